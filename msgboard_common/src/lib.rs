pub mod config;
pub mod transport;
pub mod types;

pub use transport::{FrameError, JsonLinesCodec, Transport, TransportError};
pub use types::{Action, MessageEntry, Request, Response, Status};
