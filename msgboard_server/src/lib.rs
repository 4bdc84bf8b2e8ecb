//! Concurrent message board server.
//!
//! Every accepted connection runs in its own task and talks newline-delimited
//! JSON. All tasks share one append-only [`MessageLog`].

pub mod dispatcher;
pub mod guard;
pub mod listeners;
pub mod message_log;
pub mod server;

pub use dispatcher::{Dispatcher, Reply};
pub use guard::{GuardError, InstanceGuard};
pub use message_log::{MessageLog, MessageStore};
pub use server::{Server, ServerError};
