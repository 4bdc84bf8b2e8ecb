//! Parameters shared by the server and the client.

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 50000;

/// Maximum characters per message. Enforced by the client only; the server
/// accepts any length that fits in a frame.
pub const MAX_MSG_LEN: usize = 280;

/// Maximum bytes in a single newline-delimited frame.
pub const MAX_FRAME_LEN: usize = 64 * 1024;
