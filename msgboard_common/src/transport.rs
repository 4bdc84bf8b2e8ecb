use std::marker::PhantomData;

use bytes::{BufMut, BytesMut};
use futures::prelude::*;
use futures::SinkExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, Encoder, Framed};

use crate::config::MAX_FRAME_LEN;

/// A frame that arrived intact but could not be turned into a command.
/// Returned as a stream item so the connection survives it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(String),
    #[error("frame exceeds {0} bytes")]
    TooLong(usize),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid Transport Operation. {0}")]
    Io(#[from] std::io::Error),
    #[error("Error serializing command. {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Connection closed by peer")]
    Closed,
}

/// Newline-delimited JSON, one value per line.
///
/// Decodes `In` and encodes `Out`, so the server uses
/// `JsonLinesCodec<Request, Response>` and the client the mirror image.
pub struct JsonLinesCodec<In, Out> {
    lines: AnyDelimiterCodec,
    max_length: usize,
    _marker: PhantomData<fn(Out) -> In>,
}

impl<In, Out> JsonLinesCodec<In, Out> {
    pub fn new() -> Self {
        Self::with_max_length(MAX_FRAME_LEN)
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: AnyDelimiterCodec::new_with_max_length(vec![b'\n'], vec![b'\n'], max_length),
            max_length,
            _marker: PhantomData,
        }
    }
}

impl<In, Out> Default for JsonLinesCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In: DeserializeOwned, Out> JsonLinesCodec<In, Out> {
    // None for blank lines, which carry no command.
    fn parse(line: &[u8]) -> Option<Result<In, FrameError>> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        Some(serde_json::from_slice(line).map_err(|e| FrameError::Malformed(e.to_string())))
    }

    fn next_frame(
        &mut self,
        src: &mut BytesMut,
        at_eof: bool,
    ) -> Result<Option<Result<In, FrameError>>, TransportError> {
        loop {
            let chunk = if at_eof {
                self.lines.decode_eof(src)
            } else {
                self.lines.decode(src)
            };

            match chunk {
                Ok(Some(line)) => {
                    if let Some(frame) = Self::parse(&line) {
                        return Ok(Some(frame));
                    }
                }
                Ok(None) => return Ok(None),
                Err(AnyDelimiterCodecError::Io(e)) => return Err(e.into()),
                // The inner codec skips ahead to the next newline on its own.
                Err(_) => return Ok(Some(Err(FrameError::TooLong(self.max_length)))),
            }
        }
    }
}

impl<In: DeserializeOwned, Out> Decoder for JsonLinesCodec<In, Out> {
    type Item = Result<In, FrameError>;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.next_frame(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.next_frame(src, true)
    }
}

impl<In, Out: Serialize> Encoder<Out> for JsonLinesCodec<In, Out> {
    type Error = TransportError;

    fn encode(&mut self, command: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let serialized = serde_json::to_vec(&command)?;
        dst.reserve(serialized.len() + 1);
        dst.put_slice(&serialized);
        dst.put_u8(b'\n');
        Ok(())
    }
}

/// A socket speaking newline-delimited JSON.
pub type Transport<T, In, Out> = Framed<T, JsonLinesCodec<In, Out>>;

pub fn transport<T, In, Out>(io: T) -> Transport<T, In, Out>
where
    T: AsyncRead + AsyncWrite,
{
    Framed::new(io, JsonLinesCodec::new())
}

pub async fn send_command<T, In, Out>(
    transport: &mut Transport<T, In, Out>,
    command: Out,
) -> Result<(), TransportError>
where
    T: AsyncWrite + Unpin,
    Out: Serialize,
{
    transport.send(command).await
}

/// Flushes pending frames and shuts down the write side.
pub async fn shutdown<T, In, Out>(
    transport: &mut Transport<T, In, Out>,
) -> Result<(), TransportError>
where
    T: AsyncWrite + Unpin,
    Out: Serialize,
{
    SinkExt::<Out>::close(transport).await
}

/// Reads the next command. A clean end-of-stream is `TransportError::Closed`;
/// a frame that fails to decode is `Ok(Err(_))`.
pub async fn read_command<T, In, Out>(
    transport: &mut Transport<T, In, Out>,
) -> Result<Result<In, FrameError>, TransportError>
where
    T: AsyncRead + Unpin,
    In: DeserializeOwned,
{
    match transport.next().await {
        Some(frame) => frame,
        None => Err(TransportError::Closed),
    }
}
