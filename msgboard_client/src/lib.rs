//! Client side of the message board: a typed [`Client`] plus the
//! interactive menu built on top of it.

use std::io;

use msgboard_common::transport::{self, read_command, send_command, shutdown};
use msgboard_common::{FrameError, Request, Response, Transport, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

pub mod menu;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Transport(TransportError),
    #[error("invalid response from server: {0}")]
    InvalidResponse(FrameError),
    #[error("server closed the connection")]
    Closed,
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Closed => Self::Closed,
            other => Self::Transport(other),
        }
    }
}

impl ClientError {
    /// Whether the session can carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}

/// One request, one response, over a single persistent connection.
pub struct Client<T = TcpStream> {
    transport: Transport<T, Response, Request>,
}

impl Client<TcpStream> {
    pub async fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self::new(stream))
    }
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T) -> Self {
        Self {
            transport: transport::transport(io),
        }
    }

    pub async fn request(&mut self, request: Request) -> Result<Response, ClientError> {
        send_command(&mut self.transport, request).await?;
        read_command(&mut self.transport)
            .await?
            .map_err(ClientError::InvalidResponse)
    }

    pub async fn register(
        &mut self,
        user: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Response, ClientError> {
        self.request(Request::register(user, text)).await
    }

    pub async fn list(&mut self) -> Result<Response, ClientError> {
        self.request(Request::list()).await
    }

    /// Ends the session. The connection is shut down whatever the reply.
    pub async fn quit(mut self) -> Result<Response, ClientError> {
        let response = self.request(Request::quit()).await;
        let _ = shutdown(&mut self.transport).await;
        response
    }
}
