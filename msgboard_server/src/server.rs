use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{error, info, warn};
use tokio::net::TcpListener;

use crate::dispatcher::Dispatcher;
use crate::listeners;
use crate::message_log::{MessageLog, MessageStore};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_session_label() -> String {
    format!("session-{}", SESSION_COUNTER.fetch_add(1, Ordering::Relaxed))
}

const ACCEPT_BACKOFF_START: Duration = Duration::from_millis(50);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(5);

#[cfg(unix)]
const DESCRIPTOR_LIMIT_ERRORS: &[i32] = &[23, 24]; // ENFILE, EMFILE
#[cfg(windows)]
const DESCRIPTOR_LIMIT_ERRORS: &[i32] = &[10024]; // WSAEMFILE
#[cfg(not(any(unix, windows)))]
const DESCRIPTOR_LIMIT_ERRORS: &[i32] = &[];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptFailure {
    /// Tied to one half-open connection; accept again right away.
    Connection,
    /// Out of descriptors or memory; accept again once some are released.
    Exhausted,
    Fatal,
}

fn classify(e: &io::Error) -> AcceptFailure {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => AcceptFailure::Connection,
        io::ErrorKind::OutOfMemory => AcceptFailure::Exhausted,
        _ if e
            .raw_os_error()
            .is_some_and(|code| DESCRIPTOR_LIMIT_ERRORS.contains(&code)) =>
        {
            AcceptFailure::Exhausted
        }
        _ => AcceptFailure::Fatal,
    }
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(ACCEPT_BACKOFF_MAX)
}

/// The listening side: one passive socket plus the dispatcher every
/// connection shares.
pub struct Server<S = MessageLog> {
    listener: TcpListener,
    dispatcher: Dispatcher<S>,
}

impl Server<MessageLog> {
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        Self::bind_with_store(addr, MessageLog::new()).await
    }
}

impl<S> Server<S>
where
    S: MessageStore + Clone + Send + Sync + 'static,
{
    pub async fn bind_with_store(addr: &str, store: S) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        info!("[+] Server listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            dispatcher: Dispatcher::new(store),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, one task per connection. Running out of
    /// descriptors pauses accepting with a growing delay instead of stopping;
    /// only an error that breaks the listener itself ends the loop.
    pub async fn run(self) -> Result<(), ServerError> {
        let mut backoff = ACCEPT_BACKOFF_START;

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => {
                    backoff = ACCEPT_BACKOFF_START;
                    accepted
                }
                Err(e) => match classify(&e) {
                    AcceptFailure::Connection => {
                        warn!("Dropped incoming connection: {}", e);
                        continue;
                    }
                    AcceptFailure::Exhausted => {
                        warn!("Cannot accept ({}), retrying in {:?}", e, backoff);
                        tokio::time::sleep(backoff).await;
                        backoff = next_backoff(backoff);
                        continue;
                    }
                    AcceptFailure::Fatal => {
                        error!("Listener failed: {}", e);
                        return Err(ServerError::Accept(e));
                    }
                },
            };

            let session = next_session_label();
            let dispatcher = self.dispatcher.clone();
            info!("[{}] Session started with {}", session, peer);

            tokio::spawn(async move {
                match listeners::process(socket, dispatcher, &session).await {
                    Ok(()) => info!("[{}] Connection closed with {}", session, peer),
                    Err(e) => warn!("[{}] Connection with {} dropped: {}", session, peer, e),
                }
            });
        }
    }
}
