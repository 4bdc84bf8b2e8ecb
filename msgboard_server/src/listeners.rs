use log::{debug, warn};
use msgboard_common::transport::{self, read_command, send_command, shutdown};
use msgboard_common::{FrameError, Request, Response, Transport, TransportError};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::dispatcher::{Dispatcher, Reply};
use crate::message_log::MessageStore;

#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Serves one connection until the peer leaves, asks to quit, or the socket
/// fails. Requests on one connection are handled strictly in order.
pub async fn process<S, T>(
    socket: T,
    dispatcher: Dispatcher<S>,
    session: &str,
) -> Result<(), ListenerError>
where
    S: MessageStore,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut transport: Transport<T, Request, Response> = transport::transport(socket);

    loop {
        let reply = match read_command(&mut transport).await {
            Ok(frame) => process_frame(frame, &dispatcher, session),
            Err(TransportError::Closed) => {
                debug!("[{}] Peer closed the connection", session);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let closing = reply.closes_session();
        send_command(&mut transport, reply.into_response()).await?;

        if closing {
            break;
        }
    }

    shutdown(&mut transport).await?;
    Ok(())
}

fn process_frame<S: MessageStore>(
    frame: Result<Request, FrameError>,
    dispatcher: &Dispatcher<S>,
    session: &str,
) -> Reply {
    match frame {
        Ok(request) => dispatcher.dispatch(request, session),
        Err(FrameError::Malformed(e)) => {
            warn!("[{}] Invalid JSON: {}", session, e);
            Response::malformed().into()
        }
        Err(FrameError::TooLong(limit)) => {
            warn!("[{}] Frame over {} bytes discarded", session, limit);
            Response::too_long().into()
        }
    }
}
