use msgboard_client::{menu, Client};
use msgboard_common::transport::{self, read_command, send_command};
use msgboard_common::{Request, Response, Transport};
use tokio::io::DuplexStream;

// Records every request and answers with a fixed reply per action.
async fn recording_server(io: DuplexStream) -> Vec<Request> {
    let mut transport: Transport<_, Request, Response> = transport::transport(io);
    let mut seen = vec![];

    while let Ok(Ok(request)) = read_command(&mut transport).await {
        let reply = match request.action_name() {
            "register" => Response::registered(seen.len() + 1),
            "list" => Response::listed(vec![]),
            "quit" => Response::session_closed(),
            other => Response::unknown_action(other),
        };
        let quitting = request.action_name() == "quit";
        seen.push(request);
        if send_command(&mut transport, reply).await.is_err() || quitting {
            break;
        }
    }

    seen
}

async fn scripted(script: &str) -> (Vec<Request>, String) {
    colored::control::set_override(false);

    let (client_io, server_io) = tokio::io::duplex(4096);
    let server = tokio::spawn(recording_server(server_io));

    let mut out = Vec::new();
    menu::run_session(Client::new(client_io), script.as_bytes(), &mut out, 10)
        .await
        .unwrap();

    (server.await.unwrap(), String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn register_list_quit() {
    let (requests, out) = scripted("1\nalice\nhello\n2\n3\n").await;

    assert_eq!(
        requests,
        vec![
            Request::register("alice", "hello"),
            Request::list(),
            Request::quit()
        ]
    );
    assert!(out.contains("[OK] Mensaje registrado"));
    assert!(out.contains("Total de mensajes: 1"));
    assert!(out.contains("(sin mensajes)"));
    assert!(out.contains("Sesión cerrada"));
}

#[tokio::test]
async fn overlong_message_is_never_sent() {
    let (requests, out) = scripted("1\nalice\nthis is far too long\n3\n").await;

    assert_eq!(requests, vec![Request::quit()]);
    assert!(out.contains("supera el maximo de 10"));
}

#[tokio::test]
async fn invalid_choice_shows_menu_again() {
    let (requests, out) = scripted("9\n2\n3\n").await;

    assert_eq!(requests, vec![Request::list(), Request::quit()]);
    assert!(out.contains("Opcion invalida"));
}

#[tokio::test]
async fn end_of_input_still_quits() {
    let (requests, _) = scripted("2\n").await;
    assert_eq!(requests, vec![Request::list(), Request::quit()]);
}
