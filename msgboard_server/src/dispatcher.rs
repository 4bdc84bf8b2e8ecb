use log::{debug, info, warn};
use msgboard_common::{Action, MessageEntry, Request, Response};

use crate::message_log::MessageStore;

/// What the connection should do after sending the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Continue(Response),
    Close(Response),
}

impl Reply {
    pub fn response(&self) -> &Response {
        match self {
            Reply::Continue(r) | Reply::Close(r) => r,
        }
    }

    pub fn into_response(self) -> Response {
        match self {
            Reply::Continue(r) | Reply::Close(r) => r,
        }
    }

    pub fn closes_session(&self) -> bool {
        matches!(self, Reply::Close(_))
    }
}

impl From<Response> for Reply {
    fn from(r: Response) -> Self {
        Self::Continue(r)
    }
}

/// Maps decoded requests onto the message store. Every request yields
/// exactly one reply.
#[derive(Debug, Clone)]
pub struct Dispatcher<S> {
    store: S,
}

impl<S: MessageStore> Dispatcher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn dispatch(&self, request: Request, session: &str) -> Reply {
        debug!("[{}] Action received: {}", session, request.action_name());

        match request.action() {
            Some(Action::Register) => self.register(request, session).into(),
            Some(Action::List) => self.list(session).into(),
            Some(Action::Quit) => {
                info!("[{}] Quit requested", session);
                Reply::Close(Response::session_closed())
            }
            None => {
                warn!("[{}] Unknown action: {}", session, request.action_name());
                Response::unknown_action(request.action_name()).into()
            }
        }
    }

    fn register(&self, request: Request, session: &str) -> Response {
        let (user, text) = match (request.user, request.text) {
            (Some(user), Some(text)) if !user.is_empty() && !text.is_empty() => (user, text),
            _ => {
                warn!("[{}] Incomplete register request", session);
                return Response::incomplete();
            }
        };

        let total = self.store.append(MessageEntry { user, text });
        info!("[{}] Message registered. Total: {}", session, total);
        Response::registered(total)
    }

    fn list(&self, session: &str) -> Response {
        let messages = self.store.snapshot();
        info!("[{}] Listing {} messages", session, messages.len());
        Response::listed(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_log::{MessageLog, MockMessageStore};
    use msgboard_common::types::detail;
    use msgboard_common::Status;

    const SESSION: &str = "session-test";

    fn request(action: &str, user: Option<&str>, text: Option<&str>) -> Request {
        Request {
            action: Some(action.to_string()),
            user: user.map(String::from),
            text: text.map(String::from),
        }
    }

    #[test]
    fn register_appends_and_reports_total() {
        let mut store = MockMessageStore::new();
        store
            .expect_append()
            .withf(|entry| entry == &MessageEntry::new("alice", "hello"))
            .times(1)
            .return_const(4usize);

        let reply = Dispatcher::new(store).dispatch(Request::register("alice", "hello"), SESSION);

        assert!(!reply.closes_session());
        let response = reply.into_response();
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.detail, detail::REGISTERED);
        assert_eq!(response.total_count, Some(4));
    }

    #[test]
    fn incomplete_register_never_touches_the_store() {
        let mut store = MockMessageStore::new();
        store.expect_append().never();
        let dispatcher = Dispatcher::new(store);

        let incomplete = [
            request("register", Some(""), Some("hello")),
            request("register", Some("alice"), Some("")),
            request("register", None, Some("hello")),
            request("register", Some("alice"), None),
        ];

        for req in incomplete {
            let response = dispatcher.dispatch(req, SESSION).into_response();
            assert_eq!(response, Response::incomplete());
        }
    }

    #[test]
    fn list_returns_snapshot() {
        let mut store = MockMessageStore::new();
        store
            .expect_snapshot()
            .times(1)
            .returning(|| vec![MessageEntry::new("bob", "hi")]);

        let response = Dispatcher::new(store)
            .dispatch(Request::list(), SESSION)
            .into_response();

        assert!(response.is_ok());
        assert_eq!(response.messages, Some(vec![MessageEntry::new("bob", "hi")]));
    }

    #[test]
    fn list_on_empty_log() {
        let response = Dispatcher::new(MessageLog::new())
            .dispatch(Request::list(), SESSION)
            .into_response();

        assert!(response.is_ok());
        assert_eq!(response.messages, Some(vec![]));
    }

    #[test]
    fn list_is_idempotent() {
        let dispatcher = Dispatcher::new(MessageLog::new());
        dispatcher.dispatch(Request::register("alice", "hello"), SESSION);

        let first = dispatcher.dispatch(Request::list(), SESSION);
        let second = dispatcher.dispatch(Request::list(), SESSION);

        assert_eq!(first, second);
        assert_eq!(dispatcher.store().len(), 1);
    }

    #[test]
    fn quit_closes_the_session() {
        let mut store = MockMessageStore::new();
        store.expect_append().never();
        store.expect_snapshot().never();

        let reply = Dispatcher::new(store).dispatch(Request::quit(), SESSION);

        assert!(reply.closes_session());
        assert_eq!(reply.response().detail, "Sesión cerrada");
    }

    #[test]
    fn unknown_action_is_named_in_reply() {
        let dispatcher = Dispatcher::new(MessageLog::new());

        let reply = dispatcher.dispatch(request("delete", None, None), SESSION);
        assert!(!reply.closes_session());
        let response = reply.into_response();
        assert_eq!(response.status, Status::Error);
        assert!(response.detail.contains("delete"));

        let response = dispatcher
            .dispatch(Request::default(), SESSION)
            .into_response();
        assert_eq!(response.detail, "Acción desconocida: <none>");
    }

    #[test]
    fn mistyped_fields_get_validation_replies() {
        let mut store = MockMessageStore::new();
        store.expect_append().never();
        let dispatcher = Dispatcher::new(store);

        let numeric_action: Request = serde_json::from_str(r#"{"action":5}"#).unwrap();
        let response = dispatcher.dispatch(numeric_action, SESSION).into_response();
        assert_eq!(response, Response::unknown_action("5"));
        assert_eq!(response.detail, "Acción desconocida: 5");

        let numeric_user: Request =
            serde_json::from_str(r#"{"action":"register","user":5,"text":"x"}"#).unwrap();
        let response = dispatcher.dispatch(numeric_user, SESSION).into_response();
        assert_eq!(response, Response::incomplete());
    }

    #[test]
    fn totals_increase_across_registrations() {
        let dispatcher = Dispatcher::new(MessageLog::new());
        let totals: Vec<_> = (0..5)
            .map(|i| {
                dispatcher
                    .dispatch(Request::register("alice", format!("msg {i}")), SESSION)
                    .into_response()
                    .total_count
            })
            .collect();

        assert_eq!(totals, vec![Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }
}
