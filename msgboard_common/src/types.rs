use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Wire-visible detail strings.
pub mod detail {
    pub const REGISTERED: &str = "Mensaje registrado";
    pub const INCOMPLETE: &str = "Solicitud incompleta";
    pub const LISTED: &str = "Mensajes listados";
    pub const SESSION_CLOSED: &str = "Sesión cerrada";
    pub const UNKNOWN_ACTION: &str = "Acción desconocida";
    pub const MALFORMED: &str = "Formato JSON invalido";
    pub const TOO_LONG: &str = "Solicitud demasiado larga";
}

/// Placeholder used when a request carries no `action` at all.
pub const NO_ACTION: &str = "<none>";

/// One stored (user, text) record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageEntry {
    #[serde(alias = "usuario")]
    pub user: String,
    #[serde(alias = "mensaje")]
    pub text: String,
}

impl MessageEntry {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    List,
    Quit,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::Register => "register",
            Action::List => "list",
            Action::Quit => "quit",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "register" => Some(Action::Register),
            "list" => Some(Action::List),
            "quit" => Some(Action::Quit),
            _ => None,
        }
    }
}

// Client Side
//
// Kept as a loose envelope rather than a tagged enum: an unrecognised or
// missing action must still decode so the server can name it in its reply.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// Any JSON object is a request. Fields of the wrong type do not fail the
// frame: a non-string action is kept as its JSON text so it can be named
// back to the client, and a non-string user or text counts as missing.
impl<'de> Deserialize<'de> for Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let mut take = |names: &[&str]| names.iter().find_map(|name| fields.remove(*name));

        Ok(Self {
            action: take(&["action", "accion"]).and_then(|value| match value {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            }),
            user: take(&["user", "usuario"]).and_then(string_only),
            text: take(&["text", "mensaje"]).and_then(string_only),
        })
    }
}

fn string_only(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

impl Request {
    pub fn register(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            action: Some(Action::Register.as_str().to_string()),
            user: Some(user.into()),
            text: Some(text.into()),
        }
    }

    pub fn list() -> Self {
        Self::bare(Action::List)
    }

    pub fn quit() -> Self {
        Self::bare(Action::Quit)
    }

    fn bare(action: Action) -> Self {
        Self {
            action: Some(action.as_str().to_string()),
            ..Self::default()
        }
    }

    /// The recognised action, if any.
    pub fn action(&self) -> Option<Action> {
        self.action.as_deref().and_then(Action::parse)
    }

    /// The raw action name for logging and error replies.
    pub fn action_name(&self) -> &str {
        self.action.as_deref().unwrap_or(NO_ACTION)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

// Server Side
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Response {
    #[serde(alias = "estado")]
    pub status: Status,
    #[serde(alias = "respuesta", default)]
    pub detail: String,
    #[serde(
        alias = "total_mensajes",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_count: Option<usize>,
    #[serde(alias = "mensajes", default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<MessageEntry>>,
}

impl Response {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            detail: detail.into(),
            total_count: None,
            messages: None,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            ..Self::ok(detail)
        }
    }

    pub fn registered(total_count: usize) -> Self {
        Self {
            total_count: Some(total_count),
            ..Self::ok(detail::REGISTERED)
        }
    }

    pub fn listed(messages: Vec<MessageEntry>) -> Self {
        Self {
            messages: Some(messages),
            ..Self::ok(detail::LISTED)
        }
    }

    pub fn session_closed() -> Self {
        Self::ok(detail::SESSION_CLOSED)
    }

    pub fn incomplete() -> Self {
        Self::error(detail::INCOMPLETE)
    }

    pub fn unknown_action(action: &str) -> Self {
        Self::error(format!("{}: {}", detail::UNKNOWN_ACTION, action))
    }

    pub fn malformed() -> Self {
        Self::error(detail::MALFORMED)
    }

    pub fn too_long() -> Self {
        Self::error(detail::TOO_LONG)
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn register_request_wire_shape() {
        let value = serde_json::to_value(Request::register("alice", "hello")).unwrap();
        assert_eq!(
            value,
            json!({"action": "register", "user": "alice", "text": "hello"})
        );
    }

    #[test]
    fn bare_requests_omit_payload_fields() {
        let value = serde_json::to_value(Request::list()).unwrap();
        assert_eq!(value, json!({"action": "list"}));
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let request: Request =
            serde_json::from_str(r#"{"accion":"register","usuario":"ana","mensaje":"hola"}"#)
                .unwrap();
        assert_eq!(request, Request::register("ana", "hola"));
    }

    #[test]
    fn unknown_and_missing_actions_still_decode() {
        let request: Request = serde_json::from_str(r#"{"action":"delete"}"#).unwrap();
        assert_eq!(request.action(), None);
        assert_eq!(request.action_name(), "delete");

        let request: Request = serde_json::from_str("{}").unwrap();
        assert_eq!(request.action_name(), NO_ACTION);
    }

    #[test]
    fn mistyped_fields_do_not_fail_the_frame() {
        let request: Request = serde_json::from_str(r#"{"action":5}"#).unwrap();
        assert_eq!(request.action(), None);
        assert_eq!(request.action_name(), "5");

        let request: Request =
            serde_json::from_str(r#"{"action":{"op":"list"},"user":true}"#).unwrap();
        assert_eq!(request.action_name(), r#"{"op":"list"}"#);
        assert_eq!(request.user, None);

        let request: Request =
            serde_json::from_str(r#"{"action":"register","user":5,"text":"x"}"#).unwrap();
        assert_eq!(request.action(), Some(Action::Register));
        assert_eq!(request.user, None);
        assert_eq!(request.text.as_deref(), Some("x"));
    }

    #[test]
    fn non_objects_are_rejected() {
        for frame in [r#"["list"]"#, "5", r#""list""#, "null"] {
            assert!(serde_json::from_str::<Request>(frame).is_err(), "{frame}");
        }
    }

    #[test]
    fn response_payload_fields_are_optional() {
        let value = serde_json::to_value(Response::registered(3)).unwrap();
        assert_eq!(
            value,
            json!({"status": "ok", "detail": "Mensaje registrado", "total_count": 3})
        );

        let value = serde_json::to_value(Response::unknown_action("delete")).unwrap();
        assert_eq!(
            value,
            json!({"status": "error", "detail": "Acción desconocida: delete"})
        );
    }

    #[test]
    fn list_response_round_trips() {
        let response = Response::listed(vec![
            MessageEntry::new("alice", "hello"),
            MessageEntry::new("bob", "hi"),
        ]);
        let encoded = serde_json::to_string(&response).unwrap();
        let decoded: Response = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, response);
    }
}
