//! Niri IPC client implementation
//!
//! `NiriClient` layers the niri JSON protocol over a [`Transport`]:
//!
//! 1. Requests are bare JSON strings (e.g. `"Windows"`); replies are
//!    `{"Ok": {"Windows": [...]}}` or `{"Err": "..."}`.
//! 2. Actions are wrapped as `{"Action": {...}}`; the reply is logged but not
//!    interpreted.
//!
//! Transport and protocol failures never escape this layer. Requests degrade
//! to `None`, actions are logged and dropped, so a workflow issuing many
//! actions in a row keeps going after a single failed step. Only argument
//! validation is reported as an error, and it happens before any I/O.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use super::action::Action;
use super::transport::{SocketTransport, Transport};
use super::types::{Window, Workspace};
use super::NiriError;

/// Client for communicating with the niri compositor via IPC
///
/// # Example
///
/// ```ignore
/// let client = NiriClient::connect()?;
/// if let Some(window) = client.focused_window().await {
///     client.send_action(&Action::MoveWindowToFloating { id: window.id }).await;
/// }
/// ```
#[derive(Debug)]
pub struct NiriClient<T = SocketTransport> {
    transport: T,
}

impl NiriClient<SocketTransport> {
    /// Create a client for the socket named by `$NIRI_SOCKET`
    ///
    /// # Errors
    ///
    /// Returns `NiriError::SocketNotSet` if `$NIRI_SOCKET` is not set.
    /// Returns `NiriError::SocketNotFound` if the socket path doesn't exist.
    pub fn connect() -> Result<Self, NiriError> {
        Ok(Self::new(SocketTransport::from_env()?))
    }
}

impl<T: Transport> NiriClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a named request and return the reply payload
    ///
    /// If the `Ok` payload is an object keyed by the request name (niri echoes
    /// `"Windows"` as `{"Windows": [...]}`), the inner value is returned.
    ///
    /// Returns `Ok(None)` when the request could not be delivered, the reply
    /// could not be parsed, or niri answered with `Err`; each case is logged.
    ///
    /// # Errors
    ///
    /// Returns `NiriError::Validation` if `name` is empty or blank.
    pub async fn send_request(&self, name: &str) -> Result<Option<Value>, NiriError> {
        if name.trim().is_empty() {
            return Err(NiriError::validation("request name must be a non-empty string"));
        }

        let payload = serde_json::to_string(name).map_err(NiriError::SerializeFailed)?;
        debug!(request = %payload, "Sending request");

        let raw = match self.transport.round_trip(&payload).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(request = name, error = %e, "Failed to send request");
                return Ok(None);
            }
        };
        debug!(response = raw.trim(), "Response");

        match parse_reply(&raw) {
            Ok(value) => Ok(Some(unwrap_named(name, value))),
            Err(NiriError::NiriError { message }) => {
                error!(request = name, error = %message, "Request error");
                Ok(None)
            }
            Err(e) => {
                error!(request = name, error = %e, raw = raw.trim(), "Malformed reply");
                Ok(None)
            }
        }
    }

    /// Send an untyped action object, wrapped as `{"Action": action}`
    ///
    /// The reply is logged and otherwise ignored. Delivery failures are
    /// logged and swallowed.
    ///
    /// # Errors
    ///
    /// Returns `NiriError::Validation` if `action` is empty; nothing is sent.
    pub async fn send_raw_action(&self, action: Map<String, Value>) -> Result<(), NiriError> {
        if action.is_empty() {
            return Err(NiriError::validation("action must be a non-empty object"));
        }

        let mut envelope = Map::new();
        envelope.insert("Action".to_string(), Value::Object(action));
        let payload =
            serde_json::to_string(&Value::Object(envelope)).map_err(NiriError::SerializeFailed)?;
        debug!(action = %payload, "Sending action");

        match self.transport.round_trip(&payload).await {
            Ok(raw) => debug!(response = raw.trim(), "Response"),
            Err(e) => error!(action = %payload, error = %e, "Failed to send action"),
        }

        Ok(())
    }

    /// Send a typed action
    pub async fn send_action(&self, action: &Action) {
        let map = match serde_json::to_value(action) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                warn!(action = action.name(), value = %other, "Action did not serialize to an object");
                return;
            }
            Err(e) => {
                warn!(action = action.name(), error = %e, "Failed to serialize action");
                return;
            }
        };

        if let Err(e) = self.send_raw_action(map).await {
            warn!(action = action.name(), error = %e, "Action rejected");
        }
    }

    /// Query all windows; empty if the query failed
    pub async fn windows(&self) -> Vec<Window> {
        self.typed_request("Windows").await.unwrap_or_default()
    }

    /// Query all workspaces; empty if the query failed
    pub async fn workspaces(&self) -> Vec<Workspace> {
        self.typed_request("Workspaces").await.unwrap_or_default()
    }

    /// Query the focused window
    ///
    /// `None` both when nothing is focused and when the query failed.
    pub async fn focused_window(&self) -> Option<Window> {
        self.typed_request::<Option<Window>>("FocusedWindow")
            .await
            .flatten()
    }

    async fn typed_request<R: DeserializeOwned>(&self, name: &'static str) -> Option<R> {
        let value = match self.send_request(name).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                error!(request = name, error = %e, "Request rejected");
                return None;
            }
        };

        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                error!(request = name, error = %e, "Failed to decode reply");
                None
            }
        }
    }
}

/// Parse a reply line into the payload of its `Ok` variant
///
/// # Errors
///
/// Returns `NiriError::DeserializeFailed` for invalid JSON,
/// `NiriError::NiriError` for an `Err` reply and
/// `NiriError::UnexpectedReply` for any other shape.
pub(crate) fn parse_reply(raw: &str) -> Result<Value, NiriError> {
    let parsed: Value = serde_json::from_str(raw).map_err(NiriError::DeserializeFailed)?;

    let Value::Object(mut object) = parsed else {
        return Err(NiriError::UnexpectedReply {
            raw: raw.trim().to_string(),
        });
    };

    if let Some(ok) = object.remove("Ok") {
        return Ok(ok);
    }

    match object.remove("Err") {
        Some(Value::String(message)) => Err(NiriError::NiriError { message }),
        Some(other) => Err(NiriError::NiriError {
            message: other.to_string(),
        }),
        None => Err(NiriError::UnexpectedReply {
            raw: raw.trim().to_string(),
        }),
    }
}

/// Strip the single-key wrapper niri puts around request replies
fn unwrap_named(name: &str, value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.contains_key(name) => {
            object.remove(name).unwrap_or(Value::Null)
        }
        other => other,
    }
}
