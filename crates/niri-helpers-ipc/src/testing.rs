//! Test doubles for code that talks to niri
//!
//! [`StubTransport`] records every payload and connection attempt and replays
//! canned replies keyed by request name. Replies queued for the same request
//! are handed out in order; the last one is repeated forever, which makes
//! "window appears on the third poll" scenarios easy to script.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::{json, Map, Value};

use crate::transport::{Transport, REQUEST_TIMEOUT};
use crate::NiriError;

#[derive(Debug, Default)]
pub struct StubTransport {
    replies: Mutex<HashMap<String, VecDeque<String>>>,
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    unreachable: bool,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every round trip fails as if niri were gone
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Queue a raw reply line for `request`
    pub fn with_reply(self, request: &str, raw: impl Into<String>) -> Self {
        self.push_reply(request, raw);
        self
    }

    /// Queue `{"Ok": {request: value}}` for `request`
    pub fn with_ok(self, request: &str, value: Value) -> Self {
        let mut inner = Map::new();
        inner.insert(request.to_string(), value);
        let raw = json!({ "Ok": Value::Object(inner) }).to_string();
        self.with_reply(request, raw)
    }

    pub fn push_reply(&self, request: &str, raw: impl Into<String>) {
        self.replies
            .lock()
            .unwrap()
            .entry(request.to_string())
            .or_default()
            .push_back(raw.into());
    }

    /// Number of round trips attempted, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Every payload handed to the transport, in order
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Names of the requests sent, in order
    pub fn requests(&self) -> Vec<String> {
        self.sent_values()
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Inner objects of every `{"Action": ...}` payload, in order
    pub fn actions(&self) -> Vec<Value> {
        self.sent_values()
            .into_iter()
            .filter_map(|mut v| v.get_mut("Action").map(Value::take))
            .collect()
    }

    /// Variant names of the actions sent, in order
    pub fn action_names(&self) -> Vec<String> {
        self.actions()
            .iter()
            .filter_map(|a| a.as_object().and_then(|o| o.keys().next().cloned()))
            .collect()
    }

    fn sent_values(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .filter_map(|p| serde_json::from_str(p).ok())
            .collect()
    }

    fn next_reply(&self, request: &str) -> Option<String> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(request)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Transport for StubTransport {
    async fn round_trip(&self, payload: &str) -> Result<String, NiriError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(payload.to_string());

        if self.unreachable {
            return Err(NiriError::ConnectionClosed);
        }

        let value: Value = serde_json::from_str(payload).map_err(NiriError::DeserializeFailed)?;
        match value {
            // No scripted reply behaves like a niri that never answers
            Value::String(request) => self
                .next_reply(&request)
                .ok_or(NiriError::Timeout(REQUEST_TIMEOUT)),
            _ => Ok(r#"{"Ok":"Handled"}"#.to_string()),
        }
    }
}
