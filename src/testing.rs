//! Testing utilities for resource implementations.
//!
//! [`StubClient`] stands in for the remote API: responses are scripted in
//! order, and every call is recorded so tests can assert on what was sent,
//! and on what was *not* sent.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ovh_iplb_provider::testing::StubClient;
//! use ovh_iplb_provider::Reconciler;
//!
//! #[tokio::test]
//! async fn test_create_frontend() {
//!     let stub = Arc::new(StubClient::new());
//!     stub.push_ok(json!({"frontendId": 12, "port": "80", "zone": "all"}));
//!
//!     let reconciler = Reconciler::new(stub.clone());
//!     let id = reconciler.create(&mut frontend).await.unwrap();
//!
//!     assert_eq!(stub.call_count(), 1);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::client::{RemoteClient, RemoteError, Verb};
use crate::schema::Diagnostic;

/// A call received by a [`StubClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Verb of the call.
    pub verb: Verb,
    /// Path of the call.
    pub path: String,
    /// JSON body, for POST and PUT.
    pub body: Option<Value>,
}

impl RecordedCall {
    /// The body exactly as it would go on the wire.
    pub fn body_bytes(&self) -> Vec<u8> {
        self.body
            .as_ref()
            .map(|b| serde_json::to_vec(b).unwrap_or_default())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Ok(Value),
    Status(u16, String),
    Transport(String),
}

/// Scripted, call-counting [`RemoteClient`].
///
/// Each call consumes the next scripted response. With nothing scripted, a
/// call succeeds with an empty (`null`) body.
#[derive(Debug, Default)]
pub struct StubClient {
    responses: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubClient {
    /// Create a stub with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful response with `body`.
    pub fn push_ok(&self, body: Value) {
        self.push(Scripted::Ok(body));
    }

    /// Script a non-2xx response.
    pub fn push_status(&self, status: u16, message: impl Into<String>) {
        self.push(Scripted::Status(status, message.into()));
    }

    /// Script a failure with no HTTP response at all.
    pub fn push_transport_error(&self, message: impl Into<String>) {
        self.push(Scripted::Transport(message.into()));
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// The most recent call.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().ok().and_then(|c| c.last().cloned())
    }

    /// Calls made with the given verb, in order.
    pub fn calls_with(&self, verb: Verb) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.verb == verb)
            .collect()
    }

    fn push(&self, scripted: Scripted) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(scripted);
        }
    }

    fn answer(&self, verb: Verb, path: &str, body: Option<&Value>) -> Result<Value, RemoteError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                verb,
                path: path.to_string(),
                body: body.cloned(),
            });
        }

        let next = self.responses.lock().ok().and_then(|mut r| r.pop_front());
        let fail = |status, message| RemoteError {
            verb,
            endpoint: path.to_string(),
            status,
            message,
        };
        match next {
            None => Ok(Value::Null),
            Some(Scripted::Ok(value)) => Ok(value),
            Some(Scripted::Status(status, message)) => Err(fail(Some(status), message)),
            Some(Scripted::Transport(message)) => Err(fail(None, message)),
        }
    }
}

#[async_trait::async_trait]
impl RemoteClient for StubClient {
    async fn get(&self, path: &str) -> Result<Value, RemoteError> {
        self.answer(Verb::Get, path, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, RemoteError> {
        self.answer(Verb::Post, path, Some(body))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, RemoteError> {
        self.answer(Verb::Put, path, Some(body))
    }

    async fn delete(&self, path: &str) -> Result<Value, RemoteError> {
        self.answer(Verb::Delete, path, None)
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a JSON payload does not contain `key` at all (not even `null`).
///
/// # Panics
///
/// Panics if the key is present.
pub fn assert_key_absent(payload: &Value, key: &str) {
    assert!(
        payload.get(key).is_none(),
        "Expected key '{}' to be omitted, but payload has {}",
        key,
        payload
    );
}

/// Assert that a diagnostic's summary contains the given substring.
///
/// # Panics
///
/// Panics if no diagnostic contains the given substring.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics.iter().any(|d| d.summary.contains(substring)),
        "Expected an error containing '{}', but no matching error found. Errors: {:?}",
        substring,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_stub_replays_script_in_order() {
        let stub = StubClient::new();
        stub.push_ok(json!({"a": 1}));
        stub.push_status(404, "missing");
        stub.push_transport_error("reset");

        assert_eq!(stub.get("/x").await.unwrap(), json!({"a": 1}));

        let err = stub.post("/x", &json!({"b": 2})).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.verb, Verb::Post);

        let err = stub.delete("/x/1").await.unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.message, "reset");

        assert_eq!(stub.put("/x/1", &json!({})).await.unwrap(), Value::Null);
        assert_eq!(stub.call_count(), 4);
    }

    #[tokio::test]
    async fn test_stub_records_calls() {
        let stub = StubClient::new();
        stub.post("/x", &json!({"port": "80"})).await.unwrap();
        stub.get("/x/1").await.unwrap();

        let posts = stub.calls_with(Verb::Post);
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].body_bytes(), br#"{"port":"80"}"#.to_vec());

        let last = stub.last_call().unwrap();
        assert_eq!(last.verb, Verb::Get);
        assert_eq!(last.path, "/x/1");
        assert!(last.body.is_none());
        assert!(last.body_bytes().is_empty());
    }

    #[test]
    fn test_assert_helpers() {
        assert_key_absent(&json!({"a": 1}), "b");
        assert_error_contains(&[Diagnostic::error("Missing required attribute")], "Missing");
    }

    #[test]
    #[should_panic(expected = "Expected an error containing 'Missing'")]
    fn test_assert_error_contains_rejects_other_summaries() {
        assert_error_contains(&[Diagnostic::error("Unsupported attribute 'x'")], "Missing");
    }

    #[test]
    #[should_panic(expected = "to be omitted")]
    fn test_assert_key_absent_rejects_null() {
        assert_key_absent(&json!({"a": null}), "a");
    }
}
