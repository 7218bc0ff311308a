//! Remote resource client.
//!
//! The reconciler talks to the remote API through the [`RemoteClient`] trait:
//! four verbs against a path, JSON in and JSON out. [`HttpClient`] is the
//! `reqwest` implementation used in production; tests substitute
//! [`crate::testing::StubClient`].
//!
//! Every call is a single attempt. Nothing is retried or cached here, and a
//! `404` is reported like any other non-2xx status.

use std::fmt;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::{Error, Result};

/// HTTP verb of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Verb {
    fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// A failed remote call: non-2xx status or transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Verb of the failed call.
    pub verb: Verb,
    /// Path the call was issued against.
    pub endpoint: String,
    /// HTTP status, `None` when no response was received.
    pub status: Option<u16>,
    /// Error message from the response body or the transport.
    pub message: String,
}

impl RemoteError {
    /// Whether the remote answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "calling {} {} returned {}: {}",
                self.verb, self.endpoint, status, self.message
            ),
            None => write!(f, "calling {} {}: {}", self.verb, self.endpoint, self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Four-verb JSON client against a hierarchical resource API.
///
/// Responses without a body decode as [`Value::Null`]. A 2xx body that is not
/// JSON is returned as [`Value::String`], never as an error.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    /// `GET path`.
    async fn get(&self, path: &str) -> std::result::Result<Value, RemoteError>;

    /// `POST path` with a JSON body.
    async fn post(&self, path: &str, body: &Value) -> std::result::Result<Value, RemoteError>;

    /// `PUT path` with a JSON body.
    async fn put(&self, path: &str, body: &Value) -> std::result::Result<Value, RemoteError>;

    /// `DELETE path`.
    async fn delete(&self, path: &str) -> std::result::Result<Value, RemoteError>;
}

/// [`RemoteClient`] over HTTPS using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Build a client for the endpoint and timeout in `config`.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(
        &self,
        verb: Verb,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%verb, %url, "remote call");

        let fail = |status: Option<u16>, message: String| RemoteError {
            verb,
            endpoint: path.to_string(),
            status,
            message,
        };

        let mut request = self
            .http
            .request(verb.method(), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| fail(None, e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| fail(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(fail(Some(status.as_u16()), error_message(status, &text)));
        }

        Ok(success_body(text))
    }
}

#[async_trait::async_trait]
impl RemoteClient for HttpClient {
    async fn get(&self, path: &str) -> std::result::Result<Value, RemoteError> {
        self.call(Verb::Get, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> std::result::Result<Value, RemoteError> {
        self.call(Verb::Post, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> std::result::Result<Value, RemoteError> {
        self.call(Verb::Put, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> std::result::Result<Value, RemoteError> {
        self.call(Verb::Delete, path, None).await
    }
}

/// Body of a 2xx response. A success is never turned into an error here:
/// empty bodies are `null`, and text that is not JSON is passed on as a JSON
/// string for the caller to decode or ignore.
fn success_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// OVH error bodies look like `{"message": "..."}`; anything else is passed
/// through as text.
fn error_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
    }
}
