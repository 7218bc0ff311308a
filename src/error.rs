//! Error types for the provider core.

use thiserror::Error;

use crate::client::RemoteError;
use crate::reconciler::Operation;
use crate::schema::Diagnostic;

/// Errors returned by the reconciler, the client and the configuration layer.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value was rejected before any network call was made.
    #[error("Validation error: `{field}` value {value:?} {reason}")]
    Validation {
        /// Internal name of the offending field.
        field: String,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A JSON configuration failed schema checks.
    #[error("Invalid configuration: {}", summarize(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The remote API answered with a non-2xx status or could not be reached.
    #[error("{operation} failed: {source}")]
    Remote {
        /// The reconciler operation that issued the call.
        operation: Operation,
        /// The underlying client failure.
        #[source]
        source: RemoteError,
    },

    /// A create response did not carry the identity of the new resource.
    #[error("No identity in response from {endpoint}")]
    MissingIdentity {
        /// Endpoint that was called.
        endpoint: String,
    },

    /// A response body did not match the expected payload shape.
    #[error("Cannot decode response from {endpoint}: {source}")]
    Decode {
        /// Endpoint that was called.
        endpoint: String,
        /// The decoding failure.
        #[source]
        source: serde_json::Error,
    },

    /// The operation is not allowed in the instance's current phase.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// The provider configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A payload could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a validation error for `field`.
    pub fn validation(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a remote "resource not found" answer.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote { source, .. } if source.is_not_found())
    }

    /// HTTP status of a remote failure, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { source, .. } => source.status,
            _ => None,
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.attribute {
            Some(attr) => format!("{} (at {})", d.summary, attr),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Verb;

    fn remote(status: Option<u16>) -> Error {
        Error::Remote {
            operation: Operation::Read,
            source: RemoteError {
                verb: Verb::Get,
                endpoint: "/ipLoadbalancing/lb-1/tcp/frontend/7".to_string(),
                status,
                message: "boom".to_string(),
            },
        }
    }

    #[test]
    fn test_validation_display() {
        let err = Error::validation("allowed_source", "999.999.999.999", "is not an IP or CIDR");
        assert_eq!(
            err.to_string(),
            "Validation error: `allowed_source` value \"999.999.999.999\" is not an IP or CIDR"
        );
    }

    #[test]
    fn test_remote_display_carries_context() {
        let msg = remote(Some(500)).to_string();
        assert!(msg.starts_with("read failed: "));
        assert!(msg.contains("GET /ipLoadbalancing/lb-1/tcp/frontend/7"));
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(remote(Some(404)).is_not_found());
        assert!(!remote(Some(500)).is_not_found());
        assert!(!remote(None).is_not_found());
        assert!(!Error::Configuration("x".to_string()).is_not_found());
    }

    #[test]
    fn test_status() {
        assert_eq!(remote(Some(503)).status(), Some(503));
        assert_eq!(remote(None).status(), None);
        assert_eq!(Error::FailedPrecondition("x".to_string()).status(), None);
    }

    #[test]
    fn test_diagnostics_display() {
        let err = Error::Diagnostics(vec![
            Diagnostic::error("Missing required attribute 'port'").with_attribute("port"),
            Diagnostic::error("Expected object"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Missing required attribute 'port' (at port); Expected object"
        );
    }
}
