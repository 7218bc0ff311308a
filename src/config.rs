//! Provider configuration.
//!
//! The provider is configured with a JSON object:
//!
//! ```json
//! { "endpoint": "ovh-eu", "timeout_secs": 30 }
//! ```
//!
//! `endpoint` is either a full base URL or one of the well-known API aliases
//! (see [`ENDPOINT_ALIASES`]).

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{Field, FieldKind, FieldType, Schema};
use crate::validation;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API aliases accepted as `endpoint`, and the base URL each stands for.
pub const ENDPOINT_ALIASES: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Schema of the provider configuration object.
pub fn provider_schema() -> Schema {
    Schema::v0()
        .with_field(
            Field::new("endpoint", FieldType::String, FieldKind::RequiredMutable)
                .with_description("API base URL or alias such as `ovh-eu`"),
        )
        .with_field(
            Field::new("timeout_secs", FieldType::Int64, FieldKind::Optional)
                .with_default(json!(DEFAULT_TIMEOUT_SECS))
                .with_description("Per-request timeout in seconds"),
        )
}

/// Connection settings for the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// Base URL or alias.
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderConfig {
    /// Configuration for `endpoint` with the default timeout.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Decode and check a JSON configuration object.
    pub fn from_value(value: &Value) -> Result<Self> {
        validation::validate_result(&provider_schema(), value).map_err(Error::Diagnostics)?;

        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| Error::Configuration(format!("invalid provider configuration: {}", e)))?;
        config.check()?;

        debug!(
            endpoint = %config.base_url(),
            timeout_secs = config.timeout_secs,
            "provider configured"
        );
        Ok(config)
    }

    /// The base URL, with aliases resolved.
    pub fn base_url(&self) -> &str {
        ENDPOINT_ALIASES
            .iter()
            .find(|(alias, _)| *alias == self.endpoint)
            .map(|(_, url)| *url)
            .unwrap_or(self.endpoint.as_str())
    }

    fn check(&self) -> Result<()> {
        let url = self.base_url();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(Error::Configuration(format!(
                "endpoint {:?} is neither a known alias nor an http(s) URL",
                self.endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Configuration(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
