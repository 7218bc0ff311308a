//! OVH IP load-balancing TCP frontend.
//!
//! Remote collection: `/ipLoadbalancing/{serviceName}/tcp/frontend`. The
//! frontend's identity is the integer `frontendId` assigned on creation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::field::{self, Attr};
use crate::reconciler::{Resource, ResourceId};
use crate::schema::{Field, FieldKind, FieldType, Schema};
use crate::validation;

/// Desired configuration of a TCP frontend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TcpFrontend {
    /// Load balancer service the frontend belongs to. Immutable.
    pub service_name: String,
    /// Listening port(s), e.g. `"80"` or `"8000-8100"`.
    pub port: String,
    /// Zone the frontend is deployed in, e.g. `"rbx"` or `"all"`.
    pub zone: String,
    /// Source IPs or CIDR blocks allowed to connect.
    #[serde(default)]
    pub allowed_source: BTreeSet<String>,
    /// Failover IPs the frontend is restricted to.
    #[serde(default)]
    pub dedicated_ipfo: BTreeSet<String>,
    /// Farm receiving traffic by default.
    #[serde(default)]
    pub default_farm_id: Attr<i64>,
    /// SSL certificate used by default.
    #[serde(default)]
    pub default_ssl_id: Attr<i64>,
    /// Whether the frontend is disabled.
    #[serde(default)]
    pub disabled: Attr<bool>,
    /// Whether SSL termination is enabled.
    #[serde(default)]
    pub ssl: Attr<bool>,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
}

/// Wire form of a TCP frontend.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpFrontendPayload {
    /// Identity, only present in responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_id: Option<i64>,
    /// Listening port(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Deployment zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Allowed source IP blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_source: Option<Vec<String>>,
    /// Dedicated failover IPs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedicated_ipfo: Option<Vec<String>>,
    /// Default farm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_farm_id: Option<i64>,
    /// Default SSL certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ssl_id: Option<i64>,
    /// Disabled flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    /// SSL termination flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    /// Human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl TcpFrontend {
    /// A frontend with the required fields set and everything else unset.
    pub fn new(
        service_name: impl Into<String>,
        port: impl Into<String>,
        zone: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            port: port.into(),
            zone: zone.into(),
            ..Default::default()
        }
    }

    /// Decode a JSON configuration keyed by field name.
    ///
    /// Keys that are present (and not `null`) count as explicitly set.
    pub fn from_config(value: &Value) -> Result<Self> {
        validation::validate_result(&Self::schema(), value).map_err(Error::Diagnostics)?;
        serde_json::from_value(value.clone()).map_err(|e| {
            Error::Configuration(format!("invalid {} configuration: {}", Self::TYPE_NAME, e))
        })
    }

    /// Render the record as JSON keyed by field name, with the identity.
    pub fn state(&self, id: Option<&ResourceId>) -> Result<Value> {
        let mut state = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut state {
            map.insert("id".to_string(), json!(id));
        }
        Ok(state)
    }
}

impl Resource for TcpFrontend {
    type Payload = TcpFrontendPayload;

    const TYPE_NAME: &'static str = "ovh_iploadbalancing_tcp_frontend";

    fn schema() -> Schema {
        Schema::v0()
            .with_field(
                Field::new("id", FieldType::String, FieldKind::Computed)
                    .with_wire_name("frontendId"),
            )
            .with_field(
                Field::new("service_name", FieldType::String, FieldKind::RequiredImmutable)
                    .path_only()
                    .with_description("Internal name of the IP load balancer service"),
            )
            .with_field(
                Field::new("port", FieldType::String, FieldKind::RequiredMutable)
                    .with_description("Port(s) attached to the frontend"),
            )
            .with_field(
                Field::new("zone", FieldType::String, FieldKind::RequiredMutable)
                    .with_description("Zone of the frontend, or `all`"),
            )
            .with_field(
                Field::new("allowed_source", FieldType::StringSet, FieldKind::OptionalComputed)
                    .with_wire_name("allowedSource")
                    .with_ip_blocks()
                    .with_description("Restrict access to these source IP blocks"),
            )
            .with_field(
                Field::new("dedicated_ipfo", FieldType::StringSet, FieldKind::OptionalComputed)
                    .with_wire_name("dedicatedIpfo")
                    .with_ip_blocks()
                    .with_description("Only attach the frontend to these failover IPs"),
            )
            .with_field(
                Field::new("default_farm_id", FieldType::Int64, FieldKind::OptionalComputed)
                    .with_wire_name("defaultFarmId"),
            )
            .with_field(
                Field::new("default_ssl_id", FieldType::Int64, FieldKind::OptionalComputed)
                    .with_wire_name("defaultSslId"),
            )
            .with_field(
                Field::new("disabled", FieldType::Bool, FieldKind::Optional)
                    .with_default(json!(false)),
            )
            .with_field(
                Field::new("ssl", FieldType::Bool, FieldKind::Optional).with_default(json!(false)),
            )
            .with_field(
                Field::new("display_name", FieldType::String, FieldKind::Optional)
                    .with_wire_name("displayName"),
            )
    }

    fn collection_path(&self) -> String {
        format!("/ipLoadbalancing/{}/tcp/frontend", self.service_name)
    }

    fn validate(&self) -> Result<()> {
        validation::require_non_empty("service_name", &self.service_name)?;
        validation::require_non_empty("port", &self.port)?;
        validation::require_non_empty("zone", &self.zone)?;
        validation::validate_ip_blocks("allowed_source", &self.allowed_source)?;
        validation::validate_ip_blocks("dedicated_ipfo", &self.dedicated_ipfo)
    }

    fn to_payload(&self) -> TcpFrontendPayload {
        TcpFrontendPayload {
            frontend_id: None,
            port: Some(self.port.clone()),
            zone: Some(self.zone.clone()),
            allowed_source: field::non_empty_sequence(&self.allowed_source),
            dedicated_ipfo: field::non_empty_sequence(&self.dedicated_ipfo),
            default_farm_id: field::optional_int(&self.default_farm_id),
            default_ssl_id: field::optional_int(&self.default_ssl_id),
            disabled: field::optional_bool(&self.disabled),
            ssl: field::optional_bool(&self.ssl),
            display_name: field::non_empty_string(&self.display_name),
        }
    }

    fn identity(payload: &TcpFrontendPayload) -> Option<ResourceId> {
        payload.frontend_id.map(ResourceId::from)
    }

    fn absorb(&mut self, payload: TcpFrontendPayload) {
        if let Some(port) = payload.port {
            self.port = port;
        }
        if let Some(zone) = payload.zone {
            self.zone = zone;
        }
        if let Some(sources) = payload.allowed_source {
            self.allowed_source = sources.into_iter().collect();
        }
        if let Some(ips) = payload.dedicated_ipfo {
            self.dedicated_ipfo = ips.into_iter().collect();
        }
        self.default_farm_id.absorb(payload.default_farm_id);
        self.default_ssl_id.absorb(payload.default_ssl_id);
        self.disabled.absorb(payload.disabled);
        self.ssl.absorb(payload.ssl);
        if let Some(name) = payload.display_name {
            self.display_name = name;
        }
    }
}
