//! Schema types describing resource fields.
//!
//! A [`Schema`] is the static field table of one resource kind: the internal
//! field name, the external (wire) name, the value type and the field's
//! [`FieldKind`]. The reconciler never consults it at runtime; it is what
//! callers use to validate JSON configuration and to decide when a change
//! requires recreating the remote resource.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A boolean value.
    Bool,
    /// An unordered set of strings.
    StringSet,
}

/// How a field participates in the resource lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Required at creation; changing it means recreating the resource.
    RequiredImmutable,
    /// Required at creation; can be changed in place.
    RequiredMutable,
    /// May be omitted; the remote assigns a default that is read back.
    OptionalComputed,
    /// May be omitted; never filled in by the remote.
    Optional,
    /// Set by the remote only (e.g. the identity).
    Computed,
}

impl FieldKind {
    /// Whether the field must be present in configuration.
    pub fn is_required(self) -> bool {
        matches!(self, Self::RequiredImmutable | Self::RequiredMutable)
    }

    /// Whether the remote may fill in the value.
    pub fn is_computed(self) -> bool {
        matches!(self, Self::OptionalComputed | Self::Computed)
    }

    /// Whether the field can be set in configuration at all.
    pub fn is_configurable(self) -> bool {
        !matches!(self, Self::Computed)
    }

    /// Whether a change to this field forces the resource to be replaced.
    pub fn forces_replacement(self) -> bool {
        matches!(self, Self::RequiredImmutable)
    }
}

/// One entry of a resource's field table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Internal (configuration) name.
    pub name: &'static str,
    /// External name used on the wire, `None` if the field never travels in
    /// a payload (e.g. it is part of the path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<&'static str>,
    /// Value type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Lifecycle kind.
    pub kind: FieldKind,
    /// Elements must be IP addresses or CIDR blocks.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ip_blocks: bool,
    /// Value assumed when the field is not configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl Field {
    /// Create a field whose wire name equals its internal name.
    pub fn new(name: &'static str, field_type: FieldType, kind: FieldKind) -> Self {
        Self {
            name,
            wire_name: Some(name),
            field_type,
            kind,
            ip_blocks: false,
            default: None,
            description: None,
        }
    }

    /// Set the external name.
    pub fn with_wire_name(mut self, wire_name: &'static str) -> Self {
        self.wire_name = Some(wire_name);
        self
    }

    /// Mark the field as never sent in a payload.
    pub fn path_only(mut self) -> Self {
        self.wire_name = None;
        self
    }

    /// Require every element to be an IP address or CIDR block.
    pub fn with_ip_blocks(mut self) -> Self {
        self.ip_blocks = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Field table of a resource kind or of the provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    /// Schema version, bumped when the stored state shape changes.
    pub version: u64,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create an empty schema at the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            fields: Vec::new(),
        }
    }

    /// Create an empty schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Append a field.
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by internal name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// External name of a field, if it travels on the wire.
    pub fn wire_name(&self, name: &str) -> Option<&'static str> {
        self.field(name).and_then(|f| f.wire_name)
    }

    /// Names of fields whose change forces replacement.
    pub fn immutable_fields(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.kind.forces_replacement())
            .map(|f| f.name)
            .collect()
    }

    /// Immutable fields whose value differs between two JSON states.
    ///
    /// A non-empty result means the change cannot be applied with an update.
    pub fn replacement_fields(&self, prior: &Value, desired: &Value) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.kind.forces_replacement())
            .filter(|f| prior.get(f.name) != desired.get(f.name))
            .map(|f| f.name)
            .collect()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::v0()
    }
}

/// A configuration problem found by schema validation.
///
/// Every diagnostic rejects the configuration it was raised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic rejecting the configuration.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}
