//! Input validation.
//!
//! Two layers: typed checks that run on a decoded configuration record right
//! before a create or update ([`validate_ip_blocks`], [`require_non_empty`]),
//! and [`validate`], which checks a raw JSON configuration against a
//! [`Schema`] and reports every problem as a [`Diagnostic`].
//!
//! # Example
//!
//! ```
//! use ovh_iplb_provider::schema::{Field, FieldKind, FieldType, Schema};
//! use ovh_iplb_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_field(Field::new("port", FieldType::String, FieldKind::RequiredMutable))
//!     .with_field(
//!         Field::new("allowed_source", FieldType::StringSet, FieldKind::OptionalComputed)
//!             .with_ip_blocks(),
//!     );
//!
//! assert!(validate(&schema, &json!({"port": "80"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"port": "80", "allowed_source": ["nope"]}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("allowed_source.0".to_string()));
//! ```

use std::net::IpAddr;

use ipnet::IpNet;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{Diagnostic, Field, FieldType, Schema};

/// Whether `value` is an IP address or a CIDR block, v4 or v6.
pub fn is_ip_block(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok() || value.parse::<IpNet>().is_ok()
}

/// Check that `value` is an IP address or CIDR block.
pub fn validate_ip_block(field: &str, value: &str) -> Result<()> {
    if is_ip_block(value) {
        Ok(())
    } else {
        Err(Error::validation(
            field,
            value,
            "is not a valid IP address or CIDR block",
        ))
    }
}

/// Check every element of an IP-block field, stopping at the first bad one.
pub fn validate_ip_blocks<'a>(
    field: &str,
    values: impl IntoIterator<Item = &'a String>,
) -> Result<()> {
    values
        .into_iter()
        .try_for_each(|value| validate_ip_block(field, value))
}

/// Check that a required string is not empty.
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::validation(field, value, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Validate a JSON configuration object against a schema.
///
/// Returns a list of diagnostics; an empty list means the value is valid.
///
/// - Required fields must be present, non-null and (for strings) not blank,
///   the same rule as [`require_non_empty`]
/// - Computed-only fields must not be configured (the remote sets these)
/// - Values must match the field type
/// - Elements of IP-block fields must parse as an address or CIDR block
/// - Keys not in the schema are rejected
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        },
    };

    for field in &schema.fields {
        if field.kind.is_configurable() {
            validate_field(field, obj.get(field.name), &mut diagnostics);
        } else if obj.get(field.name).is_some_and(|v| !v.is_null()) {
            diagnostics.push(
                Diagnostic::error(format!("Attribute '{}' is computed", field.name))
                    .with_detail("This attribute is set by the remote and cannot be configured")
                    .with_attribute(field.name),
            );
        }
    }

    for key in obj.keys() {
        if schema.field(key).is_none() {
            diagnostics.push(
                Diagnostic::error(format!("Unsupported attribute '{}'", key))
                    .with_detail("This attribute is not part of the schema")
                    .with_attribute(key.as_str()),
            );
        }
    }

    diagnostics
}

/// Validate, returning `Err` with the diagnostics if there are any.
pub fn validate_result(schema: &Schema, value: &Value) -> std::result::Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate_result(schema, value).is_ok()
}

fn validate_field(field: &Field, value: Option<&Value>, diagnostics: &mut Vec<Diagnostic>) {
    let path = field.name;
    match value {
        None | Some(Value::Null) => {
            if field.kind.is_required() {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => match field.field_type {
            FieldType::String => match v.as_str() {
                Some(s) if field.kind.is_required() && s.trim().is_empty() => diagnostics.push(
                    Diagnostic::error(format!("Empty required attribute '{}'", path))
                        .with_attribute(path),
                ),
                Some(s) if field.ip_blocks && !is_ip_block(s) => {
                    diagnostics.push(ip_block_error(path, s))
                },
                Some(_) => {},
                None => diagnostics.push(type_error(path, "string", v)),
            },
            FieldType::Int64 => {
                if v.as_i64().is_none() {
                    diagnostics.push(type_error(path, "int64", v));
                }
            },
            FieldType::Bool => {
                if !v.is_boolean() {
                    diagnostics.push(type_error(path, "bool", v));
                }
            },
            FieldType::StringSet => {
                let Some(items) = v.as_array() else {
                    diagnostics.push(type_error(path, "set", v));
                    return;
                };
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}.{}", path, i);
                    match item.as_str() {
                        Some(s) if field.ip_blocks && !is_ip_block(s) => {
                            diagnostics.push(ip_block_error(&item_path, s))
                        },
                        Some(_) => {},
                        None => diagnostics.push(type_error(&item_path, "string", item)),
                    }
                }
            },
        },
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

fn ip_block_error(path: &str, value: &str) -> Diagnostic {
    Diagnostic::error(format!("Invalid IP block for attribute '{}'", path))
        .with_detail(format!("{:?} is not a valid IP address or CIDR block", value))
        .with_attribute(path)
}
