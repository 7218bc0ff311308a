//! OVH IP Load Balancing provider core
//!
//! This crate provides a small generic CRUD-resource engine and the OVH IP
//! load-balancing TCP frontend resource built on it. It follows the resource
//! model of Terraform providers: a typed desired configuration is pushed to a
//! remote REST API and the remote state is read back into it.
//!
//! # Overview
//!
//! - **Remote client**: the [`RemoteClient`] trait (GET/POST/PUT/DELETE with
//!   JSON bodies) and its `reqwest` implementation [`HttpClient`]
//! - **Reconciler**: [`Reconciler`] runs create/read/update/delete for an
//!   [`Instance`] of any [`Resource`]
//! - **Field helpers**: [`Attr`] keeps "never set" apart from "set to
//!   `false`/`0`", so unset optional fields are left out of payloads
//! - **Schemas**: static field tables with per-field [`FieldKind`]
//! - **Validation**: IP/CIDR checks before any network call, and JSON
//!   configuration checks reported as diagnostics
//! - **Logging**: integration with `tracing`
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ovh_iplb_provider::{HttpClient, Instance, ProviderConfig, Reconciler};
//! use ovh_iplb_provider::resources::TcpFrontend;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     ovh_iplb_provider::init_logging();
//!
//!     let config = ProviderConfig::from_value(&json!({"endpoint": "ovh-eu"}))?;
//!     let reconciler = Reconciler::new(Arc::new(HttpClient::new(&config)?));
//!
//!     let desired = TcpFrontend::from_config(&json!({
//!         "service_name": "loadbalancer-1",
//!         "port": "80",
//!         "zone": "all",
//!         "allowed_source": ["203.0.113.0/24"]
//!     }))?;
//!
//!     let mut frontend = Instance::new(desired);
//!     let id = reconciler.create(&mut frontend).await?;
//!     tracing::info!(%id, "frontend created");
//!     Ok(())
//! }
//! ```
//!
//! # Delete semantics
//!
//! Deleting a resource that is already gone succeeds by default
//! ([`DeletePolicy::TolerateMissing`]). Use [`DeletePolicy::Strict`] to get
//! the `404` back as an error instead.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod logging;
pub mod reconciler;
pub mod resources;
pub mod schema;
pub mod testing;
pub mod validation;

// Re-export main types at crate root
pub use client::{HttpClient, RemoteClient, RemoteError, Verb};
pub use config::ProviderConfig;
pub use error::{Error, Result};
pub use field::Attr;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use reconciler::{DeletePolicy, Instance, Operation, Phase, Reconciler, Resource, ResourceId};
pub use schema::{Diagnostic, Field, FieldKind, FieldType, Schema};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for RemoteClient implementors
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
