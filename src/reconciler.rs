//! The CRUD reconciler.
//!
//! A [`Reconciler`] drives one [`Instance`] of a [`Resource`] through its
//! lifecycle against a [`RemoteClient`]:
//!
//! ```text
//! Absent -> Creating -> Present -> Deleting -> Absent
//!                       Present -> Updating -> Present
//! ```
//!
//! Each operation issues exactly one remote call. Validation always runs
//! before the call, so invalid input never reaches the network. Errors are
//! returned to the caller with the operation and endpoint attached; nothing is
//! retried here.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ovh_iplb_provider::{HttpClient, Instance, ProviderConfig, Reconciler};
//! use ovh_iplb_provider::resources::TcpFrontend;
//!
//! let client = HttpClient::new(&ProviderConfig::new("ovh-eu"))?;
//! let reconciler = Reconciler::new(Arc::new(client));
//!
//! let mut frontend = Instance::new(TcpFrontend::new("loadbalancer-1", "80", "all"));
//! let id = reconciler.create(&mut frontend).await?;
//!
//! frontend.config_mut().port = "8080".to_string();
//! reconciler.update(&mut frontend).await?;
//!
//! if !reconciler.read(&mut frontend).await? {
//!     frontend.forget();
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, Span};

use crate::client::RemoteClient;
use crate::error::{Error, Result};
use crate::schema::Schema;

/// Identity assigned by the remote system when a resource is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as it appears in resource paths.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ResourceId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Reconciler operation, used for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// POST to the collection endpoint.
    Create,
    /// GET of the per-resource endpoint.
    Read,
    /// PUT to the per-resource endpoint.
    Update,
    /// DELETE of the per-resource endpoint.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Lifecycle phase of an [`Instance`].
///
/// The transitional phases are only observable while an operation is in
/// flight, or after its future was dropped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No remote resource is tracked.
    Absent,
    /// A create call is in flight.
    Creating,
    /// The remote resource exists and its identity is known.
    Present,
    /// An update call is in flight.
    Updating,
    /// A delete call is in flight.
    Deleting,
}

/// What [`Reconciler::delete`] does when the remote answers `404`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeletePolicy {
    /// The resource is already gone, which is what delete wanted: succeed.
    #[default]
    TolerateMissing,
    /// Surface the `404` as an error and keep the identity.
    Strict,
}

/// A resource kind the reconciler can manage.
///
/// Implementors are the typed desired-configuration record of one kind. They
/// know how to validate themselves, how to build the wire payload, and how to
/// absorb a payload returned by the remote.
pub trait Resource: Send + Sync {
    /// Wire representation, serialized for create/update and decoded from
    /// create/read responses.
    type Payload: Serialize + DeserializeOwned + Send;

    /// Resource type name, e.g. `ovh_iploadbalancing_tcp_frontend`.
    const TYPE_NAME: &'static str;

    /// Static field table of this kind.
    fn schema() -> Schema;

    /// Collection endpoint, used for create.
    fn collection_path(&self) -> String;

    /// Per-resource endpoint, used for read, update and delete.
    fn resource_path(&self, id: &ResourceId) -> String {
        format!("{}/{}", self.collection_path(), id)
    }

    /// Check the configuration before anything is sent.
    fn validate(&self) -> Result<()>;

    /// Build the full payload from the configuration.
    fn to_payload(&self) -> Self::Payload;

    /// Identity carried by a response payload.
    fn identity(payload: &Self::Payload) -> Option<ResourceId>;

    /// Overwrite local fields with the ones present in `payload`.
    ///
    /// Fields the remote left out must keep their current value.
    fn absorb(&mut self, payload: Self::Payload);
}

/// The local record of one managed resource: its configuration, its remote
/// identity and its lifecycle phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance<R> {
    config: R,
    id: Option<ResourceId>,
    phase: Phase,
}

impl<R: Resource> Instance<R> {
    /// A not-yet-created resource.
    pub fn new(config: R) -> Self {
        Self {
            config,
            id: None,
            phase: Phase::Absent,
        }
    }

    /// A resource that already exists remotely under `id`.
    pub fn existing(config: R, id: ResourceId) -> Self {
        Self {
            config,
            id: Some(id),
            phase: Phase::Present,
        }
    }

    /// The configuration record.
    pub fn config(&self) -> &R {
        &self.config
    }

    /// Mutable access to the configuration record, to change desired values
    /// before an update.
    pub fn config_mut(&mut self) -> &mut R {
        &mut self.config
    }

    /// Remote identity, present iff the resource exists.
    pub fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Per-resource endpoint, if the identity is known.
    pub fn resource_path(&self) -> Option<String> {
        self.id.as_ref().map(|id| self.config.resource_path(id))
    }

    /// Drop the identity after a read reported the resource gone.
    pub fn forget(&mut self) {
        self.id = None;
        self.phase = Phase::Absent;
    }

    /// Consume the instance, returning the configuration.
    pub fn into_config(self) -> R {
        self.config
    }

    fn require_id(&self, operation: Operation) -> Result<ResourceId> {
        self.id.clone().ok_or_else(|| {
            Error::FailedPrecondition(format!(
                "cannot {} {}: resource has no identity",
                operation,
                R::TYPE_NAME
            ))
        })
    }
}

/// Drives create/read/update/delete against a remote client.
#[derive(Clone)]
pub struct Reconciler {
    client: Arc<dyn RemoteClient>,
    delete_policy: DeletePolicy,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("delete_policy", &self.delete_policy)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler using `client` for every remote call.
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            client,
            delete_policy: DeletePolicy::default(),
        }
    }

    /// Choose how delete treats a resource that is already gone.
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// The active delete policy.
    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Create the remote resource and adopt its identity.
    ///
    /// On any failure the instance stays [`Phase::Absent`] with no identity.
    #[instrument(level = "debug", skip_all, fields(resource = R::TYPE_NAME, id = tracing::field::Empty))]
    pub async fn create<R: Resource>(&self, instance: &mut Instance<R>) -> Result<ResourceId> {
        if let Some(id) = &instance.id {
            return Err(Error::FailedPrecondition(format!(
                "cannot create {}: already exists with id {}",
                R::TYPE_NAME,
                id
            )));
        }

        instance.config.validate()?;
        let endpoint = instance.config.collection_path();
        let body = serde_json::to_value(instance.config.to_payload())?;

        instance.phase = Phase::Creating;
        let (id, payload) = match self.post_new::<R>(&endpoint, &body).await {
            Ok(created) => created,
            Err(err) => {
                instance.phase = Phase::Absent;
                return Err(err);
            },
        };

        Span::current().record("id", id.as_str());
        debug!(%endpoint, "created");

        instance.config.absorb(payload);
        instance.id = Some(id.clone());
        instance.phase = Phase::Present;
        Ok(id)
    }

    /// Refresh the local configuration from the remote resource.
    ///
    /// Returns `Ok(false)` when the remote answers `404`: the resource was
    /// deleted out of band. The identity is left in place for the caller to
    /// [`Instance::forget`].
    #[instrument(level = "debug", skip_all, fields(resource = R::TYPE_NAME, id = tracing::field::Empty))]
    pub async fn read<R: Resource>(&self, instance: &mut Instance<R>) -> Result<bool> {
        let id = instance.require_id(Operation::Read)?;
        Span::current().record("id", id.as_str());
        let endpoint = instance.config.resource_path(&id);

        let response = match self.client.get(&endpoint).await {
            Ok(response) => response,
            Err(source) if source.is_not_found() => {
                debug!(%endpoint, "resource not found");
                return Ok(false);
            },
            Err(source) => {
                return Err(Error::Remote {
                    operation: Operation::Read,
                    source,
                })
            },
        };

        let payload: R::Payload = decode(&endpoint, response)?;
        if let Some(remote_id) = R::identity(&payload) {
            instance.id = Some(remote_id);
        }
        instance.config.absorb(payload);
        debug!(%endpoint, "read");
        Ok(true)
    }

    /// Send the full desired configuration to the remote resource.
    ///
    /// Nothing is read back: the local configuration already holds the
    /// desired values. On failure the local configuration is left as is.
    #[instrument(level = "debug", skip_all, fields(resource = R::TYPE_NAME, id = tracing::field::Empty))]
    pub async fn update<R: Resource>(&self, instance: &mut Instance<R>) -> Result<()> {
        let id = instance.require_id(Operation::Update)?;
        Span::current().record("id", id.as_str());

        instance.config.validate()?;
        let endpoint = instance.config.resource_path(&id);
        let body = serde_json::to_value(instance.config.to_payload())?;

        instance.phase = Phase::Updating;
        let result = self.client.put(&endpoint, &body).await;
        instance.phase = Phase::Present;

        result.map_err(|source| Error::Remote {
            operation: Operation::Update,
            source,
        })?;
        debug!(%endpoint, "updated");
        Ok(())
    }

    /// Delete the remote resource and clear the identity.
    ///
    /// A `404` counts as success under [`DeletePolicy::TolerateMissing`]. On
    /// failure the identity is kept so the caller can retry.
    #[instrument(level = "debug", skip_all, fields(resource = R::TYPE_NAME, id = tracing::field::Empty))]
    pub async fn delete<R: Resource>(&self, instance: &mut Instance<R>) -> Result<()> {
        let id = instance.require_id(Operation::Delete)?;
        Span::current().record("id", id.as_str());
        let endpoint = instance.config.resource_path(&id);

        instance.phase = Phase::Deleting;
        match self.client.delete(&endpoint).await {
            Ok(_) => {
                debug!(%endpoint, "deleted");
            },
            Err(source)
                if source.is_not_found() && self.delete_policy == DeletePolicy::TolerateMissing =>
            {
                debug!(%endpoint, "resource already gone");
            },
            Err(source) => {
                instance.phase = Phase::Present;
                return Err(Error::Remote {
                    operation: Operation::Delete,
                    source,
                });
            },
        }

        instance.forget();
        Ok(())
    }

    async fn post_new<R: Resource>(
        &self,
        endpoint: &str,
        body: &Value,
    ) -> Result<(ResourceId, R::Payload)> {
        let response = self
            .client
            .post(endpoint, body)
            .await
            .map_err(|source| Error::Remote {
                operation: Operation::Create,
                source,
            })?;

        let payload: R::Payload = decode(endpoint, response)?;
        let id = R::identity(&payload).ok_or_else(|| Error::MissingIdentity {
            endpoint: endpoint.to_string(),
        })?;
        Ok((id, payload))
    }
}

fn decode<P: DeserializeOwned>(endpoint: &str, value: Value) -> Result<P> {
    serde_json::from_value(value).map_err(|source| Error::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}
