//! Reconciler behaviour for the TCP frontend resource, against a stub client.

use std::sync::Arc;

use ovh_iplb_provider::resources::TcpFrontend;
use ovh_iplb_provider::testing::{assert_key_absent, StubClient};
use ovh_iplb_provider::{Attr, Error, Instance, Operation, Phase, Reconciler, ResourceId, Verb};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

const COLLECTION: &str = "/ipLoadbalancing/loadbalancer-1/tcp/frontend";

fn setup() -> (Arc<StubClient>, Reconciler) {
    let stub = Arc::new(StubClient::new());
    let reconciler = Reconciler::new(stub.clone());
    (stub, reconciler)
}

fn desired() -> TcpFrontend {
    TcpFrontend {
        allowed_source: ["1.2.3.0/24".to_string()].into(),
        ssl: Attr::Set(false),
        ..TcpFrontend::new("loadbalancer-1", "80", "rbx")
    }
}

fn remote_body(id: i64) -> Value {
    json!({
        "frontendId": id,
        "port": "80",
        "zone": "rbx",
        "allowedSource": ["1.2.3.0/24"],
        "dedicatedIpfo": [],
        "defaultFarmId": 7,
        "defaultSslId": null,
        "disabled": false,
        "ssl": false,
        "displayName": null
    })
}

async fn created(stub: &StubClient, reconciler: &Reconciler) -> Instance<TcpFrontend> {
    stub.push_ok(remote_body(42));
    let mut instance = Instance::new(desired());
    reconciler.create(&mut instance).await.unwrap();
    instance
}

#[tokio::test]
async fn create_sends_only_configured_fields() {
    let (stub, reconciler) = setup();
    stub.push_ok(remote_body(42));

    let mut instance = Instance::new(desired());
    let id = assert_ok!(reconciler.create(&mut instance).await);
    assert_eq!(id, ResourceId::new("42"));

    let call = stub.last_call().unwrap();
    assert_eq!(call.verb, Verb::Post);
    assert_eq!(call.path, COLLECTION);

    let body = call.body.unwrap();
    assert_eq!(
        body,
        json!({"port": "80", "zone": "rbx", "allowedSource": ["1.2.3.0/24"], "ssl": false})
    );
    assert_key_absent(&body, "disabled");
    assert_key_absent(&body, "defaultFarmId");
    assert_key_absent(&body, "defaultSslId");
}

#[tokio::test]
async fn create_reads_back_computed_defaults() {
    let (stub, reconciler) = setup();
    let instance = created(&stub, &reconciler).await;

    let config = instance.config();
    assert_eq!(instance.phase(), Phase::Present);
    assert_eq!(config.default_farm_id, Attr::Computed(7));
    assert_eq!(config.default_ssl_id, Attr::Unset);
    assert_eq!(config.disabled, Attr::Computed(false));
    assert_eq!(config.ssl, Attr::Set(false));
    assert!(config.dedicated_ipfo.is_empty());
}

#[tokio::test]
async fn read_after_create_does_not_drift() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;
    let after_create = instance.clone();

    stub.push_ok(remote_body(42));
    assert!(assert_ok!(reconciler.read(&mut instance).await));

    assert_eq!(instance, after_create);
    assert_eq!(
        stub.last_call().unwrap().path,
        format!("{}/42", COLLECTION)
    );
}

#[tokio::test]
async fn read_detects_out_of_band_changes() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;

    let mut changed = remote_body(42);
    changed["allowedSource"] = json!(["10.0.0.0/8", "1.2.3.0/24"]);
    changed["displayName"] = json!("edited in the console");
    stub.push_ok(changed);

    assert!(assert_ok!(reconciler.read(&mut instance).await));
    let config = instance.config();
    assert_eq!(config.allowed_source.len(), 2);
    assert_eq!(config.display_name, "edited in the console");
}

#[tokio::test]
async fn invalid_address_never_reaches_the_network() {
    let (stub, reconciler) = setup();

    let mut bad = Instance::new(TcpFrontend {
        allowed_source: ["999.999.999.999".to_string()].into(),
        ..desired()
    });
    let err = assert_err!(reconciler.create(&mut bad).await);
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "allowed_source"));
    assert_eq!(stub.call_count(), 0);
    assert!(bad.id().is_none());

    let mut instance = created(&stub, &reconciler).await;
    instance
        .config_mut()
        .dedicated_ipfo
        .insert("999.999.999.999".to_string());
    let err = assert_err!(reconciler.update(&mut instance).await);
    assert!(matches!(err, Error::Validation { ref field, .. } if field == "dedicated_ipfo"));
    assert!(stub.calls_with(Verb::Put).is_empty());
}

#[tokio::test]
async fn update_keeps_identity_and_resends_everything() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;

    instance.config_mut().port = "443".to_string();
    instance.config_mut().default_ssl_id = Attr::Set(0);
    assert_ok!(reconciler.update(&mut instance).await);

    let put = stub.last_call().unwrap();
    assert_eq!(put.verb, Verb::Put);
    assert_eq!(put.path, format!("{}/42", COLLECTION));
    assert_eq!(instance.id(), Some(&ResourceId::new("42")));

    let body = put.body.unwrap();
    assert_eq!(body["port"], json!("443"));
    assert_eq!(body["zone"], json!("rbx"));
    assert_eq!(body["defaultSslId"], json!(0));
    assert_eq!(body["ssl"], json!(false));
    // Read back from the remote, never configured: left to the remote.
    assert_key_absent(&body, "defaultFarmId");
    assert_key_absent(&body, "disabled");
}

#[tokio::test]
async fn repeated_update_sends_identical_bodies() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;

    assert_ok!(reconciler.update(&mut instance).await);
    assert_ok!(reconciler.update(&mut instance).await);

    let puts = stub.calls_with(Verb::Put);
    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].path, puts[1].path);
    assert_eq!(puts[0].body_bytes(), puts[1].body_bytes());
}

#[tokio::test]
async fn failed_update_keeps_desired_values() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;

    instance.config_mut().zone = "gra".to_string();
    stub.push_status(400, "Invalid zone");
    let err = assert_err!(reconciler.update(&mut instance).await);

    assert_eq!(err.status(), Some(400));
    assert!(err.to_string().contains("Invalid zone"));
    assert_eq!(instance.config().zone, "gra");
    assert_eq!(instance.phase(), Phase::Present);
}

#[tokio::test]
async fn read_distinguishes_not_found_from_failure() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;

    stub.push_status(404, "This frontend does not exist");
    assert!(!assert_ok!(reconciler.read(&mut instance).await));

    stub.push_status(500, "Internal server error");
    let err = assert_err!(reconciler.read(&mut instance).await);
    assert!(matches!(
        err,
        Error::Remote {
            operation: Operation::Read,
            ..
        }
    ));
    assert!(!err.is_not_found());

    // Drift: the caller drops the identity.
    instance.forget();
    assert_eq!(instance.phase(), Phase::Absent);
    assert!(instance.id().is_none());
}

#[tokio::test]
async fn delete_clears_identity_and_tolerates_missing() {
    let (stub, reconciler) = setup();
    let mut instance = created(&stub, &reconciler).await;

    assert_ok!(reconciler.delete(&mut instance).await);
    assert!(instance.id().is_none());
    let call = stub.last_call().unwrap();
    assert_eq!(call.verb, Verb::Delete);
    assert_eq!(call.path, format!("{}/42", COLLECTION));

    let mut instance = created(&stub, &reconciler).await;
    stub.push_status(404, "gone");
    assert_ok!(reconciler.delete(&mut instance).await);
    assert_eq!(instance.phase(), Phase::Absent);
}

#[tokio::test]
async fn create_from_json_configuration() {
    let (stub, reconciler) = setup();
    let config = TcpFrontend::from_config(&json!({
        "service_name": "loadbalancer-1",
        "port": "80",
        "zone": "rbx",
        "allowed_source": ["1.2.3.0/24"],
        "ssl": false
    }))
    .unwrap();
    assert_eq!(config, desired());

    stub.push_ok(remote_body(42));
    let mut instance = Instance::new(config);
    assert_ok!(reconciler.create(&mut instance).await);

    let state = instance.config().state(instance.id()).unwrap();
    assert_eq!(state["id"], json!("42"));
    assert_eq!(state["default_farm_id"], json!(7));
    assert_eq!(state["allowed_source"], json!(["1.2.3.0/24"]));
}
