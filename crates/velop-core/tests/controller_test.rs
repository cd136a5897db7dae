#![allow(clippy::unwrap_used)]
// Controller lifecycle tests against a mocked JNAP endpoint.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use velop_api::Action;
use velop_core::{LoggingMode, MeshConfig, MeshController, RunState};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer, logging_mode: LoggingMode) -> MeshConfig {
    MeshConfig {
        host: server
            .uri()
            .strip_prefix("http://")
            .expect("mock server is plain http")
            .to_owned(),
        password: SecretString::from("test-password".to_owned()),
        request_timeout: Duration::from_secs(5),
        // No background tasks; connect() is what's under test.
        scan_interval_secs: 0,
        device_trackers: false,
        name: "Test Mesh".to_owned(),
        logging_mode,
        ..MeshConfig::default()
    }
}

fn sub_ok(output: serde_json::Value) -> serde_json::Value {
    json!({ "result": "OK", "output": output })
}

fn sub_err() -> serde_json::Value {
    json!({ "result": "_ErrorUnknownAction" })
}

/// Mount a passing password check and a minimal one-node mesh.
async fn mount_mesh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/JNAP/"))
        .and(header("X-JNAP-Action", Action::CheckAdminPassword.uri()))
        .respond_with(ResponseTemplate::new(200).set_body_json(sub_ok(json!({}))))
        .mount(server)
        .await;

    let devices = sub_ok(json!({
        "devices": [{
            "deviceID": "uuid-primary",
            "unit": { "serialNumber": "SER1" },
            "nodeType": "Master",
            "friendlyName": "Gateway",
            "connections": [
                { "macAddress": "AA:00:00:00:00:01", "ipAddress": "192.168.1.1" }
            ]
        }],
        "revision": 1
    }));
    let txn = json!({
        "result": "OK",
        "responses": [
            devices, sub_err(), sub_err(), sub_err(), sub_err(), sub_err(), sub_err()
        ]
    });
    Mock::given(method("POST"))
        .and(path("/JNAP/"))
        .and(header("X-JNAP-Action", Action::Transaction.uri()))
        .respond_with(ResponseTemplate::new(200).set_body_json(txn))
        .mount(server)
        .await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_publishes_and_marks_running() {
    let server = MockServer::start().await;
    mount_mesh(&server).await;

    let ctrl = MeshController::new(config(&server, LoggingMode::Off));
    let mut events = ctrl.events();

    ctrl.connect().await.expect("connect succeeds");

    assert_eq!(*ctrl.run_state().borrow(), RunState::Running);
    let snapshot = ctrl.snapshot().expect("initial cycle published");
    assert_eq!(snapshot.nodes.len(), 1);
    assert_eq!(snapshot.nodes[0].serial, "SER1");

    // Off mode: nothing fires on connect.
    assert!(events.try_recv().is_err());

    ctrl.disconnect().await;
    assert_eq!(*ctrl.run_state().borrow(), RunState::Stopping);
}

#[tokio::test]
async fn single_poll_mode_fires_the_logging_stopped_event() {
    let server = MockServer::start().await;
    mount_mesh(&server).await;

    let ctrl = MeshController::new(config(&server, LoggingMode::SinglePoll));
    let mut events = ctrl.events();

    ctrl.connect().await.expect("connect succeeds");

    let event = events.try_recv().expect("one event after the first poll");
    assert_eq!(event.name(), "velop_logging_stopped");
    let payload = serde_json::to_value(event.as_ref()).expect("payload serializes");
    assert_eq!(payload["data"]["name"], "Test Mesh");

    // The revert event is one-shot.
    assert!(events.try_recv().is_err());

    ctrl.disconnect().await;
}

#[tokio::test]
async fn rejected_password_aborts_connect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/JNAP/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": "_ErrorUnauthorized" })),
        )
        .mount(&server)
        .await;

    let ctrl = MeshController::new(config(&server, LoggingMode::Off));
    let err = ctrl.connect().await.expect_err("auth should fail");
    assert!(matches!(err, velop_core::CoreError::AuthenticationFailed { .. }));
    assert!(ctrl.snapshot().is_none());

    // A failed connect leaves no usable session behind.
    assert!(ctrl.refresh().await.is_err());
}