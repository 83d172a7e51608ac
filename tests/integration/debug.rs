//! Debug endpoint tests

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{constants::USER_EMAIL, envelope, spawn_app, test_config};
use crate::mocks::CountingLedger;

#[tokio::test]
async fn test_debug_disabled_by_default() {
    let app = spawn_app(test_config(&[]), Arc::new(CountingLedger::new(3600)));

    let token = app
        .server
        .post("/debug/token")
        .json(&json!({ "email": USER_EMAIL }))
        .await;
    token.assert_status(StatusCode::NOT_FOUND);

    let config = app.server.get("/debug/config").await;
    config.assert_status(StatusCode::NOT_FOUND);
    let json: Value = config.json();
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_disabled_debug_hides_endpoint_from_bad_payloads() {
    let app = spawn_app(test_config(&[]), Arc::new(CountingLedger::new(3600)));

    for body in ["not json", "{\"verified\":true}", ""] {
        let response = app
            .server
            .post("/debug/token")
            .text(body)
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_enabled_debug_rejects_bad_payload() {
    let app = spawn_app(
        test_config(&[("GATEWAY_DEBUG", "true")]),
        Arc::new(CountingLedger::new(3600)),
    );

    let response = app
        .server
        .post("/debug/token")
        .text("{\"verified\":true}")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_issued_token_passes_gateway() {
    let app = spawn_app(
        test_config(&[("GATEWAY_DEBUG", "true")]),
        Arc::new(CountingLedger::new(3600)),
    );

    let issued = app
        .server
        .post("/debug/token")
        .json(&json!({ "email": USER_EMAIL }))
        .await;
    issued.assert_status_ok();
    let issued: Value = issued.json();
    let token = issued["token"].as_str().unwrap();

    let response = app
        .server
        .post("/v1/identity")
        .json(&envelope(USER_EMAIL, token))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["email"], USER_EMAIL);
}

#[tokio::test]
async fn test_blank_email_rejected() {
    let app = spawn_app(
        test_config(&[("GATEWAY_DEBUG", "true")]),
        Arc::new(CountingLedger::new(3600)),
    );

    let response = app
        .server
        .post("/debug/token")
        .json(&json!({ "email": " " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_config_hides_secret() {
    let app = spawn_app(
        test_config(&[("GATEWAY_DEBUG", "true")]),
        Arc::new(CountingLedger::new(3600)),
    );

    let response = app.server.get("/debug/config").await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["ledger_backend"], "counting");
    assert_eq!(json["revocation_backend"], "memory");
    assert_eq!(json["quota_window_seconds"], 86_400);
    assert_eq!(json["require_verified_account"], true);
    assert!(json.get("jwt_secret").is_none());
}
