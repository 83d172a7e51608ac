//! Admin-gated route tests

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{
    constants::{ADMIN_EMAIL, DOCUMENTS_PATH, USER_EMAIL},
    envelope, spawn_app, test_config, token_for, verified_envelope,
};
use crate::mocks::CountingLedger;

#[tokio::test]
async fn test_admin_reaches_documents_with_elevated_quota() {
    let ledger = Arc::new(CountingLedger::new(3600));
    let app = spawn_app(test_config(&[]), ledger.clone());

    let mut body = verified_envelope(ADMIN_EMAIL);
    body["title"] = json!("Syllabus");

    let response = app.server.post(DOCUMENTS_PATH).json(&body).await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["email"], ADMIN_EMAIL);
    assert_eq!(json["is_admin"], true);
    assert_eq!(json["remaining"], 99_999);

    // Handler sees the same body the client sent
    let echoed: Value = serde_json::from_str(json["body"].as_str().unwrap()).unwrap();
    assert_eq!(echoed["title"], "Syllabus");
    assert_eq!(echoed["email"], ADMIN_EMAIL);

    assert_eq!(
        response.headers().get("x-ratelimit-limit").unwrap(),
        "100000"
    );
    assert_eq!(ledger.calls(), 1);
}

#[tokio::test]
async fn test_admin_identity_route() {
    let app = spawn_app(test_config(&[]), Arc::new(CountingLedger::new(3600)));

    let response = app
        .server
        .post("/v1/admin/identity")
        .json(&verified_envelope(ADMIN_EMAIL))
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    assert_eq!(json["is_admin"], true);
    assert_eq!(json["quota"]["limit"], 100_000);
}

#[tokio::test]
async fn test_non_admin_rejected_without_counting() {
    let ledger = Arc::new(CountingLedger::new(3600));
    let app = spawn_app(test_config(&[]), ledger.clone());

    let response = app
        .server
        .post(DOCUMENTS_PATH)
        .json(&verified_envelope(USER_EMAIL))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "NOT_AUTHORIZED");
    assert_eq!(json["error"]["kind"], "FORBIDDEN");
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_claiming_admin_email_with_user_token_fails() {
    let ledger = Arc::new(CountingLedger::new(3600));
    let app = spawn_app(test_config(&[]), ledger.clone());

    let response = app
        .server
        .post(DOCUMENTS_PATH)
        .json(&envelope(ADMIN_EMAIL, &token_for(USER_EMAIL, true)))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "INVALID_CREDENTIAL");
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_unverified_admin_rejected() {
    let ledger = Arc::new(CountingLedger::new(3600));
    let app = spawn_app(
        test_config(&[("REQUIRE_VERIFIED_ACCOUNT", "false")]),
        ledger.clone(),
    );

    let response = app
        .server
        .post(DOCUMENTS_PATH)
        .json(&envelope(ADMIN_EMAIL, &token_for(ADMIN_EMAIL, false)))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "UNVERIFIED");
    assert_eq!(json["error"]["message"], "Verify your account first");
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_unverified_admin_rejected_at_credential_stage_by_default() {
    let ledger = Arc::new(CountingLedger::new(3600));
    let app = spawn_app(test_config(&[]), ledger.clone());

    let response = app
        .server
        .post(DOCUMENTS_PATH)
        .json(&envelope(ADMIN_EMAIL, &token_for(ADMIN_EMAIL, false)))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let json: Value = response.json();
    assert_eq!(json["error"]["code"], "INVALID_CREDENTIAL");
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_configured_admin_list() {
    let app = spawn_app(
        test_config(&[("ADMIN_EMAILS", "faculty@ishkul.org, principal@ishkul.org")]),
        Arc::new(CountingLedger::new(3600)),
    );

    let faculty = app
        .server
        .post(DOCUMENTS_PATH)
        .json(&verified_envelope("faculty@ishkul.org"))
        .await;
    faculty.assert_status_ok();

    // The built-in admin is replaced, not extended
    let former = app
        .server
        .post(DOCUMENTS_PATH)
        .json(&verified_envelope(ADMIN_EMAIL))
        .await;
    former.assert_status(StatusCode::FORBIDDEN);
}
