//! Common test utilities for the gateway
//!
//! This module provides shared fixtures and helper functions used across the
//! integration tests: configuration, token minting and app construction.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{routing::post, Extension, Json, Router};
use axum_test::TestServer;
use serde_json::{json, Value};

use ishkul_gateway::{
    gateway::AuthenticatedIdentity, ledger::QuotaLedger, routes, AppState, Config,
    InMemoryRevocationList, JwtAuthority, RevocationList, RouteGuard, TokenAuthority,
};

/// Test configuration constants
pub mod constants {
    /// Signing secret shared by the app and the test token minter
    pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
    /// Registered admin
    pub const ADMIN_EMAIL: &str = "mesbah.tanvir.cs@gmail.com";
    /// Regular user
    pub const USER_EMAIL: &str = "user@example.com";
    /// Host-application route mounted behind the admin guard
    pub const DOCUMENTS_PATH: &str = "/documents";
}

/// Config with test secret and in-memory ledger, plus `overrides`
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let overrides: Vec<(String, String)> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Config::from_lookup(move |key| {
        if let Some((_, v)) = overrides.iter().find(|(k, _)| k == key) {
            return Some(v.clone());
        }
        match key {
            "JWT_SECRET" => Some(constants::TEST_JWT_SECRET.to_string()),
            "LEDGER_BACKEND" => Some("memory".to_string()),
            _ => None,
        }
    })
    .expect("test config must be valid")
}

/// Token signer matching the app's secret
pub fn authority() -> JwtAuthority {
    JwtAuthority::new(constants::TEST_JWT_SECRET, 24)
}

/// Signed token for `email`
pub fn token_for(email: &str, verified: bool) -> String {
    authority()
        .issue(email, verified)
        .expect("token issuance must succeed")
}

/// Request body carrying credentials
pub fn envelope(email: &str, token: &str) -> Value {
    json!({ "email": email, "token": token })
}

/// Request body with a fresh verified token for `email`
pub fn verified_envelope(email: &str) -> Value {
    envelope(email, &token_for(email, true))
}

/// Handler standing in for business logic: echoes identity and raw body
async fn echo_document(
    Extension(identity): Extension<AuthenticatedIdentity>,
    body: String,
) -> Json<Value> {
    Json(json!({
        "email": identity.claim.email,
        "is_admin": identity.is_admin,
        "remaining": identity.quota.remaining,
        "body": body,
    }))
}

/// A running app under test
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub revocations: Arc<dyn RevocationList>,
}

/// Build the full router plus an admin-guarded `/documents` route
pub fn spawn_app(config: Config, ledger: Arc<dyn QuotaLedger>) -> TestApp {
    spawn_app_with_revocations(config, ledger, Arc::new(InMemoryRevocationList::new()))
}

/// [`spawn_app`] with a caller-supplied revocation list
pub fn spawn_app_with_revocations(
    config: Config,
    ledger: Arc<dyn QuotaLedger>,
    revocations: Arc<dyn RevocationList>,
) -> TestApp {
    let authority: Arc<dyn TokenAuthority> =
        Arc::new(JwtAuthority::new(&config.jwt_secret, config.token_ttl_hours));
    let state = Arc::new(AppState::from_parts(
        config,
        authority,
        ledger,
        revocations.clone(),
    ));

    let documents = routes::guard(
        Router::new().route(constants::DOCUMENTS_PATH, post(echo_document)),
        state.gate(RouteGuard::AdminOnly),
    );

    let app = routes::create_router(state.clone()).merge(documents);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        revocations,
    }
}
