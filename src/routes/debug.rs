//! Debug endpoints for development
//!
//! These endpoints are only available when GATEWAY_DEBUG=true.
//! They mint tokens for local testing and report non-sensitive settings.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    AppState,
};

/// Token request body
#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub email: String,
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

/// Issued token response
#[derive(Debug, Serialize)]
pub struct IssueTokenResponse {
    pub email: String,
    pub token: String,
}

/// Config response (non-sensitive)
#[derive(Debug, Serialize)]
pub struct ConfigInfo {
    pub ledger_backend: &'static str,
    pub revocation_backend: &'static str,
    pub default_quota_ceiling: i64,
    pub admin_quota_ceiling: i64,
    pub quota_window_seconds: u64,
    pub ledger_timeout_ms: u64,
    pub token_ttl_hours: u64,
    pub require_verified_account: bool,
    pub admin_count: usize,
    pub debug_enabled: bool,
}

/// POST /debug/token - Mint a token for the given email
///
/// The body is parsed only after the debug check, so a disabled endpoint
/// answers 404 whatever the payload.
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<IssueTokenResponse>> {
    ensure_enabled(&state)?;

    let body: IssueTokenRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid token request: {}", e)))?;

    if body.email.trim().is_empty() {
        return Err(AppError::BadRequest("email must not be empty".to_string()));
    }

    let token = state.authority.issue(&body.email, body.verified)?;
    info!(email = %body.email, verified = body.verified, "Issued debug token");

    Ok(Json(IssueTokenResponse {
        email: body.email,
        token,
    }))
}

/// GET /debug/config - Return non-sensitive configuration
pub async fn config_info(State(state): State<Arc<AppState>>) -> AppResult<Json<ConfigInfo>> {
    ensure_enabled(&state)?;

    let config = &state.config;
    let ceilings = state.pipeline.ceilings();

    Ok(Json(ConfigInfo {
        ledger_backend: state.pipeline.ledger().backend(),
        revocation_backend: state.pipeline.validator().revocations().backend(),
        default_quota_ceiling: ceilings.default,
        admin_quota_ceiling: ceilings.admin,
        quota_window_seconds: config.quota_window_seconds,
        ledger_timeout_ms: config.ledger_timeout_ms,
        token_ttl_hours: config.token_ttl_hours,
        require_verified_account: config.require_verified_account,
        admin_count: state.pipeline.admins().admin_count(),
        debug_enabled: config.debug_enabled,
    }))
}

fn ensure_enabled(state: &AppState) -> AppResult<()> {
    if state.config.debug_enabled {
        Ok(())
    } else {
        Err(AppError::NotFound(
            "Debug endpoints are disabled. Set GATEWAY_DEBUG=true to enable.".to_string(),
        ))
    }
}
