//! Token revocation endpoints
//!
//! Both run behind the gateway, so the caller has already proven their own
//! credential (and, for the admin route, their admin status).

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    auth::{token_digest, RevocationReason},
    error::{AppError, AppResult},
    gateway::AuthenticatedIdentity,
    AppState,
};

/// Admin revocation request; sent alongside the admin's own credentials
#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub target_token: String,
    #[serde(default)]
    pub reason: Option<RevocationReason>,
}

/// Revocation result
#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
    pub email: String,
    pub reason: RevocationReason,
    pub expires_at: String,
}

impl RevokeResponse {
    fn new(email: String, reason: RevocationReason, exp: i64) -> Self {
        Self {
            revoked: true,
            email,
            reason,
            expires_at: chrono::DateTime::from_timestamp(exp, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| exp.to_string()),
        }
    }
}

/// POST /v1/logout - Revoke the token that authenticated this request
///
/// A revocation that cannot be recorded is an error, not a silent success.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> AppResult<Json<RevokeResponse>> {
    let reason = RevocationReason::Logout;
    state
        .pipeline
        .validator()
        .revocations()
        .revoke(&identity.token_digest, reason, identity.claim.exp)
        .await?;

    info!(email = %identity.claim.email, "Logged out");

    Ok(Json(RevokeResponse::new(
        identity.claim.email,
        reason,
        identity.claim.exp,
    )))
}

/// POST /v1/admin/revoke - Revoke another caller's token
///
/// The target must still decode; expired or forged tokens are a bad request
/// since there is nothing left to revoke.
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthenticatedIdentity>,
    Json(body): Json<RevokeRequest>,
) -> AppResult<Json<RevokeResponse>> {
    let validator = state.pipeline.validator();
    let target = validator
        .authority()
        .decode(&body.target_token)
        .map_err(|e| AppError::BadRequest(format!("target token cannot be revoked: {}", e)))?;

    let reason = body.reason.unwrap_or(RevocationReason::SecurityConcern);
    validator
        .revocations()
        .revoke(&token_digest(&body.target_token), reason, target.exp)
        .await?;

    info!(
        admin = %admin.claim.email,
        target = %target.email,
        reason = reason.as_str(),
        "Token revoked by admin"
    );

    Ok(Json(RevokeResponse::new(target.email, reason, target.exp)))
}
