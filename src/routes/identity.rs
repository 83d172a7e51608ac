//! Identity endpoints
//!
//! Echo the identity the gateway attached to an admitted request. Mounted
//! behind both route guards so clients can check their credentials, admin
//! status and remaining quota.

use axum::{Extension, Json};
use serde::Serialize;

use crate::{error::QuotaDetails, gateway::AuthenticatedIdentity};

/// Identity echo response
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub email: String,
    pub verified: bool,
    pub is_admin: bool,
    pub expires_at: String,
    pub quota: QuotaDetails,
}

/// POST /v1/identity and POST /v1/admin/identity
pub async fn identity(
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Json<IdentityResponse> {
    let expires_at = chrono::DateTime::from_timestamp(identity.claim.exp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| identity.claim.exp.to_string());

    Json(IdentityResponse {
        quota: QuotaDetails::from(&identity.quota),
        email: identity.claim.email,
        verified: identity.claim.verified,
        is_admin: identity.is_admin,
        expires_at,
    })
}
