//! Error types for the gateway
//!
//! This module defines the rejection taxonomy of the gateway pipeline and the
//! application-level error that maps it onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::{IssueError, RevocationError};
use crate::ledger::QuotaOutcome;

/// Coarse rejection class the HTTP layer maps to a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    BadRequest,
    Forbidden,
    RateLimited,
}

impl RejectionKind {
    pub fn status(self) -> StatusCode {
        match self {
            RejectionKind::BadRequest => StatusCode::BAD_REQUEST,
            RejectionKind::Forbidden => StatusCode::FORBIDDEN,
            RejectionKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

/// Terminal rejections produced by the gateway pipeline
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid credentials provided")]
    InvalidCredential,

    /// Admin route reached with an unverified claim. Only reachable when
    /// `REQUIRE_VERIFIED_ACCOUNT=false`; otherwise the credential stage
    /// already rejects unverified accounts with `InvalidCredential`.
    #[error("Verify your account first")]
    Unverified,

    #[error("Only admins can access this resource")]
    NotAuthorized,

    #[error("Request quota exceeded for this endpoint")]
    QuotaExceeded(QuotaOutcome),

    /// The detail is for logs only; clients see the generic message
    #[error("Request quota could not be verified")]
    LedgerUnavailable(String),
}

impl GatewayError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            GatewayError::MalformedRequest(_) => RejectionKind::BadRequest,
            GatewayError::InvalidCredential
            | GatewayError::Unverified
            | GatewayError::NotAuthorized => RejectionKind::Forbidden,
            GatewayError::QuotaExceeded(_) | GatewayError::LedgerUnavailable(_) => {
                RejectionKind::RateLimited
            }
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MalformedRequest(_) => "MALFORMED_REQUEST",
            GatewayError::InvalidCredential => "INVALID_CREDENTIAL",
            GatewayError::Unverified => "UNVERIFIED",
            GatewayError::NotAuthorized => "NOT_AUTHORIZED",
            GatewayError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            GatewayError::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
        }
    }
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token error: {0}")]
    Token(#[from] IssueError),

    /// The detail is for logs only; clients see the generic message
    #[error("Revocation list unavailable: {0}")]
    Revocation(#[from] RevocationError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RejectionKind>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<QuotaDetails>,
}

/// Quota state reported with rejections and identity responses
#[derive(Debug, Serialize)]
pub struct QuotaDetails {
    pub limit: i64,
    pub used: i64,
    pub remaining: i64,
    pub reset_at: String,
}

impl From<&QuotaOutcome> for QuotaDetails {
    fn from(outcome: &QuotaOutcome) -> Self {
        Self {
            limit: outcome.limit,
            used: outcome.current,
            remaining: outcome.remaining.max(0),
            reset_at: chrono::DateTime::from_timestamp(outcome.reset_at, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| outcome.reset_at.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, kind, message, details, quota) = match &self {
            AppError::Gateway(err) => {
                let quota = match err {
                    GatewayError::QuotaExceeded(outcome) => Some(outcome.clone()),
                    _ => None,
                };
                (
                    err.kind().status(),
                    err.code(),
                    Some(err.kind()),
                    err.to_string(),
                    quota.as_ref().map(QuotaDetails::from),
                    quota,
                )
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                None,
                msg.clone(),
                None,
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                None,
                msg.clone(),
                None,
                None,
            ),
            AppError::Revocation(e) => {
                tracing::error!(error = %e, "Revocation list unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "REVOCATION_UNAVAILABLE",
                    None,
                    "Token revocation is temporarily unavailable".to_string(),
                    None,
                    None,
                )
            }
            AppError::Token(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                None,
                "Internal server error".to_string(),
                None,
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                kind,
                message,
                details,
            },
        };

        let mut response = (status, Json(body)).into_response();

        if let Some(outcome) = quota {
            let headers = response.headers_mut();
            for (name, value) in outcome.headers() {
                headers.insert(name, value);
            }
        }

        response
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
