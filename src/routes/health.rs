//! Health check endpoints
//!
//! Provides endpoints for monitoring and container orchestration:
//! - `/health` - Full health check with ledger and revocation list status
//! - `/health/ready` - Readiness check
//! - `/health/live` - Liveness check

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual dependency check result
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub backend: &'static str,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Dependency checks collection
#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub quota_ledger: DependencyCheck,
    pub revocation_list: DependencyCheck,
}

/// Gateway settings worth surfacing to operators
#[derive(Debug, Serialize)]
pub struct HealthStats {
    pub admin_count: usize,
    pub default_quota_ceiling: i64,
    pub admin_quota_ceiling: i64,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub checks: DependencyChecks,
    pub stats: HealthStats,
}

/// Simple health response for liveness/readiness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Ping the quota ledger
async fn check_ledger(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let ledger = state.pipeline.ledger();

    match ledger.ping().await {
        Ok(()) => DependencyCheck {
            status: HealthStatus::Healthy,
            backend: ledger.backend(),
            latency_ms: start.elapsed().as_millis() as u64,
            error: None,
        },
        Err(e) => DependencyCheck {
            status: HealthStatus::Unhealthy,
            backend: ledger.backend(),
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some(e.to_string()),
        },
    }
}

/// Ping the revocation list
async fn check_revocations(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let revocations = state.pipeline.validator().revocations();

    match revocations.ping().await {
        Ok(()) => DependencyCheck {
            status: HealthStatus::Healthy,
            backend: revocations.backend(),
            latency_ms: start.elapsed().as_millis() as u64,
            error: None,
        },
        Err(e) => DependencyCheck {
            status: HealthStatus::Unhealthy,
            backend: revocations.backend(),
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some(e.to_string()),
        },
    }
}

/// Healthy only when every dependency is
fn overall(checks: &DependencyChecks) -> HealthStatus {
    if checks.quota_ledger.status == HealthStatus::Healthy
        && checks.revocation_list.status == HealthStatus::Healthy
    {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}

/// Full health check endpoint
///
/// The gateway fails closed without its ledger or revocation list, so either
/// one being unreachable makes the whole service unhealthy.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let checks = DependencyChecks {
        quota_ledger: check_ledger(&state).await,
        revocation_list: check_revocations(&state).await,
    };
    let overall_status = overall(&checks);
    let ceilings = state.pipeline.ceilings();

    let response = HealthResponse {
        status: overall_status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks,
        stats: HealthStats {
            admin_count: state.pipeline.admins().admin_count(),
            default_quota_ceiling: ceilings.default,
            admin_quota_ceiling: ceilings.admin,
        },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Readiness check endpoint
///
/// Returns 200 OK if the quota ledger and revocation list are reachable.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<SimpleHealthResponse>) {
    let checks = DependencyChecks {
        quota_ledger: check_ledger(&state).await,
        revocation_list: check_revocations(&state).await,
    };

    if overall(&checks) == HealthStatus::Unhealthy {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: HealthStatus::Unhealthy,
            }),
        );
    }

    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}

/// Liveness check endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
