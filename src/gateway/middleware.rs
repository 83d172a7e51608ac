//! Gateway middleware
//!
//! Buffers the request body, runs the pipeline, then hands the untouched
//! request to the handler with the caller's identity attached.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::{
    auth::IdentityClaim,
    error::{AppError, GatewayError},
    gateway::{
        envelope::RequestEnvelope,
        pipeline::{Admission, GatewayPipeline, PipelineStage, RouteGuard},
    },
    ledger::QuotaOutcome,
    routes::metrics,
};

/// Identity attached to admitted requests
///
/// Handlers read it with `Extension<AuthenticatedIdentity>`.
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    /// Decoded claim; its email is the caller's authoritative identity
    pub claim: IdentityClaim,
    pub is_admin: bool,
    /// Quota state after this request was counted
    pub quota: QuotaOutcome,
    /// Digest of the presented token; what a logout revokes
    pub token_digest: String,
}

impl From<Admission> for AuthenticatedIdentity {
    fn from(admission: Admission) -> Self {
        Self {
            claim: admission.claim,
            is_admin: admission.is_admin,
            quota: admission.quota,
            token_digest: admission.token_digest,
        }
    }
}

/// Middleware state: one pipeline, one guard
#[derive(Clone)]
pub struct Gate {
    pub pipeline: Arc<GatewayPipeline>,
    pub guard: RouteGuard,
    pub max_body_bytes: usize,
}

impl Gate {
    pub fn new(pipeline: Arc<GatewayPipeline>, guard: RouteGuard, max_body_bytes: usize) -> Self {
        Self {
            pipeline,
            guard,
            max_body_bytes,
        }
    }
}

/// Gateway middleware
///
/// This middleware:
/// 1. Buffers the body (bounded by `max_body_bytes`)
/// 2. Parses the credential envelope
/// 3. Runs credential, admin and quota checks
/// 4. Re-attaches the body and adds `AuthenticatedIdentity` to request extensions
/// 5. Adds rate limit headers to the handler's response
#[instrument(skip_all, fields(path = %request.uri().path(), guard = ?gate.guard))]
pub async fn gateway_middleware(
    State(gate): State<Gate>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let started = std::time::Instant::now();
    let deadline = gate.pipeline.deadline();

    let (parts, body) = request.into_parts();
    let path = parts.uri.path().to_string();

    let result = async {
        let bytes = to_bytes(body, gate.max_body_bytes)
            .await
            .map_err(|e| GatewayError::MalformedRequest(format!("unreadable body: {}", e)))?;
        let envelope = RequestEnvelope::parse(&path, &bytes)?;
        let admission = gate.pipeline.run(&envelope, gate.guard, deadline).await?;
        Ok::<_, GatewayError>((bytes, admission))
    }
    .await;

    metrics::record_pipeline_duration(started.elapsed().as_secs_f64());

    let (bytes, admission) = match result {
        Ok(admitted) => admitted,
        Err(e) => {
            warn!(code = e.code(), reason = %e, "Request rejected");
            if let GatewayError::LedgerUnavailable(detail) = &e {
                warn!(detail = %detail, "Rejected because quota could not be verified");
            }
            metrics::record_rejection(e.code());
            return Err(e.into());
        }
    };

    let quota = admission.quota.clone();
    debug!(
        stage = PipelineStage::Forwarded.as_str(),
        email = %admission.claim.email,
        remaining = quota.remaining,
        "Request admitted"
    );
    metrics::record_admission(gate.guard);

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request
        .extensions_mut()
        .insert(AuthenticatedIdentity::from(admission));

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in quota.headers() {
        headers.insert(name, value);
    }

    Ok(response)
}
