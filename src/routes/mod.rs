//! HTTP routes for the gateway
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod debug;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod revocation;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    gateway::{gateway_middleware, Gate, RouteGuard},
    AppState,
};

/// Put every route of `router` behind the gateway
///
/// Handlers mounted this way receive `AuthenticatedIdentity` in their
/// request extensions.
pub fn guard<S>(router: Router<S>, gate: Gate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(gate, gateway_middleware))
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Any authenticated caller
    let user_routes = guard(
        Router::new()
            .route("/v1/identity", post(identity::identity))
            .route("/v1/logout", post(revocation::logout))
            .with_state(state.clone()),
        state.gate(RouteGuard::Authenticated),
    );

    // Verified admins only; the policy check runs before quota is counted
    let admin_routes = guard(
        Router::new()
            .route("/v1/admin/identity", post(identity::identity))
            .route("/v1/admin/revoke", post(revocation::revoke_token))
            .with_state(state.clone()),
        state.gate(RouteGuard::AdminOnly),
    );

    // Public routes (health checks, metrics, debug) - no gateway
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/debug/token", post(debug::issue_token))
        .route("/debug/config", get(debug::config_info))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (applied to all routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
