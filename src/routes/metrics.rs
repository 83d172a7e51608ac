//! Prometheus metrics endpoint
//!
//! Exposes gateway metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use crate::gateway::RouteGuard;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "gateway_requests_total",
        "Requests that passed the gateway, by route guard"
    );
    metrics::describe_counter!(
        "gateway_rejections_total",
        "Requests rejected by the gateway, by rejection code"
    );
    metrics::describe_histogram!(
        "gateway_pipeline_duration_seconds",
        "Time spent in the gateway pipeline"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record an admitted request
pub fn record_admission(guard: RouteGuard) {
    metrics::counter!("gateway_requests_total", "guard" => guard.as_str()).increment(1);
}

/// Record a rejected request
pub fn record_rejection(code: &'static str) {
    metrics::counter!("gateway_rejections_total", "code" => code).increment(1);
}

/// Record time spent before forwarding or rejecting
pub fn record_pipeline_duration(duration_secs: f64) {
    metrics::histogram!("gateway_pipeline_duration_seconds").record(duration_secs);
}
