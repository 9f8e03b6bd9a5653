//! Prometheus metrics
//!
//! Counters are recorded through the `metrics` facade; the exporter renders
//! them at `/metrics`.

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;

pub const REQUESTS_TOTAL: &str = "voice_console_requests_total";
pub const AGENT_SAVES_TOTAL: &str = "voice_console_agent_saves_total";
pub const SAVE_CONFLICTS_TOTAL: &str = "voice_console_save_conflicts_total";

/// Install the global Prometheus recorder
///
/// Returns `None` if a recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            metrics::describe_counter!(REQUESTS_TOTAL, "HTTP requests by route and status");
            metrics::describe_counter!(AGENT_SAVES_TOTAL, "Agent creates and updates");
            metrics::describe_counter!(SAVE_CONFLICTS_TOTAL, "Agent saves rejected as stale");
            Some(handle)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        }
    }
}

pub fn record_request(method: &str, route: &str, status: u16) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// `kind` is `create` or `update`
pub fn record_agent_save(kind: &'static str) {
    metrics::counter!(AGENT_SAVES_TOTAL, "kind" => kind).increment(1);
}

pub fn record_save_conflict() {
    metrics::counter!(SAVE_CONFLICTS_TOTAL).increment(1);
}

/// Count every request by matched route
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &route, response.status().as_u16());
    response
}

/// Prometheus text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics disabled").into_response(),
    }
}
