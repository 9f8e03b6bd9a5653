//! HTTP Endpoints
//!
//! Router for the console REST API.

use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, account, agents, catalog, drafts, records, ApiResult};
use crate::auth::auth_middleware;
use crate::metrics::{metrics_handler, track_requests};
use crate::state::AppState;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let timeout = Duration::from_secs(config.server.timeout_seconds.max(1));
    drop(config); // Release lock before building router

    Router::new()
        // Users
        .route("/user/signup", post(account::signup))
        .route("/user/login", post(account::login))
        .route("/user/me", get(account::me))
        .route("/user/logout", post(account::logout))
        // Agents
        .route("/agent", post(agents::create_agent))
        .route("/agent/all", get(agents::list_agents))
        .route(
            "/agent/:id",
            get(agents::get_agent)
                .put(agents::update_agent)
                .delete(agents::delete_agent),
        )
        .route("/agent/:id/cost", post(agents::agent_cost))
        .route("/cost/estimate", post(agents::estimate_cost))
        // Edit sessions
        .route("/drafts", post(drafts::create_draft))
        .route(
            "/drafts/:id",
            get(drafts::get_draft)
                .patch(drafts::patch_draft)
                .delete(drafts::discard_draft),
        )
        .route("/drafts/:id/sections/:section", get(drafts::get_section))
        .route("/drafts/:id/save", post(drafts::save_draft))
        // Executions
        .route("/execution", post(records::record_execution))
        .route("/execution/all", get(records::list_executions))
        .route("/execution/:id", get(records::get_execution))
        // Knowledge bases
        .route("/knowledge-base", post(records::create_knowledge_base))
        .route("/knowledge-base/all", get(records::list_knowledge_bases))
        .route("/knowledge-base/:rag_id", delete(records::delete_knowledge_base))
        // Phone numbers
        .route("/phone-numbers", post(records::create_phone_number))
        .route("/phone-numbers/all", get(records::list_phone_numbers))
        .route("/phone-numbers/:id", delete(records::delete_phone_number))
        .route("/phone-numbers/:id/agent", put(records::assign_phone_number))
        // Providers and voices
        .route("/providers", get(catalog::list_providers))
        .route(
            "/providers/credentials",
            get(catalog::list_credentials).post(catalog::connect_provider),
        )
        .route(
            "/providers/credentials/:provider_name",
            delete(catalog::disconnect_provider),
        )
        .route("/voices", get(catalog::list_voices))
        // API keys
        .route(
            "/api-keys",
            get(account::list_api_keys).post(account::create_api_key),
        )
        .route("/api-keys/:id", delete(account::delete_api_key))
        // Organizations
        .route("/organizations", post(account::create_organization))
        .route("/organizations/all", get(account::list_organizations))
        .route("/organizations/active", get(account::active_organization))
        .route("/organizations/:id/activate", post(account::activate_organization))
        // Operations
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/admin/reload-config", post(reload_config))
        // Middleware (last added runs first: CORS, trace, timeout, metrics, auth)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn(track_requests))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If no configured origin parses, falls back to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let mut parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        parsed_origins.push(HeaderValue::from_static(FALLBACK_ORIGIN));
        return CorsLayer::new()
            .allow_origin(parsed_origins)
            .allow_methods(CORS_METHODS)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    // Credentialed CORS cannot use wildcard headers
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ])
        .allow_credentials(true)
}

/// Health check
///
/// Degraded (503) while the provider catalog is empty, since no cost can
/// be estimated without it.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let provider_count = state.catalog.read().providers().len();
    let environment = format!("{:?}", state.get_config().environment).to_lowercase();
    let healthy = provider_count > 0;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(serde_json::json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "version": env!("CARGO_PKG_VERSION"),
            "environment": environment,
            "checks": {
                "catalog": {
                    "status": if healthy { "ok" } else { "empty" },
                    "providers": provider_count,
                },
                "metrics": {
                    "status": if state.metrics.is_some() { "ok" } else { "disabled" },
                },
            },
        })),
    )
}

/// Reload configuration from files
///
/// POST /admin/reload-config
async fn reload_config(State(state): State<AppState>) -> ApiResult<()> {
    state.reload_config()?;
    api::ok_with_message((), "Configuration reloaded successfully")
}
