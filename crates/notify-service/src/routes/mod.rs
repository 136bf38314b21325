//! HTTP routes for the notify service.

use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_token};
use crate::repositories::MessageStore;
use crate::services::TokenService;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub use crate::observability::metrics::init_metrics_recorder;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Message storage backend.
    pub store: Arc<dyn MessageStore>,

    /// Token issuance and verification over the process key pair.
    pub tokens: TokenService,
}

/// Build the application routes.
///
/// - `/health` - liveness, public
/// - `/ready` - readiness (storage + public key), public
/// - `/metrics` - Prometheus scrape, public
/// - `GET /api/v1/messages` - list messages, public
/// - `POST /api/v1/messages` - create a message, requires a `token` header
///
/// Layers: permissive CORS, request tracing, 30 second timeout, and HTTP
/// metrics outermost so framework rejections are counted too.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/messages", get(handlers::list_messages))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/messages", post(handlers::create_message))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_token,
        ))
        .with_state(state);

    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
