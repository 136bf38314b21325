//! Liveness and readiness probes.
//!
//! - `/health`: the process is up
//! - `/ready`: storage answers and the verification key can be loaded

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe. Checks no dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe. 200 when ready, 503 otherwise.
///
/// Loading the public key here also warms the verification cache.
/// Error detail is logged, never returned.
#[tracing::instrument(skip_all, name = "notify.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.store.ping().await {
        tracing::warn!(target: "notify.health", error = %e, "Readiness check failed: storage");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                storage: Some("unhealthy"),
                verification_key: None,
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    let keys = state.tokens.key_store().clone();
    let key_check = tokio::task::spawn_blocking(move || keys.load_public().map(|_| ())).await;

    match key_check {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                storage: Some("healthy"),
                verification_key: Some("available"),
                error: None,
            }),
        ),
        Ok(Err(e)) => {
            tracing::warn!(target: "notify.health", error = %e, "Readiness check failed: public key");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    storage: Some("healthy"),
                    verification_key: Some("unavailable"),
                    error: Some("Service dependencies unavailable".to_string()),
                }),
            )
        }
        Err(e) => {
            tracing::error!(target: "notify.health", error = %e, "Readiness key check panicked");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    storage: Some("healthy"),
                    verification_key: None,
                    error: Some("Service dependencies unavailable".to_string()),
                }),
            )
        }
    }
}
