use axum::extract::State;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// Prometheus scrape endpoint.
///
/// ```text
/// notify_token_validations_total{status="error",reason="signature_mismatch"} 3
/// ```
#[tracing::instrument(skip_all, name = "notify.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
