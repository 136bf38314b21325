//! Integration tests for health probes and the metrics endpoint

use notify_service::services::KeyStoreConfig;
use notify_test_utils::TestNotifyServer;
use reqwest::StatusCode;

// ============================================================================
// Liveness Probe Tests
// ============================================================================

/// The liveness probe returns 200 OK as long as the process serves HTTP.
#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestNotifyServer::spawn().await?;

    // Act
    let response = reqwest::get(format!("{}/health", server.url())).await?;

    // Assert
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Health check should return 200 OK"
    );

    let body = response.text().await?;
    assert_eq!(body, "OK", "Health check body should be 'OK'");

    Ok(())
}

// ============================================================================
// Readiness Probe Tests
// ============================================================================

/// Ready when storage answers and the verification key loads.
#[tokio::test]
async fn test_ready_endpoint_returns_ok_when_healthy() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestNotifyServer::spawn().await?;

    // Act
    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    // Assert
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Readiness check should return 200 OK when healthy"
    );

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "healthy");
    assert_eq!(body["verification_key"], "available");
    assert!(body.get("error").is_none());

    Ok(())
}

/// Not ready when the public key file is missing; detail stays in the logs.
#[tokio::test]
async fn test_ready_endpoint_returns_503_without_public_key() -> Result<(), anyhow::Error> {
    // Arrange: empty key directory
    let key_dir = tempfile::tempdir()?;
    let config = KeyStoreConfig::new(
        key_dir.path().join("key.pem"),
        key_dir.path().join("key.pub"),
    );
    let server = TestNotifyServer::spawn_with(key_dir, config).await?;

    // Act
    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["verification_key"], "unavailable");
    assert_eq!(body["error"], "Service dependencies unavailable");

    let text = body.to_string();
    assert!(
        !text.contains("key.pub"),
        "Readiness response must not leak file paths"
    );

    Ok(())
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;

    let response = reqwest::get(format!("{}/email", server.url())).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
