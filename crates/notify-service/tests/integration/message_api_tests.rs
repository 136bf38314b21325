//! Integration tests for the message API and its token gate
//!
//! Listing is public; creating a message requires a `token` header carrying
//! an RS256 token issued with the service key.

use jsonwebtoken::Algorithm;
use notify_service::handlers::messages::MISSING_FIELDS_MESSAGE;
use notify_service::models::{Message, MessageList};
use notify_service::repositories::MessageStore;
use notify_test_utils::{other_key_pair, TestNotifyServer, TestTokenBuilder};
use reqwest::StatusCode;
use serde_json::json;

const UNAUTHORIZED_MESSAGE: &str = "Please provide a valid 'token' header.";

// ============================================================================
// Helper Functions
// ============================================================================

fn message_body(subject: &str) -> serde_json::Value {
    json!({
        "to": "florence@example.com",
        "subject": subject,
        "body": "Hello from the integration tests",
    })
}

async fn assert_unauthorized(response: reqwest::Response) -> Result<(), anyhow::Error> {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], UNAUTHORIZED_MESSAGE);
    Ok(())
}

// ============================================================================
// Token Gate
// ============================================================================

#[tokio::test]
async fn test_create_without_token_is_unauthorized() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestNotifyServer::spawn().await?;

    // Act
    let response = server.post_message(None, &message_body("no token")).await?;

    // Assert
    assert_unauthorized(response).await?;
    assert!(
        server.store().list().await?.is_empty(),
        "Rejected request must not store anything"
    );
    Ok(())
}

#[tokio::test]
async fn test_create_with_invalid_tokens_is_unauthorized() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;
    let other = other_key_pair()?;

    let forged = TestTokenBuilder::new().sign_rsa(Algorithm::RS256, other.private_key());
    let unsigned = TestTokenBuilder::new().unsigned();

    for token in ["", "garbage", forged.as_str(), unsigned.as_str()] {
        let response = server
            .post_message(Some(token), &message_body("bad token"))
            .await?;

        assert_unauthorized(response).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_bearer_prefix_is_not_stripped() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().build())?;

    let response = server
        .post_message(Some(&format!("Bearer {token}")), &message_body("bearer"))
        .await?;

    assert_unauthorized(response).await
}

#[tokio::test]
async fn test_authorization_header_is_ignored() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().build())?;

    let response = server
        .client()
        .post(server.messages_url())
        .bearer_auth(token)
        .json(&message_body("authorization header"))
        .send()
        .await?;

    assert_unauthorized(response).await
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_with_valid_token_stores_message() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().for_subject("alice").build())?;

    // Act
    let response = server
        .post_message(Some(&token), &message_body("hello"))
        .await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);

    let created: Message = response.json().await?;
    assert_eq!(created.to, "florence@example.com");
    assert_eq!(created.subject, "hello");
    assert_eq!(created.body, "Hello from the integration tests");

    let stored = server.store().list().await?;
    assert_eq!(stored, vec![created]);
    Ok(())
}

#[tokio::test]
async fn test_create_with_missing_field_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().build())?;

    for body in [
        json!({ "subject": "s", "body": "b" }),
        json!({ "to": "t", "body": "b" }),
        json!({ "to": "t", "subject": "s" }),
        json!({}),
    ] {
        let response = server.post_message(Some(&token), &body).await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let error: serde_json::Value = response.json().await?;
        assert_eq!(error["error"]["message"], MISSING_FIELDS_MESSAGE);
    }

    assert!(server.store().list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_with_invalid_json_is_bad_request() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().build())?;

    let response = server
        .client()
        .post(server.messages_url())
        .header("token", token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_token_checked_before_body() -> Result<(), anyhow::Error> {
    // A bad token with a bad body is still a 401
    let server = TestNotifyServer::spawn().await?;

    let response = server.post_message(Some("garbage"), &json!({})).await?;

    assert_unauthorized(response).await
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_is_public_and_empty_initially() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;

    let response = server.client().get(server.messages_url()).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    let list: MessageList = response.json().await?;
    assert!(list.messages.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_list_returns_newest_first() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().build())?;

    for subject in ["first", "second", "third"] {
        let response = server
            .post_message(Some(&token), &message_body(subject))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // Act
    let list: MessageList = server
        .client()
        .get(server.messages_url())
        .send()
        .await?
        .json()
        .await?;

    // Assert
    let subjects: Vec<_> = list.messages.iter().map(|m| m.subject.as_str()).collect();
    assert_eq!(subjects, vec!["third", "second", "first"]);
    Ok(())
}

#[tokio::test]
async fn test_one_token_authorizes_many_requests() -> Result<(), anyhow::Error> {
    let server = TestNotifyServer::spawn().await?;
    let token = server.issue_token(&TestTokenBuilder::new().build())?;

    for i in 0..5 {
        let response = server
            .post_message(Some(&token), &message_body(&format!("message {i}")))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(server.store().list().await?.len(), 5);
    assert_eq!(server.tokens().key_store().public_key_loads(), 1);
    Ok(())
}
