use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored message (maps to messages table)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    #[sqlx(rename = "recipient")]
    pub to: String,
    pub subject: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/messages`.
///
/// Fields are optional so a missing field yields our own 400 rather than a
/// deserializer rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMessageRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// A validated message ready to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl CreateMessageRequest {
    /// `None` unless `to`, `subject` and `body` are all present.
    pub fn into_new_message(self) -> Option<NewMessage> {
        Some(NewMessage {
            to: self.to?,
            subject: self.subject?,
            body: self.body?,
        })
    }
}

/// Body of `GET /api/v1/messages`, newest first.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageList {
    pub messages: Vec<Message>,
}

/// Readiness probe response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
