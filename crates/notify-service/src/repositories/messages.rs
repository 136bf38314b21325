//! Message storage.
//!
//! [`PgMessageStore`] is used when a database is configured;
//! [`InMemoryMessageStore`] otherwise and in tests.

use crate::errors::NotifyError;
use crate::models::{Message, NewMessage};
use crate::observability::metrics::record_store_operation;
use chrono::Utc;
use sqlx::PgPool;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message stamped with the current time.
    async fn create(&self, message: NewMessage) -> Result<Message, NotifyError>;

    /// All messages, newest first.
    async fn list(&self) -> Result<Vec<Message>, NotifyError>;

    /// Cheap liveness check of the backing store.
    async fn ping(&self) -> Result<(), NotifyError>;
}

fn stamp(message: NewMessage) -> Message {
    Message {
        id: Uuid::new_v4(),
        to: message.to,
        subject: message.subject,
        body: message.body,
        created_at: Utc::now(),
    }
}

// ============================================================================
// Postgres
// ============================================================================

pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the messages table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), NotifyError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id UUID PRIMARY KEY,
                recipient VARCHAR(100) NOT NULL,
                subject TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| NotifyError::Storage(format!("Failed to create messages table: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, message: NewMessage) -> Result<Message, NotifyError> {
        let message = stamp(message);

        let start = Instant::now();
        let result = sqlx::query(
            r#"
            INSERT INTO messages (id, recipient, subject, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(&message.to)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(message.created_at)
        .execute(&self.pool)
        .await;
        let status = if result.is_ok() { "success" } else { "error" };
        record_store_operation("create", status, start.elapsed());
        result.map_err(|e| NotifyError::Storage(format!("Failed to insert message: {}", e)))?;

        Ok(message)
    }

    async fn list(&self) -> Result<Vec<Message>, NotifyError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, recipient, subject, body, created_at
            FROM messages
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        let status = if result.is_ok() { "success" } else { "error" };
        record_store_operation("list", status, start.elapsed());

        result.map_err(|e| NotifyError::Storage(format!("Failed to list messages: {}", e)))
    }

    async fn ping(&self) -> Result<(), NotifyError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| NotifyError::Storage(format!("Database unreachable: {}", e)))?;
        Ok(())
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(&self, message: NewMessage) -> Result<Message, NotifyError> {
        let start = Instant::now();
        let message = stamp(message);
        self.messages.write().await.push(message.clone());
        record_store_operation("create", "success", start.elapsed());
        Ok(message)
    }

    async fn list(&self) -> Result<Vec<Message>, NotifyError> {
        let start = Instant::now();
        let mut messages = self.messages.read().await.clone();
        // Insertion order breaks ties between equal timestamps.
        messages.reverse();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        record_store_operation("list", "success", start.elapsed());
        Ok(messages)
    }

    async fn ping(&self) -> Result<(), NotifyError> {
        Ok(())
    }
}
