//! Message record handlers.
//!
//! - `GET /api/v1/messages` - public listing, newest first
//! - `POST /api/v1/messages` - behind the token gate

use crate::errors::NotifyError;
use crate::models::{CreateMessageRequest, Message, MessageList};
use crate::routes::AppState;
use crate::services::token_service::VerifiedClaims;
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

pub const MISSING_FIELDS_MESSAGE: &str =
    "Please provide 'to', 'subject' and 'body' in your message.";

#[instrument(skip_all, name = "notify.messages.list")]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageList>, NotifyError> {
    let messages = state.store.list().await?;
    Ok(Json(MessageList { messages }))
}

#[instrument(skip_all, name = "notify.messages.create")]
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Extension(_claims): Extension<VerifiedClaims>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<Json<Message>, NotifyError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(target: "notify.messages", error = %e, "Rejected message body");
        NotifyError::BadRequest(MISSING_FIELDS_MESSAGE.to_string())
    })?;

    let new_message = request
        .into_new_message()
        .ok_or_else(|| NotifyError::BadRequest(MISSING_FIELDS_MESSAGE.to_string()))?;

    let message = state.store.create(new_message).await?;

    tracing::info!(target: "notify.messages", message_id = %message.id, "Message stored");

    Ok(Json(message))
}
