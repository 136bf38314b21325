use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while generating, persisting, parsing or loading RSA keys.
///
/// Messages never carry key material or the password.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Key file not found: {}", path.display())]
    KeyNotFound { path: PathBuf },

    /// Wrong password, or the decrypted bytes are not a private key.
    #[error("Private key decryption failed")]
    DecryptionFailed,

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Key encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(#[from] KeyError),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Please provide a valid 'token' header.")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for NotifyError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            NotifyError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Please provide a valid 'token' header.".to_string(),
            ),
            NotifyError::BadRequest(reason) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", reason.clone())
            }
            NotifyError::Key(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "KEY_ERROR",
                "An internal key management error occurred".to_string(),
            ),
            NotifyError::Signing(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SIGNING_ERROR",
                "An internal token signing error occurred".to_string(),
            ),
            NotifyError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "An internal storage error occurred".to_string(),
            ),
            NotifyError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(target: "notify.errors", error = %self, "Request failed");
        }

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}
