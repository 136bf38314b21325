//! Token gate for protected routes.
//!
//! Clients send the raw token (no `Bearer` prefix) in the `token` header.
//! Requests without a valid token are rejected with 401 before the handler
//! runs; valid claims are placed in request extensions as [`VerifiedClaims`].

use crate::errors::NotifyError;
use crate::services::token_service::{TokenService, VerifiedClaims};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use tracing::instrument;

/// Request header carrying the token.
pub const TOKEN_HEADER: &str = "token";

fn extract_token(req: &Request) -> Result<&str, NotifyError> {
    let value = req.headers().get(TOKEN_HEADER).ok_or_else(|| {
        tracing::debug!(target: "notify.middleware.auth", "Missing token header");
        NotifyError::Unauthorized
    })?;

    value
        .to_str()
        .ok()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: "notify.middleware.auth", "Unreadable token header");
            NotifyError::Unauthorized
        })
}

/// Authentication middleware for routes that change state.
///
/// # Response
///
/// - 401 Unauthorized if the header is missing or the token does not verify
/// - Otherwise the next handler runs with [`VerifiedClaims`] in extensions
#[instrument(skip_all, name = "notify.middleware.auth")]
pub async fn require_token(
    State(tokens): State<TokenService>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, NotifyError> {
    let token = extract_token(&req)?.to_string();

    // A cold cache reads and parses the public key file.
    let claims = tokio::task::spawn_blocking(move || tokens.verify(&token))
        .await
        .map_err(|e| {
            tracing::error!(target: "notify.middleware.auth", error = %e, "Token verification task failed");
            NotifyError::Internal
        })?
        .ok_or(NotifyError::Unauthorized)?;

    req.extensions_mut().insert(VerifiedClaims(claims));

    Ok(next.run(req).await)
}
