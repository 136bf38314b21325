//! JWT helpers that run before any signature work.
//!
//! - Size limit for DoS prevention
//! - Header `alg` extraction so callers can pin the algorithm up front
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Nothing here verifies a signature; values read from the header are only
//!   used to reject tokens early
//! - Error messages are generic; detail goes to debug logs
//!
//! ```rust,ignore
//! use common::jwt::{extract_alg, MAX_JWT_SIZE_BYTES};
//!
//! let alg = extract_alg(token)?;
//! if alg != "RS256" {
//!     return None;
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// An RS256 token over a 4096-bit key carries a 683-character signature
/// segment; 8KB leaves plenty of room for claims while bounding the work done
/// on hostile input. Checked BEFORE base64 decode and signature verification.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while inspecting a JWT before verification.
///
/// All variants render the same message so callers cannot leak which check
/// failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The token is invalid")]
    TokenTooLarge,

    /// Token is not three dot-separated base64url segments with a JSON header.
    #[error("The token is invalid")]
    MalformedToken,

    /// Header has no string `alg` field.
    #[error("The token is invalid")]
    MissingAlgorithm,
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` when the limit is exceeded.
pub fn check_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Extract the `alg` header value from a JWT without verifying it.
///
/// The returned value must only be used to decide whether to reject the token.
///
/// # Errors
///
/// - `TokenTooLarge` - token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - wrong segment count, bad base64 or bad header JSON
/// - `MissingAlgorithm` - header lacks a string `alg`
pub fn extract_alg(token: &str) -> Result<String, JwtValidationError> {
    check_size(token)?;

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("alg")
        .and_then(|v| v.as_str())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingAlgorithm)
}
