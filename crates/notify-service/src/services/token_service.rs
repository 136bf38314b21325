use crate::crypto::{self, Claims, TokenRejection};
use crate::errors::SigningError;
use crate::observability::metrics::{record_token_issuance, record_token_validation};
use crate::services::key_store::KeyStore;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Issues and verifies RS256 tokens with the keys of one [`KeyStore`].
///
/// Tokens carry no expiry; a token stays valid for as long as the key pair
/// that signed it is in use.
#[derive(Debug, Clone)]
pub struct TokenService {
    keys: Arc<KeyStore>,
}

impl TokenService {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    /// Sign `claims` into a compact JWS.
    ///
    /// RSASSA-PKCS1-v1_5 is deterministic, but callers should not rely on two
    /// issues of the same claims producing identical tokens.
    #[instrument(skip_all)]
    pub fn issue(&self, claims: &Claims) -> Result<String, SigningError> {
        let start = Instant::now();

        let result = self
            .keys
            .load_private()
            .map_err(SigningError::from)
            .and_then(|material| crypto::sign_jwt(claims, material.signing_key()));

        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(status, start.elapsed());

        result
    }

    /// Verify `token` and return its claims, or `None` if it is not valid.
    ///
    /// Every failure (malformed, wrong algorithm, bad signature, public key
    /// unavailable) collapses to `None`.
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match self.check(token) {
            Ok(claims) => {
                record_token_validation("success", None);
                Some(claims)
            }
            Err(rejection) => {
                debug!(target: "notify.tokens", reason = rejection.as_str(), "Token rejected");
                record_token_validation("error", Some(rejection.as_str()));
                None
            }
        }
    }

    fn check(&self, token: &str) -> Result<Claims, TokenRejection> {
        // Size is checked before the key is touched.
        common::jwt::check_size(token).map_err(|_| TokenRejection::TooLarge)?;

        let material = self
            .keys
            .load_public()
            .map_err(|_| TokenRejection::KeyUnavailable)?;

        crypto::verify_jwt(token, material.verifying_key())
    }
}

/// Claims of a token that passed verification, stored in request extensions.
#[derive(Debug, Clone)]
pub struct VerifiedClaims(pub Claims);
