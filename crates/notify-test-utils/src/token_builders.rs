//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating claim sets and for signing tokens the
//! service itself would never issue (other algorithms, unsigned tokens).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use notify_service::crypto::{self, Claims};
use rsa::RsaPrivateKey;
use serde_json::{json, Value};

/// Builder for creating test JWT claims
///
/// Tokens carry arbitrary JSON, so the builder only seeds `sub`.
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .for_subject("alice")
///     .with_claim("role", json!("sender"))
///     .build();
/// ```
pub struct TestTokenBuilder {
    claims: Claims,
}

impl TestTokenBuilder {
    /// Create a new builder with `sub` set to `test-subject`
    pub fn new() -> Self {
        let mut claims = Claims::new();
        claims.insert("sub".to_string(), json!("test-subject"));
        Self { claims }
    }

    /// Start from an empty claim set
    pub fn empty() -> Self {
        Self {
            claims: Claims::new(),
        }
    }

    /// Set the subject
    pub fn for_subject(self, subject: &str) -> Self {
        self.with_claim("sub", json!(subject))
    }

    /// Set any claim, replacing an existing value
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Build the claim set
    pub fn build(self) -> Claims {
        self.claims
    }

    /// Sign the claims with `algorithm` and an RSA private key.
    ///
    /// Panics if jsonwebtoken refuses the algorithm for an RSA key.
    pub fn sign_rsa(self, algorithm: Algorithm, key: &RsaPrivateKey) -> String {
        let encoding_key = crypto::signing_key(key).expect("Failed to build RSA signing key");
        encode(&Header::new(algorithm), &self.claims, &encoding_key)
            .expect("Failed to sign test token")
    }

    /// Sign the claims with HS256 using `secret` as the HMAC key.
    ///
    /// Passing the service's public key PEM produces the classic
    /// key-confusion token.
    pub fn sign_hs256(self, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &self.claims,
            &EncodingKey::from_secret(secret),
        )
        .expect("Failed to sign test token")
    }

    /// An unsigned token with header `{"alg":"none","typ":"JWT"}`.
    pub fn unsigned(self) -> String {
        let header = json!({ "alg": "none", "typ": "JWT" });
        let payload = Value::Object(self.claims);

        format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(header.to_string().as_bytes()),
            URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes())
        )
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Flip one bit in the signature segment of a compact JWS.
///
/// The segment stays valid base64url; only the signature bytes change.
pub fn tamper_signature(token: &str) -> String {
    tamper_signature_at(token, 0)
}

/// Flip the low bit of signature byte `index`.
///
/// # Panics
///
/// Panics if `index` is past the end of the decoded signature.
pub fn tamper_signature_at(token: &str, index: usize) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let signature = parts.last_mut().expect("Token has no segments");

    let mut bytes = URL_SAFE_NO_PAD
        .decode(signature.as_bytes())
        .expect("Signature is not base64url");
    let byte = bytes
        .get_mut(index)
        .unwrap_or_else(|| panic!("Signature has no byte {index}"));
    *byte ^= 0x01;
    *signature = URL_SAFE_NO_PAD.encode(&bytes);

    parts.join(".")
}

/// Length in bytes of the decoded signature segment.
pub fn signature_len(token: &str) -> usize {
    let signature = token.rsplit('.').next().unwrap_or("");
    URL_SAFE_NO_PAD
        .decode(signature.as_bytes())
        .expect("Signature is not base64url")
        .len()
}

/// Replace the payload segment of a compact JWS, keeping header and signature.
pub fn replace_payload(token: &str, claims: &Claims) -> String {
    let mut parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "Token must have 3 segments");

    let payload = URL_SAFE_NO_PAD.encode(Value::Object(claims.clone()).to_string().as_bytes());
    parts[1] = &payload;

    parts.join(".")
}
