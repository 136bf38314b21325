//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for tokens issued by the notify service.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::Value;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

fn segments(token: &str) -> Vec<&str> {
    let parts: Vec<_> = token.split('.').collect();
    assert_eq!(
        parts.len(),
        3,
        "JWT must have 3 parts (header.payload.signature), got {}",
        parts.len()
    );
    parts
}

fn decode_payload(token: &str) -> serde_json::Map<String, Value> {
    let parts = segments(token);
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .expect("Invalid JWT payload");
    serde_json::from_slice(&payload).expect("JWT payload is not a JSON object")
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_has_claim("sub", "alice");
/// ```
pub trait TokenAssertions {
    /// Assert compact JWS form with an `RS256`/`JWT` header and a JSON object
    /// payload
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the payload carries `name` with exactly `expected`
    fn assert_has_claim(&self, name: &str, expected: impl Into<Value>) -> &Self;

    /// Assert that the payload does not carry `name`
    fn assert_lacks_claim(&self, name: &str) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = segments(self);

        // Decode and validate header
        let header_result = URL_SAFE_NO_PAD.decode(parts[0]);
        assert!(
            header_result.is_ok(),
            "Failed to base64 decode JWT header: {:?}",
            header_result.err()
        );

        let header: Result<JwtHeader, _> = serde_json::from_slice(&header_result.unwrap());
        assert!(
            header.is_ok(),
            "Failed to parse JWT header JSON: {:?}",
            header.err()
        );

        let header = header.unwrap();
        assert_eq!(header.alg, "RS256", "Expected RS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        // Payload must be a JSON object
        decode_payload(self);

        assert!(!parts[2].is_empty(), "JWT signature must not be empty");

        self
    }

    fn assert_has_claim(&self, name: &str, expected: impl Into<Value>) -> &Self {
        let claims = decode_payload(self);
        let expected = expected.into();

        assert_eq!(
            claims.get(name),
            Some(&expected),
            "Expected claim '{}' = {}, got {:?}",
            name,
            expected,
            claims.get(name)
        );

        self
    }

    fn assert_lacks_claim(&self, name: &str) -> &Self {
        let claims = decode_payload(self);

        assert!(
            !claims.contains_key(name),
            "Token unexpectedly carries claim '{}'",
            name
        );

        self
    }
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        self.as_str().assert_valid_jwt();
        self
    }

    fn assert_has_claim(&self, name: &str, expected: impl Into<Value>) -> &Self {
        self.as_str().assert_has_claim(name, expected);
        self
    }

    fn assert_lacks_claim(&self, name: &str) -> &Self {
        self.as_str().assert_lacks_claim(name);
        self
    }
}
