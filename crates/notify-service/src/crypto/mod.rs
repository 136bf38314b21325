//! RSA key pairs and RS256 signing primitives.
//!
//! Key generation and the jsonwebtoken glue live here; PEM conversion is in
//! [`pem`]. Everything is synchronous and side-effect free apart from drawing
//! randomness from the OS.

pub mod pem;

use crate::errors::{KeyError, SigningError};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use std::fmt;
use tracing::instrument;

/// Modulus size for generated keys.
pub const RSA_KEY_BITS: usize = 4096;

/// Public exponent for generated keys.
pub const RSA_PUBLIC_EXPONENT: u64 = 65537;

/// The only algorithm tokens are signed with or accepted under.
pub const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Token payload: an arbitrary JSON object.
pub type Claims = serde_json::Map<String, serde_json::Value>;

/// An RSA private key together with its public half.
///
/// `Debug` shows only the modulus size.
#[derive(Clone)]
pub struct KeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl KeyPair {
    /// Generate a fresh 4096-bit pair with exponent 65537 from the OS CSPRNG.
    #[instrument(skip_all)]
    pub fn generate() -> Result<Self, KeyError> {
        let exponent = BigUint::from(RSA_PUBLIC_EXPONENT);
        let private = RsaPrivateKey::new_with_exp(&mut OsRng, RSA_KEY_BITS, &exponent)
            .map_err(|e| KeyError::Encoding(format!("RSA key generation failed: {}", e)))?;

        tracing::debug!(target: "notify.crypto", bits = RSA_KEY_BITS, "Generated RSA key pair");

        Ok(Self::from_private(private))
    }

    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { private, public }
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    pub fn modulus_bits(&self) -> usize {
        self.public.n().bits()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("modulus_bits", &self.modulus_bits())
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Build a jsonwebtoken signing key from an RSA private key.
#[instrument(skip_all)]
pub fn signing_key(private: &RsaPrivateKey) -> Result<EncodingKey, KeyError> {
    let der = private
        .to_pkcs1_der()
        .map_err(|e| KeyError::Encoding(format!("PKCS#1 encoding failed: {}", e)))?;
    Ok(EncodingKey::from_rsa_der(der.as_bytes()))
}

/// Build a jsonwebtoken verification key from an RSA public key.
pub fn verifying_key(public: &RsaPublicKey) -> Result<DecodingKey, KeyError> {
    let der = public
        .to_pkcs1_der()
        .map_err(|e| KeyError::Encoding(format!("PKCS#1 encoding failed: {}", e)))?;
    Ok(DecodingKey::from_rsa_der(der.as_bytes()))
}

/// Sign claims as a compact RS256 JWS with header `{"typ":"JWT","alg":"RS256"}`.
#[instrument(skip_all)]
pub fn sign_jwt(claims: &Claims, key: &EncodingKey) -> Result<String, SigningError> {
    let header = Header::new(JWT_ALGORITHM);

    encode(&header, claims, key)
        .map_err(|e| SigningError::Encoding(format!("JWT signing operation failed: {}", e)))
}

/// Why a token was refused. Only used for logs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    TooLarge,
    Malformed,
    AlgorithmMismatch,
    SignatureMismatch,
    KeyUnavailable,
}

impl TokenRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenRejection::TooLarge => "too_large",
            TokenRejection::Malformed => "malformed",
            TokenRejection::AlgorithmMismatch => "algorithm_mismatch",
            TokenRejection::SignatureMismatch => "signature_mismatch",
            TokenRejection::KeyUnavailable => "key_unavailable",
        }
    }
}

/// Verify an RS256 token and return its claims.
///
/// Order of checks:
/// 1. Size (before any decoding)
/// 2. Header `alg` must be exactly `RS256`
/// 3. Signature
///
/// No `exp`, `nbf`, `aud`, `iss` or `sub` checks are made; tokens do not
/// expire.
#[instrument(skip_all)]
pub fn verify_jwt(token: &str, key: &DecodingKey) -> Result<Claims, TokenRejection> {
    use common::jwt::{extract_alg, JwtValidationError};

    let alg = extract_alg(token).map_err(|e| match e {
        JwtValidationError::TokenTooLarge => TokenRejection::TooLarge,
        JwtValidationError::MalformedToken | JwtValidationError::MissingAlgorithm => {
            TokenRejection::Malformed
        }
    })?;

    if alg != "RS256" {
        tracing::debug!(target: "notify.crypto", alg = %alg, "Token rejected: algorithm not allowed");
        return Err(TokenRejection::AlgorithmMismatch);
    }

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, key, &validation).map_err(|e| {
        tracing::debug!(target: "notify.crypto", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::InvalidSignature => TokenRejection::SignatureMismatch,
            ErrorKind::InvalidAlgorithm => TokenRejection::AlgorithmMismatch,
            _ => TokenRejection::Malformed,
        }
    })?;

    Ok(data.claims)
}
