//! PEM conversion for RSA keys.
//!
//! Private keys are PKCS#8 (`PRIVATE KEY`, or `ENCRYPTED PRIVATE KEY` using
//! PBES2 with scrypt and AES-256-CBC). Public keys are SubjectPublicKeyInfo
//! (`PUBLIC KEY`). Private PEM text is always returned as a [`SecretString`].

use crate::errors::KeyError;
use common::secret::{ExposeSecret, SecretString};
use rand::rngs::OsRng;
use rsa::pkcs8::{
    DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey,
    EncryptedPrivateKeyInfo, LineEnding, SecretDocument,
};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::instrument;

const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const ENCRYPTED_PRIVATE_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// A key of either role, for callers that handle both uniformly.
#[derive(Clone)]
pub enum KeyHandle {
    Private(RsaPrivateKey),
    Public(RsaPublicKey),
}

impl KeyHandle {
    /// PEM text suitable for handing to token signing or verification.
    ///
    /// Private keys come out unencrypted; persist them with
    /// [`serialize_private_encrypted`] instead.
    pub fn to_pem_string(&self) -> Result<SecretString, KeyError> {
        match self {
            KeyHandle::Private(key) => serialize_private(key),
            KeyHandle::Public(key) => serialize_public(key).map(SecretString::from),
        }
    }
}

impl std::fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyHandle::Private(_) => f.write_str("KeyHandle::Private([REDACTED])"),
            KeyHandle::Public(_) => f.write_str("KeyHandle::Public"),
        }
    }
}

/// Unencrypted PKCS#8 PEM. In-memory use only.
#[instrument(skip_all)]
pub fn serialize_private(key: &RsaPrivateKey) -> Result<SecretString, KeyError> {
    let pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(format!("PKCS#8 encoding failed: {}", e)))?;
    Ok(SecretString::from(pem.as_str()))
}

/// Password-protected PKCS#8 PEM, the only form written to disk.
#[instrument(skip_all)]
pub fn serialize_private_encrypted(
    key: &RsaPrivateKey,
    password: &SecretString,
) -> Result<SecretString, KeyError> {
    let pem = key
        .to_pkcs8_encrypted_pem(&mut OsRng, password.expose_secret().as_bytes(), LineEnding::LF)
        .map_err(|e| KeyError::Encoding(format!("PKCS#8 encryption failed: {}", e)))?;
    Ok(SecretString::from(pem.as_str()))
}

/// SubjectPublicKeyInfo PEM.
pub fn serialize_public(key: &RsaPublicKey) -> Result<String, KeyError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::Encoding(format!("SPKI encoding failed: {}", e)))
}

/// Parse a private key, decrypting it with `password` when it is encrypted.
///
/// An unencrypted `PRIVATE KEY` is accepted and the password ignored. A wrong
/// password always yields [`KeyError::DecryptionFailed`], including when the
/// decrypted bytes happen to unpad cleanly but are not a key.
#[instrument(skip_all)]
pub fn parse_private(text: &str, password: &SecretString) -> Result<RsaPrivateKey, KeyError> {
    let (label, document) = SecretDocument::from_pem(text)
        .map_err(|e| KeyError::MalformedKey(format!("invalid PEM: {}", e)))?;

    match label {
        ENCRYPTED_PRIVATE_KEY_LABEL => {
            let info = EncryptedPrivateKeyInfo::try_from(document.as_bytes())
                .map_err(|e| KeyError::MalformedKey(format!("invalid encrypted key: {}", e)))?;

            let decrypted = info
                .decrypt(password.expose_secret().as_bytes())
                .map_err(|e| {
                    tracing::debug!(target: "notify.crypto", error = %e, "Private key decryption failed");
                    KeyError::DecryptionFailed
                })?;

            RsaPrivateKey::from_pkcs8_der(decrypted.as_bytes()).map_err(|e| {
                tracing::debug!(target: "notify.crypto", error = %e, "Decrypted bytes are not a private key");
                KeyError::DecryptionFailed
            })
        }
        PRIVATE_KEY_LABEL => RsaPrivateKey::from_pkcs8_der(document.as_bytes())
            .map_err(|e| KeyError::MalformedKey(format!("invalid PKCS#8 key: {}", e))),
        other => Err(KeyError::MalformedKey(format!(
            "unexpected PEM label '{}'",
            other
        ))),
    }
}

/// Parse a SubjectPublicKeyInfo PEM.
pub fn parse_public(text: &str) -> Result<RsaPublicKey, KeyError> {
    RsaPublicKey::from_public_key_pem(text)
        .map_err(|e| KeyError::MalformedKey(format!("invalid public key: {}", e)))
}
