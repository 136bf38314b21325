//! Fixed RSA key fixtures for testing
//!
//! Two pre-generated 2048-bit PKCS#8 key pairs. Loading them is instant,
//! unlike generating 4096-bit keys, and they never change between runs.
//! Key A is the "service" key; key B plays an unrelated party.

use common::secret::SecretString;
use notify_service::crypto::{pem, KeyPair};
use notify_service::errors::KeyError;
use notify_service::services::{KeyStore, KeyStoreConfig};
use std::path::Path;
use thiserror::Error;

/// Unencrypted private key A (`PRIVATE KEY`).
pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../../notify-service/tests/fixtures/key_a.pem");

/// Public half of key A (`PUBLIC KEY`).
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../../notify-service/tests/fixtures/key_a.pub");

/// Unencrypted private key B.
pub const OTHER_PRIVATE_KEY_PEM: &str =
    include_str!("../../notify-service/tests/fixtures/key_b.pem");

/// Public half of key B.
pub const OTHER_PUBLIC_KEY_PEM: &str = include_str!("../../notify-service/tests/fixtures/key_b.pub");

/// Password used whenever a fixture is written encrypted.
pub const TEST_KEY_PASSWORD: &str = "test-key-password";

/// File names used inside a fixture key directory.
pub const PRIVATE_KEY_FILE: &str = "key.pem";
pub const PUBLIC_KEY_FILE: &str = "key.pub";

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Key fixture failed: {0}")]
    Key(#[from] KeyError),

    #[error("Fixture I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Password for [`TEST_KEY_PASSWORD`] as a secret.
pub fn test_key_password() -> SecretString {
    SecretString::from(TEST_KEY_PASSWORD)
}

/// Key pair A.
pub fn test_key_pair() -> Result<KeyPair, FixtureError> {
    fixture_pair(TEST_PRIVATE_KEY_PEM)
}

/// Key pair B, unrelated to A.
pub fn other_key_pair() -> Result<KeyPair, FixtureError> {
    fixture_pair(OTHER_PRIVATE_KEY_PEM)
}

fn fixture_pair(private_pem: &str) -> Result<KeyPair, FixtureError> {
    // Unencrypted fixtures ignore the password.
    let private = pem::parse_private(private_pem, &test_key_password())?;
    Ok(KeyPair::from_private(private))
}

/// Write key A to `dir` unencrypted and return a matching store config.
///
/// The config carries [`TEST_KEY_PASSWORD`] so the default-password path is
/// not taken.
pub fn write_test_keys(dir: &Path) -> Result<KeyStoreConfig, FixtureError> {
    let config = fixture_config(dir);

    std::fs::write(&config.private_key_path, TEST_PRIVATE_KEY_PEM)?;
    std::fs::write(&config.public_key_path, TEST_PUBLIC_KEY_PEM)?;

    Ok(config)
}

/// Write key A to `dir` the way the service persists keys: private key
/// encrypted under [`TEST_KEY_PASSWORD`], public key as SPKI.
///
/// Encryption uses scrypt, so this is noticeably slower than
/// [`write_test_keys`].
pub fn write_encrypted_test_keys(dir: &Path) -> Result<KeyStoreConfig, FixtureError> {
    let config = fixture_config(dir);
    let pair = test_key_pair()?;

    KeyStore::persist_private(
        pair.private_key(),
        &config.private_key_path,
        &test_key_password(),
    )?;
    KeyStore::persist_public(pair.public_key(), &config.public_key_path)?;

    Ok(config)
}

fn fixture_config(dir: &Path) -> KeyStoreConfig {
    KeyStoreConfig::new(dir.join(PRIVATE_KEY_FILE), dir.join(PUBLIC_KEY_FILE))
        .with_password(test_key_password())
}
