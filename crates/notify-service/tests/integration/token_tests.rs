//! Integration tests for token issuance and verification
//!
//! Verification must accept exactly the RS256 tokens signed by the store's
//! private key, and reject everything else without an error escaping.

use jsonwebtoken::Algorithm;
use notify_service::crypto::{Claims, KeyPair, RSA_KEY_BITS};
use notify_service::services::{KeyStore, KeyStoreConfig, TokenService};
use notify_test_utils::{
    other_key_pair, replace_payload, signature_len, tamper_signature, tamper_signature_at,
    test_key_pair, test_key_password, write_test_keys, TestTokenBuilder, TokenAssertions,
    TEST_PUBLIC_KEY_PEM,
};
use rsa::traits::PublicKeyParts;
use rsa::BigUint;
use serde_json::json;
use std::sync::Arc;
use std::thread;

// ============================================================================
// Helper Functions
// ============================================================================

/// Token service over fixture key A written into `dir`
fn fixture_service(dir: &std::path::Path) -> Result<TokenService, anyhow::Error> {
    let config = write_test_keys(dir)?;
    Ok(TokenService::new(Arc::new(KeyStore::new(config))))
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_issue_then_verify_returns_claims() -> Result<(), anyhow::Error> {
    // Arrange
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let claims = TestTokenBuilder::new()
        .for_subject("alice")
        .with_claim("admin", json!(false))
        .with_claim("count", json!(42))
        .with_claim("nested", json!({ "list": [1, "two", null], "name": "Zoë" }))
        .build();

    // Act
    let token = tokens.issue(&claims)?;
    let verified = tokens.verify(&token);

    // Assert
    token
        .assert_valid_jwt()
        .assert_has_claim("sub", "alice")
        .assert_lacks_claim("exp");
    assert_eq!(verified, Some(claims), "Claims should survive the round trip");

    Ok(())
}

#[test]
fn test_empty_claims_round_trip() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;

    let token = tokens.issue(&Claims::new())?;

    assert_eq!(tokens.verify(&token), Some(Claims::new()));
    Ok(())
}

#[test]
fn test_past_exp_claim_is_not_enforced() -> Result<(), anyhow::Error> {
    // Tokens carry no lifetime; exp is ordinary data
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let claims = TestTokenBuilder::new().with_claim("exp", json!(1)).build();

    let token = tokens.issue(&claims)?;

    assert_eq!(tokens.verify(&token), Some(claims));
    Ok(())
}

#[test]
fn test_generated_key_pair_signs_and_verifies() -> Result<(), anyhow::Error> {
    // Arrange: full-size generated key, persisted and reloaded
    let dir = tempfile::tempdir()?;
    let pair = KeyPair::generate()?;
    assert_eq!(pair.modulus_bits(), RSA_KEY_BITS);
    assert_eq!(pair.public_key().e(), &BigUint::from(65537u32));

    let config = KeyStoreConfig::new(dir.path().join("key.pem"), dir.path().join("key.pub"))
        .with_password(test_key_password());
    KeyStore::persist_private(
        pair.private_key(),
        &config.private_key_path,
        &test_key_password(),
    )?;
    KeyStore::persist_public(pair.public_key(), &config.public_key_path)?;
    let tokens = TokenService::new(Arc::new(KeyStore::new(config)));

    // Act
    let claims = TestTokenBuilder::empty().for_subject("alice").build();
    let token = tokens.issue(&claims)?;

    // Assert
    assert_eq!(tokens.verify(&token), Some(claims));
    Ok(())
}

// ============================================================================
// Tampering
// ============================================================================

#[test]
fn test_tampered_signature_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let token = tokens.issue(&TestTokenBuilder::new().build())?;

    assert!(tokens.verify(&tamper_signature(&token)).is_none());
    Ok(())
}

#[test]
fn test_flipping_any_signature_byte_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let token = tokens.issue(&TestTokenBuilder::new().build())?;
    let len = signature_len(&token);
    assert_eq!(len, test_key_pair()?.modulus_bits() / 8);

    for index in 0..len {
        assert!(
            tokens.verify(&tamper_signature_at(&token, index)).is_none(),
            "Token with signature byte {} flipped must be rejected",
            index
        );
    }
    assert!(tokens.verify(&token).is_some());
    Ok(())
}

#[test]
fn test_swapped_payload_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let token = tokens.issue(&TestTokenBuilder::new().for_subject("alice").build())?;

    let forged = replace_payload(&token, &TestTokenBuilder::new().for_subject("mallory").build());

    assert!(tokens.verify(&forged).is_none());
    Ok(())
}

#[test]
fn test_token_signed_by_unrelated_key_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let other = other_key_pair()?;

    let token = TestTokenBuilder::new().sign_rsa(Algorithm::RS256, other.private_key());

    assert!(tokens.verify(&token).is_none());
    Ok(())
}

// ============================================================================
// Algorithm Pinning
// ============================================================================

#[test]
fn test_other_rsa_algorithms_with_same_key_are_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let pair = test_key_pair()?;

    for algorithm in [
        Algorithm::RS384,
        Algorithm::RS512,
        Algorithm::PS256,
        Algorithm::PS384,
        Algorithm::PS512,
    ] {
        let token = TestTokenBuilder::new().sign_rsa(algorithm, pair.private_key());
        assert!(
            tokens.verify(&token).is_none(),
            "{:?} token signed with the service key must be rejected",
            algorithm
        );
    }
    Ok(())
}

#[test]
fn test_hs256_keyed_with_public_key_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;

    let token = TestTokenBuilder::new().sign_hs256(TEST_PUBLIC_KEY_PEM.as_bytes());

    assert!(tokens.verify(&token).is_none());
    Ok(())
}

#[test]
fn test_unsigned_token_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;

    let token = TestTokenBuilder::new().unsigned();

    assert!(tokens.verify(&token).is_none());
    Ok(())
}

// ============================================================================
// Malformed Input
// ============================================================================

#[test]
fn test_malformed_tokens_are_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;

    for token in ["", "abc", "a.b", "a.b.c", "...", "not base64!.x.y"] {
        assert!(
            tokens.verify(token).is_none(),
            "Malformed token {:?} must be rejected",
            token
        );
    }
    Ok(())
}

#[test]
fn test_oversized_token_is_rejected() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;
    let claims = TestTokenBuilder::new()
        .with_claim("padding", json!("x".repeat(common::jwt::MAX_JWT_SIZE_BYTES)))
        .build();

    // Issuing does not cap size; verification does
    let token = tokens.issue(&claims)?;
    assert!(token.len() > common::jwt::MAX_JWT_SIZE_BYTES);

    assert!(tokens.verify(&token).is_none());
    Ok(())
}

#[test]
fn test_missing_public_key_rejects_instead_of_failing() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let signer = fixture_service(dir.path())?;
    let token = signer.issue(&TestTokenBuilder::new().build())?;

    let config = KeyStoreConfig::new(dir.path().join("key.pem"), dir.path().join("gone.pub"));
    let verifier = TokenService::new(Arc::new(KeyStore::new(config)));

    assert!(verifier.verify(&token).is_none());
    Ok(())
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_issue_and_verify() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let tokens = fixture_service(dir.path())?;

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let tokens = tokens.clone();
            thread::spawn(move || {
                let claims = TestTokenBuilder::new().with_claim("n", json!(i)).build();
                let token = tokens.issue(&claims).expect("issue should succeed");
                tokens.verify(&token) == Some(claims)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("worker panicked"));
    }
    assert_eq!(tokens.key_store().private_key_loads(), 1);
    assert_eq!(tokens.key_store().public_key_loads(), 1);
    Ok(())
}
