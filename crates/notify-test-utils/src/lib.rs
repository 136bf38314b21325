//! # Notify Test Utilities
//!
//! Shared test utilities for the notify service.
//!
//! This crate provides:
//! - Fixed RSA key fixtures (pre-generated 2048-bit keys, fast to load)
//! - Claim builders (TestTokenBuilder) including foreign-algorithm signing
//! - Server test harness (TestNotifyServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notify_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestNotifyServer::spawn().await?;
//!
//!     let claims = TestTokenBuilder::new().for_subject("alice").build();
//!     let token = server.issue_token(&claims)?;
//!
//!     token.assert_valid_jwt().assert_has_claim("sub", "alice");
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
