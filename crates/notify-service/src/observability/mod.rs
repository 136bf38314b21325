//! Observability for the notify service
//!
//! Instrumented functions use `#[instrument(skip_all)]` and record only safe
//! fields. Fields fall into two groups:
//! - **SAFE**: may be logged (enums, paths, counts, algorithm names)
//! - **NEVER**: must not appear in logs (passwords, private keys, tokens)
//!
//! Claims are caller data and are not logged either.

pub mod metrics;

pub use metrics::{record_key_load, record_token_issuance, record_token_validation};
