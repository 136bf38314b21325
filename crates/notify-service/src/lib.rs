//! Notify Service Library
//!
//! A small message-record API whose write path is gated by RS256 tokens.
//! The interesting parts are key handling and token verification:
//!
//! - `crypto` - RSA key pairs, PEM conversion, RS256 sign/verify primitives
//! - `services::key_store` - key generation, persistence and lazy loading
//! - `services::token_service` - token issuance and verification
//! - `middleware::auth` - the `token` header gate
//!
//! The rest (`handlers`, `repositories`, `routes`) is a thin HTTP and storage
//! shell around them.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
