pub mod key_store;
pub mod token_service;

pub use key_store::{KeyStore, KeyStoreConfig};
pub use token_service::{TokenService, VerifiedClaims};
