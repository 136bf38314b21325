//! Secret wrappers for key passwords and private key material.
//!
//! Re-exports [`secrecy`] so every crate in the workspace agrees on one set of
//! types. `SecretString` and `SecretBox<T>` redact themselves in `Debug`, so a
//! struct that derives `Debug` over a secret field is still safe to log.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct KeySettings {
//!     private_key_path: String,
//!     password: SecretString,
//! }
//!
//! let settings = KeySettings {
//!     private_key_path: "key/key.pem".to_string(),
//!     password: SecretString::from("hunter2"),
//! };
//!
//! assert!(!format!("{settings:?}").contains("hunter2"));
//! assert_eq!(settings.password.expose_secret(), "hunter2");
//! ```
//!
//! Use `SecretString` for the private-key password and for PEM text of
//! private keys. Public keys and tokens are not secrets here.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
