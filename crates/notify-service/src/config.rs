use crate::services::key_store::KeyStoreConfig;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "key/key.pem";
pub const DEFAULT_PUBLIC_KEY_PATH: &str = "key/key.pub";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL for message storage. Unset means in-memory storage.
    pub database_url: Option<String>,
    pub bind_address: String,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub key_password: Option<SecretString>,
    /// Literal public key PEM that overrides `public_key_path`.
    pub client_public_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars.get("DATABASE_URL").cloned();

        let bind_address = match (vars.get("BIND_ADDRESS"), vars.get("PORT")) {
            (Some(addr), _) => addr.clone(),
            (None, Some(port)) => {
                let port: u16 = port.parse().map_err(|_| ConfigError::InvalidValue {
                    name: "PORT".to_string(),
                    reason: format!("'{port}' is not a valid port number"),
                })?;
                format!("0.0.0.0:{port}")
            }
            (None, None) => DEFAULT_BIND_ADDRESS.to_string(),
        };

        let private_key_path = vars
            .get("PRIVATE_KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEY_PATH));

        let public_key_path = vars
            .get("PUBLIC_KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_KEY_PATH));

        let key_password = vars
            .get("KEY_PASSWORD")
            .map(|p| SecretString::from(p.as_str()));

        let allow_default_password = match vars.get("ALLOW_DEFAULT_KEY_PASSWORD") {
            None => true,
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
                name: "ALLOW_DEFAULT_KEY_PASSWORD".to_string(),
                reason: format!("expected true or false, got '{raw}'"),
            })?,
        };

        if key_password.is_none() && !allow_default_password {
            return Err(ConfigError::MissingEnvVar("KEY_PASSWORD".to_string()));
        }

        let client_public_key = vars.get("CLIENT_PUBLIC_KEY").cloned();

        Ok(Config {
            database_url,
            bind_address,
            private_key_path,
            public_key_path,
            key_password,
            client_public_key,
        })
    }

    /// Key locations and secrets for the service's [`KeyStore`](crate::services::key_store::KeyStore).
    pub fn key_store_config(&self) -> KeyStoreConfig {
        KeyStoreConfig {
            private_key_path: self.private_key_path.clone(),
            public_key_path: self.public_key_path.clone(),
            password: self.key_password.clone(),
            public_key_pem: self.client_public_key.clone(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
