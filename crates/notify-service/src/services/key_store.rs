//! RSA key storage and lazy loading.
//!
//! A [`KeyStore`] owns at most one private and one public key for its
//! lifetime. Each is loaded on first use and cached; concurrent first callers
//! block on the single in-flight load. A failed load is reported to the caller
//! that triggered it and leaves the cache empty.

use crate::crypto::{self, pem, pem::KeyHandle, KeyPair};
use crate::errors::KeyError;
use crate::observability::metrics::record_key_load;
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{DecodingKey, EncodingKey};
use once_cell::sync::OnceCell;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, instrument, warn};

/// Development-only password used when none is configured.
pub const DEFAULT_KEY_PASSWORD: &str = "Prototype";

/// Where the keys live and how to unlock them.
#[derive(Debug, Clone)]
pub struct KeyStoreConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub password: Option<SecretString>,
    /// Literal public key PEM; takes precedence over `public_key_path`.
    pub public_key_pem: Option<String>,
}

impl KeyStoreConfig {
    pub fn new(private_key_path: impl Into<PathBuf>, public_key_path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            public_key_path: public_key_path.into(),
            password: None,
            public_key_pem: None,
        }
    }

    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    pub fn with_public_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.public_key_pem = Some(pem.into());
        self
    }
}

/// Cached private key: unencrypted PEM plus the derived signing key.
pub struct PrivateKeyMaterial {
    pem: SecretString,
    signing_key: EncodingKey,
}

impl PrivateKeyMaterial {
    pub fn pem(&self) -> &SecretString {
        &self.pem
    }

    pub fn signing_key(&self) -> &EncodingKey {
        &self.signing_key
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyMaterial")
            .field("pem", &"[REDACTED]")
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeySource {
    /// From the configured literal PEM.
    Configured,
    /// From the public key file.
    File,
}

/// Cached public key: PEM, parsed key and the derived verification key.
pub struct PublicKeyMaterial {
    pem: String,
    key: RsaPublicKey,
    verifying_key: DecodingKey,
    source: PublicKeySource,
}

impl PublicKeyMaterial {
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn key(&self) -> &RsaPublicKey {
        &self.key
    }

    pub fn verifying_key(&self) -> &DecodingKey {
        &self.verifying_key
    }

    pub fn source(&self) -> PublicKeySource {
        self.source
    }
}

impl fmt::Debug for PublicKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyMaterial")
            .field("pem", &self.pem)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

pub struct KeyStore {
    config: KeyStoreConfig,
    password: OnceCell<SecretString>,
    private: OnceCell<PrivateKeyMaterial>,
    public: OnceCell<PublicKeyMaterial>,
    private_loads: AtomicUsize,
    public_loads: AtomicUsize,
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("private_key_path", &self.config.private_key_path)
            .field("public_key_path", &self.config.public_key_path)
            .field("private_loaded", &self.private.get().is_some())
            .field("public_loaded", &self.public.get().is_some())
            .finish()
    }
}

impl KeyStore {
    pub fn new(config: KeyStoreConfig) -> Self {
        Self {
            config,
            password: OnceCell::new(),
            private: OnceCell::new(),
            public: OnceCell::new(),
            private_loads: AtomicUsize::new(0),
            public_loads: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    /// Generate a fresh 4096-bit RSA pair (exponent 65537).
    pub fn generate() -> Result<KeyPair, KeyError> {
        KeyPair::generate()
    }

    /// Write `key` as password-protected PKCS#8 PEM.
    ///
    /// Parent directories are created. On Unix the file is created `0600`.
    #[instrument(skip_all)]
    pub fn persist_private(
        key: &RsaPrivateKey,
        path: &Path,
        password: &SecretString,
    ) -> Result<(), KeyError> {
        let pem = pem::serialize_private_encrypted(key, password)?;
        write_key_file(path, pem.expose_secret().as_bytes(), true)?;

        info!(target: "notify.keys", path = %path.display(), "Persisted encrypted private key");
        Ok(())
    }

    /// Write `key` as SubjectPublicKeyInfo PEM.
    #[instrument(skip_all)]
    pub fn persist_public(key: &RsaPublicKey, path: &Path) -> Result<(), KeyError> {
        let pem = pem::serialize_public(key)?;
        write_key_file(path, pem.as_bytes(), false)?;

        info!(target: "notify.keys", path = %path.display(), "Persisted public key");
        Ok(())
    }

    /// The password used to decrypt the private key.
    ///
    /// Resolved once: the configured value, otherwise [`DEFAULT_KEY_PASSWORD`]
    /// with a single warning.
    pub fn resolve_password(&self) -> &SecretString {
        self.password.get_or_init(|| match &self.config.password {
            Some(password) => {
                info!(target: "notify.keys", "Using configured key password");
                password.clone()
            }
            None => {
                warn!(
                    target: "notify.keys",
                    "Using default key password; set KEY_PASSWORD outside development"
                );
                SecretString::from(DEFAULT_KEY_PASSWORD)
            }
        })
    }

    /// The process-wide private key, loading and decrypting it on first use.
    #[instrument(skip_all)]
    pub fn load_private(&self) -> Result<&PrivateKeyMaterial, KeyError> {
        self.private.get_or_try_init(|| {
            self.private_loads.fetch_add(1, Ordering::SeqCst);

            let result = self.read_private();
            match &result {
                Ok(_) => {
                    record_key_load("private", "success");
                    info!(
                        target: "notify.keys",
                        path = %self.config.private_key_path.display(),
                        "Loaded private key"
                    );
                }
                Err(e) => {
                    record_key_load("private", "error");
                    warn!(target: "notify.keys", error = %e, "Failed to load private key");
                }
            }
            result
        })
    }

    /// The process-wide public key: configured PEM if present, else the file.
    #[instrument(skip_all)]
    pub fn load_public(&self) -> Result<&PublicKeyMaterial, KeyError> {
        self.public.get_or_try_init(|| {
            self.public_loads.fetch_add(1, Ordering::SeqCst);

            let result = self.read_public();
            match &result {
                Ok(material) => {
                    record_key_load("public", "success");
                    info!(target: "notify.keys", source = ?material.source, "Loaded public key");
                }
                Err(e) => {
                    record_key_load("public", "error");
                    warn!(target: "notify.keys", error = %e, "Failed to load public key");
                }
            }
            result
        })
    }

    /// Number of private key load attempts made by this store.
    pub fn private_key_loads(&self) -> usize {
        self.private_loads.load(Ordering::SeqCst)
    }

    /// Number of public key load attempts made by this store.
    pub fn public_key_loads(&self) -> usize {
        self.public_loads.load(Ordering::SeqCst)
    }

    fn read_private(&self) -> Result<PrivateKeyMaterial, KeyError> {
        let path = &self.config.private_key_path;
        let text = SecretString::from(read_key_file(path)?);
        let key = pem::parse_private(text.expose_secret(), self.resolve_password())?;

        let signing_key = crypto::signing_key(&key)?;
        let pem = KeyHandle::Private(key).to_pem_string()?;

        Ok(PrivateKeyMaterial { pem, signing_key })
    }

    fn read_public(&self) -> Result<PublicKeyMaterial, KeyError> {
        let (text, source) = match &self.config.public_key_pem {
            Some(configured) => {
                debug!(target: "notify.keys", "Using configured public key");
                (configured.clone(), PublicKeySource::Configured)
            }
            None => (
                read_key_file(&self.config.public_key_path)?,
                PublicKeySource::File,
            ),
        };

        let key = pem::parse_public(&text)?;
        let verifying_key = crypto::verifying_key(&key)?;
        let pem = KeyHandle::Public(key.clone()).to_pem_string()?;

        Ok(PublicKeyMaterial {
            pem: pem.expose_secret().to_string(),
            key,
            verifying_key,
            source,
        })
    }
}

fn read_key_file(path: &Path) -> Result<String, KeyError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            KeyError::KeyNotFound {
                path: path.to_path_buf(),
            }
        } else {
            KeyError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

fn write_key_file(path: &Path, contents: &[u8], private: bool) -> Result<(), KeyError> {
    let io_err = |source: io::Error| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path).map_err(io_err)?;

    // `mode` only applies on create; an overwritten file keeps its old bits.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if private {
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }
    }

    file.write_all(contents).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;

    Ok(())
}
