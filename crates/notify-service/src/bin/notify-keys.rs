//! Key and token tooling for the notify service (`notify-keys`).
//!
//! Reads the same environment as the service (`KEY_PASSWORD`,
//! `PRIVATE_KEY_PATH`, `PUBLIC_KEY_PATH`, `CLIENT_PUBLIC_KEY`).

use anyhow::{bail, ensure, Context};
use clap::{Parser, Subcommand};
use notify_service::config::Config;
use notify_service::crypto::Claims;
use notify_service::services::{KeyStore, KeyStoreConfig, TokenService};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "notify-keys")]
#[command(author, version, about = "Key pair and token tooling for the notify service", long_about = None)]
struct Cli {
    /// Encrypted private key file (overrides PRIVATE_KEY_PATH)
    #[arg(long, global = true)]
    private_key: Option<PathBuf>,

    /// Public key file (overrides PUBLIC_KEY_PATH)
    #[arg(long, global = true)]
    public_key: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a 4096-bit key pair and write both files
    Generate {
        /// Overwrite existing key files
        #[arg(long)]
        force: bool,
    },

    /// Sign a JSON object of claims and print the token
    Issue {
        /// Claims as a JSON object, e.g. '{"sub":"alice"}'
        #[arg(long)]
        claims: String,
    },

    /// Verify a token and print its claims
    Verify {
        token: String,
    },

    /// Print the public key in PEM format
    ShowPublic,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notify_service=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let mut key_config = config.key_store_config();
    if let Some(path) = cli.private_key {
        key_config.private_key_path = path;
    }
    if let Some(path) = cli.public_key {
        key_config.public_key_path = path;
    }

    match cli.command {
        Commands::Generate { force } => generate(key_config, force),
        Commands::Issue { claims } => issue(key_config, &claims),
        Commands::Verify { token } => verify(key_config, &token),
        Commands::ShowPublic => show_public(key_config),
    }
}

fn generate(mut key_config: KeyStoreConfig, force: bool) -> anyhow::Result<()> {
    // The freshly written file is what gets checked, not a configured PEM.
    key_config.public_key_pem = None;

    if !force {
        for path in [&key_config.private_key_path, &key_config.public_key_path] {
            if path.exists() {
                bail!("{} already exists; pass --force to overwrite", path.display());
            }
        }
    }

    let pair = KeyStore::generate()?;
    let store = KeyStore::new(key_config.clone());

    KeyStore::persist_private(
        pair.private_key(),
        &key_config.private_key_path,
        store.resolve_password(),
    )?;
    KeyStore::persist_public(pair.public_key(), &key_config.public_key_path)?;

    // Read both back to prove the files round-trip.
    store
        .load_private()
        .context("Written private key could not be read back")?;
    let public = store
        .load_public()
        .context("Written public key could not be read back")?;
    ensure!(
        public.key() == pair.public_key(),
        "Written public key does not match the generated key"
    );

    eprintln!(
        "Wrote {} and {}",
        key_config.private_key_path.display(),
        key_config.public_key_path.display()
    );
    print!("{}", public.pem());
    Ok(())
}

fn issue(key_config: KeyStoreConfig, claims: &str) -> anyhow::Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(claims).context("Claims must be valid JSON")?;
    let claims: Claims = match value {
        serde_json::Value::Object(map) => map,
        _ => bail!("Claims must be a JSON object"),
    };

    let tokens = TokenService::new(Arc::new(KeyStore::new(key_config)));
    let token = tokens.issue(&claims)?;

    println!("{token}");
    Ok(())
}

fn verify(key_config: KeyStoreConfig, token: &str) -> anyhow::Result<()> {
    let tokens = TokenService::new(Arc::new(KeyStore::new(key_config)));

    match tokens.verify(token.trim()) {
        Some(claims) => {
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(())
        }
        None => bail!("invalid token"),
    }
}

fn show_public(key_config: KeyStoreConfig) -> anyhow::Result<()> {
    let store = KeyStore::new(key_config);
    let public = store.load_public()?;

    print!("{}", public.pem());
    Ok(())
}
