use notify_service::config::Config;
use notify_service::repositories::{InMemoryMessageStore, MessageStore, PgMessageStore};
use notify_service::routes::{self, AppState};
use notify_service::services::{KeyStore, TokenService};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notify_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Notify Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Metrics recorder must exist before anything records
    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics: {}", e);
        e
    })?;

    // Keys are loaded lazily on first use
    let key_store = Arc::new(KeyStore::new(config.key_store_config()));
    let tokens = TokenService::new(key_store);

    let store: Arc<dyn MessageStore> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .map_err(|e| {
                    error!("Failed to connect to database: {}", e);
                    e
                })?;

            let store = PgMessageStore::new(pool);
            store.ensure_schema().await.map_err(|e| {
                error!("Failed to prepare database schema: {}", e);
                e
            })?;

            info!("Database connection established");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; messages are kept in memory only");
            Arc::new(InMemoryMessageStore::new())
        }
    };

    let state = Arc::new(AppState { store, tokens });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Notify Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
