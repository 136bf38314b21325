//! Test server harness for E2E testing
//!
//! Provides TestNotifyServer for spawning real notify server instances in
//! tests, backed by the in-memory message store and fixture keys.

use crate::crypto_fixtures::write_test_keys;
use notify_service::crypto::Claims;
use notify_service::middleware::auth::TOKEN_HEADER;
use notify_service::repositories::{InMemoryMessageStore, MessageStore};
use notify_service::routes::{self, AppState};
use notify_service::services::{KeyStore, KeyStoreConfig, TokenService};
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Test harness for spawning the notify service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_message_e2e() -> Result<()> {
///     let server = TestNotifyServer::spawn().await?;
///     let token = server.issue_token(&TestTokenBuilder::new().build())?;
///
///     let response = server.post_message(Some(&token), &message).await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestNotifyServer {
    addr: SocketAddr,
    tokens: TokenService,
    store: Arc<InMemoryMessageStore>,
    client: reqwest::Client,
    _key_dir: TempDir,
    handle: JoinHandle<()>,
}

impl TestNotifyServer {
    /// Spawn a new test server instance with fixture key A
    ///
    /// The server will:
    /// - Write the fixture keys into a fresh temporary directory
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let key_dir = tempfile::tempdir()
            .map_err(|e| anyhow::anyhow!("Failed to create key directory: {}", e))?;
        let config = write_test_keys(key_dir.path())?;

        Self::spawn_with(key_dir, config).await
    }

    /// Spawn a server whose key store uses `config` as given.
    ///
    /// `key_dir` is kept alive for the lifetime of the server; pass the
    /// directory the config points into.
    pub async fn spawn_with(
        key_dir: TempDir,
        config: KeyStoreConfig,
    ) -> Result<Self, anyhow::Error> {
        let tokens = TokenService::new(Arc::new(KeyStore::new(config)));
        let store = Arc::new(InMemoryMessageStore::new());

        // Create application state
        let state = Arc::new(AppState {
            store: store.clone() as Arc<dyn MessageStore>,
            tokens: tokens.clone(),
        });

        // Initialize metrics recorder for test server
        // Note: This may fail if already installed in the test process.
        // In that case, we create a new recorder without installing it globally.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let recorder = PrometheusBuilder::new().build_recorder();
                recorder.handle()
            }
        };

        // Build routes using notify-service's real route builder
        let app = routes::build_routes(state, metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            tokens,
            store,
            client: reqwest::Client::new(),
            _key_dir: key_dir,
            handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The token service the server verifies with
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// The server's message store, for seeding and inspection
    pub fn store(&self) -> &Arc<InMemoryMessageStore> {
        &self.store
    }

    /// Shared HTTP client for requests against this server
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// URL of the message collection
    pub fn messages_url(&self) -> String {
        format!("{}/api/v1/messages", self.url())
    }

    /// POST `body` to the message collection, with `token` in the `token`
    /// header when given.
    pub async fn post_message(
        &self,
        token: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let mut request = self.client.post(self.messages_url()).json(body);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }

        request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to post message: {}", e))
    }

    /// Issue a token the server will accept
    ///
    /// # Example
    /// ```rust,ignore
    /// let token = server.issue_token(&TestTokenBuilder::new().for_subject("alice").build())?;
    /// ```
    pub fn issue_token(&self, claims: &Claims) -> Result<String, anyhow::Error> {
        Ok(self.tokens.issue(claims)?)
    }
}

impl Drop for TestNotifyServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
