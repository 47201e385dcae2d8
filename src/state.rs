//! Shared application state for Axum handlers.
//!
//! Every field is either `Arc`-wrapped or cheap to clone, so cloning the
//! state per request only bumps reference counts.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::error::AppResult;
use crate::http_client::PropagatingClient;
use crate::services::{ArticleService, AuthService, TodoService};
use crate::storage::MemoryStore;

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backing store shared by all services
    pub store: Arc<MemoryStore>,
    /// Token signing and verification keys
    pub jwt: Arc<JwtKeys>,
    pub auth: AuthService,
    pub todos: TodoService,
    pub articles: ArticleService,
    /// Outbound client that forwards the correlation id
    pub http: PropagatingClient,
    /// Timestamp when the application started
    pub started_at: Instant,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create application state with an empty store.
    ///
    /// # Errors
    ///
    /// `AppError::ConfigError` if the outbound HTTP client can't be built.
    pub fn new(config: Config) -> AppResult<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create application state over an existing store.
    pub fn with_store(config: Config, store: Arc<MemoryStore>) -> AppResult<Self> {
        let jwt = Arc::new(JwtKeys::from_config(&config));
        let http = PropagatingClient::new(config.outbound_timeout)?;

        Ok(Self {
            auth: AuthService::new(store.clone(), jwt.clone(), config.bcrypt_cost),
            todos: TodoService::new(store.clone()),
            articles: ArticleService::new(store.clone()),
            store,
            jwt,
            http,
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
