//! # Todo/Article API
//!
//! A REST backend for per-user todos and public articles, built with Axum,
//! featuring:
//!
//! - **Authentication**: bcrypt passwords, HS256 access/refresh tokens,
//!   single active refresh token per user
//! - **Authorization**: owner-or-admin rule for every mutation
//! - **Correlation**: per-request `X-Request-Id`, carried through async
//!   continuations and onto outbound HTTP calls
//! - **Security**: optional API key gate with failure limiting
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request Logger → Trace → CORS → API Key)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, auth, todos, articles)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Services (AuthService, TodoService, ArticleService)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MemoryStore (users, todos, articles)                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use todo_article_api::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::new(config)?;
//!     let app = build_router(state);
//!
//!     // Start the server...
//!     # let _ = app;
//!     Ok(())
//! }
//! ```
//!
//! ## Security Configuration
//!
//! Require an API key on every route except `/health`:
//! ```bash
//! API_KEYS=key-one,key-two cargo run
//! ```

pub mod auth;
pub mod authz;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod http_client;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use http_client::PropagatingClient;
pub use routes::build_router;
pub use state::AppState;
pub use storage::MemoryStore;
