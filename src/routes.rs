//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  Request Logger  │ ← X-Request-Id, correlation context, access log
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← Span per request carrying request_id
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Preflights answered before the key check
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   API Key Gate   │ ← 401/429 (bypassed for /health)
//! └────────┬─────────┘
//!          ▼
//! ┌──────────────────┐
//! │   Body Limit     │
//! └────────┬─────────┘
//!          ▼
//!      Handler
//! ```
//!
//! # Route Groups
//!
//! - `/health` - Health check
//! - `/auth/*` - Registration, login, token lifecycle and profile
//! - `/todos` - The caller's todos (bearer auth)
//! - `/articles` - Public reads, authenticated writes, propagation demo

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{ApiKeyAuth, RequestIdExt, RequestLoggerLayer};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// - **API key gate**: enabled if `API_KEYS` is set
/// - **CORS**: configured from `cors_allowed_origins`
/// - **Body limit**: `max_request_body_size`
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let auth_routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh-token", post(handlers::refresh_token))
        .route("/logout", post(handlers::logout))
        .route("/protected", post(handlers::protected))
        .route(
            "/profile",
            get(handlers::profile).put(handlers::update_profile),
        );

    let todo_routes = Router::new()
        .route("/", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        );

    let article_routes = Router::new()
        .route(
            "/",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/proxy", get(handlers::proxy))
        .route("/headers-echo", get(handlers::headers_echo))
        .route(
            "/{id}",
            get(handlers::get_article)
                .put(handlers::update_article)
                .delete(handlers::delete_article),
        );

    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/auth", auth_routes)
        .nest("/todos", todo_routes)
        .nest("/articles", article_routes);

    // =========================================================================
    // Apply Middleware Stack (each layer wraps the ones before it)
    // =========================================================================

    info!(
        max_size_bytes = config.max_request_body_size,
        "Request body size limit configured"
    );
    router = router.layer(DefaultBodyLimit::max(config.max_request_body_size));

    let auth_layer = ApiKeyAuth::new(config.api_keys.clone(), config.auth_bypass_paths.clone());
    if auth_layer.is_enabled() {
        info!(
            keys = config.api_keys.len(),
            bypass = ?config.auth_bypass_paths,
            "API key gate enabled"
        );
        router = router.layer(auth_layer);
    } else {
        info!("API key gate disabled (no API_KEYS set)");
    }

    router = router.layer(build_cors_layer(&config.cors_allowed_origins));

    router = router.layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let request_id = req.request_id().unwrap_or_default();
        tracing::info_span!(
            "request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id,
        )
    }));

    router = router.layer(RequestLoggerLayer::new());

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// `*` anywhere in the list allows any origin; otherwise unparsable origins
/// are skipped.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
