use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use todo_article_api::{AppState, Config, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Logging settings come from the config, so it is loaded first and any
    // error is reported once the subscriber is installed.
    let config = Config::from_env();

    let (log_level, log_json) = match &config {
        Ok(c) => (c.log_level.clone(), c.log_json),
        Err(_) => ("info".to_string(), false),
    };
    init_tracing(&log_level, log_json);

    info!(
        "Starting Todo/Article API v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            return ExitCode::from(exitcode::CONFIG as u8);
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: Config) -> Result<(), exitcode::ExitCode> {
    if config.jwt_secret_generated {
        warn!("JWT_SECRET not set, using a random secret; tokens won't survive a restart");
    }

    info!(
        host = %config.host,
        port = %config.port,
        api_key_gate = config.api_key_enabled(),
        access_token_ttl_secs = config.access_token_ttl.as_secs(),
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;

    let state = AppState::new(config).map_err(|e| {
        error!("Failed to build application state: {e}");
        exitcode::SOFTWARE
    })?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET    /health                - Health check");
    info!("  POST   /auth/register         - Create an account");
    info!("  POST   /auth/login            - Obtain access and refresh tokens");
    info!("  POST   /auth/refresh-token    - Obtain a new access token");
    info!("  POST   /auth/logout           - Revoke the refresh token");
    info!("  GET    /auth/profile          - Caller's profile");
    info!("  GET    /todos                 - Caller's todos");
    info!("  GET    /articles              - All articles");
    info!("  GET    /articles/proxy        - Request id propagation demo");

    // Connect info feeds the client IP fallback in the request logger.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(utils::shutdown_signal())
    .await
    .map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Server shutdown complete");
    Ok(())
}
