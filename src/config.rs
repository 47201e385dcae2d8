//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! All configuration is loaded from environment variables with sensible defaults
//! for development. In production, configure via environment variables or a `.env` file.
//!
//! # Security Configuration
//!
//! - `JWT_SECRET`: HS256 signing secret. When unset, a random per-process secret
//!   is generated, which invalidates all tokens on restart.
//! - `API_KEYS`: Comma-separated keys. When set, every endpoint except the
//!   bypass paths requires one of them in `X-API-Key`.
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins (default: `*` for dev)
//!
//! # Token Lifetimes
//!
//! - `ACCESS_TOKEN_TTL_SECS`: Access token lifetime (default: 900)
//! - `REFRESH_TOKEN_TTL_SECS`: Refresh token lifetime (default: 7 days)

use std::env;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;

use crate::error::{AppError, AppResult};

/// Length of the generated development JWT secret.
const GENERATED_SECRET_LEN: usize = 48;

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    /// Maximum request body size in bytes (default: 1MB)
    pub max_request_body_size: usize,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Secret used to sign and verify JWTs
    pub jwt_secret: String,

    /// Whether `jwt_secret` was generated because `JWT_SECRET` was unset
    pub jwt_secret_generated: bool,

    /// Lifetime of access tokens
    pub access_token_ttl: Duration,

    /// Lifetime of refresh tokens
    pub refresh_token_ttl: Duration,

    /// bcrypt work factor for password hashes (4..=31)
    pub bcrypt_cost: u32,

    // =========================================================================
    // Security Configuration
    // =========================================================================
    /// Accepted API keys (empty = API key gate disabled)
    pub api_keys: Vec<String>,

    /// Paths that bypass the API key gate.
    /// Default: ["/health"]
    pub auth_bypass_paths: Vec<String>,

    /// Comma-separated list of allowed CORS origins
    /// Use "*" to allow all origins (not recommended for production)
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Outbound HTTP Configuration
    // =========================================================================
    /// Timeout for calls made through the propagating HTTP client
    pub outbound_timeout: Duration,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,

    /// Port for Prometheus metrics endpoint (default: 9090, 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any configuration value is invalid
    /// (e.g., non-numeric PORT value, out of range bcrypt cost).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let (jwt_secret, jwt_secret_generated) = Self::jwt_secret_or_generated();

        let config = Self {
            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: Self::parse_env("PORT", 3000)?,
            max_request_body_size: Self::parse_env("MAX_REQUEST_BODY_SIZE", 1024 * 1024)?,

            // Authentication
            jwt_secret,
            jwt_secret_generated,
            access_token_ttl: Duration::from_secs(Self::parse_env("ACCESS_TOKEN_TTL_SECS", 900)?),
            refresh_token_ttl: Duration::from_secs(Self::parse_env(
                "REFRESH_TOKEN_TTL_SECS",
                7 * 24 * 60 * 60,
            )?),
            bcrypt_cost: Self::parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST)?,

            // Security
            api_keys: Self::parse_list("API_KEYS", ""),
            auth_bypass_paths: Self::parse_list("AUTH_BYPASS_PATHS", "/health")
                .into_iter()
                .filter(|p| p.starts_with('/'))
                .collect(),
            cors_allowed_origins: Self::parse_list("CORS_ALLOWED_ORIGINS", "*"),

            // Outbound
            outbound_timeout: Duration::from_secs(Self::parse_env("OUTBOUND_TIMEOUT_SECS", 10)?),

            // Observability
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")),
            metrics_port: Self::parse_env("METRICS_PORT", 9090)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.jwt_secret.is_empty() {
            return Err(AppError::ConfigError(
                "JWT_SECRET must not be empty".to_string(),
            ));
        }

        if self.access_token_ttl.is_zero() {
            return Err(AppError::ConfigError(
                "ACCESS_TOKEN_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.refresh_token_ttl < self.access_token_ttl {
            return Err(AppError::ConfigError(format!(
                "REFRESH_TOKEN_TTL_SECS ({:?}) must be >= ACCESS_TOKEN_TTL_SECS ({:?})",
                self.refresh_token_ttl, self.access_token_ttl
            )));
        }

        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(AppError::ConfigError(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                self.bcrypt_cost
            )));
        }

        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if the API key gate is enabled.
    pub fn api_key_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr + ToString,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    /// Parse a comma-separated list, dropping blank entries.
    fn parse_list(name: &str, default: &str) -> Vec<String> {
        env::var(name)
            .unwrap_or_else(|_| default.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn jwt_secret_or_generated() -> (String, bool) {
        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => (secret, false),
            _ => (generate_secret(), true),
        }
    }
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Server
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_request_body_size: 1024 * 1024,
            // Authentication
            jwt_secret: generate_secret(),
            jwt_secret_generated: true,
            access_token_ttl: Duration::from_secs(900),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            // Security
            api_keys: vec![],
            auth_bypass_paths: vec!["/health".to_string()],
            cors_allowed_origins: vec!["*".to_string()],
            // Outbound
            outbound_timeout: Duration::from_secs(10),
            // Observability
            log_level: "info".to_string(),
            log_json: false,
            metrics_port: 9090,
        }
    }
}
