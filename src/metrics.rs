//! Prometheus metrics for application observability.
//!
//! Metrics are exposed via a dedicated HTTP listener on `METRICS_PORT`.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `auth_requests_total` - Authentication commands (labels: command, status)
//! - `authz_denials_total` - Mutations refused by the ownership rule
//!   (labels: resource, operation)
//! - `outbound_requests_total` - Calls made through the propagating client
//!   (labels: status)
//!
//! ## Histograms
//! - `http_request_duration_seconds` - Inbound request duration
//!   (labels: method, status)
//!
//! # Usage
//!
//! ```rust,ignore
//! use todo_article_api::metrics::{init_metrics, record_auth_request};
//!
//! init_metrics(addr)?;
//! record_auth_request("login", "success");
//! ```

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const AUTH_REQUESTS_TOTAL: &str = "auth_requests_total";
    pub const AUTHZ_DENIALS_TOTAL: &str = "authz_denials_total";
    pub const OUTBOUND_REQUESTS_TOTAL: &str = "outbound_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
}

/// Initialize the Prometheus metrics exporter.
///
/// Installs the global recorder, starts the HTTP listener on `metrics_addr`
/// and describes every metric.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::AUTH_REQUESTS_TOTAL,
        "Total number of authentication commands by outcome"
    );
    describe_counter!(
        names::AUTHZ_DENIALS_TOTAL,
        "Total number of mutations refused by the ownership rule"
    );
    describe_counter!(
        names::OUTBOUND_REQUESTS_TOTAL,
        "Total number of outbound HTTP requests by status"
    );
    describe_histogram!(
        names::HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request duration in seconds"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

// =============================================================================
// Counter Recording Functions
// =============================================================================

/// Record the outcome of an authentication command (login, register, ...).
pub fn record_auth_request(command: &'static str, status: &'static str) {
    counter!(names::AUTH_REQUESTS_TOTAL, "command" => command, "status" => status).increment(1);
}

/// Record a mutation refused by the ownership rule.
pub fn record_authz_denial(resource: &'static str, operation: &'static str) {
    counter!(names::AUTHZ_DENIALS_TOTAL, "resource" => resource, "operation" => operation)
        .increment(1);
}

/// Record an outbound request. `status` is the HTTP status, or `"error"`.
pub fn record_outbound_request(status: &str) {
    counter!(names::OUTBOUND_REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
}

// =============================================================================
// Histogram Recording Functions
// =============================================================================

/// Record inbound HTTP request duration.
pub fn record_request_duration(method: &str, status: u16, duration_secs: f64) {
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, "method" => method.to_string(), "status" => status.to_string())
        .record(duration_secs);
}
