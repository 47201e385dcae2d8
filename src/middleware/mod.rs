//! HTTP middleware for correlation, access logging and API key protection.
//!
//! # Architecture
//!
//! ```text
//! Request → Request Logger → Trace → API Key Gate → Handler → Response
//!               ↓                        ↓
//!        X-Request-Id header      401 / 429 envelope
//! ```
//!
//! The request logger is outermost so every response, including rejections
//! from the API key gate, carries `X-Request-Id` and is produced inside the
//! request's correlation context.

pub mod auth;
pub mod ip;
pub mod request_logger;

pub use auth::{API_KEY_HEADER, ApiKeyAuth};
pub use ip::{UNKNOWN_IP, extract_client_ip};
pub use request_logger::{REQUEST_ID_HEADER, RequestIdExt, RequestLoggerLayer};
