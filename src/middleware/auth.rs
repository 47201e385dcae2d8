//! API key gate in front of every route.
//!
//! # Security Features
//!
//! - **Constant-time comparison** against every configured key
//! - **Selective protection**: bypass paths (default `/health`) stay open
//!   for monitoring
//! - **Brute force protection**: repeated failures from one client IP are
//!   answered with 429
//!
//! # Usage
//!
//! ```bash
//! API_KEYS=key-one,key-two cargo run
//! curl -H "X-API-Key: key-one" http://localhost:3000/articles
//! ```
//!
//! With `API_KEYS` unset the gate lets everything through.

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::response::IntoResponse;
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use subtle::ConstantTimeEq;
use tower::{Layer, Service};
use tracing::{debug, error, warn};

use super::ip::{client_ip_addr, extract_client_ip};
use crate::error::AppError;

/// Header name for API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Maximum auth failures per IP per minute before blocking.
const AUTH_FAILURE_LIMIT: NonZeroU32 = NonZeroU32::new(10).unwrap();

/// Burst capacity for auth failure rate limiting.
const AUTH_FAILURE_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();

/// Failed checks between two prunes of idle limiter entries.
const PRUNE_EVERY: u64 = 1024;

/// Key shared by clients whose address can't be determined.
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Auth failure rate limiter, keyed by client IP.
///
/// Entries whose quota has fully refilled are dropped every
/// [`PRUNE_EVERY`] checks, so the map only holds recently failing clients.
struct FailureLimiter {
    limiter: KeyedLimiter,
    checks: AtomicU64,
}

impl FailureLimiter {
    fn new(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::keyed(quota),
            checks: AtomicU64::new(0),
        }
    }

    /// Record one failure for `ip`. `Err` carries the wait until the next
    /// attempt is allowed.
    fn check(&self, ip: &IpAddr) -> Result<(), Duration> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % PRUNE_EVERY == PRUNE_EVERY - 1 {
            self.prune();
        }

        self.limiter
            .check_key(ip)
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(tracked = self.limiter.len(), "Pruned auth failure limiter");
    }

    fn len(&self) -> usize {
        self.limiter.len()
    }
}

/// API key authentication layer.
///
/// Bypass paths use exact matching against `request.uri().path()`, so
/// `/health/` and `/HEALTH` are not bypassed.
///
/// # Brute Force Protection
///
/// Every missing or wrong key consumes one cell of a per-IP quota. Once the
/// quota is exhausted, failed attempts get 429 with `Retry-After` instead of
/// 401 until it refills.
#[derive(Clone)]
pub struct ApiKeyAuth {
    /// Accepted keys (empty = gate disabled)
    keys: Arc<Vec<String>>,
    bypass_paths: Arc<Vec<String>>,
    failure_limiter: Option<Arc<FailureLimiter>>,
}

impl ApiKeyAuth {
    pub fn new(keys: Vec<String>, bypass_paths: Vec<String>) -> Self {
        let quota = Quota::per_minute(AUTH_FAILURE_LIMIT).allow_burst(AUTH_FAILURE_BURST);
        Self::with_quota(keys, bypass_paths, quota)
    }

    fn with_quota(keys: Vec<String>, bypass_paths: Vec<String>, quota: Quota) -> Self {
        let failure_limiter = if keys.is_empty() {
            None
        } else {
            Some(Arc::new(FailureLimiter::new(quota)))
        };

        Self {
            keys: Arc::new(keys),
            bypass_paths: Arc::new(bypass_paths),
            failure_limiter,
        }
    }

    /// Check if the gate is enabled.
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }
}

impl<S> Layer<S> for ApiKeyAuth {
    type Service = ApiKeyAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ApiKeyAuthService {
            inner,
            auth: self.clone(),
        }
    }
}

/// API key authentication service wrapper.
#[derive(Clone)]
pub struct ApiKeyAuthService<S> {
    inner: S,
    auth: ApiKeyAuth,
}

impl<S> Service<Request<Body>> for ApiKeyAuthService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let auth = self.auth.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !auth.is_enabled() {
                return inner.call(req).await;
            }

            let path = req.uri().path();
            if auth.bypass_paths.iter().any(|p| p == path) {
                debug!(path, "Bypassing API key check");
                return inner.call(req).await;
            }

            let provided = req
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok());

            let rejection = match provided {
                Some(key) if matches_any(key, &auth.keys) => None,
                Some(_) => Some("Invalid API key"),
                None => Some("Missing API key"),
            };

            let Some(message) = rejection else {
                debug!("API key authentication successful");
                return inner.call(req).await;
            };

            let client_ip = extract_client_ip(&req).into_owned();
            let limiter_key = client_ip_addr(&req).unwrap_or(UNKNOWN_CLIENT);
            if let Some(limiter) = &auth.failure_limiter
                && let Err(wait) = limiter.check(&limiter_key)
            {
                let retry_after_secs = wait.as_secs().max(1);
                error!(
                    client_ip = %client_ip,
                    retry_after_secs,
                    "IP blocked due to excessive auth failures"
                );
                return Ok(AppError::RateLimited { retry_after_secs }.into_response());
            }

            warn!(path = %req.uri().path(), client_ip = %client_ip, "{message}");
            Ok(AppError::Unauthorized(message.to_string()).into_response())
        })
    }
}

/// Constant-time check of `provided` against every key.
///
/// All keys are compared even after a match, so timing doesn't reveal which
/// one matched.
fn matches_any(provided: &str, keys: &[String]) -> bool {
    keys.iter().fold(false, |found, key| {
        let equal: bool = provided.as_bytes().ct_eq(key.as_bytes()).into();
        found | equal
    })
}
