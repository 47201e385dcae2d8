//! Request logger: correlation id, access log lines and request timing.
//!
//! # Behavior
//!
//! For every inbound request the middleware:
//! 1. Reuses an inbound `X-Request-Id` header verbatim (any value, even
//!    empty), or generates a UUIDv4 when the header is absent
//! 2. Writes the id back into the request headers so handlers can read it
//! 3. Runs the rest of the stack inside [`context::run_request`] with that
//!    id and the request path
//! 4. Logs `--> [id] METHOD path - user-agent - ip` on entry
//! 5. Sets `X-Request-Id` on the response and logs
//!    `<-- [id] METHOD path status elapsedms` on completion
//!
//! # Client Usage
//!
//! ```bash
//! curl -H "X-Request-Id: my-correlation-id" http://localhost:3000/articles
//! ```
//!
//! The same id is returned in the response and forwarded on outbound calls.

use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::header::{HeaderValue, USER_AGENT};
use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::info;
use uuid::Uuid;

use super::ip::extract_client_ip;
use crate::context;
use crate::metrics::record_request_duration;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request logger layer for the Tower middleware stack.
#[derive(Clone, Default)]
pub struct RequestLoggerLayer;

impl RequestLoggerLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for RequestLoggerLayer {
    type Service = RequestLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggerService { inner }
    }
}

/// Request logger service wrapper.
#[derive(Clone)]
pub struct RequestLoggerService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestLoggerService<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let start = Instant::now();
        let (request_id, header_value) = resolve_request_id(&req);

        if let Some(value) = &header_value {
            req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
        }

        let method = req.method().clone();
        let path = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), ToString::to_string);
        let user_agent = req
            .headers()
            .get(USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        let client_ip = extract_client_ip(&req);

        let mut inner = self.inner.clone();
        let id = request_id.clone();

        Box::pin(context::run_request(request_id, path.clone(), async move {
            info!(
                target: "http",
                request_id = %id,
                "--> [{id}] {method} {path} - {user_agent} - {client_ip}"
            );

            let result = inner.call(req).await;
            let elapsed = start.elapsed();
            let elapsed_ms = elapsed.as_millis();

            match result {
                Ok(mut response) => {
                    if let Some(value) = header_value {
                        response.headers_mut().insert(REQUEST_ID_HEADER, value);
                    }

                    let status = response.status().as_u16();
                    info!(
                        target: "http",
                        request_id = %id,
                        "<-- [{id}] {method} {path} {status} {elapsed_ms}ms"
                    );
                    record_request_duration(method.as_str(), status, elapsed.as_secs_f64());
                    Ok(response)
                }
                Err(e) => {
                    info!(
                        target: "http",
                        request_id = %id,
                        "<-- [{id}] {method} {path} error {elapsed_ms}ms"
                    );
                    Err(e)
                }
            }
        }))
    }
}

/// The inbound request id, reused as-is whatever its content, or a new
/// UUIDv4 when the header is absent.
///
/// Returns the id as text for the context and log lines, plus the header
/// value to echo. An inbound value is echoed byte for byte.
fn resolve_request_id<B>(req: &Request<B>) -> (String, Option<HeaderValue>) {
    match req.headers().get(REQUEST_ID_HEADER) {
        Some(value) => (
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
            Some(value.clone()),
        ),
        None => {
            let id = Uuid::new_v4().to_string();
            let value = HeaderValue::from_str(&id).ok();
            (id, value)
        }
    }
}

/// Extension trait to extract request ID from requests.
pub trait RequestIdExt {
    /// Get the request ID from the request headers.
    fn request_id(&self) -> Option<String>;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<String> {
        self.headers()
            .get(REQUEST_ID_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }
}
