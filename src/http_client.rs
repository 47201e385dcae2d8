//! Outbound HTTP client that forwards the active correlation id.
//!
//! Call sites build requests as usual and hand them to
//! [`PropagatingClient::send`]. The id is read from [`context`] at send
//! time, so a request built in one task and sent from another carries the
//! id of the sender.
//!
//! ```rust,ignore
//! let response = client.send(client.get("http://inventory/items")).await?;
//! ```

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::context;
use crate::error::{AppError, AppResult};
use crate::metrics::record_outbound_request;

/// Header carrying the correlation id on outbound requests.
pub const OUTBOUND_REQUEST_ID_HEADER: &str = "x-request-id";

/// `reqwest::Client` wrapper that injects `X-Request-Id` from the active
/// correlation context.
#[derive(Debug, Clone)]
pub struct PropagatingClient {
    inner: reqwest::Client,
}

impl PropagatingClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::from_client(inner))
    }

    /// Wrap an existing client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.inner.get(url)
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.inner.request(method, url)
    }

    /// Build `builder` and set the correlation header if a context is active.
    ///
    /// Outside any context the request is returned unmodified.
    pub fn prepare(&self, builder: RequestBuilder) -> AppResult<Request> {
        let mut request = builder.build()?;

        if let Some(request_id) = context::current_request_id() {
            match HeaderValue::from_str(&request_id) {
                Ok(value) => {
                    request
                        .headers_mut()
                        .insert(OUTBOUND_REQUEST_ID_HEADER, value);
                }
                Err(_) => warn!(request_id = %request_id, "Request id is not a valid header value, not forwarding"),
            }
        }

        Ok(request)
    }

    /// Build, tag and execute `builder`.
    ///
    /// # Errors
    ///
    /// `AppError::Upstream` if the request can't be built or sent. Non-2xx
    /// responses are returned as-is.
    pub async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let request = self.prepare(builder)?;
        debug!(method = %request.method(), url = %request.url(), "Outbound request");

        match self.inner.execute(request).await {
            Ok(response) => {
                record_outbound_request(response.status().as_str());
                Ok(response)
            }
            Err(e) => {
                record_outbound_request("error");
                Err(e.into())
            }
        }
    }
}
