//! Live transport seam and the hyper-backed production implementation

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use crate::{Result, TapeError};

/// An HTTP request as seen by the interceptor.
///
/// The body is a cheaply cloneable [`Bytes`] so snapshotting a request for
/// recording never consumes it; the caller's request stays usable after
/// interception returns.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (e.g. "GET", "POST")
    pub method: String,
    /// Full request URL
    pub url: String,
    /// Request headers in wire order; keys may repeat
    pub headers: Vec<(String, String)>,
    /// Request body
    pub body: Bytes,
}

/// An HTTP response as returned to the interceptor's caller
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status_code: u16,
    /// Status line (e.g. "200 OK")
    pub status: String,
    /// Response headers in wire order
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: Bytes,
}

/// The seam between the interceptor and the real network.
///
/// Production callers use [`HyperTransport`]; tests substitute stubs.
pub trait LiveTransport {
    /// Execute a request against the live network
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Live transport backed by hyper's pooled legacy client
pub struct HyperTransport {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HyperTransport {
    /// Create a new live transport
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build_http();

        Self { client }
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTransport for HyperTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let uri = request
            .url
            .parse::<Uri>()
            .map_err(|e| TapeError::Transport(format!("Invalid URI '{}': {e}", request.url)))?;

        let method = request.method.parse::<Method>().map_err(|e| {
            TapeError::Transport(format!("Invalid HTTP method '{}': {e}", request.method))
        })?;

        debug!("Executing {} {}", request.method, uri);

        let mut builder = hyper::Request::builder().method(method).uri(uri);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let http_request = builder
            .body(Full::new(request.body.clone()))
            .map_err(|e| TapeError::Transport(format!("Failed to build request: {e}")))?;

        let response = self.client.request(http_request).await.map_err(|e| {
            warn!("Request failed: {e}");
            TapeError::Transport(format!("Request failed: {e}"))
        })?;

        let status_code = response.status().as_u16();
        let status = status_line(status_code);
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.to_str().unwrap_or("<invalid>").to_string(),
                )
            })
            .collect();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TapeError::Transport(format!("Failed to read response body: {e}")))?
            .to_bytes();

        Ok(HttpResponse {
            status_code,
            status,
            headers,
            body,
        })
    }
}

/// Build a status line such as "200 OK" from a status code
pub(crate) fn status_line(code: u16) -> String {
    match hyper::StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{code} {reason}"),
        None => code.to_string(),
    }
}
