//! Upstream forwarding.

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use tracing::debug;
use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// Proxy-specific headers never sent upstream. The upstream host header is
/// recomputed by the client from the target URL.
const STRIPPED_REQUEST_HEADERS: [&str; 3] = ["proxy-authorization", "proxy-connection", "host"];

/// Hop-specific headers never relayed back to the agent; the relayed body is
/// fully buffered, so framing headers from the upstream no longer apply.
const STRIPPED_RESPONSE_HEADERS: [&str; 2] = ["transfer-encoding", "connection"];

/// An approved request, ready to relay upstream.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    /// HTTP method.
    pub method: Method,
    /// Full target URL.
    pub url: Url,
    /// Headers from the inbound request (sanitized before sending).
    pub headers: HeaderMap,
    /// Buffered request body.
    pub body: Bytes,
}

/// The upstream's answer, relayed verbatim apart from hop headers.
#[derive(Debug, Clone)]
pub struct ForwardResponse {
    /// Upstream status code.
    pub status: StatusCode,
    /// Upstream headers (sanitized).
    pub headers: HeaderMap,
    /// Buffered response body.
    pub body: Bytes,
}

/// Relays an approved request to its target and the response back.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Perform the upstream call.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Upstream`] if the target cannot be reached or
    /// its response body cannot be read.
    async fn forward(&self, request: ForwardRequest) -> ProxyResult<ForwardResponse>;
}

/// [`Forwarder`] over a reqwest client with redirects disabled, so the agent
/// sees redirects verbatim instead of the gateway chasing them.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: reqwest::Client,
}

impl HttpForwarder {
    /// Create a forwarder.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Startup`] if the HTTP client cannot be built.
    pub fn new() -> ProxyResult<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProxyError::Startup {
                reason: format!("failed to build upstream client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> ProxyResult<ForwardResponse> {
        let mut headers = request.headers;
        sanitize_request_headers(&mut headers);

        debug!(method = %request.method, url = %request.url, "forwarding upstream");

        let response = self
            .client
            .request(request.method, request.url)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| ProxyError::Upstream {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let mut headers = response.headers().clone();
        sanitize_response_headers(&mut headers);

        let body = response.bytes().await.map_err(|e| ProxyError::Upstream {
            reason: format!("failed to read upstream body: {e}"),
        })?;

        Ok(ForwardResponse {
            status,
            headers,
            body,
        })
    }
}

pub(crate) fn sanitize_request_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_REQUEST_HEADERS {
        headers.remove(name);
    }
}

pub(crate) fn sanitize_response_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_RESPONSE_HEADERS {
        headers.remove(name);
    }
}
