use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::redirect::Policy;
use serde_json::json;
use tracing::instrument;

use crate::core::error::ConfigError;
use crate::core::registry::ServiceEntry;

/// Inbound request as seen by the proxy, independent of the HTTP server.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Path including the query string, if any.
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Response relayed back to the client.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Request addressed to a backend, ready to be sent.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Strips `prefix` from `path` and guarantees a rooted result.
pub fn forward_path(prefix: &str, path: &str) -> String {
    let rest = path.strip_prefix(prefix).unwrap_or(path);

    if rest.is_empty() {
        "/".to_owned()
    } else if rest.starts_with('/') {
        rest.to_owned()
    } else {
        format!("/{rest}")
    }
}

impl OutboundRequest {
    pub fn prepare(entry: &ServiceEntry, request: ProxyRequest) -> Self {
        let (path, query) = match request.path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (request.path.as_str(), None),
        };

        let mut url = entry.target_url();
        url.push_str(&forward_path(&entry.route_prefix, path));
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }

        let mut headers = request.headers;
        headers.remove(header::HOST);
        // relayed bodies lose their content-encoding, so ask for identity
        headers.remove(header::ACCEPT_ENCODING);
        // the body is fully buffered and re-framed by the client
        headers.remove(header::TRANSFER_ENCODING);
        headers.remove(header::CONTENT_LENGTH);
        headers.remove(header::EXPECT);

        let body = (!request.body.is_empty()).then_some(request.body);

        Self {
            method: request.method,
            url,
            headers,
            body,
        }
    }
}

impl ProxyResponse {
    /// Copies a backend response, dropping framing headers that no longer
    /// describe the buffered body.
    pub fn relay(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Self {
        headers.remove(header::CONTENT_ENCODING);
        headers.remove(header::TRANSFER_ENCODING);

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn unavailable(message: &str) -> Self {
        let body = json!({
            "error": "Service Unavailable",
            "message": message,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            headers,
            body: Bytes::from(body.to_string()),
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// The only side-effecting piece of the proxy: one shared HTTP client with
/// no timeout and no retries.
#[derive(Clone, Debug)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Result<Self, ConfigError> {
        let client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client })
    }

    #[instrument(skip_all, fields(service = %entry.key))]
    pub async fn forward(&self, entry: &ServiceEntry, request: ProxyRequest) -> ProxyResponse {
        let original_path = request.path.clone();
        let outbound = OutboundRequest::prepare(entry, request);

        tracing::info!("proxying {} -> {}", original_path, outbound.url);

        match self.send(outbound).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("proxy error for {}: {}", entry.target_url(), e);
                ProxyResponse::unavailable(&e.to_string())
            }
        }
    }

    async fn send(&self, outbound: OutboundRequest) -> Result<ProxyResponse, reqwest::Error> {
        let mut request = self
            .client
            .request(outbound.method, &outbound.url)
            .headers(outbound.headers);

        if let Some(body) = outbound.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(ProxyResponse::relay(status, headers, body))
    }
}
