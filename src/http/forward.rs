//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the cluster destination
//! - Send it with the shared HTTP client and hand back the raw response
//! - Turn an upstream response into a streamed client response
//!
//! # Design Decisions
//! - Upstream redirects are returned to the client, not followed
//! - gzip is negotiated and decoded by the client, so later stages always
//!   see decoded bytes
//! - No retries; a failed upstream call fails the request

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Request, Uri},
    response::Response,
};
use futures_util::StreamExt;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::http::headers::{client_response_headers, upstream_request_headers};
use crate::routing::Cluster;

/// Sends requests to a cluster's destination.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    max_request_body_bytes: usize,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig, max_request_body_bytes: usize) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .gzip(true)
            .no_proxy()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self {
            client: builder.build()?,
            max_request_body_bytes,
        })
    }

    /// Issue `request` against `cluster` and return the upstream response.
    pub async fn forward(
        &self,
        cluster: &Cluster,
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
    ) -> Result<reqwest::Response, ProxyError> {
        let (parts, body) = request.into_parts();
        let url = upstream_url(&cluster.destination, &parts.uri)?;

        let body = read_body(&parts.headers, body, self.max_request_body_bytes).await?;

        let mut upstream = self
            .client
            .request(parts.method, url)
            .headers(upstream_request_headers(&parts.headers, client_addr));
        if !body.is_empty() {
            upstream = upstream.body(body);
        }

        upstream.send().await.map_err(ProxyError::from_upstream)
    }
}

/// Buffer an inbound body, refusing anything over `limit` bytes.
///
/// A declared Content-Length over the limit is refused before reading.
pub async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ProxyError::RequestTooLarge { limit });
    }

    let mut buffer = Vec::new();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProxyError::RequestBody(e.to_string()))?;
        if buffer.len() + chunk.len() > limit {
            return Err(ProxyError::RequestTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buffer))
}

/// Join the destination base URL with the inbound path and query.
pub fn upstream_url(destination: &Url, uri: &Uri) -> Result<Url, ProxyError> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let base = destination.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}{path_and_query}"))
        .map_err(|e| ProxyError::InvalidUpstreamUrl(e.to_string()))
}

/// Stream an upstream response to the client unchanged.
pub fn passthrough(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = client_response_headers(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_url_joins_path_and_query() {
        let base = Url::parse("https://ozoblockly.com").unwrap();
        let uri: Uri = "/editor/generated/de/compressed.js?v=3".parse().unwrap();
        assert_eq!(
            upstream_url(&base, &uri).unwrap().as_str(),
            "https://ozoblockly.com/editor/generated/de/compressed.js?v=3"
        );
    }

    #[test]
    fn test_upstream_url_keeps_base_path() {
        let base = Url::parse("http://127.0.0.1:4000/mirror/").unwrap();
        let uri: Uri = "/editor".parse().unwrap();
        assert_eq!(
            upstream_url(&base, &uri).unwrap().as_str(),
            "http://127.0.0.1:4000/mirror/editor"
        );
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = read_body(&HeaderMap::new(), Body::from("hello"), 5).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn test_read_body_over_limit_is_too_large() {
        let err = read_body(&HeaderMap::new(), Body::from("hello!"), 5).await.unwrap_err();
        assert!(matches!(err, ProxyError::RequestTooLarge { limit: 5 }));

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, "1000".parse().unwrap());
        let err = read_body(&headers, Body::empty(), 5).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_read_body_broken_stream_is_bad_request() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"par")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let body = Body::from_stream(futures_util::stream::iter(chunks));

        let err = read_body(&HeaderMap::new(), body, 1024).await.unwrap_err();

        assert!(matches!(err, ProxyError::RequestBody(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_url_root() {
        let base = Url::parse("http://127.0.0.1:4000").unwrap();
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(upstream_url(&base, &uri).unwrap().as_str(), "http://127.0.0.1:4000/");
    }
}
