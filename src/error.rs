//! Request-level proxy errors.
//!
//! Only upstream trouble reaches the client. Translation problems are handled
//! inside the translation subsystem and never surface here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors that abort a single proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No route matched the request.
    #[error("no route matched {method} {path}")]
    NoRoute { method: String, path: String },

    /// The inbound request body was larger than the configured limit.
    #[error("request body exceeds {limit} bytes")]
    RequestTooLarge { limit: usize },

    /// The inbound request body could not be read.
    #[error("failed to read request body: {0}")]
    RequestBody(String),

    /// The upstream URL could not be built from the cluster destination.
    #[error("invalid upstream url: {0}")]
    InvalidUpstreamUrl(String),

    /// The upstream connection could not be established.
    #[error("failed to connect to upstream: {0}")]
    UpstreamConnect(#[source] reqwest::Error),

    /// The upstream did not answer in time.
    #[error("upstream request timed out: {0}")]
    UpstreamTimeout(#[source] reqwest::Error),

    /// Any other upstream failure, including a broken response body.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    /// Classify a client error by what went wrong.
    pub fn from_upstream(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::UpstreamTimeout(err)
        } else if err.is_connect() {
            ProxyError::UpstreamConnect(err)
        } else {
            ProxyError::Upstream(err)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoRoute { .. } => StatusCode::NOT_FOUND,
            ProxyError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::RequestBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidUpstreamUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamConnect(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            ProxyError::NoRoute { .. } => "No matching route found",
            ProxyError::RequestTooLarge { .. } => "Request body too large",
            ProxyError::RequestBody(_) => "Request body could not be read",
            ProxyError::InvalidUpstreamUrl(_) => "Invalid upstream address",
            ProxyError::UpstreamTimeout(_) => "Upstream request timed out",
            ProxyError::UpstreamConnect(_) | ProxyError::Upstream(_) => "Upstream request failed",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.client_message()).into_response()
    }
}
