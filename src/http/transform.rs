//! Response transformation for the translated route.
//!
//! # Responsibilities
//! - Buffer the complete upstream body as text
//! - Translate it with the rule set of the captured language
//! - Replace the body and set an exact Content-Length
//!
//! # Design Decisions
//! - The body is decoded using the Content-Type charset (UTF-8 by default)
//!   and always re-encoded as UTF-8; a declared charset is relabelled to match
//! - Translation failures are absorbed by the engine, so the only error left
//!   here is a broken upstream body
//! - Whole-body buffering is accepted; there is no streaming rewrite

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue},
    response::Response,
};

use crate::error::ProxyError;
use crate::http::headers::{client_response_headers, utf8_content_type};
use crate::translation::{FileRuleSource, RewriteEngine, RuleSetLoader, RuleSource};

/// Rewrites upstream responses with per-language rules.
#[derive(Debug)]
pub struct ResponseTransformer<S = FileRuleSource> {
    engine: RewriteEngine,
    loader: RuleSetLoader<S>,
}

impl<S: RuleSource> ResponseTransformer<S> {
    pub fn new(engine: RewriteEngine, loader: RuleSetLoader<S>) -> Self {
        Self { engine, loader }
    }

    /// Build the client response for `upstream`, translated into `language`.
    ///
    /// Without a language the text is returned as is, still re-framed.
    pub async fn transform(
        &self,
        upstream: reqwest::Response,
        language: Option<&str>,
    ) -> Result<Response, ProxyError> {
        let status = upstream.status();
        let mut headers = client_response_headers(upstream.headers());

        let body = upstream.text().await.map_err(ProxyError::from_upstream)?;
        let body = match language {
            Some(language) => self.engine.translate(body, language, &self.loader).await,
            None => body,
        };

        let relabelled = headers.get(header::CONTENT_TYPE).and_then(utf8_content_type);
        if let Some(content_type) = relabelled {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        let bytes = Bytes::from(body);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}
