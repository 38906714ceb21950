//! Root path redirect.
//!
//! Requests for exactly `/` never reach the upstream. They are answered with
//! `302 Found` pointing at the editor, carrying the default language as the
//! `lang` query parameter when one is configured.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::request_id;

/// Target of root redirects.
pub const EDITOR_PATH: &str = "/editor";

/// The default language, replaceable while the server runs.
#[derive(Debug, Default)]
pub struct DefaultLanguage {
    current: ArcSwapOption<String>,
}

impl DefaultLanguage {
    pub fn new(language: Option<&str>) -> Self {
        let this = Self::default();
        this.set(language);
        this
    }

    pub fn get(&self) -> Option<Arc<String>> {
        self.current.load_full()
    }

    /// Replace the value; blank strings clear it.
    pub fn set(&self, language: Option<&str>) {
        let language = language
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(|lang| Arc::new(lang.to_string()));
        self.current.store(language);
    }
}

/// `Location` for a root redirect.
pub fn redirect_target(language: Option<&str>) -> String {
    match language {
        Some(lang) => {
            let encoded: String = url::form_urlencoded::byte_serialize(lang.as_bytes()).collect();
            format!("{EDITOR_PATH}?lang={encoded}")
        }
        None => EDITOR_PATH.to_string(),
    }
}

/// Middleware answering `/` before any routing happens.
pub async fn root_redirect(
    State(default_language): State<Arc<DefaultLanguage>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() != "/" {
        return next.run(request).await;
    }

    let language = default_language.get();
    let target = redirect_target(language.as_deref().map(String::as_str));
    tracing::debug!(
        request_id = %request_id(request.headers()),
        method = %request.method(),
        location = %target,
        "Redirecting root request"
    );

    (StatusCode::FOUND, [(header::LOCATION, target)]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_target() {
        assert_eq!(redirect_target(Some("fr")), "/editor?lang=fr");
        assert_eq!(redirect_target(Some("pt-BR")), "/editor?lang=pt-BR");
        assert_eq!(redirect_target(Some("a&b")), "/editor?lang=a%26b");
        assert_eq!(redirect_target(None), "/editor");
    }

    #[test]
    fn test_default_language_swap() {
        let lang = DefaultLanguage::new(Some("fr"));
        assert_eq!(lang.get().as_deref().map(String::as_str), Some("fr"));

        lang.set(Some("  "));
        assert!(lang.get().is_none());

        lang.set(Some("de"));
        assert_eq!(lang.get().as_deref().map(String::as_str), Some("de"));

        lang.set(None);
        assert!(lang.get().is_none());
    }
}
