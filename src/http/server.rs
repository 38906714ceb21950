//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with the proxy handler as its only endpoint
//! - Wire up middleware (request ID, tracing, root redirect)
//! - Dispatch requests through the route table
//! - Forward to the upstream and translate where the route asks for it
//! - Apply configuration updates (default language) while running

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::forward::{passthrough, Forwarder};
use crate::http::redirect::{root_redirect, DefaultLanguage};
use crate::http::request::{request_id, MakeRequestUuid};
use crate::http::transform::ResponseTransformer;
use crate::observability::metrics;
use crate::routing::{Cluster, RouteError, RouteKind, Router as ProxyRouter};
use crate::translation::{FileRuleSource, RewriteEngine, RuleSetLoader, TracingWarnings, WarningSink};

/// Errors that prevent the server from being built.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid route table: {0}")]
    Routes(#[from] RouteError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub forwarder: Arc<Forwarder>,
    pub transformer: Arc<ResponseTransformer>,
    pub default_language: Arc<DefaultLanguage>,
}

impl AppState {
    /// Build all request-time components from `config`.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        Self::with_warnings(config, Arc::new(TracingWarnings))
    }

    /// Like [`AppState::from_config`], reporting translation warnings to `warnings`.
    pub fn with_warnings(
        config: &ProxyConfig,
        warnings: Arc<dyn WarningSink>,
    ) -> Result<Self, ServerError> {
        let cluster = Cluster::new(config.upstream.cluster_id.clone(), &config.upstream.address)?;
        let router = ProxyRouter::standard(cluster)?;
        let forwarder = Forwarder::new(&config.upstream, config.limits.max_request_body_bytes)?;

        let source = FileRuleSource::new(
            config.translations.rules_dir.clone(),
            config.translations.extension.clone(),
        );
        let transformer = ResponseTransformer::new(
            RewriteEngine::new(config.translations.max_output_bytes, warnings.clone()),
            RuleSetLoader::new(source, warnings),
        );

        Ok(Self {
            router: Arc::new(router),
            forwarder: Arc::new(forwarder),
            transformer: Arc::new(transformer),
            default_language: Arc::new(DefaultLanguage::new(config.default_language())),
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        Ok(Self::with_state(config, state))
    }

    /// Create a server around prepared state.
    pub fn with_state(config: ProxyConfig, state: AppState) -> Self {
        let router = build_router(state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// The Axum app, for embedding or in-process tests.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, accepting connections on `listener`.
    ///
    /// Configurations received on `config_updates` replace the default
    /// language; other fields only take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            rules_dir = %self.config.translations.rules_dir.display(),
            "HTTP server starting"
        );

        let default_language = self.state.default_language.clone();
        let updates = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                let language = new_config.default_language();
                default_language.set(language);
                tracing::info!(default_language = ?language, "Configuration reloaded");
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        updates.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    let default_language = state.default_language.clone();

    Router::new()
        .fallback(proxy_handler)
        .with_state(state)
        .layer(middleware::from_fn_with_state(default_language, root_redirect))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// Main proxy handler.
/// Looks up the route, forwards the request and post-processes the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    // 1. Match Route
    let Some(matched) = state.router.match_request(&method, &path) else {
        tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, "none", start_time);
        return ProxyError::NoRoute {
            method: method.to_string(),
            path,
        }
        .into_response();
    };
    let route_id = matched.route.id.as_str();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        route = %route_id,
        cluster = %matched.cluster.id,
        "Proxying request"
    );

    // 2. Forward
    let upstream = match state.forwarder.forward(matched.cluster, request, client_addr).await {
        Ok(upstream) => upstream,
        Err(e) => {
            tracing::error!(request_id = %request_id, route = %route_id, error = %e, "Upstream error");
            metrics::record_request(method.as_str(), e.status().as_u16(), route_id, start_time);
            return e.into_response();
        }
    };

    // 3. Post-process
    let response = match matched.route.kind {
        RouteKind::Passthrough => passthrough(upstream),
        RouteKind::Translated => {
            match state.transformer.transform(upstream, matched.language()).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(
                        request_id = %request_id,
                        route = %route_id,
                        lang = ?matched.language(),
                        error = %e,
                        "Failed to read upstream body"
                    );
                    e.into_response()
                }
            }
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), route_id, start_time);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn server(default_language: Option<&str>) -> HttpServer {
        let mut config = ProxyConfig::default();
        config.default_language = default_language.map(str::to_string);
        // Nothing listens here; root requests must never reach it.
        config.upstream.address = "http://127.0.0.1:9".into();
        HttpServer::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_root_redirect_short_circuits() {
        let response = server(Some("fr"))
            .app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/editor?lang=fr");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_default_language_can_be_replaced() {
        let server = server(None);
        server.state().default_language.set(Some("it"));

        let response = server
            .app()
            .oneshot(Request::builder().uri("/?x=1").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.headers()[header::LOCATION], "/editor?lang=it");
    }
}
