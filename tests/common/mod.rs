//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use translation_proxy::config::ProxyConfig;
use translation_proxy::http::HttpServer;
use translation_proxy::lifecycle::Shutdown;

/// A running proxy bound to an ephemeral port.
pub struct ProxyHandle {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<ProxyConfig>,
}

impl ProxyHandle {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for ProxyHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `app` as a mock upstream on an ephemeral port.
pub async fn start_backend(app: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy configuration pointing at `backend` with rules from `rules_dir`.
pub fn proxy_config(backend: SocketAddr, rules_dir: &Path) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.address = format!("http://{}", backend);
    config.translations.rules_dir = rules_dir.to_path_buf();
    config
}

/// Start a proxy for `config`.
pub async fn start_proxy(config: ProxyConfig) -> ProxyHandle {
    spawn_server(HttpServer::new(config).unwrap()).await
}

/// Run a prepared server on an ephemeral port.
pub async fn spawn_server(server: HttpServer) -> ProxyHandle {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    ProxyHandle {
        addr,
        shutdown,
        config_updates,
    }
}

/// Write `{lang}.txt` into `dir`.
pub fn write_rules(dir: &Path, lang: &str, rules: &str) {
    std::fs::write(dir.join(format!("{lang}.txt")), rules).unwrap();
}

/// HTTP client that neither follows redirects nor uses a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
