//! Translating reverse proxy.
//!
//! Forwards everything to a single upstream origin, rewrites the generated
//! editor bundle with per-language substitution rules, and redirects `/` to
//! the editor in the default language.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────────┐
//!                       │                  TRANSLATION PROXY                    │
//!                       │                                                       │
//!   Client Request      │  ┌──────────┐    ┌──────────┐    ┌──────────┐         │
//!   ────────────────────┼─▶│ request  │───▶│   root   │───▶│ routing  │         │
//!                       │  │ id/trace │    │ redirect │    │  table   │         │
//!                       │  └──────────┘    └──────────┘    └────┬─────┘         │
//!                       │                                       │               │
//!                       │                                       ▼               │
//!   Client Response     │  ┌──────────┐    ┌──────────┐    ┌──────────┐         │
//!   ◀───────────────────┼──│ response │◀───│  rewrite │◀───│ forward  │◀────────┼── Upstream
//!                       │  │ (framed) │    │  engine  │    │ (reqwest)│         │   Origin
//!                       │  └──────────┘    └────▲─────┘    └──────────┘         │
//!                       │                       │                               │
//!                       │                 ┌─────┴──────┐                        │
//!                       │                 │ {lang}.txt │  rule files, per req   │
//!                       │                 └────────────┘                        │
//!                       └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use translation_proxy::config::{
    load_config, validate_config, ConfigError, ConfigOverrides, ConfigWatcher, ProxyConfig,
};
use translation_proxy::http::HttpServer;
use translation_proxy::lifecycle::{wait_for_termination, Shutdown};
use translation_proxy::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "translation-proxy")]
#[command(about = "Reverse proxy that translates the generated editor bundle", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,

    /// Upstream base URL, overrides `upstream.address`.
    #[arg(long)]
    upstream: Option<String>,

    /// Directory with `{lang}.txt` rule files, overrides `translations.rules_dir`.
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Language for `/` redirects, overrides `default_language`.
    #[arg(long, env = "DEFAULT_LANGUAGE")]
    default_language: Option<String>,

    /// Reload the configuration file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            upstream_address: self.upstream.clone(),
            rules_dir: self.rules_dir.clone(),
            default_language: self.default_language.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = cli.overrides();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    overrides.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!("translation-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        rules_dir = %config.translations.rules_dir.display(),
        default_language = ?config.default_language(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match (&cli.config, cli.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.with_overrides(overrides).run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_termination().await;
            shutdown.trigger();
        }
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
