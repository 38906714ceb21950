//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the upstream URL and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ProxyConfig;
use crate::routing::Cluster;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("upstream.cluster_id must not be empty")]
    EmptyClusterId,

    #[error("upstream.address is invalid: {0}")]
    InvalidUpstream(String),

    #[error("translations.extension {0:?} must be a non-empty file extension")]
    InvalidExtension(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("default_language {0:?} contains whitespace or control characters")]
    InvalidDefaultLanguage(String),

    #[error("observability.log_level {0:?} is not a valid filter")]
    InvalidLogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.upstream.cluster_id.trim().is_empty() {
        errors.push(ValidationError::EmptyClusterId);
    }
    if let Err(e) = Cluster::new(config.upstream.cluster_id.clone(), &config.upstream.address) {
        errors.push(ValidationError::InvalidUpstream(e.to_string()));
    }

    let extension = &config.translations.extension;
    if extension.is_empty() || extension.starts_with('.') || extension.contains(['/', '\\']) {
        errors.push(ValidationError::InvalidExtension(extension.clone()));
    }
    if config.translations.max_output_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("translations.max_output_bytes"));
    }
    if config.limits.max_request_body_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("limits.max_request_body_bytes"));
    }

    if let Some(lang) = config.default_language() {
        if lang.chars().any(|c| c.is_whitespace() || c.is_control()) {
            errors.push(ValidationError::InvalidDefaultLanguage(lang.to_string()));
        }
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.upstream.cluster_id = "".into();
        config.upstream.address = "localhost".into();
        config.translations.extension = ".txt".into();
        config.translations.max_output_bytes = 0;
        config.limits.max_request_body_bytes = 0;
        config.default_language = Some("f r".into());
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "metrics".into();

        let errors = validate_config(&config).unwrap_err();

        assert!(errors.contains(&ValidationError::EmptyClusterId));
        assert!(errors.contains(&ValidationError::InvalidExtension(".txt".into())));
        assert!(errors.contains(&ValidationError::ZeroLimit("translations.max_output_bytes")));
        assert!(errors.contains(&ValidationError::ZeroLimit("limits.max_request_body_bytes")));
        assert!(errors.contains(&ValidationError::InvalidDefaultLanguage("f r".into())));
        assert!(errors.contains(&ValidationError::InvalidMetricsAddress("metrics".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidUpstream(_))));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "metrics".into();
        assert_eq!(validate_config(&config), Ok(()));
    }
}
