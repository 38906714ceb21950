//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    let config: ProxyConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ProxyConfig::default());
        assert_eq!(config.upstream.address, "https://ozoblockly.com");
        assert_eq!(config.default_language(), None);
    }

    #[test]
    fn test_full_file() {
        let config = parse_config(
            r#"
            default_language = "fr"

            [listener]
            bind_address = "127.0.0.1:3000"

            [upstream]
            address = "http://127.0.0.1:4000"
            timeout_secs = 20

            [translations]
            rules_dir = "/srv/rules"
            extension = "rules"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_language(), Some("fr"));
        assert_eq!(config.listener.bind_address, "127.0.0.1:3000");
        assert_eq!(config.upstream.address, "http://127.0.0.1:4000");
        assert_eq!(config.upstream.timeout_secs, 20);
        assert_eq!(config.upstream.connect_timeout_secs, 10);
        assert_eq!(config.translations.rules_dir, Path::new("/srv/rules"));
        assert_eq!(config.translations.extension, "rules");
    }

    #[test]
    fn test_blank_default_language_is_unset() {
        let config = parse_config("default_language = \"  \"").unwrap();
        assert_eq!(config.default_language(), None);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            parse_config("[listener\nbind_address = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_error_lists_everything() {
        let err = parse_config(
            r#"
            [listener]
            bind_address = "nowhere"

            [upstream]
            address = "ftp://example.com"
            "#,
        )
        .unwrap_err();

        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        let message = err.to_string();
        assert!(message.contains("nowhere"));
        assert!(message.contains("ftp://example.com"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
