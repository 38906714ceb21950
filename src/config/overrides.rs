//! Command-line and environment overrides.
//!
//! Overrides are layered on top of every configuration that is loaded,
//! at startup and on each reload, so a file edit never undoes them.

use std::path::PathBuf;

use crate::config::schema::ProxyConfig;

/// Values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub upstream_address: Option<String>,
    pub rules_dir: Option<PathBuf>,
    pub default_language: Option<String>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields of `config` that have an override.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(bind) = &self.bind_address {
            config.listener.bind_address = bind.clone();
        }
        if let Some(upstream) = &self.upstream_address {
            config.upstream.address = upstream.clone();
        }
        if let Some(rules_dir) = &self.rules_dir {
            config.translations.rules_dir = rules_dir.clone();
        }
        if let Some(lang) = &self.default_language {
            config.default_language = Some(lang.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = parse_config(
            r#"
default_language = "de"

[listener]
bind_address = "127.0.0.1:1000"
"#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            default_language: Some("fr".into()),
            rules_dir: Some(PathBuf::from("/srv/rules")),
            ..Default::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.default_language(), Some("fr"));
        assert_eq!(config.translations.rules_dir, PathBuf::from("/srv/rules"));
        assert_eq!(config.listener.bind_address, "127.0.0.1:1000");
    }

    #[test]
    fn test_empty_overrides_leave_config_alone() {
        let overrides = ConfigOverrides::default();
        assert!(overrides.is_empty());

        let mut config = ProxyConfig::default();
        config.default_language = Some("es".into());
        overrides.apply(&mut config);
        assert_eq!(config, {
            let mut expected = ProxyConfig::default();
            expected.default_language = Some("es".into());
            expected
        });
    }
}
