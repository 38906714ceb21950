//! Rule resource lookup.
//!
//! # Responsibilities
//! - Map a language key to a resource name (`{lang}.{extension}`)
//! - Refuse keys that could escape the rules directory
//! - Read the resource as text

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::translation::LoadError;

/// Where rule text comes from.
pub trait RuleSource: Send + Sync {
    /// Read the raw rule text for a language.
    fn read(&self, language: &str) -> impl Future<Output = Result<String, LoadError>> + Send;
}

/// Rule files in a directory, one file per language.
#[derive(Debug, Clone)]
pub struct FileRuleSource {
    dir: PathBuf,
    extension: String,
}

impl FileRuleSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the rule file for `language`.
    pub fn resource_path(&self, language: &str) -> Result<PathBuf, LoadError> {
        if !is_valid_language(language) {
            return Err(LoadError::InvalidLanguage(language.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", language, self.extension)))
    }
}

impl RuleSource for FileRuleSource {
    async fn read(&self, language: &str) -> Result<String, LoadError> {
        let path = self.resource_path(language)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Unavailable {
                resource: path.display().to_string(),
                source,
            })
    }
}

/// Rule text held in memory, keyed by language.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleSource {
    languages: HashMap<String, String>,
}

impl MemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.languages.insert(language.into(), text.into());
        self
    }
}

impl RuleSource for MemoryRuleSource {
    async fn read(&self, language: &str) -> Result<String, LoadError> {
        self.languages
            .get(language)
            .cloned()
            .ok_or_else(|| LoadError::Unavailable {
                resource: language.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no rules for language"),
            })
    }
}

/// A language key is a single, non-empty file-name component.
pub fn is_valid_language(language: &str) -> bool {
    !language.is_empty()
        && !language.contains(['/', '\\', '\0'])
        && !language.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_path_uses_extension() {
        let source = FileRuleSource::new("/srv/rules", "txt");
        let path = source.resource_path("de").unwrap();
        assert_eq!(path, PathBuf::from("/srv/rules/de.txt"));
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let source = FileRuleSource::new("/srv/rules", "txt");
        for key in ["", "..", "../etc/passwd", "a/b", "a\\b", "x..y"] {
            assert!(
                matches!(source.resource_path(key), Err(LoadError::InvalidLanguage(_))),
                "{key:?} should be rejected"
            );
        }
        assert!(source.resource_path("pt-BR").is_ok());
        assert!(source.resource_path("zh_Hans").is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileRuleSource::new(dir.path(), "txt");

        let err = source.read("fr").await.unwrap_err();
        match err {
            LoadError::Unavailable { resource, source } => {
                assert!(resource.ends_with("fr.txt"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("it.txt"), "Hello ==> Ciao\n").unwrap();
        let source = FileRuleSource::new(dir.path(), "txt");

        assert_eq!(source.read("it").await.unwrap(), "Hello ==> Ciao\n");
    }
}
