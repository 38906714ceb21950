//! Sequential rule application.
//!
//! Rules run in file order and each one rewrites the output of the previous
//! one. Given `a ==> b` followed by `b ==> c`, the body `a` becomes `c`.
//! Replacement text that matches a later pattern is rewritten again; that is
//! intended and covered by tests.

use std::borrow::Cow;
use std::sync::Arc;

use crate::observability::metrics;
use crate::translation::diagnostics::WarningSink;
use crate::translation::rules::{RuleSet, RuleSetLoader};
use crate::translation::source::RuleSource;
use crate::translation::RewriteError;

/// Applies rule sets to response bodies.
pub struct RewriteEngine {
    max_output_bytes: usize,
    warnings: Arc<dyn WarningSink>,
}

impl RewriteEngine {
    pub fn new(max_output_bytes: usize, warnings: Arc<dyn WarningSink>) -> Self {
        Self {
            max_output_bytes,
            warnings,
        }
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output_bytes
    }

    /// Fold `rules` over `body`, replacing every match of each rule in turn.
    pub fn apply(&self, body: &str, rules: &RuleSet) -> Result<String, RewriteError> {
        let mut current = body.to_string();

        for rule in rules {
            let replaced = match rule.pattern().replace_all(&current, rule.replacement()) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(replaced) => replaced,
            };
            if replaced.len() > self.max_output_bytes {
                return Err(RewriteError::OutputTooLarge {
                    line: rule.line(),
                    limit: self.max_output_bytes,
                });
            }
            current = replaced;
        }

        Ok(current)
    }

    /// Load the rules for `language` and apply them, falling back to the
    /// untouched `body` when either step fails.
    pub async fn translate<S: RuleSource>(
        &self,
        body: String,
        language: &str,
        loader: &RuleSetLoader<S>,
    ) -> String {
        let rules = match loader.load(language).await {
            Ok(rules) => rules,
            Err(e) => {
                let error = e.to_string();
                self.warnings.warn(
                    "Error while applying translations, body left unchanged",
                    &[("language", language), ("error", error.as_str())],
                );
                metrics::record_translation(metrics::UNKNOWN_LANGUAGE, "unavailable", 0);
                return body;
            }
        };

        match self.apply(&body, &rules) {
            Ok(translated) => {
                tracing::debug!(
                    lang = %language,
                    rules = rules.len(),
                    before = body.len(),
                    after = translated.len(),
                    "Translation applied"
                );
                metrics::record_translation(language, "applied", rules.len());
                translated
            }
            Err(e) => {
                let error = e.to_string();
                self.warnings.warn(
                    "Error while applying translations, body left unchanged",
                    &[("language", language), ("error", error.as_str())],
                );
                metrics::record_translation(language, "failed", rules.len());
                body
            }
        }
    }
}

impl std::fmt::Debug for RewriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteEngine")
            .field("max_output_bytes", &self.max_output_bytes)
            .finish_non_exhaustive()
    }
}
