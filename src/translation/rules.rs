//! Rule parsing and rule set loading.
//!
//! # Resource format
//! ```text
//! PATTERN ==> REPLACEMENT
//! ```
//! One rule per line. A line only counts when splitting on the literal
//! `" ==> "` gives exactly two parts and the replacement is non-empty; every
//! other line is skipped without a warning. Patterns use `regex` syntax.
//!
//! # Replacement references
//! - `$N` takes every following digit as the group number, so `$1a` is group
//!   1 followed by `a`
//! - `${N}` and `${name}` name a group explicitly
//! - `$&` is the whole match, `$$` a single dollar
//!
//! A reference to a group the pattern does not have stays literal text, so
//! `costs $5` survives a pattern without five groups. Any other `$` is also
//! kept as is.

use std::sync::Arc;

use regex::Regex;

use crate::translation::diagnostics::WarningSink;
use crate::translation::source::{FileRuleSource, RuleSource};
use crate::translation::LoadError;

/// Separator between pattern and replacement.
pub const RULE_DELIMITER: &str = " ==> ";

/// A compiled pattern with its replacement text.
#[derive(Debug, Clone)]
pub struct TranslationRule {
    pattern: Regex,
    replacement: String,
    line: usize,
}

impl TranslationRule {
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// 1-based line in the rule resource.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Ordered rules for one language.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    language: String,
    rules: Vec<TranslationRule>,
}

impl RuleSet {
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn rules(&self) -> &[TranslationRule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TranslationRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a TranslationRule;
    type IntoIter = std::slice::Iter<'a, TranslationRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Split a resource line into `(pattern, replacement)`.
///
/// Returns `None` for anything but exactly one delimiter followed by a
/// non-empty replacement.
pub fn split_rule_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(RULE_DELIMITER);
    let pattern = parts.next()?;
    let replacement = parts.next()?;
    if parts.next().is_some() || replacement.is_empty() {
        return None;
    }
    Some((pattern, replacement))
}

/// Compile every well-formed line of `text` into a rule set.
///
/// Patterns that fail to compile are reported to `warnings` and dropped; the
/// remaining rules keep their line order.
pub fn parse_rules(language: &str, text: &str, warnings: &dyn WarningSink) -> RuleSet {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let rules = text
        .lines()
        .enumerate()
        .filter_map(|(index, line)| {
            split_rule_line(line).map(|(pattern, replacement)| (index + 1, pattern, replacement))
        })
        .filter_map(|(line, pattern, replacement)| match Regex::new(pattern) {
            Ok(pattern) => Some(TranslationRule {
                replacement: expand_references(&pattern, replacement),
                pattern,
                line,
            }),
            Err(e) => {
                let error = e.to_string();
                let line_number = line.to_string();
                warnings.warn(
                    "Error while replacing pattern, rule skipped",
                    &[
                        ("language", language),
                        ("line", line_number.as_str()),
                        ("pattern", pattern),
                        ("replacement", replacement),
                        ("error", error.as_str()),
                    ],
                );
                None
            }
        })
        .collect();

    RuleSet {
        language: language.to_string(),
        rules,
    }
}

/// Rewrite `replacement` into `regex` expansion syntax.
///
/// Valid group references become `${..}`; every other `$` is escaped so it
/// reaches the output unchanged.
pub fn expand_references(pattern: &Regex, replacement: &str) -> String {
    let has_group = |name: &str| match name.parse::<usize>() {
        Ok(index) => index < pattern.captures_len(),
        Err(_) => pattern.capture_names().flatten().any(|n| n == name),
    };

    let mut out = String::with_capacity(replacement.len());
    let mut rest = replacement;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push_str("$$");
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('&') {
            out.push_str("${0}");
            rest = tail;
        } else if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if end > 0 && has_group(&braced[..end]) => {
                    out.push_str("${");
                    out.push_str(&braced[..end]);
                    out.push('}');
                    rest = &braced[end + 1..];
                }
                _ => {
                    out.push_str("$$");
                    rest = after;
                }
            }
        } else {
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 0 && has_group(&after[..digits]) {
                out.push_str("${");
                out.push_str(&after[..digits]);
                out.push('}');
                rest = &after[digits..];
            } else {
                out.push_str("$$");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Loads rule sets from a [`RuleSource`], reporting bad rules as warnings.
pub struct RuleSetLoader<S = FileRuleSource> {
    source: S,
    warnings: Arc<dyn WarningSink>,
}

impl<S: RuleSource> RuleSetLoader<S> {
    pub fn new(source: S, warnings: Arc<dyn WarningSink>) -> Self {
        Self { source, warnings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn warnings(&self) -> &Arc<dyn WarningSink> {
        &self.warnings
    }

    /// Read and compile the rules for `language`.
    ///
    /// An unreadable resource is an error; a readable one always yields a
    /// rule set, possibly empty.
    pub async fn load(&self, language: &str) -> Result<RuleSet, LoadError> {
        let text = self.source.read(language).await?;
        Ok(parse_rules(language, &text, self.warnings.as_ref()))
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for RuleSetLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSetLoader")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
