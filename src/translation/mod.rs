//! Response translation subsystem.
//!
//! # Data Flow
//! ```text
//! language key (from the route capture)
//!     → source.rs (locate and read `{rules_dir}/{lang}.txt`)
//!     → rules.rs (split `PATTERN ==> REPLACEMENT` lines, compile patterns)
//!     → RuleSet (ordered, rebuilt per request)
//!     → engine.rs (sequential fold over the body)
//!     → translated body, or the original body on any failure
//! ```
//!
//! # Design Decisions
//! - Rules are reloaded on every request; editing a rule file takes effect
//!   immediately and there is no cache to invalidate
//! - A bad rule drops only itself; a missing file skips the whole rewrite
//! - Rules compose: each rule sees the output of the previous one
//! - Warnings go through an explicit [`WarningSink`], not a global logger

pub mod diagnostics;
pub mod engine;
pub mod rules;
pub mod source;

use thiserror::Error;

pub use diagnostics::{MemoryWarnings, TracingWarnings, Warning, WarningSink};
pub use engine::RewriteEngine;
pub use rules::{RuleSet, RuleSetLoader, TranslationRule, RULE_DELIMITER};
pub use source::{FileRuleSource, MemoryRuleSource, RuleSource};

/// Failure to obtain a rule set for a language.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The language key cannot name a rule resource.
    #[error("invalid language key {0:?}")]
    InvalidLanguage(String),

    /// The rule resource exists in name only: missing or unreadable.
    #[error("rule resource {resource} unavailable: {source}")]
    Unavailable {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while folding a rule set over a body.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// A rule grew the body beyond the configured ceiling.
    #[error("rule on line {line} grew the body past {limit} bytes")]
    OutputTooLarge { line: usize, limit: usize },
}
