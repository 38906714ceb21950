//! Warning capability for the translation pipeline.
//!
//! The loader and the engine never reach for a global logger. They receive a
//! [`WarningSink`] at construction time; production wiring passes
//! [`TracingWarnings`], tests pass [`MemoryWarnings`] and inspect it.

use std::sync::Mutex;

/// Narrow logging capability: record a warning with structured fields.
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str, fields: &[(&str, &str)]);
}

/// Forwards warnings to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWarnings;

impl WarningSink for TracingWarnings {
    fn warn(&self, message: &str, fields: &[(&str, &str)]) {
        let details = fields
            .iter()
            .map(|(key, value)| format!("{key}={value:?}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::warn!(details = %details, "{}", message);
    }
}

/// A recorded warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl Warning {
    /// Value of a field, if present.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps warnings in memory.
#[derive(Debug, Default)]
pub struct MemoryWarnings {
    entries: Mutex<Vec<Warning>>,
}

impl MemoryWarnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn entries(&self) -> Vec<Warning> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WarningSink for MemoryWarnings {
    fn warn(&self, message: &str, fields: &[(&str, &str)]) {
        let warning = Warning {
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(warning);
        }
    }
}
