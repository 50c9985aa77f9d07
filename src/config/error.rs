//! Configuration error type.

use std::fmt;

/// A configuration file could not be read, parsed, or applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The configuration field or source that was rejected.
    pub field: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid configuration for '{}': {}",
            self.field, self.reason
        )
    }
}

impl std::error::Error for ConfigError {}
