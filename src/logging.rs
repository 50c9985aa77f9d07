//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Binaries and tests call
//! [`init_logging`] once to print them to stderr; `RUST_LOG` takes precedence
//! over the configured level when set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Configuration for log output.
///
/// # Example
///
/// ```rust
/// use tinyutil::logging::{LogLevel, LoggingConfig};
///
/// let config = LoggingConfig::new().with_level(LogLevel::Debug);
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether to install a subscriber at all.
    pub enabled: bool,
    /// Level used when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Route output through the test harness capture instead of stderr.
    pub test_writer: bool,
}

impl LoggingConfig {
    /// Creates a new LoggingConfig with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a disabled logging configuration.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Sets the log level filter.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Routes output through the libtest capture.
    #[must_use]
    pub fn with_test_writer(mut self) -> Self {
        self.test_writer = true;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::default(),
            test_writer: false,
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level - most verbose.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warn level - default.
    #[default]
    Warn,
    /// Error level - least verbose.
    Error,
}

impl LogLevel {
    /// Converts to tracing_subscriber LevelFilter.
    #[must_use]
    pub fn to_filter(self) -> tracing_subscriber::filter::LevelFilter {
        match self {
            Self::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            Self::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            Self::Info => tracing_subscriber::filter::LevelFilter::INFO,
            Self::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            Self::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingError {
    /// The specific error that occurred.
    pub kind: LoggingErrorKind,
}

/// Specific logging error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingErrorKind {
    /// Subscriber initialization failed.
    SubscriberInitFailed {
        /// The reason for failure.
        reason: String,
    },
}

impl LoggingError {
    /// Creates a new LoggingError with the given kind.
    #[must_use]
    pub fn new(kind: LoggingErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an error for subscriber initialization failure.
    #[must_use]
    pub fn subscriber_init_failed(reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::SubscriberInitFailed {
            reason: reason.into(),
        })
    }
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LoggingErrorKind::SubscriberInitFailed { reason } => {
                write!(
                    f,
                    "failed to initialize tracing subscriber: {}; \
                     a subscriber may already be set",
                    reason
                )
            }
        }
    }
}

impl std::error::Error for LoggingError {}

/// Installs a global fmt subscriber writing to stderr.
///
/// # Returns
///
/// `Ok(true)` if a subscriber was installed.
/// `Ok(false)` if logging is disabled or was already initialized here.
///
/// # Errors
///
/// Returns an error if another global subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, LoggingError> {
    if !config.enabled || LOGGING_INITIALIZED.get().is_some() {
        return Ok(false);
    }

    let filter = EnvFilter::builder()
        .with_default_directive(config.level.to_filter().into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let result = if config.test_writer {
        builder.with_test_writer().try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };

    match result {
        Ok(()) => {
            let _ = LOGGING_INITIALIZED.set(());
            Ok(true)
        }
        Err(e) => Err(LoggingError::subscriber_init_failed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_config_default_values() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, LogLevel::Warn);
        assert!(!config.test_writer);
    }

    #[test]
    fn logging_config_builder_pattern() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Debug)
            .with_test_writer();
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.test_writer);
    }

    #[test]
    fn log_level_to_filter_mapping() {
        use tracing_subscriber::filter::LevelFilter;
        assert_eq!(LogLevel::Trace.to_filter(), LevelFilter::TRACE);
        assert_eq!(LogLevel::Debug.to_filter(), LevelFilter::DEBUG);
        assert_eq!(LogLevel::Info.to_filter(), LevelFilter::INFO);
        assert_eq!(LogLevel::Warn.to_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Error.to_filter(), LevelFilter::ERROR);
    }

    #[test]
    fn log_level_deserializes_lowercase() {
        let config: LoggingConfig = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert!(config.enabled);
    }

    #[test]
    fn disabled_config_installs_nothing() {
        assert_eq!(init_logging(&LoggingConfig::disabled()), Ok(false));
    }

    #[test]
    fn init_logging_is_idempotent() {
        let config = LoggingConfig::new().with_test_writer();
        assert_eq!(init_logging(&config), Ok(true));
        assert_eq!(init_logging(&config), Ok(false));
    }

    #[test]
    fn subscriber_init_failed_display() {
        let error = LoggingError::subscriber_init_failed("already set");
        assert!(error.to_string().contains("already set"));
    }
}
