//! Configuration file types.
//!
//! Every field is optional; anything left out falls back to the library
//! defaults when converted with [`HarnessFileConfig::to_harness_config`] or
//! [`HttpFileConfig::to_client_config`].

use super::error::ConfigError;
use crate::harness::{ClassificationPolicy, HarnessConfig, ToolCommand};
use crate::httputil::ClientConfig;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for tinyutil.
///
/// ```toml
/// [harness]
/// build_timeout_secs = 60
/// run_timeout_ms = 1500
/// policy = "strict"
///
/// [harness.runtime]
/// program = "wasmtime"
/// args = ["run", "--dir=."]
///
/// [http]
/// timeout_secs = 10
///
/// [logging]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TinyutilConfig {
    /// Harness settings.
    pub harness: HarnessFileConfig,
    /// HTTP client settings.
    pub http: HttpFileConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl TinyutilConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// `[harness]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessFileConfig {
    /// Compile budget in seconds.
    pub build_timeout_secs: Option<u64>,
    /// Run budget in milliseconds.
    pub run_timeout_ms: Option<u64>,
    /// Classification policy: `"exit-status-only"` or `"strict"`.
    pub policy: Option<ClassificationPolicy>,
    /// Compilation target.
    pub target: Option<String>,
    /// Source file extension.
    pub source_extension: Option<String>,
    /// Compiled artifact file name.
    pub artifact_name: Option<String>,
    /// Directory under which workspaces are created.
    pub workspace_root: Option<PathBuf>,
    /// Compiler command.
    pub compiler: Option<ToolCommand>,
    /// Runtime command.
    pub runtime: Option<ToolCommand>,
}

impl HarnessFileConfig {
    /// Applies these settings on top of the harness defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is zero or a name field is empty.
    pub fn to_harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        let mut config = HarnessConfig::default();

        if let Some(secs) = self.build_timeout_secs {
            config.build_timeout = positive("harness.build_timeout_secs", secs)
                .map(Duration::from_secs)?;
        }
        if let Some(ms) = self.run_timeout_ms {
            config.run_timeout = positive("harness.run_timeout_ms", ms)
                .map(Duration::from_millis)?;
        }
        if let Some(policy) = self.policy {
            config.policy = policy;
        }
        if let Some(ref target) = self.target {
            config.target = non_empty("harness.target", target)?;
        }
        if let Some(ref extension) = self.source_extension {
            config.source_extension = non_empty("harness.source_extension", extension)?;
        }
        if let Some(ref name) = self.artifact_name {
            config.artifact_name = non_empty("harness.artifact_name", name)?;
        }
        if let Some(ref root) = self.workspace_root {
            config.workspace_root = Some(root.clone());
        }
        if let Some(ref compiler) = self.compiler {
            non_empty("harness.compiler.program", &compiler.program)?;
            config.compiler = compiler.clone();
        }
        if let Some(ref runtime) = self.runtime {
            non_empty("harness.runtime.program", &runtime.program)?;
            config.runtime = runtime.clone();
        }

        Ok(config)
    }
}

/// `[http]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpFileConfig {
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
}

impl HttpFileConfig {
    /// Applies these settings on top of the client defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is zero.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::default();
        if let Some(secs) = self.timeout_secs {
            config.timeout = Some(Duration::from_secs(positive("http.timeout_secs", secs)?));
        }
        if let Some(ref user_agent) = self.user_agent {
            config.user_agent = user_agent.clone();
        }
        Ok(config)
    }
}

fn positive(field: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::new(field, "must be greater than zero"));
    }
    Ok(value)
}

fn non_empty(field: &str, value: &str) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::new(field, "must not be empty"));
    }
    Ok(value.to_string())
}
