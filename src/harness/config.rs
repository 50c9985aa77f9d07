//! Harness configuration types.
//!
//! Holds the two timeout budgets, the external toolchain commands and the
//! classification policy used by a [`Harness`](super::Harness).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default compile budget (30 seconds). Toolchain startup and compilation are slow.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(30);

/// Default run budget (1 second). Test programs must be fast; hangs must fail quickly.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(1);

/// Default compiler program.
pub const DEFAULT_COMPILER: &str = "tinygo";

/// Default runtime program.
pub const DEFAULT_RUNTIME: &str = "wasmtime";

/// Default compilation target passed as `-target`.
pub const DEFAULT_TARGET: &str = "wasip1";

/// Default extension of the materialized source file.
pub const DEFAULT_SOURCE_EXTENSION: &str = "go";

/// Default file name of the compiled artifact inside the workspace.
pub const DEFAULT_ARTIFACT_NAME: &str = "program.wasm";

/// How the result classifier treats a program's diagnostic stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationPolicy {
    /// Only an unsuccessful exit fails the run. Diagnostic output from a
    /// successful run is kept as non-fatal context on the output.
    #[default]
    ExitStatusOnly,
    /// Any diagnostic output fails the run, even when the program exits zero.
    Strict,
}

/// An external program plus the leading arguments the harness prepends to.
///
/// The compile stage appends `build -o <out> -target <target> <src>`; the
/// execute stage appends the artifact path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program name (looked up on `PATH`) or path.
    pub program: String,
    /// Arguments placed before the stage-specific arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the subprocess.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ToolCommand {
    /// Creates a command with no leading arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Appends a leading argument.
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets an environment variable for the subprocess.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Returns true if the program can be found.
    ///
    /// A program containing a path separator is checked directly; a bare
    /// name is searched for in every `PATH` entry.
    #[must_use]
    pub fn is_available(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file();
        }

        env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
            .unwrap_or(false)
    }
}

/// Configuration for a [`Harness`](super::Harness).
///
/// # Example
///
/// ```rust
/// use tinyutil::harness::{ClassificationPolicy, HarnessConfig, ToolCommand};
/// use std::time::Duration;
///
/// let config = HarnessConfig::new()
///     .with_compiler(ToolCommand::new("tinygo"))
///     .with_runtime(ToolCommand::new("wasmtime").with_arg("run"))
///     .with_run_timeout(Duration::from_millis(1500))
///     .with_policy(ClassificationPolicy::Strict);
/// assert_eq!(config.target, "wasip1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Compiler invoked by the compile stage.
    pub compiler: ToolCommand,
    /// Sandboxed runtime invoked by the execute stage.
    pub runtime: ToolCommand,
    /// Target identifier passed to the compiler as `-target`.
    pub target: String,
    /// Extension of the source file, without the leading dot.
    pub source_extension: String,
    /// File name of the compiled artifact.
    pub artifact_name: String,
    /// Compile budget.
    ///
    /// Default: 30 seconds
    pub build_timeout: Duration,
    /// Run budget.
    ///
    /// Default: 1 second
    pub run_timeout: Duration,
    /// Classification policy applied to every run.
    pub policy: ClassificationPolicy,
    /// Directory under which workspaces are created. `None` uses the system temp dir.
    pub workspace_root: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            compiler: ToolCommand::new(DEFAULT_COMPILER),
            runtime: ToolCommand::new(DEFAULT_RUNTIME).with_arg("run"),
            target: DEFAULT_TARGET.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            policy: ClassificationPolicy::default(),
            workspace_root: None,
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compiler command.
    #[must_use]
    pub fn with_compiler(mut self, compiler: ToolCommand) -> Self {
        self.compiler = compiler;
        self
    }

    /// Sets the runtime command.
    #[must_use]
    pub fn with_runtime(mut self, runtime: ToolCommand) -> Self {
        self.runtime = runtime;
        self
    }

    /// Sets the compilation target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Sets the source file extension (without the dot).
    #[must_use]
    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    /// Sets the artifact file name.
    #[must_use]
    pub fn with_artifact_name(mut self, name: impl Into<String>) -> Self {
        self.artifact_name = name.into();
        self
    }

    /// Sets the compile budget.
    #[must_use]
    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    /// Sets the run budget.
    #[must_use]
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Sets the classification policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the directory under which workspaces are created.
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }
}
