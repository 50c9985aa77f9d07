//! Ephemeral build-and-execute harness for restricted-target test programs.
//!
//! Each call to [`Harness::run`] takes program source text through a fixed,
//! strictly sequential pipeline:
//!
//! ```text
//! Source text
//!         |
//!         v
//! +-------------------+
//! |     Workspace     |  Unique temp dir, removed on every exit path
//! +-------------------+
//!         |
//!         v
//! +-------------------+
//! |    Materialize    |  main.<ext>, synced and closed
//! +-------------------+
//!         |
//!         v
//! +-------------------+
//! |   Compile Stage   |  <compiler> build -o <out> -target <target> <src>
//! +-------------------+    (build budget, default 30s)
//!         |
//!         v
//! +-------------------+
//! |   Execute Stage   |  <runtime> [args...] <out>
//! +-------------------+    (run budget, default 1s)
//!         |
//!         v
//! +-------------------+
//! |     Classify      |  ProgramOutput or RuntimeError
//! +-------------------+
//! ```
//!
//! Nothing is cached or reused between calls, and concurrent calls share
//! nothing but the temp-directory root.
//!
//! # Classification policy
//!
//! Source toolchains disagree on whether diagnostic output from a program
//! that exits zero means failure. The harness makes this an explicit part of
//! its contract via [`ClassificationPolicy`]. The default is
//! [`ClassificationPolicy::ExitStatusOnly`]: only an unsuccessful exit, a
//! timeout or a launch failure fails the run, and diagnostics are returned as
//! non-fatal context through [`ProgramOutput::diagnostics`]. A `Harness`
//! applies its one policy to every call.
//!
//! # Example
//!
//! ```rust,ignore
//! use tinyutil::harness::{Harness, HarnessConfig};
//!
//! let harness = Harness::new(HarnessConfig::default());
//! let output = harness.run(r#"
//! package main
//!
//! func main() { println("hello") }
//! "#).await?;
//! assert_eq!(output.text(), "hello");
//! ```

pub mod classify;
pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
mod process;
pub mod source;
pub mod workspace;

pub use classify::{classify, ProgramOutput};
pub use compile::{compile, CompiledArtifact};
pub use config::{
    ClassificationPolicy, HarnessConfig, ToolCommand, DEFAULT_ARTIFACT_NAME,
    DEFAULT_BUILD_TIMEOUT, DEFAULT_RUN_TIMEOUT, DEFAULT_SOURCE_EXTENSION, DEFAULT_TARGET,
};
pub use error::{HarnessError, HarnessErrorKind, StageFailure, MAX_CAPTURED_OUTPUT};
pub use execute::{execute, Completion, ExecutionOutcome};
pub use source::{write_source, SourceFile};
pub use workspace::{Workspace, WORKSPACE_PREFIX};

/// Compiles and runs one-shot test programs.
///
/// The harness holds only configuration, so it is cheap to share and safe to
/// call concurrently; every call gets its own workspace.
#[derive(Debug, Clone, Default)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    /// Creates a harness with the given configuration.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Returns the harness configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Compiles `source`, runs it and returns its classified output.
    ///
    /// The workspace is removed before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns exactly one of:
    /// - a workspace error if the workspace or source file cannot be prepared,
    ///   or if an otherwise successful run leaves its workspace behind,
    /// - a build error if compilation fails, times out or cannot start
    ///   (the program is then never executed),
    /// - a runtime error if execution fails, times out, cannot start, or is
    ///   classified as a failure.
    pub async fn run(&self, source: &str) -> Result<ProgramOutput, HarnessError> {
        let workspace = Workspace::acquire(self.config.workspace_root.as_deref())?;
        let result = self.run_in(&workspace, source).await;
        let result = finish(result, workspace.release());

        match &result {
            Ok(output) => tracing::debug!(stdout_bytes = output.stdout().len(), "run succeeded"),
            Err(e) => tracing::debug!(error = %e, "run failed"),
        }
        result
    }

    /// Blocking form of [`run`](Self::run) for synchronous callers.
    ///
    /// Drives the run on a private current-thread runtime. Must not be called
    /// from inside an async context.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), plus a workspace error if the runtime cannot
    /// be created.
    pub fn run_blocking(&self, source: &str) -> Result<ProgramOutput, HarnessError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| HarnessError::workspace("starting async runtime", e.to_string()))?;
        runtime.block_on(self.run(source))
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        source: &str,
    ) -> Result<ProgramOutput, HarnessError> {
        let config = &self.config;

        let source = write_source(workspace, source, &config.source_extension)?;
        let artifact = compile(
            &config.compiler,
            &source,
            &workspace.file(&config.artifact_name),
            &config.target,
            config.build_timeout,
        )
        .await?;
        let outcome = execute(&config.runtime, artifact, config.run_timeout).await?;
        classify(outcome, config.policy)
    }
}

/// Combines a run result with the outcome of releasing its workspace.
///
/// A stage failure takes precedence; a release failure is then only logged.
fn finish(
    result: Result<ProgramOutput, HarnessError>,
    released: Result<(), HarnessError>,
) -> Result<ProgramOutput, HarnessError> {
    match (result, released) {
        (result, Ok(())) => result,
        (Ok(_), Err(e)) => Err(e),
        (Err(stage), Err(e)) => {
            tracing::warn!(error = %e, "failed to remove workspace after a failed run");
            Err(stage)
        }
    }
}
