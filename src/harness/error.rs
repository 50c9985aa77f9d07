//! Harness error types.
//!
//! Every harness invocation either returns the program's output or exactly one
//! `HarnessError`. The error records which stage failed (workspace, build or
//! runtime) and, for the two subprocess stages, how the subprocess failed.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum number of bytes of captured output carried in an error payload (1MB).
pub const MAX_CAPTURED_OUTPUT: usize = 1024 * 1024;

/// Errors that can occur while building or running a test program.
///
/// This type uses `Box<HarnessErrorKind>` to keep the error size small,
/// enabling efficient use in Result types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessError {
    /// The specific error that occurred (boxed for size efficiency)
    kind: Box<HarnessErrorKind>,
}

/// Which part of the invocation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarnessErrorKind {
    /// The ephemeral workspace or the source file could not be created or written.
    Workspace {
        /// Operation that failed
        operation: String,
        /// Error message
        message: String,
    },

    /// The compile stage failed; the program was never executed.
    Build(StageFailure),

    /// The execute stage failed, or its output was classified as a failure.
    Runtime(StageFailure),
}

/// How a subprocess stage failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageFailure {
    /// The subprocess could not be started at all.
    Launch {
        /// The program that was invoked
        program: String,
        /// Why the spawn failed
        reason: String,
    },

    /// The subprocess ran and exited unsuccessfully.
    Exit {
        /// Exit code, or `None` if the process was terminated by a signal
        exit_code: Option<i32>,
        /// Captured diagnostic text
        output: String,
    },

    /// The subprocess exceeded its budget and was killed.
    Timeout {
        /// The budget that was exceeded
        limit: Duration,
        /// Whatever diagnostic text was captured before the kill
        output: String,
    },

    /// The program exited zero but wrote to its diagnostic stream (strict policy).
    Diagnostics {
        /// The diagnostic text
        output: String,
    },

    /// The compiler exited zero without producing an artifact.
    MissingArtifact {
        /// Where the artifact was expected
        path: PathBuf,
    },

    /// Waiting on the subprocess or reading its output failed.
    Supervision {
        /// Description of the failure
        reason: String,
    },
}

impl HarnessError {
    /// Creates a new `HarnessError` with the given kind.
    #[must_use]
    pub fn new(kind: HarnessErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
        }
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &HarnessErrorKind {
        &self.kind
    }

    /// Creates a workspace error.
    #[must_use]
    pub fn workspace(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(HarnessErrorKind::Workspace {
            operation: operation.into(),
            message: message.into(),
        })
    }

    /// Creates a build error.
    #[must_use]
    pub fn build(failure: StageFailure) -> Self {
        Self::new(HarnessErrorKind::Build(failure))
    }

    /// Creates a runtime error.
    #[must_use]
    pub fn runtime(failure: StageFailure) -> Self {
        Self::new(HarnessErrorKind::Runtime(failure))
    }

    /// Returns true if the workspace or source file could not be prepared.
    #[must_use]
    pub fn is_workspace_error(&self) -> bool {
        matches!(*self.kind, HarnessErrorKind::Workspace { .. })
    }

    /// Returns true if the compile stage failed.
    #[must_use]
    pub fn is_build_error(&self) -> bool {
        matches!(*self.kind, HarnessErrorKind::Build(_))
    }

    /// Returns true if the execute stage failed.
    #[must_use]
    pub fn is_runtime_error(&self) -> bool {
        matches!(*self.kind, HarnessErrorKind::Runtime(_))
    }

    /// Returns true if either subprocess stage was killed for exceeding its budget.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.stage_failure(), Some(StageFailure::Timeout { .. }))
    }

    /// Returns true if either subprocess could not be started.
    #[must_use]
    pub fn is_launch_failure(&self) -> bool {
        matches!(self.stage_failure(), Some(StageFailure::Launch { .. }))
    }

    /// Returns the subprocess failure, if this error came from a subprocess stage.
    #[must_use]
    pub fn stage_failure(&self) -> Option<&StageFailure> {
        match self.kind.as_ref() {
            HarnessErrorKind::Build(failure) | HarnessErrorKind::Runtime(failure) => Some(failure),
            HarnessErrorKind::Workspace { .. } => None,
        }
    }
}

impl StageFailure {
    /// Creates a launch failure.
    #[must_use]
    pub fn launch(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Launch {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unsuccessful-exit failure.
    #[must_use]
    pub fn exit(exit_code: Option<i32>, output: impl Into<String>) -> Self {
        Self::Exit {
            exit_code,
            output: output.into(),
        }
    }

    /// Creates a timeout failure.
    #[must_use]
    pub fn timeout(limit: Duration, output: impl Into<String>) -> Self {
        Self::Timeout {
            limit,
            output: output.into(),
        }
    }

    /// Creates a strict-policy diagnostics failure.
    #[must_use]
    pub fn diagnostics(output: impl Into<String>) -> Self {
        Self::Diagnostics {
            output: output.into(),
        }
    }

    /// Creates a supervision failure.
    #[must_use]
    pub fn supervision(reason: impl Into<String>) -> Self {
        Self::Supervision {
            reason: reason.into(),
        }
    }

    /// Returns the captured output carried by this failure, if any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Exit { output, .. }
            | Self::Timeout { output, .. }
            | Self::Diagnostics { output } => Some(output),
            _ => None,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch { program, reason } => {
                write!(
                    f,
                    "failed to launch '{}': {}; check that it is installed and on PATH",
                    program, reason
                )
            }
            Self::Exit { exit_code, output } => {
                match exit_code {
                    Some(code) => write!(f, "exited with code {}", code)?,
                    None => write!(f, "terminated by signal")?,
                }
                write_output(f, output)
            }
            Self::Timeout { limit, output } => {
                write!(f, "timed out after {} ms", limit.as_millis())?;
                write_output(f, output)
            }
            Self::Diagnostics { output } => {
                write!(f, "exited successfully but wrote diagnostic output")?;
                write_output(f, output)
            }
            Self::MissingArtifact { path } => {
                write!(
                    f,
                    "exited successfully but produced no artifact at '{}'",
                    path.display()
                )
            }
            Self::Supervision { reason } => write!(f, "process supervision failed: {}", reason),
        }
    }
}

fn write_output(f: &mut fmt::Formatter<'_>, output: &str) -> fmt::Result {
    if output.is_empty() {
        Ok(())
    } else {
        write!(f, "\noutput:\n{}", output)
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_ref() {
            HarnessErrorKind::Workspace { operation, message } => {
                write!(f, "workspace error during {}: {}", operation, message)
            }
            HarnessErrorKind::Build(failure) => write!(f, "build failed: compiler {}", failure),
            HarnessErrorKind::Runtime(failure) => write!(f, "run failed: program {}", failure),
        }
    }
}

impl std::error::Error for HarnessError {}

/// Converts captured bytes into payload text, truncating oversized output.
pub(crate) fn payload_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= MAX_CAPTURED_OUTPUT {
        return text.into_owned();
    }

    let mut cut = MAX_CAPTURED_OUTPUT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}\n\n... (output truncated, {} bytes total)",
        &text[..cut],
        text.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_error_display() {
        let error = HarnessError::workspace("creating workspace", "permission denied");
        let msg = error.to_string();
        assert!(msg.contains("workspace error"));
        assert!(msg.contains("creating workspace"));
        assert!(msg.contains("permission denied"));
        assert!(error.is_workspace_error());
        assert!(error.stage_failure().is_none());
    }

    #[test]
    fn build_exit_display_includes_output_verbatim() {
        let error = HarnessError::build(StageFailure::exit(Some(1), "main.go:3: undefined: x"));
        let msg = error.to_string();
        assert!(msg.contains("build failed"));
        assert!(msg.contains("exited with code 1"));
        assert!(msg.contains("main.go:3: undefined: x"));
        assert!(error.is_build_error());
        assert!(!error.is_runtime_error());
    }

    #[test]
    fn exit_by_signal_display() {
        let error = HarnessError::runtime(StageFailure::exit(None, ""));
        let msg = error.to_string();
        assert!(msg.contains("terminated by signal"));
        assert!(!msg.contains("output:"));
    }

    #[test]
    fn timeout_is_tagged() {
        let error = HarnessError::runtime(StageFailure::timeout(Duration::from_millis(1500), ""));
        assert!(error.is_timeout());
        assert!(!error.is_launch_failure());
        assert!(error.to_string().contains("timed out after 1500 ms"));
    }

    #[test]
    fn launch_failure_is_tagged() {
        let error = HarnessError::build(StageFailure::launch("tinygo", "No such file or directory"));
        assert!(error.is_launch_failure());
        assert!(!error.is_timeout());
        let msg = error.to_string();
        assert!(msg.contains("'tinygo'"));
        assert!(msg.contains("PATH"));
    }

    #[test]
    fn diagnostics_failure_display() {
        let error = HarnessError::runtime(StageFailure::diagnostics("warning: deprecated\n"));
        let msg = error.to_string();
        assert!(msg.contains("diagnostic output"));
        assert!(msg.contains("warning: deprecated"));
    }

    #[test]
    fn missing_artifact_display() {
        let error = HarnessError::build(StageFailure::MissingArtifact {
            path: PathBuf::from("/tmp/ws/program.wasm"),
        });
        assert!(error.to_string().contains("/tmp/ws/program.wasm"));
    }

    #[test]
    fn stage_failure_output_accessor() {
        assert_eq!(StageFailure::exit(Some(2), "boom").output(), Some("boom"));
        assert_eq!(StageFailure::launch("x", "y").output(), None);
    }

    #[test]
    fn payload_text_keeps_small_output() {
        assert_eq!(payload_text(b"hello\n"), "hello\n");
    }

    #[test]
    fn payload_text_truncates_large_output() {
        let large = vec![b'x'; MAX_CAPTURED_OUTPUT + 10];
        let text = payload_text(&large);
        assert!(text.contains("truncated"));
        assert!(text.len() < MAX_CAPTURED_OUTPUT + 100);
    }

    #[test]
    fn errors_are_eq() {
        let error1 = HarnessError::build(StageFailure::exit(Some(1), "a"));
        let error2 = HarnessError::build(StageFailure::exit(Some(1), "a"));
        assert_eq!(error1, error2);
        assert_ne!(error1, HarnessError::runtime(StageFailure::exit(Some(1), "a")));
    }
}
