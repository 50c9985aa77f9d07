//! Execute stage.
//!
//! Runs `<runtime> [args...] <artifact>` under the run budget and captures
//! stdout and stderr as two separate byte buffers. Whether the run counts
//! as a success is decided afterwards by the classifier.

use super::compile::CompiledArtifact;
use super::config::ToolCommand;
use super::error::{payload_text, HarnessError, StageFailure};
use super::process::{self, ProcessError};
use std::path::Path;
use std::time::Duration;

/// How a program that ran to completion finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Exited with status zero.
    Success,
    /// Exited unsuccessfully. `None` means it was terminated by a signal.
    Failed {
        /// The exit code, if any
        exit_code: Option<i32>,
    },
}

/// Everything the execute stage observed about a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Bytes written to standard output.
    pub stdout: Vec<u8>,
    /// Bytes written to the diagnostic stream.
    pub stderr: Vec<u8>,
    /// How the program finished.
    pub completion: Completion,
}

/// Runs the compiled artifact in the sandboxed runtime.
///
/// # Errors
///
/// Returns a runtime error if the runtime cannot be launched or exceeds
/// `timeout`. An unsuccessful exit is not an error here; it is reported in
/// the outcome for the classifier.
pub async fn execute(
    runtime: &ToolCommand,
    artifact: CompiledArtifact,
    timeout: Duration,
) -> Result<ExecutionOutcome, HarnessError> {
    let cwd = artifact.path().parent().unwrap_or_else(|| Path::new("."));

    let mut cmd = process::command(runtime, cwd);
    cmd.arg(artifact.path());

    tracing::debug!(
        runtime = %runtime.program,
        artifact = %artifact.path().display(),
        "executing"
    );

    let captured = process::run_captured(cmd, timeout)
        .await
        .map_err(|e| HarnessError::runtime(stage_failure(&runtime.program, timeout, e)))?;

    let completion = if captured.status.success() {
        Completion::Success
    } else {
        Completion::Failed {
            exit_code: captured.status.code(),
        }
    };

    Ok(ExecutionOutcome {
        stdout: captured.stdout,
        stderr: captured.stderr,
        completion,
    })
}

fn stage_failure(program: &str, timeout: Duration, error: ProcessError) -> StageFailure {
    match error {
        ProcessError::Launch(e) => StageFailure::launch(program, e.to_string()),
        ProcessError::TimedOut { stderr, .. } => {
            StageFailure::timeout(timeout, payload_text(&stderr))
        }
        ProcessError::Supervision(reason) => StageFailure::supervision(reason),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::harness::compile::compile;
    use crate::harness::source::write_source;
    use crate::harness::workspace::Workspace;

    async fn artifact_for(workspace: &Workspace, program: &str) -> CompiledArtifact {
        let source = write_source(workspace, program, "sh").unwrap();
        let compiler = ToolCommand::new("sh")
            .with_arg("-c")
            .with_arg(r#"cp "$6" "$3""#)
            .with_arg("fake-compiler");
        compile(
            &compiler,
            &source,
            &workspace.file("program.sh"),
            "posix-sh",
            Duration::from_secs(5),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn execute_captures_both_streams() {
        let workspace = Workspace::acquire(None).unwrap();
        let artifact = artifact_for(&workspace, "echo out\necho err >&2\n").await;

        let outcome = execute(&ToolCommand::new("sh"), artifact, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.stdout, b"out\n");
        assert_eq!(outcome.stderr, b"err\n");
        assert_eq!(outcome.completion, Completion::Success);
    }

    #[tokio::test]
    async fn execute_reports_failed_completion() {
        let workspace = Workspace::acquire(None).unwrap();
        let artifact = artifact_for(&workspace, "echo fatal >&2\nexit 3\n").await;

        let outcome = execute(&ToolCommand::new("sh"), artifact, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(outcome.completion, Completion::Failed { exit_code: Some(3) });
        assert_eq!(outcome.stderr, b"fatal\n");
    }

    #[tokio::test]
    async fn execute_timeout_is_tagged() {
        let workspace = Workspace::acquire(None).unwrap();
        let artifact = artifact_for(&workspace, "sleep 30\n").await;

        let error = execute(&ToolCommand::new("sh"), artifact, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(error.is_runtime_error());
        assert!(error.is_timeout());
    }

    #[tokio::test]
    async fn execute_missing_runtime_is_launch_failure() {
        let workspace = Workspace::acquire(None).unwrap();
        let artifact = artifact_for(&workspace, "echo hi\n").await;

        let error = execute(
            &ToolCommand::new("/nonexistent/tinyutil/wasmtime"),
            artifact,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

        assert!(error.is_runtime_error());
        assert!(error.is_launch_failure());
        assert!(error.to_string().contains("/nonexistent/tinyutil/wasmtime"));
    }
}
