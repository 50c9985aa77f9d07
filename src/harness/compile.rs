//! Compile stage.
//!
//! Runs `<compiler> [args...] build -o <output> -target <target> <source>`
//! under the build budget. Compilers here do not report errors in a
//! machine-readable form, so a failed build carries the compiler's combined
//! stdout and stderr text as its only diagnostic.

use super::config::ToolCommand;
use super::error::{payload_text, HarnessError, StageFailure};
use super::process::{self, ProcessError};
use super::source::SourceFile;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A binary produced by a successful compile stage.
///
/// Not `Clone`: the execute stage consumes it exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct CompiledArtifact {
    path: PathBuf,
}

impl CompiledArtifact {
    /// Returns the artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Compiles `source` into `output`.
///
/// # Errors
///
/// Returns a build error if the compiler cannot be launched, exceeds
/// `timeout`, exits unsuccessfully, or exits successfully without writing
/// `output`. The validity of the artifact itself is not checked here.
pub async fn compile(
    compiler: &ToolCommand,
    source: &SourceFile,
    output: &Path,
    target: &str,
    timeout: Duration,
) -> Result<CompiledArtifact, HarnessError> {
    let cwd = source.path().parent().unwrap_or_else(|| Path::new("."));

    let mut cmd = process::command(compiler, cwd);
    cmd.arg("build")
        .arg("-o")
        .arg(output)
        .arg("-target")
        .arg(target)
        .arg(source.path());

    tracing::debug!(
        compiler = %compiler.program,
        target,
        source = %source.path().display(),
        "compiling"
    );

    let captured = process::run_captured(cmd, timeout)
        .await
        .map_err(|e| HarnessError::build(stage_failure(&compiler.program, timeout, e)))?;

    if !captured.status.success() {
        let output = combined_output(&captured.stdout, &captured.stderr);
        return Err(HarnessError::build(StageFailure::exit(
            captured.status.code(),
            output,
        )));
    }

    if !output.is_file() {
        return Err(HarnessError::build(StageFailure::MissingArtifact {
            path: output.to_path_buf(),
        }));
    }

    tracing::debug!(artifact = %output.display(), "compiled");
    Ok(CompiledArtifact {
        path: output.to_path_buf(),
    })
}

fn stage_failure(program: &str, timeout: Duration, error: ProcessError) -> StageFailure {
    match error {
        ProcessError::Launch(e) => StageFailure::launch(program, e.to_string()),
        ProcessError::TimedOut { stdout, stderr } => {
            StageFailure::timeout(timeout, combined_output(&stdout, &stderr))
        }
        ProcessError::Supervision(reason) => StageFailure::supervision(reason),
    }
}

/// Joins the compiler's stdout and stderr into one diagnostic text.
fn combined_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = Vec::with_capacity(stdout.len() + stderr.len() + 1);
    combined.extend_from_slice(stdout);
    if !stdout.is_empty() && !stdout.ends_with(b"\n") && !stderr.is_empty() {
        combined.push(b'\n');
    }
    combined.extend_from_slice(stderr);
    payload_text(&combined)
}
