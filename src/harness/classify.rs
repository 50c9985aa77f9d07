//! Result classification.
//!
//! Turns an [`ExecutionOutcome`] into either the program's output or a
//! runtime error, according to one [`ClassificationPolicy`].

use super::config::ClassificationPolicy;
use super::error::{payload_text, HarnessError, StageFailure};
use super::execute::{Completion, ExecutionOutcome};

/// Output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOutput {
    stdout: Vec<u8>,
    diagnostics: Vec<u8>,
}

impl ProgramOutput {
    /// Creates a new `ProgramOutput`.
    #[must_use]
    pub fn new(stdout: Vec<u8>, diagnostics: Vec<u8>) -> Self {
        Self {
            stdout,
            diagnostics,
        }
    }

    /// Returns the raw standard output bytes.
    #[must_use]
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Consumes self and returns the raw standard output bytes.
    #[must_use]
    pub fn into_stdout(self) -> Vec<u8> {
        self.stdout
    }

    /// Returns standard output as text with one trailing line break removed.
    ///
    /// A program that prints `T` followed by a single newline yields `T`.
    /// Invalid UTF-8 is replaced.
    #[must_use]
    pub fn text(&self) -> String {
        let lossy = String::from_utf8_lossy(&self.stdout);
        let text: &str = &lossy;
        text.strip_suffix("\r\n")
            .or_else(|| text.strip_suffix('\n'))
            .unwrap_or(text)
            .to_string()
    }

    /// Returns diagnostic-stream bytes from a run that still counted as a success.
    ///
    /// Always empty under [`ClassificationPolicy::Strict`].
    #[must_use]
    pub fn diagnostics(&self) -> &[u8] {
        &self.diagnostics
    }
}

/// Classifies a completed run.
///
/// # Errors
///
/// Returns a runtime error if the program exited unsuccessfully, or, under
/// [`ClassificationPolicy::Strict`], if it wrote anything to its diagnostic
/// stream.
pub fn classify(
    outcome: ExecutionOutcome,
    policy: ClassificationPolicy,
) -> Result<ProgramOutput, HarnessError> {
    let ExecutionOutcome {
        stdout,
        stderr,
        completion,
    } = outcome;

    if let Completion::Failed { exit_code } = completion {
        return Err(HarnessError::runtime(StageFailure::exit(
            exit_code,
            payload_text(&stderr),
        )));
    }

    match policy {
        ClassificationPolicy::Strict if !stderr.is_empty() => Err(HarnessError::runtime(
            StageFailure::diagnostics(payload_text(&stderr)),
        )),
        ClassificationPolicy::Strict | ClassificationPolicy::ExitStatusOnly => {
            if !stderr.is_empty() {
                tracing::debug!(
                    stderr_bytes = stderr.len(),
                    "program wrote diagnostics but exited successfully"
                );
            }
            Ok(ProgramOutput::new(stdout, stderr))
        }
    }
}
