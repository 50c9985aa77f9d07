//! Source materialization.
//!
//! Writes the caller's program text into the workspace. The file is synced
//! and closed before the compile stage starts.

use super::error::HarnessError;
use super::workspace::Workspace;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Base name of the materialized source file.
pub const SOURCE_STEM: &str = "main";

/// A source file inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    /// Returns the source file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes `source` to `main.<extension>` inside the workspace.
///
/// # Errors
///
/// Returns a workspace error if the file cannot be created, written or
/// synced (disk full, permission failure).
pub fn write_source(
    workspace: &Workspace,
    source: &str,
    extension: &str,
) -> Result<SourceFile, HarnessError> {
    let name = if extension.is_empty() {
        SOURCE_STEM.to_string()
    } else {
        format!("{}.{}", SOURCE_STEM, extension)
    };
    let path = workspace.file(&name);

    let fail = |operation: &str, e: std::io::Error| {
        HarnessError::workspace(operation, format!("'{}': {}", path.display(), e))
    };

    let mut file = File::create(&path).map_err(|e| fail("creating source file", e))?;
    file.write_all(source.as_bytes())
        .map_err(|e| fail("writing source file", e))?;
    file.sync_all().map_err(|e| fail("syncing source file", e))?;
    drop(file);

    tracing::debug!(path = %path.display(), bytes = source.len(), "source materialized");
    Ok(SourceFile { path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_source_round_trips_contents() {
        let workspace = Workspace::acquire(None).unwrap();
        let source = "package main\n\nfunc main() {}\n";

        let file = write_source(&workspace, source, "go").unwrap();

        assert_eq!(file.path(), workspace.path().join("main.go"));
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), source);
    }

    #[test]
    fn write_source_without_extension() {
        let workspace = Workspace::acquire(None).unwrap();
        let file = write_source(&workspace, "echo hi", "").unwrap();
        assert_eq!(file.path().file_name().unwrap(), "main");
    }

    #[test]
    fn write_source_accepts_empty_text() {
        let workspace = Workspace::acquire(None).unwrap();
        let file = write_source(&workspace, "", "sh").unwrap();
        assert_eq!(std::fs::metadata(file.path()).unwrap().len(), 0);
    }

    #[test]
    fn write_source_fails_when_workspace_is_gone() {
        let workspace = Workspace::acquire(None).unwrap();
        std::fs::remove_dir_all(workspace.path()).unwrap();

        let error = write_source(&workspace, "x", "go").unwrap_err();
        assert!(error.is_workspace_error());
        assert!(error.to_string().contains("creating source file"));
    }
}
