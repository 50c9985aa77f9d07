//! Ephemeral per-invocation workspace.
//!
//! A `Workspace` is a uniquely named directory owned by exactly one harness
//! invocation. Name uniqueness comes from the operating system's temp-name
//! allocation (via `tempfile`), so concurrent invocations need no locking.
//!
//! The directory is removed by [`Workspace::release`], or when the value is
//! dropped on any other exit path (early return, panic, cancelled future).

use super::error::HarnessError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "tinyutil-";

/// An exclusively owned ephemeral directory.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates a new workspace under `root`, or under the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns a workspace error if the directory cannot be created. This is
    /// never retried.
    pub fn acquire(root: Option<&Path>) -> Result<Self, HarnessError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| HarnessError::workspace("creating workspace", e.to_string()))?;

        tracing::debug!(workspace = %dir.path().display(), "workspace acquired");
        Ok(Self { dir })
    }

    /// Returns the workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of `name` inside the workspace.
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Recursively removes the workspace.
    ///
    /// # Errors
    ///
    /// Returns a workspace error if the directory could not be fully removed.
    pub fn release(self) -> Result<(), HarnessError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            HarnessError::workspace(
                "removing workspace",
                format!("'{}': {}", path.display(), e),
            )
        })?;
        tracing::debug!(workspace = %path.display(), "workspace released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_creates_prefixed_directory() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::acquire(Some(root.path())).unwrap();

        assert!(workspace.path().is_dir());
        assert!(workspace.path().starts_with(root.path()));
        let name = workspace.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(WORKSPACE_PREFIX));
    }

    #[test]
    fn acquire_names_are_unique() {
        let root = TempDir::new().unwrap();
        let first = Workspace::acquire(Some(root.path())).unwrap();
        let second = Workspace::acquire(Some(root.path())).unwrap();
        assert_ne!(first.path(), second.path());
    }

    #[test]
    fn release_removes_directory_and_contents() {
        let root = TempDir::new().unwrap();
        let workspace = Workspace::acquire(Some(root.path())).unwrap();
        let path = workspace.path().to_path_buf();
        std::fs::write(workspace.file("main.go"), "package main").unwrap();

        workspace.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_removes_directory() {
        let root = TempDir::new().unwrap();
        let path = {
            let workspace = Workspace::acquire(Some(root.path())).unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn acquire_fails_for_missing_root() {
        let error = Workspace::acquire(Some(Path::new("/nonexistent/tinyutil/root"))).unwrap_err();
        assert!(error.is_workspace_error());
        assert!(error.to_string().contains("creating workspace"));
    }

    #[test]
    fn file_joins_inside_workspace() {
        let workspace = Workspace::acquire(None).unwrap();
        assert_eq!(
            workspace.file("program.wasm"),
            workspace.path().join("program.wasm")
        );
    }
}
