//! Temporary directory management for a single analysis run.
//!
//! Every run operates on disposable copies of the input repository. The
//! [`TempWorkspace`] allocates uniquely named directories and files under a
//! configured root and tracks them so a bulk cleanup can remove everything
//! still outstanding, including on error paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;
use uuid::Uuid;

use crate::errors::DriftError;

/// Allocator for uniquely named temporary directories and files.
///
/// Names are random v4 UUIDs, so concurrent callers can never collide
/// without any central counter. The root must exist and be writable for the
/// whole run.
#[derive(Debug)]
pub struct TempWorkspace {
    root: PathBuf,
    allocated: Mutex<Vec<PathBuf>>,
}

impl TempWorkspace {
    /// Create a workspace rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`DriftError::PathNotFound`] if the root does not exist or is
    /// not a directory.
    pub fn new(root: &Path) -> Result<Self, DriftError> {
        if !root.is_dir() {
            return Err(DriftError::PathNotFound(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
            allocated: Mutex::new(Vec::new()),
        })
    }

    /// The configured workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate and create a fresh uniquely named directory under the root.
    pub fn create_temp_dir(&self) -> Result<PathBuf, DriftError> {
        let dir = self.root.join(Uuid::new_v4().to_string());
        fs::create_dir(&dir).map_err(|e| DriftError::Workspace {
            path: dir.clone(),
            reason: e.to_string(),
        })?;
        self.track(dir.clone());
        Ok(dir)
    }

    /// Allocate and create a fresh uniquely named empty file under the root.
    pub fn create_temp_file(&self) -> Result<PathBuf, DriftError> {
        let file = self.root.join(format!("{}.tmp", Uuid::new_v4()));
        fs::write(&file, "").map_err(|e| DriftError::Workspace {
            path: file.clone(),
            reason: e.to_string(),
        })?;
        self.track(file.clone());
        Ok(file)
    }

    /// Remove one tracked path and stop tracking it.
    pub fn remove(&self, path: &Path) -> Result<(), DriftError> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        match result {
            Ok(()) => {
                self.untrack(path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.untrack(path);
                Ok(())
            }
            Err(e) => Err(DriftError::Workspace {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Stop tracking a path without removing it (directory was handed off
    /// and is deleted elsewhere, e.g. by a worker tearing down its own
    /// repository).
    pub fn untrack(&self, path: &Path) {
        let mut allocated = self.allocated.lock().expect("workspace lock poisoned");
        allocated.retain(|p| p != path);
    }

    /// Remove every still-tracked directory and file.
    ///
    /// Best-effort: failures are logged and do not stop the remaining
    /// removals.
    pub fn cleanup_all(&self) {
        let paths: Vec<PathBuf> = {
            let mut allocated = self.allocated.lock().expect("workspace lock poisoned");
            std::mem::take(&mut *allocated)
        };
        for path in paths {
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = result {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "could not remove temporary path");
                }
            }
        }
    }

    fn track(&self, path: PathBuf) {
        let mut allocated = self.allocated.lock().expect("workspace lock poisoned");
        allocated.push(path);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_rejects_missing_root() {
        let err = TempWorkspace::new(Path::new("/definitely/not/there")).unwrap_err();
        assert!(matches!(err, DriftError::PathNotFound(_)));
    }

    #[test]
    fn test_create_temp_dir_is_unique_and_exists() {
        let root = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(root.path()).unwrap();

        let a = workspace.create_temp_dir().unwrap();
        let b = workspace.create_temp_dir().unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir());
        assert!(b.is_dir());
        assert!(a.starts_with(root.path()));
    }

    #[test]
    fn test_cleanup_all_removes_everything_tracked() {
        let root = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(root.path()).unwrap();

        let dir = workspace.create_temp_dir().unwrap();
        let file = workspace.create_temp_file().unwrap();
        std::fs::write(dir.join("nested.txt"), "x").unwrap();

        workspace.cleanup_all();
        assert!(!dir.exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_untracked_path_survives_cleanup() {
        let root = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(root.path()).unwrap();

        let dir = workspace.create_temp_dir().unwrap();
        workspace.untrack(&dir);
        workspace.cleanup_all();
        assert!(dir.exists());
    }

    #[test]
    fn test_remove_is_idempotent_for_missing_paths() {
        let root = TempDir::new().unwrap();
        let workspace = TempWorkspace::new(root.path()).unwrap();

        let dir = workspace.create_temp_dir().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
        workspace.remove(&dir).unwrap();
    }
}
