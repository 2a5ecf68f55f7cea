//! Discarding the compiled artifact.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CacheError;

/// Discards the downstream compiled artifact.
///
/// Must be idempotent. Failures are the implementation's to log; the checker
/// never sees them, because a leftover artifact only costs an extra rebuild.
pub trait ArtifactInvalidator {
    /// Discards the artifact.
    fn invalidate(&self);
}

/// Invalidates by deleting the artifact directory.
#[derive(Debug, Clone)]
pub struct DirectoryInvalidator {
    dir: PathBuf,
}

impl DirectoryInvalidator {
    /// Creates an invalidator for the given artifact directory.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Returns the artifact directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deletes the directory, returning whether anything was removed.
    pub fn try_invalidate(&self) -> Result<bool, CacheError> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(&self.dir, e)),
        }
    }
}

impl ArtifactInvalidator for DirectoryInvalidator {
    fn invalidate(&self) {
        match self.try_invalidate() {
            Ok(true) => debug!(dir = %self.dir.display(), "removed compiled artifact"),
            Ok(false) => {}
            Err(e) => warn!("failed to invalidate compiled artifact: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_artifact_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("cache");
        std::fs::create_dir_all(artifact.join("nested")).unwrap();
        std::fs::write(artifact.join("nested/Container.php"), "<?php").unwrap();

        let invalidator = DirectoryInvalidator::new(&artifact);
        assert!(invalidator.try_invalidate().unwrap());
        assert!(!artifact.exists());
    }

    #[test]
    fn missing_directory_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let invalidator = DirectoryInvalidator::new(&dir.path().join("cache"));
        assert!(!invalidator.try_invalidate().unwrap());
        invalidator.invalidate();
    }

    #[test]
    fn invalidate_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("cache");
        std::fs::create_dir_all(&artifact).unwrap();
        let invalidator = DirectoryInvalidator::new(&artifact);
        invalidator.invalidate();
        invalidator.invalidate();
        assert!(!artifact.exists());
        assert_eq!(invalidator.dir(), artifact.as_path());
    }

    #[test]
    fn failure_is_reported_by_try_invalidate() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected cannot be removed as a tree.
        let artifact = dir.path().join("cache");
        std::fs::write(&artifact, "not a directory").unwrap();
        let invalidator = DirectoryInvalidator::new(&artifact);
        assert!(invalidator.try_invalidate().is_err());
        // The trait method swallows the same failure.
        invalidator.invalidate();
    }
}
