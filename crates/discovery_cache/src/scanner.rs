//! Modification-time scanning of watched source trees.
//!
//! The scan result maps every root directory, every directory beneath it and
//! every file with the watched extension to its modification time. A root
//! that no longer exists maps to `None`. Two scans of an unchanged tree
//! produce identical maps, whichever scan mode is used.

use std::collections::BTreeMap;
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};

use discovery_common::Timestamp;
use rayon::prelude::*;

use crate::error::CacheError;

/// Path to modification time; `None` marks a missing root directory.
pub type MtimeMap = BTreeMap<PathBuf, Option<Timestamp>>;

/// Read-only walker that collects modification times under a set of roots.
#[derive(Debug, Clone)]
pub struct MtimeScanner {
    /// Watched file extension, without the dot.
    extension: String,
    /// Walk roots and subdirectories on the rayon pool.
    parallel: bool,
}

impl MtimeScanner {
    /// Creates a sequential scanner for files with the given extension.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            parallel: false,
        }
    }

    /// Enables or disables parallel scanning.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Scans all roots and returns the merged modification-time map.
    ///
    /// Entries that disappear while the walk is running are skipped. Any other
    /// I/O failure is returned, since a partial map could hide a change.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<MtimeMap, CacheError> {
        let parts: Vec<MtimeMap> = if self.parallel {
            roots
                .par_iter()
                .map(|root| self.scan_root(root))
                .collect::<Result<_, _>>()?
        } else {
            roots
                .iter()
                .map(|root| self.scan_root(root))
                .collect::<Result<_, _>>()?
        };
        Ok(merge(parts))
    }

    fn scan_root(&self, root: &Path) -> Result<MtimeMap, CacheError> {
        let metadata = match fs::metadata(root) {
            Ok(m) if m.is_dir() => m,
            Ok(_) => return Ok(MtimeMap::from([(root.to_path_buf(), None)])),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(MtimeMap::from([(root.to_path_buf(), None)]));
            }
            Err(e) => return Err(CacheError::io(root, e)),
        };

        let mtime = modified(root, &metadata)?;
        let mut map = self.walk(root)?;
        map.insert(root.to_path_buf(), Some(mtime));
        Ok(map)
    }

    /// Collects entries beneath `dir`, excluding `dir` itself.
    fn walk(&self, dir: &Path) -> Result<MtimeMap, CacheError> {
        let entries = read_entries(dir)?;
        let parts: Vec<MtimeMap> = if self.parallel {
            entries
                .par_iter()
                .map(|(path, kind)| self.visit(path, *kind))
                .collect::<Result<_, _>>()?
        } else {
            entries
                .iter()
                .map(|(path, kind)| self.visit(path, *kind))
                .collect::<Result<_, _>>()?
        };
        Ok(merge(parts))
    }

    fn visit(&self, path: &Path, kind: FileType) -> Result<MtimeMap, CacheError> {
        // Symlinks are followed for their timestamp but never descended into.
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(MtimeMap::new()),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        if metadata.is_dir() {
            let mut map = if kind.is_dir() {
                self.walk(path)?
            } else {
                MtimeMap::new()
            };
            map.insert(path.to_path_buf(), Some(modified(path, &metadata)?));
            return Ok(map);
        }

        if is_watched_file(path, &self.extension) {
            return Ok(MtimeMap::from([(
                path.to_path_buf(),
                Some(modified(path, &metadata)?),
            )]));
        }
        Ok(MtimeMap::new())
    }
}

/// Returns `true` if `path` ends in the watched `extension` (without the dot).
pub fn is_watched_file(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext == extension)
}

fn read_entries(dir: &Path) -> Result<Vec<(PathBuf, FileType)>, CacheError> {
    let read_dir = match fs::read_dir(dir) {
        Ok(iter) => iter,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(CacheError::io(dir, e)),
    };

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| CacheError::io(dir, e))?;
        match entry.file_type() {
            Ok(kind) => entries.push((entry.path(), kind)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io(entry.path(), e)),
        }
    }
    Ok(entries)
}

fn modified(path: &Path, metadata: &fs::Metadata) -> Result<Timestamp, CacheError> {
    metadata
        .modified()
        .map(Timestamp::from)
        .map_err(|e| CacheError::io(path, e))
}

fn merge(parts: Vec<MtimeMap>) -> MtimeMap {
    let mut merged = MtimeMap::new();
    for part in parts {
        merged.extend(part);
    }
    merged
}
