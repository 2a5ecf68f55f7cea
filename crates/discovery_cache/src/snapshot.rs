//! The persisted fingerprint record.
//!
//! The snapshot is stored as `discovery.meta` in the cache directory. It is
//! written once after every successful compilation and replaced whole; it is
//! never patched in place. Reads are fail-safe: a missing, corrupt,
//! differently versioned or unrecognized record reads as "no snapshot".

use std::io;
use std::path::{Path, PathBuf};

use discovery_common::ContentHash;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CacheError;
use crate::fingerprint::hash_shapes;
use crate::paths::{mtime_entries, path_list};
use crate::scanner::MtimeMap;
use crate::shape::ShapeMap;

/// Name of the snapshot file within the cache directory.
pub const SNAPSHOT_FILE: &str = "discovery.meta";

/// Current snapshot schema. Records with any other schema are ignored.
pub const SNAPSHOT_SCHEMA: u32 = 1;

/// Last known-valid state of a watched configuration.
///
/// `shapes_hash` is derived from `entity_shapes` at construction and cannot
/// be set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    schema: u32,

    /// Watched roots, in the order the indexer was built with.
    #[serde(with = "path_list")]
    roots: Vec<PathBuf>,

    /// Modification times of every root, subdirectory and watched file.
    #[serde(with = "mtime_entries")]
    mtimes: MtimeMap,

    /// Fingerprint of the compilation this snapshot belongs to.
    mtime_hash: ContentHash,

    /// Shapes of every indexed entity that declares something.
    entity_shapes: ShapeMap,

    /// Hash over `entity_shapes`.
    shapes_hash: ContentHash,
}

impl Snapshot {
    /// Creates a snapshot, hashing the given shapes.
    pub fn new(
        roots: Vec<PathBuf>,
        mtimes: MtimeMap,
        mtime_hash: ContentHash,
        entity_shapes: ShapeMap,
    ) -> Result<Self, CacheError> {
        let shapes_hash = hash_shapes(&entity_shapes)?;
        Ok(Self {
            schema: SNAPSHOT_SCHEMA,
            roots,
            mtimes,
            mtime_hash,
            entity_shapes,
            shapes_hash,
        })
    }

    /// Returns the watched roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Returns the saved modification times.
    pub fn mtimes(&self) -> &MtimeMap {
        &self.mtimes
    }

    /// Returns the compilation fingerprint.
    pub fn mtime_hash(&self) -> ContentHash {
        self.mtime_hash
    }

    /// Returns the saved entity shapes.
    pub fn entity_shapes(&self) -> &ShapeMap {
        &self.entity_shapes
    }

    /// Returns the saved hash over the entity shapes.
    pub fn shapes_hash(&self) -> ContentHash {
        self.shapes_hash
    }

    /// Returns `true` if this snapshot was taken for exactly these roots,
    /// in this order.
    pub fn matches_roots(&self, roots: &[PathBuf]) -> bool {
        self.roots == roots
    }
}

/// Reads and writes the snapshot record in a cache directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    cache_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at the given cache directory.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    /// Returns the snapshot file path.
    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot.
    ///
    /// Returns `Ok(None)` if the file is missing, unparseable, carries a field
    /// this version does not know or has a different schema. Other I/O failures, such as a
    /// permission error, are returned so the host can stop instead of
    /// rebuilding into a broken cache directory.
    pub fn load(&self) -> Result<Option<Snapshot>, CacheError> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                debug!(path = %path.display(), "snapshot is not valid UTF-8, ignoring");
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(path = %path.display(), "ignoring unreadable snapshot: {e}");
                return Ok(None);
            }
        };

        if snapshot.schema != SNAPSHOT_SCHEMA {
            debug!(
                schema = snapshot.schema,
                expected = SNAPSHOT_SCHEMA,
                "ignoring snapshot with foreign schema"
            );
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    /// Saves the snapshot, replacing any previous one.
    ///
    /// Writes to a temporary file first and renames it into place, so a
    /// concurrent reader sees either the old or the new record.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| CacheError::io(&self.cache_dir, e))?;

        let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })?;

        let path = self.path();
        let tmp_path = path.with_extension("meta.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| CacheError::io(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &path).map_err(|e| CacheError::io(&path, e))?;

        debug!(
            path = %path.display(),
            entities = snapshot.entity_shapes.len(),
            paths = snapshot.mtimes.len(),
            "wrote snapshot"
        );
        Ok(())
    }
}
