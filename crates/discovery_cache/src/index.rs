//! The entity index: which source file defines which entity.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use discovery_common::EntityId;

use crate::error::CacheError;

/// Discovers entities under a set of roots.
///
/// The indexer owns its own caching; the checker only reads the current
/// index and never asks it to rebuild.
pub trait EntityIndexer {
    /// Returns the entities currently indexed under `roots`.
    fn indexed_entities(&self, roots: &[PathBuf]) -> Result<EntityIndex, CacheError>;
}

/// Bidirectional mapping between entity identifiers and source paths.
///
/// A single file may define several entities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIndex {
    by_id: BTreeMap<EntityId, PathBuf>,
    by_path: HashMap<PathBuf, Vec<EntityId>>,
}

impl EntityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `id` is defined in `path`, replacing any earlier location.
    pub fn insert(&mut self, id: EntityId, path: PathBuf) {
        if let Some(old) = self.by_id.insert(id.clone(), path.clone()) {
            if let Some(ids) = self.by_path.get_mut(&old) {
                ids.retain(|existing| existing != &id);
                if ids.is_empty() {
                    self.by_path.remove(&old);
                }
            }
        }
        let ids = self.by_path.entry(path).or_default();
        ids.push(id);
        ids.sort();
    }

    /// Returns the entities defined in `path`; empty if the path is not indexed.
    pub fn entities_at(&self, path: &Path) -> &[EntityId] {
        self.by_path.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the source path of `id`.
    pub fn path_of(&self, id: &EntityId) -> Option<&Path> {
        self.by_id.get(id).map(PathBuf::as_path)
    }

    /// Returns the number of indexed entities.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterates entities in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Path)> {
        self.by_id.iter().map(|(id, path)| (id, path.as_path()))
    }
}

impl FromIterator<(EntityId, PathBuf)> for EntityIndex {
    fn from_iter<T: IntoIterator<Item = (EntityId, PathBuf)>>(iter: T) -> Self {
        let mut index = Self::new();
        for (id, path) in iter {
            index.insert(id, path);
        }
        index
    }
}

/// An indexer over an index the host already holds.
///
/// Only entities whose path lies under one of the requested roots are returned.
#[derive(Debug, Clone, Default)]
pub struct StaticIndexer {
    index: EntityIndex,
}

impl StaticIndexer {
    /// Wraps a prebuilt index.
    pub fn new(index: EntityIndex) -> Self {
        Self { index }
    }

    /// Replaces the held index, as a host does after re-indexing.
    pub fn replace(&mut self, index: EntityIndex) {
        self.index = index;
    }
}

impl EntityIndexer for StaticIndexer {
    fn indexed_entities(&self, roots: &[PathBuf]) -> Result<EntityIndex, CacheError> {
        Ok(self
            .index
            .iter()
            .filter(|(_, path)| roots.iter().any(|root| path.starts_with(root)))
            .map(|(id, path)| (id.clone(), path.to_path_buf()))
            .collect())
    }
}
