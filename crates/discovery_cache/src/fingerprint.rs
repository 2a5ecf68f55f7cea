//! Entity shape extraction and deterministic whole-map hashing.

use discovery_common::{ContentHash, EntityId, Timestamp};
use serde::Serialize;

use crate::error::CacheError;
use crate::index::EntityIndex;
use crate::paths::path_bytes;
use crate::scanner::MtimeMap;
use crate::shape::{Shape, ShapeMap};

/// Produces the current shape of an entity.
///
/// Implementations may parse source, walk an AST or introspect a runtime;
/// the only contract is that equal declarations give equal shapes.
pub trait EntityExtractor {
    /// Returns the entity's shape, or `None` if it no longer resolves
    /// (deleted, renamed or broken).
    fn shape_of(&self, id: &EntityId) -> Option<Shape>;
}

impl<F> EntityExtractor for F
where
    F: Fn(&EntityId) -> Option<Shape>,
{
    fn shape_of(&self, id: &EntityId) -> Option<Shape> {
        self(id)
    }
}

/// Computes shapes through an [`EntityExtractor`].
pub struct Fingerprinter<'a, E: ?Sized> {
    extractor: &'a E,
}

impl<'a, E: EntityExtractor + ?Sized> Fingerprinter<'a, E> {
    /// Wraps an extractor.
    pub fn new(extractor: &'a E) -> Self {
        Self { extractor }
    }

    /// Returns the current shape of one entity.
    pub fn shape_of(&self, id: &EntityId) -> Option<Shape> {
        self.extractor.shape_of(id)
    }

    /// Computes the full shape map for every indexed entity.
    ///
    /// Entities that do not resolve or declare nothing are left out.
    pub fn snapshot_shapes(&self, index: &EntityIndex) -> ShapeMap {
        index
            .iter()
            .filter_map(|(id, _)| {
                let shape = self.extractor.shape_of(id)?;
                (!shape.is_empty()).then(|| (id.clone(), shape))
            })
            .collect()
    }
}

/// Hashes a shape map over its canonical encoding.
///
/// Empty shapes are skipped, so an entity mapped to an empty shape hashes
/// the same as an entity that is absent.
pub fn hash_shapes(shapes: &ShapeMap) -> Result<ContentHash, CacheError> {
    let canonical: Vec<(&EntityId, &Shape)> =
        shapes.iter().filter(|(_, shape)| !shape.is_empty()).collect();
    hash_encoded(&canonical)
}

/// Hashes a modification-time map; this is the fingerprint handed to the
/// artifact-persistence step.
///
/// Paths are hashed by their OS bytes, so names that are not valid UTF-8
/// are fingerprinted like any other.
pub fn hash_mtimes(mtimes: &MtimeMap) -> Result<ContentHash, CacheError> {
    let canonical: Vec<(&[u8], Option<Timestamp>)> = mtimes
        .iter()
        .map(|(path, mtime)| (path_bytes(path), *mtime))
        .collect();
    hash_encoded(&canonical)
}

fn hash_encoded<T: Serialize + ?Sized>(value: &T) -> Result<ContentHash, CacheError> {
    let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(|e| {
        CacheError::Serialization {
            reason: e.to_string(),
        }
    })?;
    Ok(ContentHash::from_bytes(&bytes))
}
