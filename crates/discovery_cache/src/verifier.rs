//! Precise verification of a modification-time diff.
//!
//! Only the entities behind changed files get their shapes recomputed. Those
//! shapes are merged over the saved map and the merged map is hashed, so the
//! cost follows the size of the diff rather than the size of the codebase.

use std::path::PathBuf;

use discovery_common::{ContentHash, EntityId};
use tracing::debug;

use crate::error::CacheError;
use crate::fingerprint::{hash_shapes, EntityExtractor, Fingerprinter};
use crate::index::EntityIndex;
use crate::scanner::is_watched_file;
use crate::shape::{Shape, ShapeMap};

/// Outcome of verifying a set of changed paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// A changed watched file defines no indexed entity yet.
    NotIndexed {
        /// The first such file.
        path: PathBuf,
    },

    /// The merged shapes hash to the saved hash.
    Unchanged {
        /// Saved shapes with recomputed entries merged in.
        shapes: ShapeMap,
        /// Number of entities whose shape was recomputed.
        recomputed: usize,
    },

    /// The merged shapes hash differently.
    Changed {
        /// Number of entities whose shape was recomputed.
        recomputed: usize,
    },
}

impl Verification {
    /// Returns `true` if the artifact has to be rebuilt.
    pub fn is_changed(&self) -> bool {
        !matches!(self, Verification::Unchanged { .. })
    }
}

/// Recomputes shapes for changed files and compares the merged hash.
pub struct PreciseVerifier<'a, E: ?Sized> {
    fingerprinter: Fingerprinter<'a, E>,
    extension: &'a str,
}

impl<'a, E: EntityExtractor + ?Sized> PreciseVerifier<'a, E> {
    /// Creates a verifier for files with the given extension.
    pub fn new(extractor: &'a E, extension: &'a str) -> Self {
        Self {
            fingerprinter: Fingerprinter::new(extractor),
            extension,
        }
    }

    /// Verifies `changed` against the saved shapes and hash.
    ///
    /// Paths that are not watched files are ignored. A watched file with no
    /// indexed entity means the compiler cannot see it yet either, so it is
    /// reported as [`Verification::NotIndexed`] without looking further.
    /// An entity that no longer resolves, or that has left the index since the
    /// snapshot was taken, is removed from the merged map.
    pub fn verify(
        &self,
        changed: &[PathBuf],
        index: &EntityIndex,
        saved_shapes: &ShapeMap,
        saved_hash: ContentHash,
    ) -> Result<Verification, CacheError> {
        let mut updated: Vec<(EntityId, Option<Shape>)> = Vec::new();

        for path in changed {
            if path.is_dir() || !is_watched_file(path, self.extension) {
                continue;
            }

            let ids = index.entities_at(path);
            if ids.is_empty() {
                debug!(path = %path.display(), "changed file is not indexed yet");
                return Ok(Verification::NotIndexed { path: path.clone() });
            }

            for id in ids {
                updated.push((id.clone(), self.fingerprinter.shape_of(id)));
            }
        }

        let recomputed = updated.len();
        let departed: Vec<&EntityId> = saved_shapes
            .keys()
            .filter(|id| index.path_of(id).is_none())
            .collect();
        if updated.is_empty() && departed.is_empty() {
            return Ok(Verification::Unchanged {
                shapes: saved_shapes.clone(),
                recomputed,
            });
        }

        let mut merged = saved_shapes.clone();
        for id in departed {
            debug!(entity = %id, "saved entity is no longer indexed");
            merged.remove(id);
        }
        for (id, shape) in updated {
            match shape {
                Some(shape) if !shape.is_empty() => {
                    merged.insert(id, shape);
                }
                _ => {
                    merged.remove(&id);
                }
            }
        }

        let merged_hash = hash_shapes(&merged)?;
        debug!(recomputed, %merged_hash, %saved_hash, "compared merged shapes");

        if merged_hash == saved_hash {
            Ok(Verification::Unchanged {
                shapes: merged,
                recomputed,
            })
        } else {
            Ok(Verification::Changed { recomputed })
        }
    }
}
