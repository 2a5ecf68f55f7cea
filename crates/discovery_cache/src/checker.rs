//! The invalidation orchestrator.
//!
//! [`Checker::precheck`] runs once before the host constructs the compiler
//! and answers whether the compiled artifact is still valid. When it is not,
//! the artifact is discarded and the returned [`Precheck`] carries a fresh
//! fingerprint; after recompiling, the host passes it to [`Checker::commit`]
//! to persist a new snapshot.

use std::path::PathBuf;

use discovery_common::ContentHash;
use discovery_config::ResolvedConfig;
use tracing::{debug, info, warn};

use crate::detector::detect_changes;
use crate::error::CacheError;
use crate::fingerprint::{hash_mtimes, EntityExtractor, Fingerprinter};
use crate::index::EntityIndexer;
use crate::invalidate::{ArtifactInvalidator, DirectoryInvalidator};
use crate::scanner::{MtimeMap, MtimeScanner};
use crate::shape::ShapeMap;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::verifier::{PreciseVerifier, Verification};

/// Where a precheck ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    /// No usable snapshot exists for the configured roots.
    Unversioned,
    /// The indexer reports no entities; indistinguishable from "not built yet".
    Unindexed,
    /// No modification time moved.
    FastClean,
    /// A previously seen path no longer exists.
    StructurallyDeleted,
    /// Modification times moved but no entity shape changed.
    PreciseClean,
    /// An entity shape changed, or a changed file is not indexed yet.
    PreciseDirty,
}

impl CheckState {
    /// Returns `true` if the compiled artifact can be reused.
    pub fn is_valid(self) -> bool {
        matches!(self, CheckState::FastClean | CheckState::PreciseClean)
    }
}

/// Result of [`Checker::precheck`], threaded into the compile step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precheck {
    state: CheckState,
    fingerprint: Option<ContentHash>,
    changed: Vec<PathBuf>,
}

impl Precheck {
    fn valid(state: CheckState, changed: Vec<PathBuf>) -> Self {
        Self {
            state,
            fingerprint: None,
            changed,
        }
    }

    /// Returns the state the check ended in.
    pub fn state(&self) -> CheckState {
        self.state
    }

    /// Returns `true` if the artifact can be reused.
    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    /// Returns the fresh fingerprint, or `None` if the artifact is valid.
    pub fn fingerprint(&self) -> Option<ContentHash> {
        self.fingerprint
    }

    /// Returns the paths the fast diff reported.
    pub fn changed_paths(&self) -> &[PathBuf] {
        &self.changed
    }
}

/// Decides whether the compiled artifact is stale.
///
/// Holds no state between calls beyond its collaborators; every check loads
/// the snapshot from disk. Checks against the same cache directory must be
/// serialized by the caller.
pub struct Checker<I, E, V = DirectoryInvalidator> {
    config: ResolvedConfig,
    store: SnapshotStore,
    indexer: I,
    extractor: E,
    invalidator: V,
}

impl<I, E> Checker<I, E, DirectoryInvalidator>
where
    I: EntityIndexer,
    E: EntityExtractor,
{
    /// Creates a checker that invalidates by deleting the configured artifact directory.
    pub fn new(config: ResolvedConfig, indexer: I, extractor: E) -> Self {
        let invalidator = DirectoryInvalidator::new(&config.artifact_dir);
        Self {
            store: SnapshotStore::new(&config.cache_dir),
            config,
            indexer,
            extractor,
            invalidator,
        }
    }
}

impl<I, E, V> Checker<I, E, V>
where
    I: EntityIndexer,
    E: EntityExtractor,
    V: ArtifactInvalidator,
{
    /// Replaces the artifact invalidator.
    pub fn with_invalidator<W: ArtifactInvalidator>(self, invalidator: W) -> Checker<I, E, W> {
        Checker {
            config: self.config,
            store: self.store,
            indexer: self.indexer,
            extractor: self.extractor,
            invalidator,
        }
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Returns the snapshot store.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Returns the entity indexer.
    pub fn indexer(&self) -> &I {
        &self.indexer
    }

    /// Returns the entity indexer mutably, e.g. to swap in a rebuilt index.
    pub fn indexer_mut(&mut self) -> &mut I {
        &mut self.indexer
    }

    /// Returns the entity extractor.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Returns the artifact invalidator.
    pub fn invalidator(&self) -> &V {
        &self.invalidator
    }

    /// Returns a scanner configured for the watched extension.
    pub fn scanner(&self) -> MtimeScanner {
        MtimeScanner::new(self.config.extension.as_str()).parallel(self.config.parallel_scan)
    }

    /// Checks whether the compiled artifact is still valid.
    ///
    /// Every "must rebuild" outcome discards the artifact before returning.
    pub fn precheck(&self) -> Result<Precheck, CacheError> {
        let roots = &self.config.roots;

        let snapshot = match self.store.load()? {
            Some(snapshot) if snapshot.matches_roots(roots) => snapshot,
            Some(_) => {
                debug!("snapshot was taken for different roots");
                return self.rebuild(CheckState::Unversioned, None, Vec::new());
            }
            None => return self.rebuild(CheckState::Unversioned, None, Vec::new()),
        };

        let index = self.indexer.indexed_entities(roots)?;
        if index.is_empty() {
            return self.rebuild(CheckState::Unindexed, None, Vec::new());
        }

        let current = self.scanner().scan(roots)?;
        let changes = detect_changes(snapshot.mtimes(), &current);
        if changes.is_empty() {
            debug!(paths = current.len(), "no modification time moved");
            return Ok(Precheck::valid(CheckState::FastClean, Vec::new()));
        }

        let changed = changes.paths();
        debug!(changed = changed.len(), "modification times moved");

        if let Some(gone) = changed.iter().find(|p| !p.is_file() && !p.is_dir()) {
            debug!(path = %gone.display(), "watched path was deleted");
            return self.rebuild(CheckState::StructurallyDeleted, Some(current), changed);
        }

        let verifier = PreciseVerifier::new(&self.extractor, &self.config.extension);
        match verifier.verify(
            &changed,
            &index,
            snapshot.entity_shapes(),
            snapshot.shapes_hash(),
        )? {
            Verification::Unchanged { shapes, recomputed } => {
                debug!(recomputed, "entity shapes unchanged");
                if self.config.refresh_on_precise_clean {
                    self.refresh(&snapshot, current, shapes);
                }
                Ok(Precheck::valid(CheckState::PreciseClean, changed))
            }
            Verification::NotIndexed { .. } | Verification::Changed { .. } => {
                self.rebuild(CheckState::PreciseDirty, Some(current), changed)
            }
        }
    }

    /// Persists a fresh snapshot after the host recompiled.
    ///
    /// Does nothing for a valid precheck.
    pub fn commit(&self, precheck: &Precheck) -> Result<(), CacheError> {
        match precheck.fingerprint() {
            Some(fingerprint) => self.record(fingerprint).map(drop),
            None => Ok(()),
        }
    }

    /// Records a full snapshot for the compilation identified by `fingerprint`.
    ///
    /// Every root must be a directory. Shapes are computed for all indexed
    /// entities and modification times are scanned at save time.
    pub fn record(&self, fingerprint: ContentHash) -> Result<Snapshot, CacheError> {
        let roots = &self.config.roots;
        if let Some(missing) = roots.iter().find(|root| !root.is_dir()) {
            return Err(CacheError::MissingRoot {
                path: missing.clone(),
            });
        }

        let index = self.indexer.indexed_entities(roots)?;
        let shapes = Fingerprinter::new(&self.extractor).snapshot_shapes(&index);
        let mtimes = self.scanner().scan(roots)?;
        let snapshot = Snapshot::new(roots.clone(), mtimes, fingerprint, shapes)?;
        self.store.save(&snapshot)?;

        info!(
            entities = index.len(),
            shaped = snapshot.entity_shapes().len(),
            %fingerprint,
            "recorded discovery snapshot"
        );
        Ok(snapshot)
    }

    fn rebuild(
        &self,
        state: CheckState,
        current: Option<MtimeMap>,
        changed: Vec<PathBuf>,
    ) -> Result<Precheck, CacheError> {
        let current = match current {
            Some(current) => current,
            None => self.scanner().scan(&self.config.roots)?,
        };
        let fingerprint = hash_mtimes(&current)?;

        self.invalidator.invalidate();
        info!(?state, changed = changed.len(), %fingerprint, "compiled artifact is stale");

        Ok(Precheck {
            state,
            fingerprint: Some(fingerprint),
            changed,
        })
    }

    /// Rewrites the snapshot with current timestamps after a precise-clean check.
    ///
    /// The shapes hash is unchanged by construction. A failed write only means
    /// the same paths are verified again next time.
    fn refresh(&self, snapshot: &Snapshot, current: MtimeMap, shapes: ShapeMap) {
        let refreshed = Snapshot::new(
            snapshot.roots().to_vec(),
            current,
            snapshot.mtime_hash(),
            shapes,
        );
        let result = refreshed.and_then(|refreshed| self.store.save(&refreshed));
        if let Err(e) = result {
            warn!("failed to refresh snapshot timestamps: {e}");
        }
    }
}
