//! Incremental invalidation for artifacts compiled from annotated sources.
//!
//! This crate decides whether a compiled artifact (such as a dependency
//! injection container) built from a tree of source entities is still valid.
//! A cheap modification-time diff runs first; only the entities behind the
//! touched files get their shapes recomputed, merged into the last known
//! shapes, and compared by whole-map hash against the saved snapshot.

#![warn(missing_docs)]

pub mod checker;
pub mod detector;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod invalidate;
mod paths;
pub mod scanner;
pub mod shape;
pub mod snapshot;
pub mod verifier;

pub use checker::{CheckState, Checker, Precheck};
pub use detector::{detect_changes, ChangeSet};
pub use error::CacheError;
pub use fingerprint::{hash_mtimes, hash_shapes, EntityExtractor, Fingerprinter};
pub use index::{EntityIndex, EntityIndexer, StaticIndexer};
pub use invalidate::{ArtifactInvalidator, DirectoryInvalidator};
pub use scanner::{is_watched_file, MtimeMap, MtimeScanner};
pub use shape::{MemberShape, Shape, ShapeBuilder, ShapeMap};
pub use snapshot::{Snapshot, SnapshotStore, SNAPSHOT_FILE, SNAPSHOT_SCHEMA};
pub use verifier::{PreciseVerifier, Verification};
