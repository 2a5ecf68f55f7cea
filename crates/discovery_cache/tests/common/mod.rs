//! Shared fixtures for the checker integration tests.
//!
//! Source files use a tiny marker syntax standing in for real annotations:
//!
//! ```text
//! @class Service
//! @member actionDefault Get App\Model\User
//! ```
//!
//! Every other line is treated as code or comment and never reaches a shape.
//!
//! Entity `Name` lives in `Name.php`. An id written `File::Name` lives in
//! `File.php`, in the section opened by an `@entity Name` line.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use discovery_cache::{
    ArtifactInvalidator, Checker, EntityExtractor, EntityIndex, MemberShape, Shape, StaticIndexer,
};
use discovery_common::EntityId;
use discovery_config::ResolvedConfig;

/// Base time for pinned modification times.
const EPOCH_SECS: u64 = 1_600_000_000;

/// Extracts shapes from marker lines and records which entities it was asked about.
pub struct MarkerExtractor {
    root: PathBuf,
    calls: RefCell<Vec<String>>,
}

impl MarkerExtractor {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&self) -> Vec<String> {
        self.calls.take()
    }
}

impl EntityExtractor for MarkerExtractor {
    fn shape_of(&self, id: &EntityId) -> Option<Shape> {
        self.calls.borrow_mut().push(id.to_string());
        let (file, section) = match id.as_str().split_once("::") {
            Some((file, section)) => (file, Some(section)),
            None => (id.as_str(), None),
        };
        let source = std::fs::read_to_string(self.root.join(format!("{file}.php"))).ok()?;
        match section {
            Some(section) => Some(parse_markers(&section_of(&source, section)?)),
            None => Some(parse_markers(&source)),
        }
    }
}

pub fn parse_markers(source: &str) -> Shape {
    let mut builder = Shape::builder();
    for line in source.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("@class ") {
            builder = builder.facet("class", rest.trim());
        } else if let Some(rest) = line.strip_prefix("@member ") {
            let mut parts = rest.split_whitespace();
            if let (Some(name), Some(marker)) = (parts.next(), parts.next()) {
                builder = builder.member(name, MemberShape::new([marker], parts));
            }
        }
    }
    builder.build()
}

/// Returns the lines of the `@entity name` section, or `None` if it is gone.
pub fn section_of(source: &str, name: &str) -> Option<String> {
    let mut lines = source
        .lines()
        .map(str::trim)
        .skip_while(|line| line.strip_prefix("@entity ") != Some(name));
    lines.next()?;
    let body: Vec<&str> = lines.take_while(|line| !line.starts_with("@entity ")).collect();
    Some(body.join("\n"))
}

/// Counts invalidations instead of deleting anything.
#[derive(Default)]
pub struct CountingInvalidator {
    count: std::cell::Cell<usize>,
}

impl CountingInvalidator {
    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl ArtifactInvalidator for CountingInvalidator {
    fn invalidate(&self) {
        self.count.set(self.count.get() + 1);
    }
}

pub type TestChecker = Checker<StaticIndexer, MarkerExtractor, CountingInvalidator>;

/// A scratch project with one watched root.
pub struct Project {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("app");
        std::fs::create_dir_all(&root).unwrap();
        Self { dir, root }
    }

    /// Path of the source file defining entity `name`.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.php"))
    }

    /// Writes entity `name` and pins its mtime to `EPOCH_SECS + tick`.
    pub fn write(&self, name: &str, source: &str, tick: u64) {
        let path = self.file(name);
        std::fs::write(&path, source).unwrap();
        set_mtime(&path, tick);
    }

    /// Indexes the given entity names as `<root>/<name>.php`.
    pub fn index(&self, names: &[&str]) -> EntityIndex {
        names
            .iter()
            .map(|name| (EntityId::from(*name), self.file(name)))
            .collect()
    }

    /// Indexes the given entity ids as living in one shared file.
    pub fn shared_index(&self, file: &str, ids: &[&str]) -> EntityIndex {
        ids.iter()
            .map(|id| (EntityId::from(*id), self.file(file)))
            .collect()
    }

    pub fn config(&self) -> ResolvedConfig {
        ResolvedConfig::with_defaults(vec![self.root.clone()], &self.dir.path().join("temp"))
    }

    pub fn checker(&self, names: &[&str]) -> TestChecker {
        self.checker_with(self.config(), names)
    }

    pub fn checker_with(&self, config: ResolvedConfig, names: &[&str]) -> TestChecker {
        self.checker_for(config, self.index(names))
    }

    pub fn checker_for(&self, config: ResolvedConfig, index: EntityIndex) -> TestChecker {
        Checker::new(
            config,
            StaticIndexer::new(index),
            MarkerExtractor::new(&self.root),
        )
        .with_invalidator(CountingInvalidator::default())
    }
}

/// Routes checker logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn set_mtime(path: &Path, tick: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(EPOCH_SECS + tick))
        .unwrap();
}

/// Runs a precheck and commits it, as the host does around a compilation.
pub fn compile(checker: &TestChecker) {
    let precheck = checker.precheck().unwrap();
    checker.commit(&precheck).unwrap();
    checker.extractor().take_calls();
}
