//! Fast change detection over modification-time maps.
//!
//! Compares the saved map against a fresh scan in a single pass over each
//! side. Never looks at entity metadata.

use std::path::PathBuf;

use crate::scanner::MtimeMap;

/// Paths whose modification time moved between two scans.
///
/// All lists are sorted, since both maps iterate in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Paths present now but absent from the saved map.
    pub added: Vec<PathBuf>,

    /// Paths present in both maps with different timestamps.
    pub modified: Vec<PathBuf>,

    /// Paths present in the saved map but absent now.
    pub removed: Vec<PathBuf>,
}

impl ChangeSet {
    /// Returns `true` if no path was added, modified or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Returns the total number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Returns every changed path in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .added
            .iter()
            .chain(&self.modified)
            .chain(&self.removed)
            .cloned()
            .collect();
        paths.sort();
        paths
    }
}

/// Diffs a saved modification-time map against a freshly scanned one.
pub fn detect_changes(previous: &MtimeMap, current: &MtimeMap) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (path, mtime) in current {
        match previous.get(path) {
            Some(old) if old == mtime => {}
            Some(_) => changes.modified.push(path.clone()),
            None => changes.added.push(path.clone()),
        }
    }

    changes.removed = previous
        .keys()
        .filter(|p| !current.contains_key(*p))
        .cloned()
        .collect();

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery_common::Timestamp;

    fn map(entries: &[(&str, Option<i64>)]) -> MtimeMap {
        entries
            .iter()
            .map(|(p, t)| (PathBuf::from(p), t.map(Timestamp::from_nanos)))
            .collect()
    }

    #[test]
    fn identical_maps_have_no_changes() {
        let m = map(&[("/app", Some(1)), ("/app/A.php", Some(2))]);
        let cs = detect_changes(&m, &m.clone());
        assert!(cs.is_empty());
        assert_eq!(cs.len(), 0);
    }

    #[test]
    fn detects_modified() {
        let old = map(&[("/app", Some(1)), ("/app/A.php", Some(2))]);
        let new = map(&[("/app", Some(1)), ("/app/A.php", Some(3))]);
        let cs = detect_changes(&old, &new);
        assert_eq!(cs.modified, vec![PathBuf::from("/app/A.php")]);
        assert!(cs.added.is_empty());
        assert!(cs.removed.is_empty());
    }

    #[test]
    fn detects_added_and_removed() {
        let old = map(&[("/app", Some(1)), ("/app/A.php", Some(2))]);
        let new = map(&[("/app", Some(5)), ("/app/B.php", Some(4))]);
        let cs = detect_changes(&old, &new);
        assert_eq!(cs.added, vec![PathBuf::from("/app/B.php")]);
        assert_eq!(cs.modified, vec![PathBuf::from("/app")]);
        assert_eq!(cs.removed, vec![PathBuf::from("/app/A.php")]);
        assert_eq!(
            cs.paths(),
            vec![
                PathBuf::from("/app"),
                PathBuf::from("/app/A.php"),
                PathBuf::from("/app/B.php"),
            ]
        );
    }

    #[test]
    fn root_disappearing_is_a_modification() {
        let old = map(&[("/app", Some(1))]);
        let new = map(&[("/app", None)]);
        let cs = detect_changes(&old, &new);
        assert_eq!(cs.modified, vec![PathBuf::from("/app")]);
    }

    #[test]
    fn empty_previous_reports_everything_added() {
        let new = map(&[("/app", Some(1)), ("/app/A.php", Some(2))]);
        let cs = detect_changes(&MtimeMap::new(), &new);
        assert_eq!(cs.added.len(), 2);
        assert_eq!(cs.len(), 2);
    }
}
