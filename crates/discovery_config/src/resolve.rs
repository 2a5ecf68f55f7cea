//! Path resolution: turning a parsed configuration into absolute locations.

use crate::types::DiscoveryConfig;
use std::path::{Path, PathBuf};

/// A configuration with every path resolved against the project directory.
///
/// Root order is preserved exactly: the snapshot is keyed by this list, so
/// reordering roots is a different watched configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Watched root directories, in configured order.
    pub roots: Vec<PathBuf>,
    /// Watched file extension, without the dot.
    pub extension: String,
    /// Directory holding the snapshot record.
    pub cache_dir: PathBuf,
    /// Directory holding the compiled artifact that gets invalidated.
    pub artifact_dir: PathBuf,
    /// Rewrite stored mtimes when timestamps moved but no shape changed.
    pub refresh_on_precise_clean: bool,
    /// Scan on the rayon thread pool.
    pub parallel_scan: bool,
}

impl DiscoveryConfig {
    /// Resolves relative paths against `project_dir`.
    ///
    /// Absolute paths in the configuration are kept as they are.
    pub fn resolve(&self, project_dir: &Path) -> ResolvedConfig {
        let temp_dir = project_dir.join(&self.cache.temp_dir);
        ResolvedConfig {
            roots: self
                .discovery
                .roots
                .iter()
                .map(|root| project_dir.join(root))
                .collect(),
            extension: self.discovery.extension.clone(),
            cache_dir: temp_dir.join(&self.cache.folder),
            artifact_dir: temp_dir.join(&self.cache.artifact_dir),
            refresh_on_precise_clean: self.cache.refresh_on_precise_clean,
            parallel_scan: self.cache.parallel_scan,
        }
    }
}

impl ResolvedConfig {
    /// Builds a configuration for `roots` with the default layout under `temp_dir`.
    pub fn with_defaults(roots: Vec<PathBuf>, temp_dir: &Path) -> Self {
        let defaults = crate::types::CacheConfig::default();
        Self {
            roots,
            extension: "php".to_string(),
            cache_dir: temp_dir.join(defaults.folder),
            artifact_dir: temp_dir.join(defaults.artifact_dir),
            refresh_on_precise_clean: defaults.refresh_on_precise_clean,
            parallel_scan: defaults.parallel_scan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn resolves_relative_paths() {
        let config = load_config_from_str(
            r#"
[discovery]
roots = ["app/Services", "app/Presentation"]
"#,
        )
        .unwrap();
        let resolved = config.resolve(Path::new("/project"));
        assert_eq!(
            resolved.roots,
            vec![
                PathBuf::from("/project/app/Services"),
                PathBuf::from("/project/app/Presentation"),
            ]
        );
        assert_eq!(
            resolved.cache_dir,
            PathBuf::from("/project/temp/service-discovery")
        );
        assert_eq!(resolved.artifact_dir, PathBuf::from("/project/temp/cache"));
    }

    #[test]
    fn keeps_absolute_paths() {
        let config = load_config_from_str(
            r#"
[discovery]
roots = ["/srv/app"]

[cache]
temp_dir = "/var/tmp"
"#,
        )
        .unwrap();
        let resolved = config.resolve(Path::new("/project"));
        assert_eq!(resolved.roots, vec![PathBuf::from("/srv/app")]);
        assert_eq!(
            resolved.cache_dir,
            PathBuf::from("/var/tmp/service-discovery")
        );
    }

    #[test]
    fn root_order_is_preserved() {
        let config = load_config_from_str("[discovery]\nroots = [\"b\", \"a\"]\n").unwrap();
        let resolved = config.resolve(Path::new("/p"));
        assert_eq!(resolved.roots, vec![PathBuf::from("/p/b"), PathBuf::from("/p/a")]);
    }

    #[test]
    fn with_defaults_layout() {
        let resolved = ResolvedConfig::with_defaults(vec![PathBuf::from("/app")], Path::new("/tmp/t"));
        assert_eq!(resolved.cache_dir, PathBuf::from("/tmp/t/service-discovery"));
        assert_eq!(resolved.artifact_dir, PathBuf::from("/tmp/t/cache"));
        assert_eq!(resolved.extension, "php");
    }
}
