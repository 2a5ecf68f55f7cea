//! Configuration types deserialized from `discovery.toml`.

use serde::Deserialize;

/// The top-level checker configuration parsed from `discovery.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Which directories are watched and which files in them count.
    pub discovery: WatchConfig,
    /// Where snapshots and compiled artifacts live.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// The watched source trees.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Root directories to watch, in the order the entity indexer is built with.
    pub roots: Vec<String>,
    /// Extension (without the dot) of files that hold entities.
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Cache layout and checker policy.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Base temporary directory shared with the downstream compiler.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
    /// Subdirectory of `temp_dir` holding the snapshot.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Subdirectory of `temp_dir` holding the compiled artifact.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
    /// Rewrite stored mtimes when timestamps moved but no shape changed.
    #[serde(default = "default_true")]
    pub refresh_on_precise_clean: bool,
    /// Scan roots and subdirectories on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel_scan: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            folder: default_folder(),
            artifact_dir: default_artifact_dir(),
            refresh_on_precise_clean: true,
            parallel_scan: true,
        }
    }
}

fn default_extension() -> String {
    "php".to_string()
}

fn default_temp_dir() -> String {
    "temp".to_string()
}

fn default_folder() -> String {
    "service-discovery".to_string()
}

fn default_artifact_dir() -> String {
    "cache".to_string()
}

fn default_true() -> bool {
    true
}
