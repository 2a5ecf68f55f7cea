//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::DiscoveryConfig;
use std::collections::HashSet;
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE: &str = "discovery.toml";

/// Loads and validates a `discovery.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<DiscoveryConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE);
    let content =
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates a `discovery.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<DiscoveryConfig, ConfigError> {
    let config: DiscoveryConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &DiscoveryConfig) -> Result<(), ConfigError> {
    let watch = &config.discovery;
    if watch.roots.is_empty() {
        return Err(ConfigError::MissingField {
            field: "discovery.roots",
        });
    }

    let mut seen = HashSet::new();
    for root in &watch.roots {
        if root.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "discovery.roots",
                reason: "contains an empty path".to_string(),
            });
        }
        if !seen.insert(root.as_str()) {
            return Err(ConfigError::DuplicateRoot { root: root.clone() });
        }
    }

    if watch.extension.is_empty() {
        return Err(ConfigError::MissingField {
            field: "discovery.extension",
        });
    }
    if watch.extension.starts_with('.') {
        return Err(ConfigError::InvalidValue {
            field: "discovery.extension",
            reason: format!("'{}' must not start with a dot", watch.extension),
        });
    }

    if config.cache.folder.is_empty() {
        return Err(ConfigError::MissingField {
            field: "cache.folder",
        });
    }
    if config.cache.folder == config.cache.artifact_dir {
        return Err(ConfigError::InvalidValue {
            field: "cache.folder",
            reason: format!(
                "'{}' is also the artifact directory, which gets deleted on rebuild",
                config.cache.folder
            ),
        });
    }
    Ok(())
}
