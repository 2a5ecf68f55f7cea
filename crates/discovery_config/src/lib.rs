//! Parsing and validation of `discovery.toml` configuration files.
//!
//! This crate reads the checker configuration and produces a strongly-typed
//! [`DiscoveryConfig`], which resolves against a project directory into the
//! absolute paths the checker works with.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::ResolvedConfig;
pub use types::*;
