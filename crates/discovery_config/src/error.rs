//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a `discovery.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{}': {source}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed into the expected tables.
    #[error("failed to parse configuration: {reason}")]
    Parse {
        /// Parser message, including the offending line.
        reason: String,
    },

    /// A required field is missing or empty.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Dotted key of the field, e.g. `discovery.roots`.
        field: &'static str,
    },

    /// The same watched root is listed twice.
    #[error("root '{root}' is listed more than once in discovery.roots")]
    DuplicateRoot {
        /// The repeated entry, as written.
        root: String,
    },

    /// A field has a value the checker cannot work with.
    #[error("invalid '{field}': {reason}")]
    InvalidValue {
        /// Dotted key of the field.
        field: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_failure_names_the_file() {
        let err = ConfigError::Io {
            path: PathBuf::from("/project/discovery.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.starts_with("failed to read configuration '/project/discovery.toml'"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn duplicate_root_quotes_the_entry() {
        let err = ConfigError::DuplicateRoot {
            root: "app/Services".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "root 'app/Services' is listed more than once in discovery.roots"
        );
    }

    #[test]
    fn invalid_value_names_field_and_reason() {
        let err = ConfigError::InvalidValue {
            field: "discovery.extension",
            reason: "'.php' must not start with a dot".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid 'discovery.extension': '.php' must not start with a dot"
        );
    }
}
