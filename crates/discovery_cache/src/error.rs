//! Error types for checker operations.

use std::path::PathBuf;

/// Errors that can occur while checking or recording a snapshot.
///
/// Most problems are decided internally: a missing or corrupt snapshot is a
/// rebuild, not an error. This enum only carries conditions the host should
/// see, such as an unreadable cache directory or a failing indexer.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error other than "not found" occurred on a cache or source path.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or hashing encode step failed.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The entity indexer could not produce an index.
    #[error("entity index unavailable: {reason}")]
    Index {
        /// Description of the indexer failure.
        reason: String,
    },

    /// A watched root is not a directory when a snapshot is recorded.
    #[error("discovery directory '{path}' does not exist")]
    MissingRoot {
        /// The missing root.
        path: PathBuf,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::io(
            "/tmp/temp/service-discovery/discovery.meta",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("discovery.meta"));
    }

    #[test]
    fn serialization_error_display() {
        let err = CacheError::Serialization {
            reason: "path is not valid UTF-8".to_string(),
        };
        assert!(err.to_string().contains("path is not valid UTF-8"));
    }

    #[test]
    fn index_error_display() {
        let err = CacheError::Index {
            reason: "loader cache locked".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "entity index unavailable: loader cache locked"
        );
    }

    #[test]
    fn missing_root_display() {
        let err = CacheError::MissingRoot {
            path: PathBuf::from("/app/Services"),
        };
        assert_eq!(
            err.to_string(),
            "discovery directory '/app/Services' does not exist"
        );
    }
}
