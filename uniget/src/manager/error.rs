//! Error types for package materialization.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::package::{FilterError, ManifestError};

/// Result type for manager operations.
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors that can occur while materializing a package.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Failed to read a file or directory.
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write a file or directory.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create a directory.
    #[error("failed to create directory {}: {source}", .path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Archive extraction failed.
    #[error("failed to extract {}: {reason}", .path.display())]
    ExtractionFailed { path: PathBuf, reason: String },

    /// The archive kind could not be determined from its path.
    #[error("unsupported archive type: {}", .0.display())]
    UnsupportedArchive(PathBuf),

    /// A copy failed with a non-transient error.
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A copy kept failing with transient errors until the retry budget ran out.
    #[error("gave up on {} after {attempts} attempts: {source}", .path.display())]
    CopyContention {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// The package manifest could not be resolved.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A path filter pattern was invalid.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = ManagerError::UnsupportedArchive(PathBuf::from("pkg.rar"));
        assert_eq!(err.to_string(), "unsupported archive type: pkg.rar");
    }

    #[test]
    fn test_copy_contention_display() {
        let err = ManagerError::CopyContention {
            path: PathBuf::from("/project/Assets/a.cs"),
            attempts: 5,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "locked"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/project/Assets/a.cs"));
        assert!(msg.contains("5 attempts"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_manifest_error_is_transparent() {
        let err: ManagerError = ManifestError::CyclicBase {
            location: "a.json".to_string(),
        }
        .into();
        assert!(err.to_string().contains("cyclic #base"));
    }
}
