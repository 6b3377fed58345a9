//! Release source helpers.
//!
//! The network fetch of a package lives with the caller. This module holds the
//! parts of it that are pure: picking release assets by name, reading a
//! version out of a release title, choosing the highest version that satisfies
//! a requirement and locating downloads in the local cache.

mod cache;
mod release;

pub use cache::{PackageCache, CACHE_DIR_NAME};
pub use release::{
    collect_candidates, parse_release_version, parse_requirement, select_version,
    AssetNameMatcher, Candidate, Release, ReleaseAsset, Repository,
};

use std::path::PathBuf;

use thiserror::Error;

/// Result type for release source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from release selection and cache lookup.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No release satisfied the requested version range.
    #[error("no release satisfies version requirement '{requirement}'")]
    NoMatchingVersion { requirement: String },

    #[error("invalid version requirement '{requirement}': {source}")]
    InvalidRequirement {
        requirement: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid repository '{0}', expected owner/repo")]
    InvalidRepository(String),

    #[error("failed to read package cache {}: {source}", .path.display())]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
