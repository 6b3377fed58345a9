//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;
use uniget::config::ConfigError;
use uniget::manager::ManagerError;
use uniget::package::{FilterError, ManifestError};
use uniget::source::SourceError;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Install failed: {0}")]
    Materialize(#[from] ManagerError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Release lookup failed: {0}")]
    Source(#[from] SourceError),

    #[error("Cannot read release listing {}: {source}", .path.display())]
    ReadListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid release listing {}: {source}", .path.display())]
    ParseListing {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Nothing to install. Pass an archive, or --github OWNER/REPO with --project.")]
    MissingArchive,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot tell archive type of '{0}'. Use --kind unitypackage|source.")]
    UnknownArchive(String),
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl CliError {
    /// Print the error and its cause chain to stderr, then exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        let mut source = std::error::Error::source(self).and_then(|e| e.source());
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}
