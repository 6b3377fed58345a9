//! Archive extraction for package materialization.
//!
//! This module handles:
//! - Detecting the archive layout from its filename
//! - Extracting identifier-keyed `.unitypackage` archives (gzip-compressed tar)
//! - Extracting flat source archives (zip)

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use super::error::{ManagerError, ManagerResult};

/// Extracts an archive into a directory.
pub trait ArchiveExtractor {
    /// Extract `archive_path` into `dest_dir`, returning the number of files written.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize>;
}

/// Layout of a package archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzip tar whose top-level directories are named by asset GUIDs.
    UnityPackage,
    /// Zip mirroring the package's directory hierarchy.
    Source,
}

impl ArchiveKind {
    /// Infer the archive kind from a filename extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".unitypackage") || name.ends_with(".tar.gz") || name.ends_with(".tgz")
        {
            Some(Self::UnityPackage)
        } else if name.ends_with(".zip") {
            Some(Self::Source)
        } else {
            None
        }
    }

    /// Extractor implementation for this layout.
    pub fn extractor(&self) -> Box<dyn ArchiveExtractor> {
        match self {
            Self::UnityPackage => Box::new(TarGzExtractor::new()),
            Self::Source => Box::new(ZipExtractor::new()),
        }
    }

    /// Extension a release asset of this kind is published with.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::UnityPackage => ".unitypackage",
            Self::Source => ".zip",
        }
    }

    /// Get a human-readable name for the kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnityPackage => "unitypackage",
            Self::Source => "source",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extractor for gzip-compressed tar archives.
#[derive(Debug, Default)]
pub struct TarGzExtractor;

impl TarGzExtractor {
    /// Create a new tar.gz extractor.
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        create_dir(dest_dir)?;

        let file = File::open(archive_path).map_err(|e| ManagerError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        archive
            .unpack(dest_dir)
            .map_err(|e| ManagerError::ExtractionFailed {
                path: archive_path.to_path_buf(),
                reason: format!("tar extraction failed: {}", e),
            })?;

        count_files_recursive(dest_dir)
    }
}

/// Extractor for zip archives.
#[derive(Debug, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new zip extractor.
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ManagerResult<usize> {
        create_dir(dest_dir)?;

        let file = File::open(archive_path).map_err(|e| ManagerError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        })?;
        let extraction_failed = |reason: String| ManagerError::ExtractionFailed {
            path: archive_path.to_path_buf(),
            reason,
        };
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| extraction_failed(format!("invalid zip archive: {}", e)))?;

        let mut count = 0;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| extraction_failed(format!("unreadable entry #{}: {}", i, e)))?;

            // Entries escaping the destination are skipped
            let Some(relative) = entry.enclosed_name() else {
                tracing::warn!(entry = entry.name(), "Skipping zip entry with unsafe path");
                continue;
            };
            let output_path = dest_dir.join(relative);

            if entry.is_dir() {
                create_dir(&output_path)?;
                continue;
            }
            if let Some(parent) = output_path.parent() {
                create_dir(parent)?;
            }
            let mut outfile = File::create(&output_path).map_err(|e| ManagerError::WriteFailed {
                path: output_path.clone(),
                source: e,
            })?;
            io::copy(&mut entry, &mut outfile).map_err(|e| ManagerError::WriteFailed {
                path: output_path.clone(),
                source: e,
            })?;
            count += 1;
        }

        Ok(count)
    }
}

fn create_dir(path: &Path) -> ManagerResult<()> {
    fs::create_dir_all(path).map_err(|e| ManagerError::CreateDirFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Count files recursively in a directory.
fn count_files_recursive(dir: &Path) -> ManagerResult<usize> {
    let mut count = 0;

    if !dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(dir).map_err(|e| ManagerError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            count += 1;
        } else if path.is_dir() {
            count += count_files_recursive(&path)?;
        }
    }

    Ok(count)
}
