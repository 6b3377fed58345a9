//! Flat-layout (source zip) materialization.
//!
//! A source archive mirrors the package hierarchy directly. Its contents are
//! copied below `Assets/UnityPackages/<project>/`, synthesizing sidecars for
//! anything the archive does not describe itself. Directories are created on
//! demand, so a directory whose files are all skipped leaves nothing behind.
//! Existing destination files are always overwritten.

use std::fs;
use std::path::Path;

use super::copy::{copy_with_retry, RetryPolicy};
use super::error::{ManagerError, ManagerResult};
use super::meta::{ensure_meta, EntryKind};
use crate::package::{
    is_meta_file, join_relative, manifest_filename, meta_path, package_root, PathFilter,
};

/// Outcome of materializing a flat archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatCopyStats {
    /// Files copied into the destination.
    pub files_copied: usize,
    /// Files skipped by the ignore predicate or the path filter.
    pub files_skipped: usize,
    /// Directories created in the destination.
    pub folders_created: usize,
    /// Sidecars synthesized for files and directories.
    pub sidecars_synthesized: usize,
    /// Whether the archive root had no `<project>.unitypackage.json`.
    pub manifest_missing: bool,
}

/// Whether a file is filesystem housekeeping that is never materialized.
///
/// Only the final path component is inspected.
pub fn is_ignored_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase().contains(".ds_store"))
        .unwrap_or(false)
}

/// Copy an extracted flat archive into `<dest_root>/Assets/UnityPackages/<project_id>`.
pub fn copy_flat_tree(
    source_root: &Path,
    dest_root: &Path,
    project_id: &str,
    filter: &PathFilter,
    retry: &RetryPolicy,
) -> ManagerResult<FlatCopyStats> {
    let relative_root = format!("{}/{}", package_root(), project_id);
    let package_dir = join_relative(dest_root, &relative_root);

    let mut stats = FlatCopyStats {
        manifest_missing: !source_root.join(manifest_filename(project_id)).is_file(),
        ..Default::default()
    };

    if !package_dir.exists() {
        create_dir(&package_dir)?;
        stats.folders_created += 1;
        if ensure_meta(&package_dir, &relative_root, EntryKind::Folder)? {
            stats.sidecars_synthesized += 1;
        }
    }

    let mut walker = FlatWalker {
        filter,
        retry,
        stats: &mut stats,
    };
    walker.copy_dir(source_root, &package_dir, &relative_root)?;

    tracing::info!(
        project = project_id,
        files = stats.files_copied,
        skipped = stats.files_skipped,
        manifest_missing = stats.manifest_missing,
        "Copied source package"
    );
    Ok(stats)
}

struct FlatWalker<'a> {
    filter: &'a PathFilter,
    retry: &'a RetryPolicy,
    stats: &'a mut FlatCopyStats,
}

impl FlatWalker<'_> {
    fn copy_dir(&mut self, source: &Path, target: &Path, relative: &str) -> ManagerResult<()> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in read_dir_sorted(source)? {
            if entry.is_dir() {
                dirs.push(entry);
            } else if entry.is_file() {
                files.push(entry);
            }
        }

        for dir in dirs {
            let Some(name) = file_name(&dir) else {
                continue;
            };
            let child_relative = format!("{}/{}", relative, name);
            self.copy_dir(&dir, &target.join(&name), &child_relative)?;
        }

        for file in files {
            let Some(name) = file_name(&file) else {
                continue;
            };
            let child_relative = format!("{}/{}", relative, name);
            if is_ignored_file(&file) || !self.filter.matches(&child_relative) {
                self.stats.files_skipped += 1;
                continue;
            }

            self.ensure_dir(target, relative)?;
            let dest = target.join(&name);
            // Sidecars travel with the archive when present
            let carries_meta = is_meta_file(&name) || meta_path(&file).is_file();
            if !carries_meta && ensure_meta(&dest, &child_relative, EntryKind::File)? {
                self.stats.sidecars_synthesized += 1;
            }
            copy_with_retry(&file, &dest, self.retry)?;
            self.stats.files_copied += 1;
        }

        Ok(())
    }

    /// Create `target` and any missing ancestors, each with a folder sidecar.
    fn ensure_dir(&mut self, target: &Path, relative: &str) -> ManagerResult<()> {
        if target.is_dir() {
            return Ok(());
        }
        if let (Some(parent), Some((parent_relative, _))) =
            (target.parent(), relative.rsplit_once('/'))
        {
            self.ensure_dir(parent, parent_relative)?;
        }
        create_dir(target)?;
        self.stats.folders_created += 1;
        if ensure_meta(target, relative, EntryKind::Folder)? {
            self.stats.sidecars_synthesized += 1;
        }
        Ok(())
    }
}

fn read_dir_sorted(dir: &Path) -> ManagerResult<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ManagerError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

fn create_dir(path: &Path) -> ManagerResult<()> {
    fs::create_dir_all(path).map_err(|e| ManagerError::CreateDirFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
