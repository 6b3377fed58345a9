//! Sidecar metadata synthesis.
//!
//! Unity expects a `<entry>.meta` file next to every asset and folder. When a
//! package does not carry one, a minimal sidecar is generated with a GUID
//! derived from the entry's project-relative path, so repeated runs produce
//! the same identity.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::error::{ManagerError, ManagerResult};
use crate::package::meta_path;

/// Kind of entry a sidecar describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// Deterministic 32-hex-digit GUID for a project-relative path.
pub fn guid_for(relative_path: &str) -> String {
    let digest = Sha256::digest(relative_path.replace('\\', "/").as_bytes());
    digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Render the sidecar text for an entry.
pub fn render_meta(relative_path: &str, kind: EntryKind) -> String {
    let mut text = format!(
        "fileFormatVersion: 2\nguid: {}\n",
        guid_for(relative_path)
    );
    if kind == EntryKind::Folder {
        text.push_str("folderAsset: yes\n");
    }
    text.push_str("DefaultImporter:\n  userData: \n  assetBundleName: \n  assetBundleVariant: \n");
    text
}

/// Write a synthesized sidecar for `entry` unless one already exists.
///
/// Returns whether a sidecar was written.
pub fn ensure_meta(entry: &Path, relative_path: &str, kind: EntryKind) -> ManagerResult<bool> {
    let sidecar = meta_path(entry);
    if sidecar.exists() {
        return Ok(false);
    }
    fs::write(&sidecar, render_meta(relative_path, kind)).map_err(|e| {
        ManagerError::WriteFailed {
            path: sidecar.clone(),
            source: e,
        }
    })?;
    tracing::debug!(path = %sidecar.display(), "Synthesized sidecar");
    Ok(true)
}
