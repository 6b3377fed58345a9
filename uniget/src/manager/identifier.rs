//! Logical path reconstruction for identifier-keyed archives.
//!
//! An extracted `.unitypackage` looks like:
//!
//! ```text
//! staging/
//! ├── 0c1f.../          one directory per asset GUID
//! │   ├── asset         payload (absent for folders)
//! │   ├── asset.meta    payload sidecar
//! │   └── pathname      first line: logical path, e.g. Assets/Foo/Bar.cs
//! └── 9ab2.../
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ManagerError, ManagerResult};
use crate::package::is_safe_logical;

/// Payload filename inside an identifier directory.
pub const ASSET_FILE: &str = "asset";

/// Logical path record inside an identifier directory.
pub const PATHNAME_FILE: &str = "pathname";

/// Logical path → extracted payload maps for one archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMap {
    /// Logical file path → payload file.
    pub files: BTreeMap<String, PathBuf>,
    /// Logical folder path → (absent) payload path; its sidecar is `<payload>.meta`.
    pub folders: BTreeMap<String, PathBuf>,
}

impl AssetMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registered entries.
    pub fn len(&self) -> usize {
        self.files.len() + self.folders.len()
    }

    /// Whether no entries were registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}

/// Scan an extracted identifier-keyed archive.
///
/// Identifier directories without a readable, non-empty `pathname` record, or
/// whose record points outside the project, are skipped. Only a failure to
/// list `root` itself is an error.
pub fn build_asset_map(root: &Path) -> ManagerResult<AssetMap> {
    let entries = fs::read_dir(root).map_err(|e| ManagerError::ReadFailed {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut map = AssetMap::new();
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }

        let Some(logical) = read_pathname(&dir) else {
            tracing::debug!(entry = %dir.display(), "Skipping entry without pathname record");
            continue;
        };
        if !is_safe_logical(&logical) {
            tracing::warn!(
                entry = %dir.display(),
                pathname = %logical,
                "Skipping entry whose pathname leaves the project"
            );
            continue;
        }

        let asset = dir.join(ASSET_FILE);
        if asset.is_file() {
            map.files.insert(logical, asset);
        } else {
            map.folders.insert(logical, asset);
        }
    }

    tracing::debug!(
        files = map.files.len(),
        folders = map.folders.len(),
        "Reconstructed package layout"
    );
    Ok(map)
}

/// First line of the `pathname` record, if present and non-empty.
fn read_pathname(dir: &Path) -> Option<String> {
    let text = fs::read_to_string(dir.join(PATHNAME_FILE)).ok()?;
    let first = text.lines().next()?.trim_end_matches('\r');
    (!first.is_empty()).then(|| first.to_string())
}
