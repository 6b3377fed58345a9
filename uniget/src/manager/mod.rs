//! Package materialization.
//!
//! Turns a downloaded package archive into files below a project root:
//!
//! - **Extractor**: unpacks `.unitypackage` (gzip tar) or source (zip) archives
//! - **Identifier**: rebuilds logical paths from `<guid>/pathname` records
//! - **Copy**: newer-only copy with bounded retry on contended files
//! - **Meta**: deterministic `.meta` sidecar synthesis
//! - **Flat**: materialization of source archives into the package subtree
//! - **Installer**: the end-to-end [`PackageMaterializer`]
//!
//! # Workflow
//!
//! ```text
//! archive ──► staging (temp dir) ──► AssetMap ──► classify/filter ──► copy
//!                                                                      │
//!                              folder sidecars for every ancestor ◄────┘
//! ```

mod config;
mod copy;
mod error;
mod extractor;
mod flat;
mod identifier;
mod installer;
mod meta;

pub use config::MaterializerConfig;
pub use copy::{
    copy_if_newer, copy_if_newer_with_retry, copy_preserving_mtime, copy_with_retry, is_newer,
    is_transient, RetryError, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
pub use error::{ManagerError, ManagerResult};
pub use extractor::{ArchiveExtractor, ArchiveKind, TarGzExtractor, ZipExtractor};
pub use flat::{copy_flat_tree, is_ignored_file, FlatCopyStats};
pub use identifier::{build_asset_map, AssetMap, ASSET_FILE, PATHNAME_FILE};
pub use installer::{
    destination_path, load_classification, AncestorSet, MaterializeReport, MaterializeRequest,
    PackageMaterializer,
};
pub use meta::{ensure_meta, guid_for, render_meta, EntryKind};
