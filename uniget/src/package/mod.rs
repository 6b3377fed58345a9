//! Unity package manifests, classification and naming.
//!
//! This module provides the data side of package materialization:
//!
//! - **Manifest**: a project's JSON description, with `#base` inheritance
//! - **Classification**: per-file `extra`/`merged` flags projected from a manifest
//! - **Selection**: the keep/drop decision for a classified entry
//! - **Filter**: regex include/exclude predicates over project paths
//! - **Naming**: the project path conventions (`Assets/UnityPackages`, `.meta`)
//!
//! # Type Hierarchy
//!
//! ```text
//! Project (resolved manifest)
//! └── files: Vec<FileDeclaration>
//!         │
//!         ▼  classification_map()
//! ClassificationMap ──► should_materialize(path, InclusionPolicy)
//! ```

mod filter;
mod manifest;
mod naming;
mod selection;

// Manifest loading
pub use manifest::{
    load_document, merge_documents, parse_document, AssetMapSource, Dependency, Document,
    FileDeclaration, FileItem, FsManifestSource, ManifestError, ManifestResult, ManifestSource,
    Project, BASE_KEY,
};

// Selection and filtering
pub use filter::{FilterError, PathFilter, SAMPLE_TOKEN};
pub use selection::{should_materialize, Classification, ClassificationMap, InclusionPolicy};

// Naming utilities
pub use naming::{
    destination_relative, is_meta_file, is_safe_logical, join_relative, logical_parent,
    manifest_filename, manifest_logical_path, meta_path, needs_package_prefix, normalize_logical,
    package_root, resolve_logical, ASSET_ROOT, MANIFEST_EXTENSION, META_SUFFIX, PACKAGE_DIR,
};
