//! Package materializer.
//!
//! This module orchestrates the full materialization workflow:
//! 1. Extract the archive into a run-scoped staging directory
//! 2. Reconstruct logical paths (identifier-keyed) or walk the tree (flat)
//! 3. Resolve the package manifest into a classification map
//! 4. Copy selected files, newer-only, with bounded retry
//! 5. Propagate folder sidecars to every ancestor of copied content
//! 6. Remove the staging directory

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::config::MaterializerConfig;
use super::copy::copy_if_newer_with_retry;
use super::error::{ManagerError, ManagerResult};
use super::extractor::ArchiveKind;
use super::flat::copy_flat_tree;
use super::identifier::{build_asset_map, AssetMap};
use super::meta::{ensure_meta, EntryKind};
use crate::package::{
    destination_relative, join_relative, logical_parent, manifest_logical_path, meta_path,
    needs_package_prefix, package_root, AssetMapSource, ClassificationMap, InclusionPolicy,
    PathFilter, Project, ASSET_ROOT,
};

/// A request to materialize one package archive.
#[derive(Debug, Clone)]
pub struct MaterializeRequest {
    /// Local path of the downloaded archive.
    pub archive_path: PathBuf,
    /// Archive layout.
    pub kind: ArchiveKind,
    /// Project identifier; names the manifest and, for flat archives, the package folder.
    pub project_id: String,
    /// Which optional content to include.
    pub inclusion: InclusionPolicy,
    /// Additional path filter applied before the selection policy.
    pub filter: PathFilter,
    /// Root of the destination project.
    pub dest_root: PathBuf,
}

impl MaterializeRequest {
    /// Create a request, inferring the archive kind from its filename.
    pub fn new(
        archive_path: impl Into<PathBuf>,
        project_id: impl Into<String>,
        dest_root: impl Into<PathBuf>,
    ) -> ManagerResult<Self> {
        let archive_path = archive_path.into();
        let kind = ArchiveKind::from_path(&archive_path)
            .ok_or_else(|| ManagerError::UnsupportedArchive(archive_path.clone()))?;
        Ok(Self::with_kind(archive_path, kind, project_id, dest_root))
    }

    /// Create a request for an explicit archive kind.
    pub fn with_kind(
        archive_path: impl Into<PathBuf>,
        kind: ArchiveKind,
        project_id: impl Into<String>,
        dest_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            archive_path: archive_path.into(),
            kind,
            project_id: project_id.into(),
            inclusion: InclusionPolicy::default(),
            filter: PathFilter::allow_all(),
            dest_root: dest_root.into(),
        }
    }

    /// Set the inclusion policy.
    pub fn with_inclusion(mut self, inclusion: InclusionPolicy) -> Self {
        self.inclusion = inclusion;
        self
    }

    /// Set the path filter.
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Summary of a materialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Files written to the destination.
    pub files_copied: usize,
    /// Files whose destination was already as new as the payload.
    pub files_up_to_date: usize,
    /// Files dropped by the selection policy.
    pub files_excluded: usize,
    /// Files dropped by the path filter.
    pub files_filtered: usize,
    /// Folder sidecars copied from the archive.
    pub folder_sidecars_copied: usize,
    /// Sidecars synthesized because the archive carried none.
    pub sidecars_synthesized: usize,
    /// Flat archives only: no manifest at the archive root.
    pub manifest_missing: bool,
}

/// Materializes package archives into a project tree.
#[derive(Debug, Clone, Default)]
pub struct PackageMaterializer {
    config: MaterializerConfig,
}

impl PackageMaterializer {
    /// Create a new materializer.
    pub fn new(config: MaterializerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    /// Materialize an archive into the request's destination.
    ///
    /// The staging directory is removed on every exit path.
    pub fn materialize(&self, request: &MaterializeRequest) -> ManagerResult<MaterializeReport> {
        fs::create_dir_all(&self.config.staging_dir).map_err(|e| ManagerError::CreateDirFailed {
            path: self.config.staging_dir.clone(),
            source: e,
        })?;
        let staging = tempfile::Builder::new()
            .prefix("uniget-")
            .tempdir_in(&self.config.staging_dir)
            .map_err(|e| ManagerError::CreateDirFailed {
                path: self.config.staging_dir.clone(),
                source: e,
            })?;

        tracing::info!(
            archive = %request.archive_path.display(),
            kind = %request.kind,
            project = %request.project_id,
            "Extracting package"
        );
        let extracted = request
            .kind
            .extractor()
            .extract(&request.archive_path, staging.path())?;
        tracing::debug!(files = extracted, staging = %staging.path().display(), "Archive extracted");

        let report = match request.kind {
            ArchiveKind::UnityPackage => self.materialize_identifier(staging.path(), request)?,
            ArchiveKind::Source => {
                let stats = copy_flat_tree(
                    staging.path(),
                    &request.dest_root,
                    &request.project_id,
                    &request.filter,
                    &self.config.retry,
                )?;
                MaterializeReport {
                    files_copied: stats.files_copied,
                    files_filtered: stats.files_skipped,
                    sidecars_synthesized: stats.sidecars_synthesized,
                    manifest_missing: stats.manifest_missing,
                    ..Default::default()
                }
            }
        };

        let staging_path = staging.path().to_path_buf();
        if let Err(e) = staging.close() {
            tracing::warn!(path = %staging_path.display(), error = %e, "Failed to remove staging directory");
        }

        Ok(report)
    }

    fn materialize_identifier(
        &self,
        staging: &Path,
        request: &MaterializeRequest,
    ) -> ManagerResult<MaterializeReport> {
        let assets = build_asset_map(staging)?;
        let classification = load_classification(&assets, &request.project_id)?;
        self.copy_assets(&assets, &classification, request)
    }

    /// Copy selected entries of an asset map and propagate folder sidecars.
    pub fn copy_assets(
        &self,
        assets: &AssetMap,
        classification: &ClassificationMap,
        request: &MaterializeRequest,
    ) -> ManagerResult<MaterializeReport> {
        let retry = &self.config.retry;
        let mut report = MaterializeReport::default();
        let mut ancestors = AncestorSet::default();
        let mut relocated = false;

        for (logical, payload) in &assets.files {
            if !request.filter.matches(logical) {
                report.files_filtered += 1;
                continue;
            }
            if !classification.should_materialize(logical, request.inclusion) {
                tracing::debug!(path = %logical, "Excluded by inclusion policy");
                report.files_excluded += 1;
                continue;
            }

            relocated |= needs_package_prefix(logical);
            let dest = destination_path(&request.dest_root, logical);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }

            if copy_if_newer_with_retry(payload, &dest, retry)? {
                report.files_copied += 1;
            } else {
                report.files_up_to_date += 1;
            }
            let payload_meta = meta_path(payload);
            if payload_meta.is_file() {
                copy_if_newer_with_retry(&payload_meta, &meta_path(&dest), retry)?;
            }

            ancestors.mark_ancestors_of(logical);
        }

        // Folder sidecars only after every file copy has finished
        for folder in ancestors.iter() {
            let dest = destination_path(&request.dest_root, folder);
            let source_meta = assets.folders.get(folder).map(|p| meta_path(p));
            match source_meta {
                Some(source_meta) if source_meta.is_file() => {
                    if !dest.is_dir() {
                        continue;
                    }
                    copy_if_newer_with_retry(&source_meta, &meta_path(&dest), retry)?;
                    report.folder_sidecars_copied += 1;
                }
                _ if folder == ASSET_ROOT || !dest.is_dir() => {}
                _ => {
                    if ensure_meta(&dest, &destination_relative(folder), EntryKind::Folder)? {
                        report.sidecars_synthesized += 1;
                    }
                }
            }
        }

        if relocated {
            let root = package_root();
            let dest = join_relative(&request.dest_root, &root);
            if dest.is_dir() && ensure_meta(&dest, &root, EntryKind::Folder)? {
                report.sidecars_synthesized += 1;
            }
        }

        tracing::info!(
            copied = report.files_copied,
            up_to_date = report.files_up_to_date,
            excluded = report.files_excluded,
            filtered = report.files_filtered,
            "Package materialized"
        );
        Ok(report)
    }
}

/// Destination of a logical path below the project root.
pub fn destination_path(dest_root: &Path, logical: &str) -> PathBuf {
    join_relative(dest_root, &destination_relative(&logical.replace('\\', "/")))
}

/// Resolve the classification map of an identifier-keyed archive.
///
/// Archives without a manifest yield an empty map.
pub fn load_classification(assets: &AssetMap, project_id: &str) -> ManagerResult<ClassificationMap> {
    let manifest = manifest_logical_path(project_id);
    if !assets.files.contains_key(&manifest) {
        tracing::debug!(manifest = %manifest, "Package has no manifest; including all files");
        return Ok(ClassificationMap::new());
    }
    let project = Project::load_from(&AssetMapSource::new(&assets.files), &manifest)?;
    Ok(project.classification_map())
}

/// Strict ancestors of materialized logical paths, each visited once.
#[derive(Debug, Default)]
pub struct AncestorSet {
    seen: BTreeSet<String>,
}

impl AncestorSet {
    /// Mark every strict ancestor of `logical`, stopping at the first one
    /// already marked.
    pub fn mark_ancestors_of(&mut self, logical: &str) {
        let mut current = logical_parent(logical);
        while let Some(dir) = current {
            if !self.seen.insert(dir.clone()) {
                break;
            }
            current = logical_parent(&dir);
        }
    }

    /// Whether a directory has been marked.
    pub fn contains(&self, dir: &str) -> bool {
        self.seen.contains(dir)
    }

    /// Marked directories in path order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.seen.iter()
    }

    /// Number of marked directories.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been marked.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Classification;
    use std::time::Duration;
    use tempfile::TempDir;

    fn add_entry(root: &Path, guid: &str, pathname: &str, asset: Option<&str>) {
        let dir = root.join(guid);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("pathname"), pathname).unwrap();
        if let Some(a) = asset {
            fs::write(dir.join("asset"), a).unwrap();
        }
        fs::write(dir.join("asset.meta"), format!("meta for {}", pathname)).unwrap();
    }

    fn materializer() -> PackageMaterializer {
        PackageMaterializer::new(
            MaterializerConfig::default()
                .with_max_attempts(3)
                .with_retry_delay(Duration::from_millis(0)),
        )
    }

    fn request(dest: &Path) -> MaterializeRequest {
        MaterializeRequest::with_kind("unused.unitypackage", ArchiveKind::UnityPackage, "Pkg", dest)
    }

    #[test]
    fn test_ancestor_walk_marks_every_strict_ancestor() {
        let mut set = AncestorSet::default();
        set.mark_ancestors_of("a/b/c/file");

        assert_eq!(set.len(), 3);
        assert!(set.contains("a"));
        assert!(set.contains("a/b"));
        assert!(set.contains("a/b/c"));
        assert!(!set.contains("a/b/c/file"));
    }

    #[test]
    fn test_ancestor_walk_stops_at_seen_ancestor() {
        let mut set = AncestorSet::default();
        set.mark_ancestors_of("a/b/x");
        set.mark_ancestors_of("a/b/c/y");

        let all: Vec<_> = set.iter().cloned().collect();
        assert_eq!(all, vec!["a", "a/b", "a/b/c"]);
    }

    #[test]
    fn test_ancestor_walk_top_level_file() {
        let mut set = AncestorSet::default();
        set.mark_ancestors_of("file");
        assert!(set.is_empty());
    }

    #[test]
    fn test_destination_path_relocates_into_package_subtree() {
        let root = Path::new("/project");
        assert_eq!(
            destination_path(root, "Assets/Pkg/a.cs"),
            PathBuf::from("/project/Assets/UnityPackages/Pkg/a.cs")
        );
        assert_eq!(
            destination_path(root, "Assets\\UnityPackages\\Pkg\\a.cs"),
            PathBuf::from("/project/Assets/UnityPackages/Pkg/a.cs")
        );
    }

    #[test]
    fn test_copy_assets_propagates_folder_sidecars() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        add_entry(&staging, "g1", "a/b/c/file", Some("payload"));
        add_entry(&staging, "g2", "a", None);
        add_entry(&staging, "g3", "a/b", None);
        add_entry(&staging, "g4", "a/b/c", None);
        let assets = build_asset_map(&staging).unwrap();

        let dest = temp.path().join("dest");
        let report = materializer()
            .copy_assets(&assets, &ClassificationMap::new(), &request(&dest))
            .unwrap();

        assert_eq!(fs::read_to_string(dest.join("a/b/c/file")).unwrap(), "payload");
        assert_eq!(
            fs::read_to_string(dest.join("a/b/c/file.meta")).unwrap(),
            "meta for a/b/c/file"
        );
        for folder in ["a", "a/b", "a/b/c"] {
            let meta = dest.join(format!("{}.meta", folder));
            assert_eq!(
                fs::read_to_string(&meta).unwrap(),
                format!("meta for {}", folder)
            );
        }
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.folder_sidecars_copied, 3);
    }

    #[test]
    fn test_copy_assets_synthesizes_missing_folder_sidecars() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        add_entry(&staging, "g1", "Assets/Pkg/Sub/a.cs", Some("a"));
        let assets = build_asset_map(&staging).unwrap();

        let dest = temp.path().join("dest");
        let report = materializer()
            .copy_assets(&assets, &ClassificationMap::new(), &request(&dest))
            .unwrap();

        let pkg = dest.join("Assets/UnityPackages");
        assert!(pkg.join("Pkg/Sub/a.cs").is_file());
        assert!(pkg.join("Pkg/Sub.meta").is_file());
        assert!(pkg.join("Pkg.meta").is_file());
        assert!(dest.join("Assets/UnityPackages.meta").is_file());
        assert!(!dest.join("Assets.meta").exists());
        assert_eq!(report.sidecars_synthesized, 3);
    }

    #[test]
    fn test_copy_assets_respects_classification() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        add_entry(&staging, "g1", "Assets/Pkg/a.cs", Some("a"));
        add_entry(&staging, "g2", "Assets/Pkg/b.cs", Some("b"));
        let assets = build_asset_map(&staging).unwrap();

        let mut classification = ClassificationMap::new();
        classification.insert("Assets/Pkg/a.cs", Classification::new(true, false));

        let dest = temp.path().join("dest");
        let report = materializer()
            .copy_assets(&assets, &classification, &request(&dest))
            .unwrap();

        let pkg = dest.join("Assets/UnityPackages/Pkg");
        assert!(!pkg.join("a.cs").exists());
        assert!(pkg.join("b.cs").is_file());
        assert_eq!(report.files_excluded, 1);

        let report = materializer()
            .copy_assets(
                &assets,
                &classification,
                &request(&dest).with_inclusion(InclusionPolicy::new(true, false)),
            )
            .unwrap();
        assert!(pkg.join("a.cs").is_file());
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.files_up_to_date, 1);
    }

    #[test]
    fn test_copy_assets_applies_path_filter() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        add_entry(&staging, "g1", "Assets/Pkg/Samples/demo.cs", Some("d"));
        add_entry(&staging, "g2", "Assets/Pkg/core.cs", Some("c"));
        let assets = build_asset_map(&staging).unwrap();

        let filter = PathFilter::new(Vec::<String>::new(), vec!["$sample$".to_string()]).unwrap();
        let dest = temp.path().join("dest");
        let report = materializer()
            .copy_assets(
                &assets,
                &ClassificationMap::new(),
                &request(&dest).with_filter(filter),
            )
            .unwrap();

        assert_eq!(report.files_filtered, 1);
        assert!(!dest.join("Assets/UnityPackages/Pkg/Samples").exists());
    }

    #[test]
    fn test_load_classification_without_manifest() {
        let map = load_classification(&AssetMap::new(), "Pkg").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn test_request_infers_kind() {
        let request = MaterializeRequest::new("Foo.zip", "Foo", "/project").unwrap();
        assert_eq!(request.kind, ArchiveKind::Source);

        let err = MaterializeRequest::new("Foo.rar", "Foo", "/project").unwrap_err();
        assert!(matches!(err, ManagerError::UnsupportedArchive(_)));
    }
}
