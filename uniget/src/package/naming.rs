//! Centralized naming conventions for Unity asset packages.
//!
//! This module is the single source of truth for all path naming used while
//! materializing a package:
//! - The project asset root (`Assets`) and package subtree (`Assets/UnityPackages`)
//! - Manifest locations (e.g., `Assets/UnityPackages/Foo.unitypackage.json`)
//! - Sidecar paths (e.g., `Assets/Foo/Bar.cs.meta`)
//! - Destination mapping of logical paths into the project tree
//!
//! All other modules should use these functions rather than constructing names directly.

use std::path::{Component, Path, PathBuf};

/// Root directory of every Unity project asset tree.
pub const ASSET_ROOT: &str = "Assets";

/// Directory name of the shared package subtree below [`ASSET_ROOT`].
pub const PACKAGE_DIR: &str = "UnityPackages";

/// Extension used in manifest filenames (`<id>.unitypackage.json`).
pub const MANIFEST_EXTENSION: &str = "unitypackage";

/// Suffix appended to an entry path to name its sidecar metadata file.
pub const META_SUFFIX: &str = ".meta";

/// Project-relative path of the shared package subtree.
///
/// ```
/// assert_eq!(uniget::package::package_root(), "Assets/UnityPackages");
/// ```
pub fn package_root() -> String {
    format!("{}/{}", ASSET_ROOT, PACKAGE_DIR)
}

/// Filename of a project's manifest.
///
/// ```
/// use uniget::package::manifest_filename;
///
/// assert_eq!(manifest_filename("Akka.Unity"), "Akka.Unity.unitypackage.json");
/// ```
pub fn manifest_filename(project_id: &str) -> String {
    format!("{}.{}.json", project_id, MANIFEST_EXTENSION)
}

/// Logical path of a project's manifest inside an identifier-keyed archive.
///
/// ```
/// use uniget::package::manifest_logical_path;
///
/// assert_eq!(
///     manifest_logical_path("Akka.Unity"),
///     "Assets/UnityPackages/Akka.Unity.unitypackage.json"
/// );
/// ```
pub fn manifest_logical_path(project_id: &str) -> String {
    format!("{}/{}", package_root(), manifest_filename(project_id))
}

/// Sidecar path for a filesystem entry.
pub fn meta_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(META_SUFFIX);
    PathBuf::from(os)
}

/// Whether a filename names a sidecar metadata file.
pub fn is_meta_file(name: &str) -> bool {
    name.len() > META_SUFFIX.len() && name.to_ascii_lowercase().ends_with(META_SUFFIX)
}

/// Map a logical path onto its project-relative destination.
///
/// Packages that place content directly below `Assets/` are relocated into
/// the shared `Assets/UnityPackages/` subtree. Paths already inside that
/// subtree, and paths outside `Assets/`, are returned unchanged.
///
/// ```
/// use uniget::package::destination_relative;
///
/// assert_eq!(destination_relative("Assets/Pkg/a.cs"), "Assets/UnityPackages/Pkg/a.cs");
/// assert_eq!(
///     destination_relative("Assets/UnityPackages/Pkg/a.cs"),
///     "Assets/UnityPackages/Pkg/a.cs"
/// );
/// assert_eq!(destination_relative("a/b/c/file"), "a/b/c/file");
/// ```
pub fn destination_relative(logical: &str) -> String {
    match needs_package_prefix(logical) {
        true => format!(
            "{}/{}{}",
            ASSET_ROOT,
            PACKAGE_DIR,
            &logical[ASSET_ROOT.len()..]
        ),
        false => logical.to_string(),
    }
}

/// Whether [`destination_relative`] relocates this logical path.
pub fn needs_package_prefix(logical: &str) -> bool {
    let Some(rest) = logical.strip_prefix(ASSET_ROOT) else {
        return false;
    };
    if !rest.starts_with('/') {
        return false;
    }
    let first_segment = rest[1..].split('/').next().unwrap_or("");
    // A bare `Assets/UnityPackages` directory is already the subtree itself.
    first_segment != PACKAGE_DIR && !rest[1..].is_empty()
}

/// Join a project-relative path onto a destination root.
///
/// Segments that could leave `root` (`..`, roots, drive prefixes) are
/// dropped, so the result always lies below `root`.
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| is_plain_segment(s))
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Whether a logical path stays inside the project when joined onto it.
///
/// Rejects empty paths, absolute paths, drive prefixes and `..` segments.
///
/// ```
/// use uniget::package::is_safe_logical;
///
/// assert!(is_safe_logical("Assets/Foo/Bar.cs"));
/// assert!(is_safe_logical("Assets\\Foo\\Bar.cs"));
/// assert!(!is_safe_logical("../../escaped.txt"));
/// assert!(!is_safe_logical("/etc/passwd"));
/// assert!(!is_safe_logical("C:/Windows/x.dll"));
/// ```
pub fn is_safe_logical(path: &str) -> bool {
    if path.is_empty() || path.starts_with(['/', '\\']) {
        return false;
    }
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .all(|s| s != ".." && !s.contains(':') && is_plain_segment(s))
}

fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(components.next(), Some(Component::Normal(_))) && components.next().is_none()
}

/// Parent of a logical path, with `\` treated as a separator.
///
/// Returns `None` for single-segment paths.
///
/// ```
/// use uniget::package::logical_parent;
///
/// assert_eq!(logical_parent("a/b/c.txt"), Some("a/b".to_string()));
/// assert_eq!(logical_parent("a\\b\\c.txt"), Some("a/b".to_string()));
/// assert_eq!(logical_parent("c.txt"), None);
/// ```
pub fn logical_parent(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_end_matches('/');
    trimmed
        .rfind('/')
        .map(|idx| trimmed[..idx].to_string())
        .filter(|p| !p.is_empty())
}

/// Resolve a relative reference against the directory of a logical path,
/// folding `.` and `..` segments.
///
/// ```
/// use uniget::package::resolve_logical;
///
/// assert_eq!(
///     resolve_logical("Assets/UnityPackages/Foo.json", "../Shared/Base.json"),
///     "Assets/Shared/Base.json"
/// );
/// assert_eq!(resolve_logical("Foo.json", "./Base.json"), "Base.json");
/// ```
pub fn resolve_logical(current: &str, reference: &str) -> String {
    let reference = reference.replace('\\', "/");
    let joined = match logical_parent(current) {
        Some(parent) if !reference.starts_with('/') => format!("{}/{}", parent, reference),
        _ => reference,
    };
    normalize_logical(&joined)
}

/// Fold `.`/`..` segments and collapse repeated separators.
pub fn normalize_logical(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_path_appends_suffix() {
        assert_eq!(
            meta_path(Path::new("/tmp/x/asset")),
            PathBuf::from("/tmp/x/asset.meta")
        );
    }

    #[test]
    fn test_is_meta_file() {
        assert!(is_meta_file("Foo.cs.meta"));
        assert!(is_meta_file("Folder.META"));
        assert!(!is_meta_file(".meta"));
        assert!(!is_meta_file("Foo.cs"));
    }

    #[test]
    fn test_destination_relative_bare_package_subtree() {
        assert_eq!(
            destination_relative("Assets/UnityPackages"),
            "Assets/UnityPackages"
        );
        assert_eq!(destination_relative("Assets"), "Assets");
    }

    #[test]
    fn test_destination_relative_similar_prefix_is_not_asset_root() {
        assert_eq!(destination_relative("AssetsExtra/a.cs"), "AssetsExtra/a.cs");
    }

    #[test]
    fn test_join_relative() {
        let root = Path::new("/project");
        assert_eq!(
            join_relative(root, "Assets/Pkg/a.cs"),
            PathBuf::from("/project/Assets/Pkg/a.cs")
        );
    }

    #[test]
    fn test_join_relative_stays_below_root() {
        let root = Path::new("/tmp/root/proj");
        assert_eq!(
            join_relative(root, "../../escaped.txt"),
            PathBuf::from("/tmp/root/proj/escaped.txt")
        );
        assert_eq!(
            join_relative(root, "a/./../b"),
            PathBuf::from("/tmp/root/proj/a/b")
        );
    }

    #[test]
    fn test_is_safe_logical() {
        assert!(is_safe_logical("a/b/c/file"));
        assert!(is_safe_logical("Assets/./Foo.cs"));
        assert!(!is_safe_logical(""));
        assert!(!is_safe_logical("Assets/../../x"));
        assert!(!is_safe_logical("Assets\\..\\..\\x"));
        assert!(!is_safe_logical("\\server\\share"));
        assert!(!is_safe_logical("D:relative"));
    }

    #[test]
    fn test_normalize_logical_parent_escape_is_clamped() {
        assert_eq!(normalize_logical("../../a/b"), "a/b");
        assert_eq!(normalize_logical("a//b/./c/../d"), "a/b/d");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_destination_always_under_package_root(
                segments in prop::collection::vec("[A-Za-z0-9_]{1,8}", 1..5)
            ) {
                let logical = format!("Assets/{}", segments.join("/"));
                let dest = destination_relative(&logical);
                let root = package_root();
                prop_assert!(dest.starts_with(&root));
                // Idempotent once relocated
                prop_assert_eq!(destination_relative(&dest), dest.clone());
            }

            #[test]
            fn test_join_relative_never_escapes(path in "[a-z./\\\\]{0,24}") {
                let root = Path::new("/project/root");
                prop_assert!(join_relative(root, &path).starts_with(root));
            }

            #[test]
            fn test_normalize_is_idempotent(path in "[a-z./]{0,24}") {
                let once = normalize_logical(&path);
                prop_assert_eq!(normalize_logical(&once), once.clone());
            }
        }
    }
}
