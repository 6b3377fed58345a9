//! Local cache naming for downloaded package archives.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};

use super::release::highest_matching;
use super::{SourceError, SourceResult};

/// Directory name of the cache below the platform cache directory.
pub const CACHE_DIR_NAME: &str = "uniget";

/// Location of downloaded archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCache {
    root: PathBuf,
}

impl PackageCache {
    /// Create a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default cache root (e.g. `~/.cache/uniget` on Linux).
    pub fn default_root() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join(CACHE_DIR_NAME))
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a cached release asset.
    ///
    /// ```
    /// use semver::Version;
    /// use uniget::source::PackageCache;
    ///
    /// let cache = PackageCache::new("/cache");
    /// let path = cache.archive_path("owner", "repo", "Foo*", &Version::new(1, 2, 0), ".unitypackage");
    /// assert_eq!(path.to_str(), Some("/cache/github~owner~repo~Foo~1.2.0.unitypackage"));
    /// ```
    pub fn archive_path(
        &self,
        owner: &str,
        repo: &str,
        source_name: &str,
        version: &Version,
        extension: &str,
    ) -> PathBuf {
        self.root.join(format!(
            "{}{}{}",
            cache_prefix(owner, repo, source_name),
            version,
            extension
        ))
    }

    /// Versions of a release asset present in the cache, in no particular order.
    ///
    /// A cache directory that does not exist yet holds no versions.
    pub fn cached_versions(
        &self,
        owner: &str,
        repo: &str,
        source_name: &str,
        extension: &str,
    ) -> SourceResult<Vec<(Version, PathBuf)>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SourceError::CacheRead {
                    path: self.root.clone(),
                    source: e,
                })
            }
        };

        let prefix = cache_prefix(owner, repo, source_name);
        let mut found = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(version) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(extension))
                .and_then(|v| Version::parse(v).ok())
            else {
                continue;
            };
            if path.is_file() {
                found.push((version, path));
            }
        }
        Ok(found)
    }

    /// Highest cached version satisfying `requirement`, with its archive path.
    pub fn resolve(
        &self,
        owner: &str,
        repo: &str,
        source_name: &str,
        extension: &str,
        requirement: &VersionReq,
    ) -> SourceResult<(Version, PathBuf)> {
        let cached = self.cached_versions(owner, repo, source_name, extension)?;
        let (version, path) = highest_matching(&cached, requirement, |(v, _)| v)?;
        tracing::debug!(
            repo = %format!("{}/{}", owner, repo),
            version = %version,
            path = %path.display(),
            "Resolved cached archive"
        );
        Ok((version.clone(), path.clone()))
    }

    /// Whether an archive is already cached.
    pub fn contains(
        &self,
        owner: &str,
        repo: &str,
        source_name: &str,
        version: &Version,
        extension: &str,
    ) -> bool {
        self.archive_path(owner, repo, source_name, version, extension)
            .is_file()
    }
}

fn cache_prefix(owner: &str, repo: &str, source_name: &str) -> String {
    format!("github~{}~{}~{}~", owner, repo, source_name.replace('*', ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_path_strips_wildcards() {
        let cache = PackageCache::new("/c");
        let path = cache.archive_path("o", "r", "*Foo*-src", &Version::new(0, 9, 1), ".zip");
        assert_eq!(path, PathBuf::from("/c/github~o~r~Foo-src~0.9.1.zip"));
    }

    #[test]
    fn test_contains() {
        let temp = TempDir::new().unwrap();
        let cache = PackageCache::new(temp.path());
        let version = Version::new(1, 0, 0);

        assert!(!cache.contains("o", "r", "Foo", &version, ".unitypackage"));
        std::fs::write(
            cache.archive_path("o", "r", "Foo", &version, ".unitypackage"),
            b"x",
        )
        .unwrap();
        assert!(cache.contains("o", "r", "Foo", &version, ".unitypackage"));
    }

    fn touch(cache: &PackageCache, version: &str, extension: &str) {
        let version = Version::parse(version).unwrap();
        fs::write(cache.archive_path("o", "r", "Foo", &version, extension), b"x").unwrap();
    }

    #[test]
    fn test_resolve_picks_highest_satisfying_version() {
        let temp = TempDir::new().unwrap();
        let cache = PackageCache::new(temp.path());
        touch(&cache, "1.0.0", ".unitypackage");
        touch(&cache, "1.4.2", ".unitypackage");
        touch(&cache, "2.0.0", ".unitypackage");
        touch(&cache, "1.9.0", ".zip");
        fs::write(temp.path().join("github~o~r~Foo~garbage.unitypackage"), b"x").unwrap();
        fs::write(temp.path().join("github~o~r~Bar~1.5.0.unitypackage"), b"x").unwrap();

        let req = VersionReq::parse("^1").unwrap();
        let (version, path) = cache
            .resolve("o", "r", "Foo", ".unitypackage", &req)
            .unwrap();

        assert_eq!(version, Version::new(1, 4, 2));
        assert_eq!(path, temp.path().join("github~o~r~Foo~1.4.2.unitypackage"));
    }

    #[test]
    fn test_resolve_without_match() {
        let temp = TempDir::new().unwrap();
        let cache = PackageCache::new(temp.path().join("not-created-yet"));

        let err = cache
            .resolve("o", "r", "Foo", ".unitypackage", &VersionReq::STAR)
            .unwrap_err();
        assert!(matches!(err, SourceError::NoMatchingVersion { .. }));
    }

    #[test]
    fn test_default_root_ends_with_cache_name() {
        if let Some(root) = PackageCache::default_root() {
            assert!(root.ends_with(CACHE_DIR_NAME));
        }
    }
}
