//! `resolve` command.
//!
//! Picks the release asset to download from a saved release listing (the JSON
//! array the hosting service returns for `repos/<owner>/<repo>/releases`) and
//! reports where it lives in the local cache.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use uniget::config::ConfigFile;
use uniget::manager::ArchiveKind;
use uniget::source::{
    collect_candidates, parse_requirement, select_version, Candidate, PackageCache, Release,
    Repository,
};

use super::install::KindArg;
use crate::error::CliError;

/// Arguments for `uniget resolve`.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Release listing JSON
    pub releases: PathBuf,

    /// Repository the listing belongs to
    #[arg(long, value_name = "OWNER/REPO")]
    pub github: Repository,

    /// Release asset name; `*` matches any run of characters
    #[arg(long = "source", value_name = "NAME")]
    pub source_name: String,

    /// Version range (e.g. "^1.2")
    #[arg(long, default_value = "*", value_name = "REQ")]
    pub range: String,

    /// Asset layout to look for
    #[arg(long, value_enum, default_value = "unitypackage")]
    pub kind: KindArg,
}

/// A selected release asset and its cache location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub candidate: Candidate,
    pub cache_path: PathBuf,
    pub cached: bool,
}

/// Run the resolve command.
pub fn run(args: ResolveArgs, config: &ConfigFile) -> Result<(), CliError> {
    let cache = config
        .package_cache()
        .ok_or_else(|| CliError::Config("no cache directory; set cache.directory".to_string()))?;
    let resolution = resolve(&args, &cache)?;

    println!("{} {}", args.source_name, resolution.candidate.version);
    println!("  Download: {}", resolution.candidate.download_url);
    println!("  Cache:    {}", resolution.cache_path.display());
    if resolution.cached {
        println!("  Already cached");
    }
    Ok(())
}

fn resolve(args: &ResolveArgs, cache: &PackageCache) -> Result<Resolution, CliError> {
    let releases = read_listing(&args.releases)?;
    let extension = ArchiveKind::from(args.kind).extension();
    let requirement = parse_requirement(&args.range)?;

    let candidates = collect_candidates(&releases, &args.source_name, extension);
    tracing::debug!(
        releases = releases.len(),
        candidates = candidates.len(),
        "Collected release candidates"
    );
    let candidate = select_version(&candidates, &requirement)?.clone();

    let (owner, repo) = (&args.github.owner, &args.github.repo);
    let cache_path =
        cache.archive_path(owner, repo, &args.source_name, &candidate.version, extension);
    let cached = cache.contains(owner, repo, &args.source_name, &candidate.version, extension);

    Ok(Resolution {
        candidate,
        cache_path,
        cached,
    })
}

fn read_listing(path: &Path) -> Result<Vec<Release>, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::ReadListing {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| CliError::ParseListing {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const LISTING: &str = r#"[
        {
            "name": "v1.2",
            "assets": [
                { "name": "Foo.1.2.0.unitypackage", "browser_download_url": "https://dl/foo-1.2.unitypackage" },
                { "name": "Foo-src.zip", "browser_download_url": "https://dl/foo-src-1.2.zip" }
            ]
        },
        {
            "name": "2.0.0",
            "assets": [
                { "name": "Foo.2.0.0.unitypackage", "browser_download_url": "https://dl/foo-2.0.unitypackage" }
            ]
        },
        { "name": "nightly", "assets": [] }
    ]"#;

    fn setup(temp: &TempDir) -> (ResolveArgs, PackageCache) {
        let listing = temp.path().join("releases.json");
        fs::write(&listing, LISTING).unwrap();
        let args = ResolveArgs {
            releases: listing,
            github: "SaladLab/Foo".parse().unwrap(),
            source_name: "Foo*".to_string(),
            range: "^1".to_string(),
            kind: KindArg::Unitypackage,
        };
        (args, PackageCache::new(temp.path().join("cache")))
    }

    #[test]
    fn test_resolve_picks_highest_version_in_range() {
        let temp = TempDir::new().unwrap();
        let (args, cache) = setup(&temp);

        let resolution = resolve(&args, &cache).unwrap();

        assert_eq!(resolution.candidate.version.to_string(), "1.2.0");
        assert_eq!(
            resolution.candidate.download_url,
            "https://dl/foo-1.2.unitypackage"
        );
        assert_eq!(
            resolution.cache_path,
            temp.path()
                .join("cache/github~SaladLab~Foo~Foo~1.2.0.unitypackage")
        );
        assert!(!resolution.cached);
    }

    #[test]
    fn test_resolve_reports_cached_archive() {
        let temp = TempDir::new().unwrap();
        let (mut args, cache) = setup(&temp);
        args.range = "*".to_string();
        fs::create_dir_all(cache.root()).unwrap();
        fs::write(
            cache.root().join("github~SaladLab~Foo~Foo~2.0.0.unitypackage"),
            b"x",
        )
        .unwrap();

        let resolution = resolve(&args, &cache).unwrap();

        assert_eq!(resolution.candidate.version.to_string(), "2.0.0");
        assert!(resolution.cached);
    }

    #[test]
    fn test_resolve_source_archive() {
        let temp = TempDir::new().unwrap();
        let (mut args, cache) = setup(&temp);
        args.source_name = "Foo-src".to_string();
        args.kind = KindArg::Source;

        let resolution = resolve(&args, &cache).unwrap();

        assert_eq!(resolution.candidate.download_url, "https://dl/foo-src-1.2.zip");
    }

    #[test]
    fn test_resolve_without_match() {
        let temp = TempDir::new().unwrap();
        let (mut args, cache) = setup(&temp);
        args.range = ">=3".to_string();

        let err = resolve(&args, &cache).unwrap_err();
        assert!(matches!(err, CliError::Source(_)));
    }

    #[test]
    fn test_unreadable_listing() {
        let temp = TempDir::new().unwrap();
        let (mut args, cache) = setup(&temp);

        args.releases = temp.path().join("missing.json");
        assert!(matches!(
            resolve(&args, &cache).unwrap_err(),
            CliError::ReadListing { .. }
        ));

        fs::write(temp.path().join("bad.json"), "{ not json").unwrap();
        args.releases = temp.path().join("bad.json");
        assert!(matches!(
            resolve(&args, &cache).unwrap_err(),
            CliError::ParseListing { .. }
        ));
    }
}
