//! Release listing and version selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use semver::{Version, VersionReq};
use serde::Deserialize;

use super::{SourceError, SourceResult};

/// A published release as listed by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Release title; the version is read from it.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
}

/// A release asset that matched a source name, with its release version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub download_url: String,
    pub version: Version,
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Dotted number run, e.g. "1.2" or "1.2.3"
    PATTERN.get_or_init(|| Regex::new(r"\d+(\.\d+)+").unwrap())
}

/// Read a version out of a release title.
///
/// The first dotted number run is taken; two-component versions are padded
/// with a patch of `0`.
///
/// ```
/// use uniget::source::parse_release_version;
///
/// assert_eq!(parse_release_version("Release v1.2").unwrap().to_string(), "1.2.0");
/// assert_eq!(parse_release_version("1.0.3-beta").unwrap().to_string(), "1.0.3");
/// assert!(parse_release_version("nightly").is_none());
/// ```
pub fn parse_release_version(name: &str) -> Option<Version> {
    let found = version_pattern().find(name)?.as_str();
    let text = if found.matches('.').count() == 1 {
        format!("{}.0", found)
    } else {
        found.to_string()
    };
    match Version::parse(&text) {
        Ok(version) => Some(version),
        Err(e) => {
            tracing::debug!(release = name, error = %e, "Skipping release with unparseable version");
            None
        }
    }
}

/// Matches asset file stems against a configured source name.
#[derive(Debug, Clone)]
pub struct AssetNameMatcher {
    prefix: String,
    wildcard: Option<glob::Pattern>,
}

impl AssetNameMatcher {
    /// Create a matcher; `source_name` may contain `*` and `?` wildcards.
    pub fn new(source_name: &str) -> Self {
        Self {
            prefix: source_name.to_string(),
            wildcard: glob::Pattern::new(source_name).ok(),
        }
    }

    /// Whether an asset stem starts with the source name or matches it as a wildcard.
    pub fn matches(&self, stem: &str) -> bool {
        if stem.is_empty() {
            return false;
        }
        stem.starts_with(&self.prefix) || self.wildcard.as_ref().is_some_and(|p| p.matches(stem))
    }
}

/// Collect every release asset with the given extension whose stem matches
/// `source_name`.
///
/// Releases whose title carries no parseable version are skipped.
pub fn collect_candidates(
    releases: &[Release],
    source_name: &str,
    extension: &str,
) -> Vec<Candidate> {
    let matcher = AssetNameMatcher::new(source_name);
    let wanted = extension.trim_start_matches('.');

    let mut candidates = Vec::new();
    for release in releases {
        for asset in &release.assets {
            let path = Path::new(&asset.name);
            let extension_matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if !extension_matches || !matcher.matches(stem) {
                continue;
            }
            if let Some(version) = parse_release_version(&release.name) {
                candidates.push(Candidate {
                    download_url: asset.download_url.clone(),
                    version,
                });
            }
        }
    }
    candidates
}

/// Pick the highest candidate satisfying `requirement`.
pub fn select_version<'a>(
    candidates: &'a [Candidate],
    requirement: &VersionReq,
) -> SourceResult<&'a Candidate> {
    highest_matching(candidates, requirement, |c| &c.version)
}

/// Highest item whose version satisfies `requirement`.
pub(crate) fn highest_matching<'a, T>(
    items: &'a [T],
    requirement: &VersionReq,
    version_of: impl Fn(&T) -> &Version,
) -> SourceResult<&'a T> {
    items
        .iter()
        .filter(|item| requirement.matches(version_of(item)))
        .max_by(|a, b| version_of(a).cmp(version_of(b)))
        .ok_or_else(|| SourceError::NoMatchingVersion {
            requirement: requirement.to_string(),
        })
}

/// Parse a version range such as `^1.2`, `>=1.0, <2` or `*`.
pub fn parse_requirement(text: &str) -> SourceResult<VersionReq> {
    VersionReq::parse(text.trim()).map_err(|e| SourceError::InvalidRequirement {
        requirement: text.to_string(),
        source: e,
    })
}

/// A hosted repository, written `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
}

impl FromStr for Repository {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(SourceError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
