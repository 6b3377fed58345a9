//! Project manifest loading and inheritance.
//!
//! A manifest is a JSON document (`<id>.unitypackage.json`) describing a
//! project and the files it ships. A manifest may name a parent document via
//! the `#base` key; the parent is resolved relative to the child's location
//! and the child's top-level fields replace the parent's.
//!
//! # Example
//!
//! ```json
//! {
//!   "#base": "../Shared/Common.unitypackage.json",
//!   "id": "Foo",
//!   "files": [
//!     "Assets/Foo/Foo.cs",
//!     { "target": "Assets/Foo/Samples/Demo.cs", "extra": true }
//!   ]
//! }
//! ```
//!
//! Loading is generic over a [`ManifestSource`], so the same resolver works
//! for manifests on disk and manifests embedded in an extracted archive.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

use super::naming;
use super::selection::{Classification, ClassificationMap};

/// Key naming the parent document of a manifest.
pub const BASE_KEY: &str = "#base";

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// A parsed JSON manifest document.
pub type Document = Map<String, Value>;

/// Errors that can occur while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest (or one of its bases) does not exist.
    #[error("manifest not found: {0}")]
    NotFound(String),

    /// The manifest could not be read.
    #[error("failed to read manifest {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },

    /// The manifest is not valid JSON or does not match the project schema.
    #[error("failed to parse manifest {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest is structurally invalid.
    #[error("invalid manifest {location}: {reason}")]
    Invalid { location: String, reason: String },

    /// A `#base` chain leads back to a document already being loaded.
    #[error("cyclic #base inheritance: {location} is already part of the chain")]
    CyclicBase { location: String },
}

/// Storage a manifest and its bases are read from.
pub trait ManifestSource {
    /// Location of a document within this source.
    type Key: Clone + Eq + Hash;

    /// Canonical form of a location; two locations naming the same document
    /// must canonicalize to equal keys.
    fn canonical(&self, location: &Self::Key) -> ManifestResult<Self::Key>;

    /// Read the text of a document.
    fn read(&self, key: &Self::Key) -> ManifestResult<String>;

    /// Resolve a `#base` reference relative to the referring document.
    fn resolve(&self, current: &Self::Key, reference: &str) -> Self::Key;

    /// Human-readable location for error messages.
    fn describe(&self, key: &Self::Key) -> String;
}

/// Manifests stored as regular files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsManifestSource;

impl ManifestSource for FsManifestSource {
    type Key = PathBuf;

    fn canonical(&self, location: &PathBuf) -> ManifestResult<PathBuf> {
        fs::canonicalize(location).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ManifestError::NotFound(location.display().to_string()),
            _ => ManifestError::Read {
                location: location.display().to_string(),
                source: e,
            },
        })
    }

    fn read(&self, key: &PathBuf) -> ManifestResult<String> {
        fs::read_to_string(key).map_err(|e| ManifestError::Read {
            location: key.display().to_string(),
            source: e,
        })
    }

    fn resolve(&self, current: &PathBuf, reference: &str) -> PathBuf {
        current
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(reference)
    }

    fn describe(&self, key: &PathBuf) -> String {
        key.display().to_string()
    }
}

/// Manifests addressed by logical path inside an extracted archive.
///
/// `#base` references resolve against the logical tree, and the payload
/// backing each logical path is read from the staging directory.
#[derive(Debug, Clone, Copy)]
pub struct AssetMapSource<'a> {
    files: &'a BTreeMap<String, PathBuf>,
}

impl<'a> AssetMapSource<'a> {
    /// Create a source over a logical path → payload map.
    pub fn new(files: &'a BTreeMap<String, PathBuf>) -> Self {
        Self { files }
    }
}

impl ManifestSource for AssetMapSource<'_> {
    type Key = String;

    fn canonical(&self, location: &String) -> ManifestResult<String> {
        if self.files.contains_key(location) {
            return Ok(location.clone());
        }
        let normalized = naming::normalize_logical(location);
        match self.files.contains_key(&normalized) {
            true => Ok(normalized),
            false => Err(ManifestError::NotFound(location.clone())),
        }
    }

    fn read(&self, key: &String) -> ManifestResult<String> {
        let payload = self
            .files
            .get(key)
            .ok_or_else(|| ManifestError::NotFound(key.clone()))?;
        fs::read_to_string(payload).map_err(|e| ManifestError::Read {
            location: key.clone(),
            source: e,
        })
    }

    fn resolve(&self, current: &String, reference: &str) -> String {
        naming::resolve_logical(current, reference)
    }

    fn describe(&self, key: &String) -> String {
        key.clone()
    }
}

/// Load a manifest document and fold in its `#base` chain.
///
/// Fails with [`ManifestError::CyclicBase`] if any document in the chain is
/// reached twice.
pub fn load_document<S: ManifestSource>(source: &S, location: &S::Key) -> ManifestResult<Document> {
    let mut open = HashSet::new();
    load_chain(source, location, &mut open)
}

fn load_chain<S: ManifestSource>(
    source: &S,
    location: &S::Key,
    open: &mut HashSet<S::Key>,
) -> ManifestResult<Document> {
    let key = source.canonical(location)?;
    let description = source.describe(&key);
    if !open.insert(key.clone()) {
        return Err(ManifestError::CyclicBase {
            location: description,
        });
    }

    let text = source.read(&key)?;
    let document = parse_document(&description, &text)?;

    let base_reference = match document.get(BASE_KEY) {
        None => return Ok(document),
        Some(Value::String(reference)) => reference.clone(),
        Some(_) => {
            return Err(ManifestError::Invalid {
                location: description,
                reason: format!("'{}' must be a string", BASE_KEY),
            })
        }
    };

    tracing::debug!(manifest = %description, base = %base_reference, "Loading base manifest");
    let base_location = source.resolve(&key, &base_reference);
    let base = load_chain(source, &base_location, open)?;
    Ok(merge_documents(&base, &document))
}

/// Parse manifest text into a JSON object.
pub fn parse_document(location: &str, text: &str) -> ManifestResult<Document> {
    let value: Value = serde_json::from_str(text).map_err(|e| ManifestError::Parse {
        location: location.to_string(),
        source: e,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ManifestError::Invalid {
            location: location.to_string(),
            reason: "document root must be a JSON object".to_string(),
        }),
    }
}

/// Overlay `child` on `base`, replacing whole top-level values.
///
/// The `#base` key is dropped from the result.
pub fn merge_documents(base: &Document, child: &Document) -> Document {
    let mut merged = base.clone();
    merged.remove(BASE_KEY);
    for (key, value) in child {
        if key != BASE_KEY {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// A dependency declared by a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dependency {
    /// Version requirement (e.g. `1.5.20-beta`).
    pub version: Option<String>,
    /// Download source (`local`, `github:owner/repo`, ...).
    pub source: Option<String>,
    /// Include extra content of the dependency.
    pub include_extra: bool,
    /// Include merged content of the dependency.
    pub include_merged: bool,
    /// Download source archive type.
    pub source_type: Option<String>,
}

/// Structured file declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileItem {
    /// Source path when packing.
    #[serde(default)]
    pub source: Option<String>,
    /// Logical target path in the project.
    pub target: String,
    #[serde(default)]
    pub extra: bool,
    #[serde(default)]
    pub merged: bool,
}

/// One entry of a manifest's `files` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FileDeclaration {
    /// Bare target path with default classification.
    Path(String),
    /// Target path with explicit classification.
    Item(FileItem),
}

impl FileDeclaration {
    /// Logical target path of this declaration.
    pub fn target(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Item(item) => &item.target,
        }
    }

    /// Classification flags of this declaration.
    pub fn classification(&self) -> Classification {
        match self {
            Self::Path(_) => Classification::default(),
            Self::Item(item) => Classification::new(item.extra, item.merged),
        }
    }
}

/// Typed view of a resolved manifest.
///
/// Only `files` is strict. Descriptive fields of an unexpected shape (e.g.
/// `"authors": null` or a numeric `version`) fall back to their defaults so
/// they cannot block an install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    #[serde(deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub version: Option<String>,
    /// Human readable name.
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub authors: Vec<String>,
    #[serde(deserialize_with = "lenient")]
    pub owners: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub dependencies: BTreeMap<String, Dependency>,
    #[serde(deserialize_with = "lenient")]
    pub merged_dependencies: BTreeMap<String, Dependency>,
    pub files: Vec<FileDeclaration>,
}

/// Deserialize a field, substituting its default when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Ignoring malformed manifest field");
        T::default()
    }))
}

/// Text field that also accepts numbers and booleans (`"version": 1.0`).
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

impl Project {
    /// Load a manifest file from disk, resolving its `#base` chain.
    pub fn load(path: impl AsRef<Path>) -> ManifestResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = load_document(&FsManifestSource, &path)?;
        Self::from_document(&path.display().to_string(), document)
    }

    /// Load a manifest through an arbitrary source.
    pub fn load_from<S: ManifestSource>(source: &S, location: &S::Key) -> ManifestResult<Self> {
        let document = load_document(source, location)?;
        Self::from_document(&source.describe(location), document)
    }

    /// Build a project from a resolved document.
    pub fn from_document(location: &str, document: Document) -> ManifestResult<Self> {
        serde_json::from_value(Value::Object(document)).map_err(|e| ManifestError::Parse {
            location: location.to_string(),
            source: e,
        })
    }

    /// Project the file list into a classification map.
    pub fn classification_map(&self) -> ClassificationMap {
        self.files
            .iter()
            .map(|f| (f.target().to_string(), f.classification()))
            .collect()
    }
}
