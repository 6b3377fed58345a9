//! Selection policy for manifest-classified package entries.

use std::collections::BTreeMap;

/// Classification flags declared for one manifest file entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// Optional content (samples, documentation, ...).
    pub extra: bool,
    /// Content merged in from another package.
    pub merged: bool,
}

impl Classification {
    /// Create a classification from its flags.
    pub fn new(extra: bool, merged: bool) -> Self {
        Self { extra, merged }
    }
}

/// Caller's request for which optional content to materialize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InclusionPolicy {
    /// Materialize entries classified as extra.
    pub include_extra: bool,
    /// Materialize entries classified as merged.
    pub include_merged: bool,
}

impl InclusionPolicy {
    /// Create a policy from its flags.
    pub fn new(include_extra: bool, include_merged: bool) -> Self {
        Self {
            include_extra,
            include_merged,
        }
    }

    /// Policy that materializes every entry.
    pub fn everything() -> Self {
        Self::new(true, true)
    }
}

/// Decide whether an entry with the given classification is materialized.
///
/// Unclassified entries are always materialized.
pub fn should_materialize(classification: Option<Classification>, policy: InclusionPolicy) -> bool {
    match classification {
        None => true,
        Some(c) if c.extra && !policy.include_extra => false,
        Some(c) if c.merged && !policy.include_merged => false,
        Some(_) => true,
    }
}

/// Logical path → classification, built once per materialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationMap {
    entries: BTreeMap<String, Classification>,
}

impl ClassificationMap {
    /// Create an empty map (every entry included).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the classification of a target path. Later declarations win.
    pub fn insert(&mut self, target: impl Into<String>, classification: Classification) {
        self.entries.insert(target.into(), classification);
    }

    /// Look up the classification of a logical path.
    pub fn get(&self, logical: &str) -> Option<Classification> {
        self.entries.get(logical).copied()
    }

    /// Apply [`should_materialize`] to a logical path.
    pub fn should_materialize(&self, logical: &str, policy: InclusionPolicy) -> bool {
        should_materialize(self.get(logical), policy)
    }

    /// Number of classified entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are classified.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Classification)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, Classification)> for ClassificationMap {
    fn from_iter<I: IntoIterator<Item = (String, Classification)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
