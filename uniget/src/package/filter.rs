//! Include/exclude path filters.
//!
//! Patterns are regular expressions matched anywhere in a project-relative
//! path. The reserved exclude token `$sample$` (any case) excludes every path
//! whose containing directory name mentions "sample".

use regex::Regex;
use thiserror::Error;

/// Reserved exclude token enabling the sample-content rule.
pub const SAMPLE_TOKEN: &str = "$sample$";

/// Errors that can occur while compiling a path filter.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A pattern is not a valid regular expression.
    #[error("invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Compiled path predicate.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    exclude_samples: bool,
    excludes: Vec<Regex>,
    includes: Vec<Regex>,
}

impl PathFilter {
    /// Compile a filter from include and exclude pattern lists.
    pub fn new<I, E>(includes: I, excludes: E) -> Result<Self, FilterError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut exclude_samples = false;
        let mut exclude_patterns = Vec::new();
        for pattern in excludes {
            let pattern = pattern.as_ref();
            if !exclude_samples && pattern.eq_ignore_ascii_case(SAMPLE_TOKEN) {
                exclude_samples = true;
            } else {
                exclude_patterns.push(compile(pattern)?);
            }
        }

        let includes = includes
            .into_iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_samples,
            excludes: exclude_patterns,
            includes,
        })
    }

    /// A filter that accepts every path.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Whether the filter accepts every path.
    pub fn is_allow_all(&self) -> bool {
        !self.exclude_samples && self.excludes.is_empty() && self.includes.is_empty()
    }

    /// Evaluate the filter for a project-relative path.
    pub fn matches(&self, path: &str) -> bool {
        if self.exclude_samples && in_sample_directory(path) {
            return false;
        }
        if self.excludes.iter().any(|re| re.is_match(path)) {
            return false;
        }
        self.includes.is_empty() || self.includes.iter().any(|re| re.is_match(path))
    }
}

fn compile(pattern: &str) -> Result<Regex, FilterError> {
    Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn in_sample_directory(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    match normalized.rfind('/') {
        Some(idx) => normalized[..idx].to_lowercase().contains("sample"),
        None => false,
    }
}
