//! Configuration for the package materializer.

use std::path::PathBuf;
use std::time::Duration;

use super::copy::RetryPolicy;

/// Configuration for [`PackageMaterializer`](super::PackageMaterializer).
#[derive(Debug, Clone)]
pub struct MaterializerConfig {
    /// Directory under which run-scoped staging directories are created.
    pub staging_dir: PathBuf,

    /// Retry policy for contended destination files.
    pub retry: RetryPolicy,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            staging_dir: std::env::temp_dir(),
            retry: RetryPolicy::default(),
        }
    }
}

impl MaterializerConfig {
    /// Create a new configuration with the given staging directory.
    pub fn new(staging_dir: PathBuf) -> Self {
        Self {
            staging_dir,
            ..Default::default()
        }
    }

    /// Set the staging directory.
    pub fn with_staging_dir(mut self, path: PathBuf) -> Self {
        self.staging_dir = path;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of copy attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry = RetryPolicy::new(max_attempts, self.retry.delay);
        self
    }

    /// Set the delay between copy attempts.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.delay = delay;
        self
    }
}
