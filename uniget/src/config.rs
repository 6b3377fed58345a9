//! User configuration file.
//!
//! Settings live in an INI file under the platform configuration directory
//! (e.g. `~/.config/uniget/config.ini`):
//!
//! ```ini
//! [install]
//! dest_dir = /path/to/project
//! staging_dir = /tmp/uniget-staging
//!
//! [cache]
//! directory = ~/.cache/uniget
//!
//! [retry]
//! max_attempts = 100
//! delay_ms = 10
//! ```
//!
//! Missing keys fall back to defaults; a missing file is not an error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::manager::{MaterializerConfig, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};
use crate::source::PackageCache;

/// Configuration directory name below the platform config directory.
pub const CONFIG_DIR_NAME: &str = "uniget";

/// Configuration filename.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("failed to write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Path of the user configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Default destination project root.
    pub dest_dir: Option<PathBuf>,
    /// Parent directory for staging directories.
    pub staging_dir: Option<PathBuf>,
    /// Downloaded archive cache.
    pub cache_dir: Option<PathBuf>,
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            dest_dir: None,
            staging_dir: None,
            cache_dir: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
        }
    }
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini
                .section(Some(key.section()))
                .and_then(|s| s.get(key.key_name()))
            {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_failed = |e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(write_failed)
    }

    /// Retry policy described by the `[retry]` section.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }

    /// Archive cache, falling back to the platform cache directory.
    pub fn package_cache(&self) -> Option<PackageCache> {
        self.cache_dir
            .clone()
            .or_else(PackageCache::default_root)
            .map(PackageCache::new)
    }

    /// Materializer configuration derived from this file.
    pub fn to_materializer_config(&self) -> MaterializerConfig {
        let config = MaterializerConfig::default().with_retry(self.retry_policy());
        match &self.staging_dir {
            Some(dir) => config.with_staging_dir(dir.clone()),
            None => config,
        }
    }
}

/// A settable configuration key, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    InstallDestDir,
    InstallStagingDir,
    CacheDirectory,
    RetryMaxAttempts,
    RetryDelayMs,
}

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::InstallDestDir,
            Self::InstallStagingDir,
            Self::CacheDirectory,
            Self::RetryMaxAttempts,
            Self::RetryDelayMs,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::InstallDestDir | Self::InstallStagingDir => "install",
            Self::CacheDirectory => "cache",
            Self::RetryMaxAttempts | Self::RetryDelayMs => "retry",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            Self::InstallDestDir => "dest_dir",
            Self::InstallStagingDir => "staging_dir",
            Self::CacheDirectory => "directory",
            Self::RetryMaxAttempts => "max_attempts",
            Self::RetryDelayMs => "delay_ms",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        match self {
            Self::InstallDestDir => path(&config.dest_dir),
            Self::InstallStagingDir => path(&config.staging_dir),
            Self::CacheDirectory => path(&config.cache_dir),
            Self::RetryMaxAttempts => config.max_attempts.to_string(),
            Self::RetryDelayMs => config.delay_ms.to_string(),
        }
    }

    /// Parse and store a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = || ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
        };
        let path = || (!value.is_empty()).then(|| expand_tilde(value));
        match self {
            Self::InstallDestDir => config.dest_dir = path(),
            Self::InstallStagingDir => config.staging_dir = path(),
            Self::CacheDirectory => config.cache_dir = path(),
            Self::RetryMaxAttempts => {
                config.max_attempts = value
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(invalid)?
            }
            Self::RetryDelayMs => config.delay_ms = value.parse().map_err(|_| invalid())?,
        }
        Ok(())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn expand_tilde(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.max_attempts, 100);
        assert_eq!(config.delay_ms, 10);
    }

    #[test]
    fn test_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.ini");
        let config = ConfigFile {
            dest_dir: Some(PathBuf::from("/projects/game")),
            staging_dir: Some(PathBuf::from("/tmp/staging")),
            cache_dir: None,
            max_attempts: 7,
            delay_ms: 25,
        };

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[retry]\nmax_attempts = many\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "retry.max_attempts");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::RetryMaxAttempts.set(&mut config, "0").is_err());
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!(
            "cache.directory".parse::<ConfigKey>().unwrap(),
            ConfigKey::CacheDirectory
        );
        assert!(matches!(
            "cache.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_to_materializer_config() {
        let config = ConfigFile {
            staging_dir: Some(PathBuf::from("/stage")),
            max_attempts: 3,
            delay_ms: 1,
            ..Default::default()
        };
        let materializer = config.to_materializer_config();
        assert_eq!(materializer.staging_dir, PathBuf::from("/stage"));
        assert_eq!(materializer.retry.max_attempts, 3);
        assert_eq!(materializer.retry.delay, Duration::from_millis(1));
    }

    #[test]
    fn test_package_cache_prefers_configured_dir() {
        let config = ConfigFile {
            cache_dir: Some(PathBuf::from("/my/cache")),
            ..Default::default()
        };
        assert_eq!(
            config.package_cache().unwrap().root(),
            Path::new("/my/cache")
        );
    }
}
