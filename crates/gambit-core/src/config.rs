//! Configuration management for Gambit

use crate::error::{GambitError, Result};
use crate::session::DEFAULT_SESSION_TIMEOUT;
use crate::storage::DEFAULT_LIST_LIMIT;
use crate::upload::UploadPolicy;
use gambit_types::DEFAULT_BACKEND_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "gambit.config.yaml",
    "gambit.config.yml",
    "gambit.config.json",
];

/// Project configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub gallery: GalleryConfig,
    #[serde(default)]
    pub upload: UploadPolicy,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Hosted backend connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    #[serde(default)]
    pub anon_key: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BACKEND_URL.to_string(),
            anon_key: None,
        }
    }
}

fn default_list_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Bucket used when a command does not name one
    #[serde(default)]
    pub default_bucket: Option<String>,
    /// Entries fetched per folder
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            default_bucket: None,
            list_limit: default_list_limit(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_SESSION_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A single problem found while validating a [`Config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending key, e.g. `gallery.list_limit`
    pub field: String,
    pub code: &'static str,
    pub message: String,
    pub suggestion: Option<String>,
}

/// Errors make a configuration unusable, warnings do not
#[derive(Debug, Clone, Default)]
pub struct ConfigReport {
    pub errors: Vec<ConfigIssue>,
    pub warnings: Vec<ConfigIssue>,
}

impl ConfigReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &str, code: &'static str, message: impl Into<String>) {
        self.errors.push(ConfigIssue {
            field: field.to_string(),
            code,
            message: message.into(),
            suggestion: None,
        });
    }

    fn warn(&mut self, field: &str, code: &'static str, message: &str, suggestion: &str) {
        self.warnings.push(ConfigIssue {
            field: field.to_string(),
            code,
            message: message.to_string(),
            suggestion: Some(suggestion.to_string()),
        });
    }

    /// `GambitError::InvalidConfig` listing every error, if there is any
    pub fn into_result(self) -> Result<Vec<ConfigIssue>> {
        if self.is_valid() {
            return Ok(self.warnings);
        }
        let details = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(GambitError::InvalidConfig(details))
    }
}

/// Loads project configurations, caching them by modification time
pub struct ConfigManager {
    cache: std::collections::HashMap<PathBuf, CachedConfig>,
}

struct CachedConfig {
    config: Config,
    modified_time: std::time::SystemTime,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|e| e == "json").unwrap_or(false)
}

impl ConfigManager {
    /// Create a manager with an empty cache
    pub fn new() -> Self {
        Self {
            cache: std::collections::HashMap::new(),
        }
    }

    /// Find configuration file in a directory
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Load configuration from a file
    pub fn load(&mut self, config_path: &Path) -> Result<Config> {
        let metadata = std::fs::metadata(config_path)?;
        let modified_time = metadata
            .modified()
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        if let Some(cached) = self.cache.get(config_path) {
            if cached.modified_time == modified_time {
                return Ok(cached.config.clone());
            }
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = if is_json(config_path) {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        self.cache.insert(
            config_path.to_path_buf(),
            CachedConfig {
                config: config.clone(),
                modified_time,
            },
        );

        Ok(config)
    }

    /// Load configuration from a directory (searches for config files)
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<(Config, PathBuf)> {
        let config_path = Self::find_config_file(dir)
            .ok_or_else(|| GambitError::ConfigNotFound(dir.display().to_string()))?;

        let config = self.load(&config_path)?;
        Ok((config, config_path))
    }

    /// Validate a configuration
    pub fn validate(&self, config: &Config) -> Result<ConfigReport> {
        let mut report = ConfigReport::default();

        let url_regex = regex::Regex::new(r"^https?://[^\s/]+")
            .map_err(|e| GambitError::Other(e.to_string()))?;
        if !url_regex.is_match(&config.backend.url) {
            report.error(
                "backend.url",
                "INVALID_URL",
                "Backend URL must start with http:// or https://",
            );
        }

        if config.backend.anon_key.is_none() {
            report.warn(
                "backend.anon_key",
                "MISSING_ANON_KEY",
                "No anonymous key configured",
                "Set backend.anon_key to the project's public key",
            );
        }

        if config.gallery.list_limit == 0 {
            report.error(
                "gallery.list_limit",
                "INVALID_LIMIT",
                "List limit must be greater than zero",
            );
        }

        if config.upload.max_bytes == 0 {
            report.error(
                "upload.max_bytes",
                "INVALID_MAX_BYTES",
                "Maximum upload size must be greater than zero",
            );
        }

        let mime_regex = regex::Regex::new(r"^[a-z0-9.+-]+/[a-z0-9.+-]+$")
            .map_err(|e| GambitError::Other(e.to_string()))?;
        for content_type in &config.upload.allowed_types {
            if !mime_regex.is_match(content_type) {
                report.error(
                    "upload.allowed_types",
                    "INVALID_CONTENT_TYPE",
                    format!("'{}' is not a valid content type", content_type),
                );
            }
        }
        if config.upload.allowed_types.is_empty() {
            report.warn(
                "upload.allowed_types",
                "NO_ALLOWED_TYPES",
                "No content types are allowed, every upload will be rejected",
                "Add at least one type such as image/png",
            );
        }

        if config.session.timeout_secs == 0 {
            report.error(
                "session.timeout_secs",
                "INVALID_TIMEOUT",
                "Session timeout must be at least one second",
            );
        }

        Ok(report)
    }
}
