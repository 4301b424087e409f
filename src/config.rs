//! Configuration module
//!
//! This module loads the instance profiles (endpoint and credentials of each
//! remote media-catalog deployment) from a TOML file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine the platform configuration directory
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read the configuration file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file
    #[error("Failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// The configuration lists no instances
    #[error("No instances configured")]
    NoInstances,

    /// Two instances share the same id
    #[error("Instance {0} is configured more than once")]
    DuplicateInstance(InstanceId),

    /// The default instance does not exist
    #[error("Default instance {0} is not configured")]
    UnknownDefaultInstance(InstanceId),

    /// An instance URL is unusable
    #[error("Instance {instance} has an invalid url: '{url}'")]
    InvalidUrl { instance: InstanceId, url: String },
}

/// Opaque reference selecting one configured instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection profile for one remote deployment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceConfig {
    /// Instance identifier referenced by series mappings
    pub id: InstanceId,
    /// Optional human readable name
    #[serde(default)]
    pub name: Option<String>,
    /// Base URL of the remote API
    pub url: String,
    /// Basic auth user name
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in seconds, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds, 0 disables it
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl InstanceConfig {
    /// Request timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        non_zero_secs(self.timeout_secs)
    }

    /// Connect timeout, `None` when disabled
    pub fn connect_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.connect_timeout_secs)
    }
}

/// Display strings used when building choices
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Label of the sentinel entry preceding the episodes of a series
    pub all_videos: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            all_videos: "All videos".to_string(),
        }
    }
}

/// Complete configuration document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// Instance used when none is given explicitly
    #[serde(default)]
    pub default_instance: Option<InstanceId>,
    /// All configured instances
    #[serde(default)]
    pub instances: Vec<InstanceConfig>,
    /// Display strings
    #[serde(default)]
    pub labels: Labels,
}

impl CatalogConfig {
    /// Loads and validates the configuration from a TOML file
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = CatalogConfig::load(Path::new("config.toml"))?;
    /// let instance = config.default_instance();
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: CatalogConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            instances = config.instances.len(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Loads the configuration from `path`, or from the platform default location
    ///
    /// The default location is:
    /// - Linux: ~/.config/media-catalog/config.toml
    /// - macOS: ~/Library/Application Support/media-catalog/config.toml
    /// - Windows: %APPDATA%\media-catalog\config\config.toml
    pub fn load_or_default_location(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&default_config_path()?),
        }
    }

    /// Parses and validates a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseFailed {
                path: PathBuf::from("<inline>"),
                source: e,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Looks up the profile of an instance
    pub fn instance(&self, id: InstanceId) -> Option<&InstanceConfig> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// The instance used when none is selected explicitly
    ///
    /// Falls back to the first listed instance when no default is configured.
    pub fn default_instance(&self) -> Option<InstanceId> {
        self.default_instance
            .or_else(|| self.instances.first().map(|i| i.id))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.instances.is_empty() {
            return Err(ConfigError::NoInstances);
        }

        let mut seen = HashSet::new();
        for instance in &self.instances {
            if !seen.insert(instance.id) {
                return Err(ConfigError::DuplicateInstance(instance.id));
            }

            let url = instance.url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    instance: instance.id,
                    url: instance.url.clone(),
                });
            }
        }

        if let Some(default) = self.default_instance {
            if !seen.contains(&default) {
                return Err(ConfigError::UnknownDefaultInstance(default));
            }
        }

        Ok(())
    }
}

/// Gets the default configuration file path
fn default_config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = directories::ProjectDirs::from("", "", "media-catalog")
        .ok_or(ConfigError::ConfigDirectoryNotFound)?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
