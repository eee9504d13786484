//! Configuration file parsing for timeroll
//!
//! Supports multiple configuration file formats:
//! - TOML (.toml)
//! - YAML (.yaml, .yml)
//! - JSON (.json)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::CONFIG_FILES;
use crate::error::{Error, Result};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(ConfigFormat::Toml),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "json" => Some(ConfigFormat::Json),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Time zone used when rendering the date placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneMode {
    /// The host's local time zone
    #[default]
    Local,
    /// Coordinated universal time
    Utc,
}

/// Rolling policy configuration
///
/// Everything here is fixed once the policy is activated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingConfig {
    /// File name template with exactly one `%d` placeholder,
    /// e.g. `/var/log/app.%d{yyyy-MM-dd}.log.gz`
    #[serde(default, alias = "FileNamePattern")]
    pub file_name_pattern: Option<String>,

    /// Fixed path of the active file. When set, archives are produced by
    /// renaming this file at each rollover.
    #[serde(default, alias = "ActiveFileName")]
    pub active_file_name: Option<PathBuf>,

    /// Time zone for rendering dates (default: local)
    #[serde(default)]
    pub time_zone: TimeZoneMode,
}

impl RollingConfig {
    /// Create a config with the given file name pattern
    pub fn new<S: Into<String>>(pattern: S) -> Self {
        Self {
            file_name_pattern: Some(pattern.into()),
            ..Default::default()
        }
    }

    /// Decouple the active file from the archive names
    pub fn with_active_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.active_file_name = Some(path.into());
        self
    }

    pub fn with_time_zone(mut self, time_zone: TimeZoneMode) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Load config from a file, picking the format from its extension
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::config(format!(
                "Unsupported config file extension: {}",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content, format)?;

        debug!("Loaded rolling config from {:?}", path);
        Ok(config)
    }

    /// Parse config content in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let config: RollingConfig = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };
        Ok(config)
    }

    /// Find the first known config file in a directory
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// The configured pattern, rejecting a missing or blank one
    pub fn pattern(&self) -> Result<&str> {
        match self.file_name_pattern.as_deref() {
            Some(p) if !p.trim().is_empty() => Ok(p),
            _ => Err(Error::PatternNotSet),
        }
    }

    /// Validate the parts of the config that do not need the pattern parser
    pub fn validate(&self) -> Result<()> {
        self.pattern()?;

        if let Some(active) = &self.active_file_name {
            if active.as_os_str().is_empty() {
                return Err(Error::config("ActiveFileName must not be empty"));
            }
        }

        Ok(())
    }
}
