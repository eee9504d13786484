//! Error types for timeroll

use std::path::PathBuf;

/// timeroll error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The FileNamePattern option must be set before using the time-based rolling policy")]
    PatternNotSet,

    #[error("FileNamePattern [{0}] does not contain a valid date format specifier")]
    NoDateSpecifier(String),

    #[error("Invalid FileNamePattern [{pattern}]: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to rename {} to {}: {reason}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Failed to compress {}: {reason}", path.display())]
    CompressionFailed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Result type alias for timeroll
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::ConfigError(msg.into())
    }

    pub fn invalid_pattern<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        Error::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn compression<R: Into<String>>(path: PathBuf, reason: R) -> Self {
        Error::CompressionFailed {
            path,
            reason: reason.into(),
        }
    }

    /// Errors raised while validating configuration; these must keep the
    /// destination from opening any file.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::PatternNotSet
                | Error::NoDateSpecifier(_)
                | Error::InvalidPattern { .. }
                | Error::ConfigError(_)
                | Error::ConfigNotFound(_)
                | Error::TomlError(_)
                | Error::YamlError(_)
                | Error::JsonError(_)
        )
    }
}
