//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

use crate::loader::ConfigFormat;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading a protocol configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file extension does not map to a supported format.
    #[error("Unsupported config format '{extension}' for {} (expected .toml, .yaml or .yml)", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The document is not syntactically valid for its format.
    #[error("Failed to parse {format} document: {message}")]
    Parse {
        format: ConfigFormat,
        message: String,
    },

    /// A required field is missing or has the wrong type.
    #[error("Invalid config at '{path}': {message}")]
    Validation { path: String, message: String },

    /// I/O error while reading the file.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Build a validation error for the given field path.
    pub fn validation(path: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The offending field path, for validation errors.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            ConfigError::Validation { path, .. } => Some(path),
            _ => None,
        }
    }
}
