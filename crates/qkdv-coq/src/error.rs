//! Error types for proof-instance generation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenerateError>;

/// Errors that can occur while rendering or writing a proof instance.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    /// A parameter lookup failed validation.
    #[error(transparent)]
    Config(#[from] qkdv_config::ConfigError),

    /// A scalar cannot be written as a Coq real literal.
    #[error("Cannot render '{name}' = {value} as a Coq real")]
    NonFinite { name: &'static str, value: f64 },

    /// The template engine failed.
    #[error("Template render error: {0}")]
    TemplateRender(#[from] askama::Error),

    /// I/O error while writing the artifact.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
