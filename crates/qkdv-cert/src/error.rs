//! Certificate error types.

use thiserror::Error;

/// Result type for certificate operations.
pub type CertResult<T> = Result<T, CertificateError>;

/// Errors raised while normalizing or exporting a certificate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateError {
    /// A field that must be a number holds something else.
    #[error("Certificate field '{field}' must be a number, found {found}")]
    NonNumeric { field: String, found: String },

    /// A numeric field is non-finite or outside the unit interval.
    #[error("Certificate field '{field}' = {value} is outside [0, 1]")]
    OutOfRange { field: String, value: f64 },

    /// Normalization margin is negative or NaN.
    #[error("Invalid normalization margin: {0} (must be >= 0)")]
    InvalidMargin(f64),

    /// Structurally invalid raw bundle.
    #[error("Malformed certificate: {0}")]
    Malformed(String),

    /// JSON serialization failed.
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error while writing the debug dump.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for CertificateError {
    fn from(e: serde_json::Error) -> Self {
        CertificateError::Export(e.to_string())
    }
}
