//! Certificate debug dump.
//!
//! The normalized certificate is written as JSON next to the generated proof
//! instance so the bound that went into the artifact can be inspected.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{CertResult, CertificateError};
use crate::normalizer::Certificate;

/// File name of the debug dump inside the output directory.
pub const CERTIFICATE_FILE: &str = "certificate.json";

/// Export configuration.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Serialize a certificate to a JSON string.
pub fn to_json(certificate: &Certificate, config: &ExportConfig) -> CertResult<String> {
    if config.pretty {
        serde_json::to_string_pretty(certificate).map_err(CertificateError::from)
    } else {
        serde_json::to_string(certificate).map_err(CertificateError::from)
    }
}

/// Write a certificate to a JSON file, creating parent directories.
///
/// Overwrites any existing file. The write is not atomic.
pub fn to_file(certificate: &Certificate, path: &Path, config: &ExportConfig) -> CertResult<()> {
    let json = to_json(certificate, config)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            CertificateError::Io(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    fs::write(path, json)
        .map_err(|e| CertificateError::Io(format!("Failed to write {}: {}", path.display(), e)))?;
    debug!("Wrote certificate dump to {}", path.display());
    Ok(())
}
