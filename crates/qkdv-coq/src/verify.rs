//! External prover invocation.
//!
//! A [`Verifier`] checks a generated proof instance with an external tool
//! and reports the outcome as data. Verification failures are never raised
//! as errors here: the caller decides what a failed check means.
//!
//! | Outcome                  | `success` | `error`                        |
//! |--------------------------|-----------|--------------------------------|
//! | Prover exits 0           | `true`    | `None`                         |
//! | Prover exits non-zero    | `false`   | [`ExternalToolError::NonZeroExit`] |
//! | Prover not installed     | `false`   | [`ExternalToolError::ProverNotFound`] |
//! | Artifact does not exist  | `false`   | [`ExternalToolError::ArtifactMissing`] |

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info, warn};

/// Default prover executable.
pub const DEFAULT_PROVER: &str = "coqc";

/// Why an external check did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ExternalToolError {
    #[error("Proof artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Prover '{0}' not found on PATH")]
    ProverNotFound(String),

    #[error("Failed to run '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("'{program}' exited with {}", exit_label(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".into(),
    }
}

/// Outcome of running a verifier on one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub success: bool,
    /// Captured standard output of the prover.
    pub stdout: String,
    /// Captured standard error of the prover.
    pub stderr: String,
    /// Set whenever `success` is false.
    pub error: Option<ExternalToolError>,
}

impl VerificationReport {
    fn failed(error: ExternalToolError) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            error: Some(error),
        }
    }

    /// Text to show a user after a failed check: the prover's stderr when
    /// it wrote any, otherwise the error itself.
    pub fn diagnostic(&self) -> Option<String> {
        if self.success {
            return None;
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return Some(stderr.to_string());
        }
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Capability to check a proof artifact.
pub trait Verifier {
    /// Tool name used in logs.
    fn name(&self) -> &str;

    /// Check `artifact`, blocking until the tool finishes.
    fn verify(&self, artifact: &Path) -> VerificationReport;
}

/// Runs `coqc <file>` from the artifact's directory.
///
/// No timeout is applied; a prover that hangs blocks the caller.
#[derive(Debug, Clone)]
pub struct CoqcVerifier {
    program: String,
}

impl Default for CoqcVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl CoqcVerifier {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROVER)
    }

    /// Use a different executable, e.g. a pinned `coqc` path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Verifier for CoqcVerifier {
    fn name(&self) -> &str {
        &self.program
    }

    fn verify(&self, artifact: &Path) -> VerificationReport {
        if !artifact.is_file() {
            warn!("Skipping verification, {} does not exist", artifact.display());
            return VerificationReport::failed(ExternalToolError::ArtifactMissing(
                artifact.to_path_buf(),
            ));
        }

        let workdir = match artifact.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let Some(file_name) = artifact.file_name() else {
            return VerificationReport::failed(ExternalToolError::ArtifactMissing(
                artifact.to_path_buf(),
            ));
        };

        debug!(
            "Running {} {} in {}",
            self.program,
            Path::new(file_name).display(),
            workdir.display()
        );

        let output = match Command::new(&self.program)
            .arg(file_name)
            .current_dir(workdir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Prover '{}' not found", self.program);
                return VerificationReport::failed(ExternalToolError::ProverNotFound(
                    self.program.clone(),
                ));
            }
            Err(e) => {
                warn!("Failed to run '{}': {e}", self.program);
                return VerificationReport::failed(ExternalToolError::Spawn {
                    program: self.program.clone(),
                    message: e.to_string(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            info!("{} accepted {}", self.program, artifact.display());
            VerificationReport {
                success: true,
                stdout,
                stderr,
                error: None,
            }
        } else {
            warn!(
                "{} rejected {} ({})",
                self.program,
                artifact.display(),
                exit_label(&output.status.code())
            );
            VerificationReport {
                success: false,
                stdout,
                error: Some(ExternalToolError::NonZeroExit {
                    program: self.program.clone(),
                    code: output.status.code(),
                    stderr: stderr.clone(),
                }),
                stderr,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_program() {
        assert_eq!(CoqcVerifier::new().program(), "coqc");
        assert_eq!(CoqcVerifier::default().name(), "coqc");
    }

    #[test]
    fn test_missing_artifact() {
        let report = CoqcVerifier::new().verify(Path::new("/definitely/not/here.v"));
        assert!(!report.success);
        assert!(matches!(
            report.error,
            Some(ExternalToolError::ArtifactMissing(_))
        ));
    }

    #[test]
    fn test_diagnostic_prefers_stderr() {
        let report = VerificationReport {
            success: false,
            stdout: String::new(),
            stderr: "Error: syntax\n".into(),
            error: Some(ExternalToolError::NonZeroExit {
                program: "coqc".into(),
                code: Some(1),
                stderr: "Error: syntax\n".into(),
            }),
        };
        assert_eq!(report.diagnostic().as_deref(), Some("Error: syntax"));
    }

    #[test]
    fn test_diagnostic_falls_back_to_error() {
        let report = VerificationReport::failed(ExternalToolError::ProverNotFound("coqc".into()));
        assert_eq!(
            report.diagnostic().as_deref(),
            Some("Prover 'coqc' not found on PATH")
        );
    }

    #[test]
    fn test_diagnostic_none_on_success() {
        let report = VerificationReport {
            success: true,
            stdout: String::new(),
            stderr: "warning".into(),
            error: None,
        };
        assert_eq!(report.diagnostic(), None);
    }

    #[test]
    fn test_exit_label() {
        assert_eq!(exit_label(&Some(2)), "status 2");
        assert!(exit_label(&None).contains("signal"));
    }
}
