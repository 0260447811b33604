//! Provenance of a bound estimate.
//!
//! Travels with the estimate through normalization into the debug dump, so
//! a reader of `certificate.json` can tell which solver produced the bound.

use serde::{Deserialize, Serialize};

/// Record of how a bound estimate was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Solver identifier.
    pub solver: String,
    /// Solver-specific detail (e.g. dual certificate reference).
    pub details: String,
    /// Free-form note.
    pub note: String,
    /// Version of the tool that produced the estimate.
    pub qkdv_version: String,
}

impl Provenance {
    /// Provenance for a solver, stamped with the current tool version.
    pub fn new(solver: impl Into<String>, details: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            solver: solver.into(),
            details: details.into(),
            note: note.into(),
            qkdv_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Provenance of the placeholder estimator: no dual certificate exists.
    pub fn placeholder() -> Self {
        Self::new(
            "stub",
            "no-duals-mvp",
            "replace with SDP dual certificate",
        )
    }
}
