//! Bound estimation.
//!
//! [`BoundEstimator`] is the extension point for the numeric solver that
//! computes the phase-error bound. The only implementation today is
//! [`PlaceholderEstimator`], whose formula is a stand-in and carries no
//! security meaning. A real solver must return the same [`RawEstimate`]
//! shape so normalization and generation are unaffected.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use qkdv_config::ProtocolConfig;

use crate::normalizer::RawBundle;
use crate::provenance::Provenance;

/// Offset added to the observed conclusive error rate by the placeholder.
pub const PLACEHOLDER_OFFSET: f64 = 0.03;

/// Lowest value the placeholder can return.
pub const PLACEHOLDER_FLOOR: f64 = 0.0;

/// Highest value the placeholder can return.
pub const PLACEHOLDER_CEILING: f64 = 0.5;

/// Unnormalized output of a bound estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEstimate {
    /// Phase-error rate bound.
    pub delta_ph: f64,
    /// How the bound was obtained.
    pub certificate: Provenance,
}

impl RawEstimate {
    /// Convert into the raw key/value bundle consumed by the normalizer.
    pub fn into_bundle(self) -> RawBundle {
        let mut bundle = Map::new();
        bundle.insert("delta_ph".into(), Value::from(self.delta_ph));
        bundle.insert(
            "certificate".into(),
            serde_json::json!({
                "solver": self.certificate.solver,
                "details": self.certificate.details,
                "note": self.certificate.note,
                "qkdv_version": self.certificate.qkdv_version,
            }),
        );
        bundle
    }
}

/// Computes a phase-error bound from a validated protocol configuration.
pub trait BoundEstimator {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Estimate the bound. Inputs are already validated, so this cannot fail.
    fn estimate(&self, config: &ProtocolConfig) -> RawEstimate;
}

/// Placeholder estimator:
/// `delta_ph = clamp(observed.error_rate_conclusive + 0.03, 0.0, 0.5)`.
///
/// Not a cryptographic result. Kept only so the pipeline can run end to end
/// until the SDP solver exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEstimator;

impl PlaceholderEstimator {
    pub fn new() -> Self {
        Self
    }

    /// The placeholder formula on its own.
    ///
    /// An undefined observation yields the most pessimistic bound.
    pub fn bound(error_rate_conclusive: f64) -> f64 {
        let raw = error_rate_conclusive + PLACEHOLDER_OFFSET;
        if raw.is_nan() {
            PLACEHOLDER_CEILING
        } else {
            raw.clamp(PLACEHOLDER_FLOOR, PLACEHOLDER_CEILING)
        }
    }
}

impl BoundEstimator for PlaceholderEstimator {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn estimate(&self, config: &ProtocolConfig) -> RawEstimate {
        warn!("Using placeholder bound estimator; delta_ph is not a security result");

        let observed = config.observed.error_rate_conclusive;
        let delta_ph = Self::bound(observed);
        debug!("Placeholder estimate: error_rate_conclusive={observed} -> delta_ph={delta_ph}");

        RawEstimate {
            delta_ph,
            certificate: Provenance::placeholder(),
        }
    }
}
