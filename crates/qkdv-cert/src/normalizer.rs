//! Certificate normalization.
//!
//! Turns a raw estimate bundle into a [`Certificate`] whose
//! `delta_ph_interval` brackets the estimate with a safety margin.
//!
//! Invariant: `0 <= lower <= delta_ph <= upper <= 1` for every margin
//! `>= 0`. Bounds are clamped to the unit interval, never wrapped. A bundle
//! without `delta_ph` normalizes to the full interval `[0, 1]`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CertResult, CertificateError};
use crate::estimator::RawEstimate;

/// Default half-width of the interval placed around `delta_ph`.
pub const DEFAULT_MARGIN: f64 = 1e-5;

/// Raw key/value bundle produced by an estimator.
pub type RawBundle = Map<String, Value>;

/// Closed interval inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// The maximally uninformative interval.
    pub const UNIT: Interval = Interval {
        lower: 0.0,
        upper: 1.0,
    };

    /// `[value - margin, value + margin]` clamped to `[0, 1]`.
    pub fn around(value: f64, margin: f64) -> Self {
        Self {
            lower: (value - margin).max(0.0),
            upper: (value + margin).min(1.0),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Normalization status marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateMeta {
    /// Always `true` on a certificate produced by [`normalize`].
    pub normalized: bool,
    /// Other metadata carried over from the raw bundle.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized interval certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Point estimate, when the estimator produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_ph: Option<f64>,
    /// Safety-margined interval around `delta_ph`.
    pub delta_ph_interval: Interval,
    /// Estimator provenance record, carried unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Value>,
    pub meta: CertificateMeta,
    /// Any other keys of the raw bundle, carried unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Certificate {
    /// Convert back into a raw bundle, e.g. for re-normalization.
    pub fn to_bundle(&self) -> CertResult<RawBundle> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CertificateError::Malformed(format!(
                "certificate serialized to {other}, expected an object"
            ))),
        }
    }
}

/// Normalize a raw bundle into an interval certificate.
///
/// Fails when `delta_ph` is present but not a finite JSON number in
/// `[0, 1]`, when `meta` is not a mapping, or when `margin` is negative or
/// NaN.
pub fn normalize(raw: &RawBundle, margin: f64) -> CertResult<Certificate> {
    if margin.is_nan() || margin < 0.0 {
        return Err(CertificateError::InvalidMargin(margin));
    }

    let mut rest = raw.clone();
    let delta_ph = rest.remove("delta_ph").map(read_delta_ph).transpose()?;
    let certificate = rest.remove("certificate");
    // A stale interval from a previous normalization is recomputed.
    rest.remove("delta_ph_interval");

    let mut meta = match rest.remove("meta") {
        None => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(CertificateError::Malformed(format!(
                "'meta' must be a mapping, found {other}"
            )));
        }
    };
    meta.remove("normalized");

    let delta_ph_interval = match delta_ph {
        Some(value) => Interval::around(value, margin),
        None => Interval::UNIT,
    };
    debug!(
        "Normalized delta_ph={:?} with margin {margin} -> [{}, {}]",
        delta_ph, delta_ph_interval.lower, delta_ph_interval.upper
    );

    Ok(Certificate {
        delta_ph,
        delta_ph_interval,
        certificate,
        meta: CertificateMeta {
            normalized: true,
            extra: meta,
        },
        extra: rest,
    })
}

/// Normalize a typed estimate.
pub fn normalize_estimate(estimate: RawEstimate, margin: f64) -> CertResult<Certificate> {
    normalize(&estimate.into_bundle(), margin)
}

fn read_delta_ph(value: Value) -> CertResult<f64> {
    let Value::Number(number) = &value else {
        return Err(CertificateError::NonNumeric {
            field: "delta_ph".into(),
            found: value.to_string(),
        });
    };
    let v = number.as_f64().ok_or_else(|| CertificateError::NonNumeric {
        field: "delta_ph".into(),
        found: number.to_string(),
    })?;
    // Rejected rather than bracketed: no interval inside [0, 1] can contain
    // such a value, and clamping would yield lower > upper.
    if !(0.0..=1.0).contains(&v) {
        return Err(CertificateError::OutOfRange {
            field: "delta_ph".into(),
            value: v,
        });
    }
    Ok(v)
}
