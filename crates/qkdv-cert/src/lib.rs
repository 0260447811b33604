//! Phase-error bound estimation and interval certificates.
//!
//! Two pipeline stages live here:
//!
//! ```text
//! ProtocolConfig -> BoundEstimator -> RawEstimate -> normalize -> Certificate
//! ```
//!
//! - [`estimator`]: the [`BoundEstimator`] extension point and the
//!   [`PlaceholderEstimator`] used until a real solver exists.
//! - [`normalizer`]: wraps the point estimate in a clamped safety interval.
//! - [`export`]: JSON debug dump of the certificate.
//!
//! # Example
//!
//! ```rust
//! use qkdv_cert::{DEFAULT_MARGIN, PlaceholderEstimator, RawEstimate, Provenance, normalize_estimate};
//!
//! let estimate = RawEstimate {
//!     delta_ph: PlaceholderEstimator::bound(0.05),
//!     certificate: Provenance::placeholder(),
//! };
//! let cert = normalize_estimate(estimate, DEFAULT_MARGIN).unwrap();
//! assert!(cert.delta_ph_interval.contains(0.08));
//! assert!(cert.meta.normalized);
//! ```

pub mod error;
pub mod estimator;
pub mod export;
pub mod normalizer;
pub mod provenance;

pub use error::{CertResult, CertificateError};
pub use estimator::{BoundEstimator, PlaceholderEstimator, RawEstimate};
pub use export::{CERTIFICATE_FILE, ExportConfig};
pub use normalizer::{
    Certificate, CertificateMeta, DEFAULT_MARGIN, Interval, RawBundle, normalize,
    normalize_estimate,
};
pub use provenance::Provenance;
