//! QKD protocol instance configuration.
//!
//! This crate holds the protocol instance model and its loader. A protocol
//! document may be written in TOML or YAML; both map onto the same
//! [`ProtocolConfig`].
//!
//! # Example
//!
//! ```rust
//! use qkdv_config::{ConfigFormat, from_str};
//!
//! let yaml = r"
//! protocol: {name: B92, description: two non-orthogonal states}
//! parameters: {N: 1000, p_psi0: 0.5, p_psi1: 0.5}
//! device: {eta: 0.9, dark_count: 1.0e-6, detector_efficiency: 0.8}
//! postprocessing:
//!   sifting: standard
//!   error_correction: {scheme: LDPC, target_ferr: 0.001, inefficiency_f: 1.16}
//!   privacy_amplification: {method: toeplitz, hash_family: universal2, security_parameter: 1.0e-10}
//! observed: {p_conclusive: 0.25, error_rate_conclusive: 0.05, p_inconclusive: 0.75}
//! security_goal: {output: key, epsilon: 1.0e-6, formula_hint: none}
//! meta: {author: lab, email: lab@example.org, date: '2025-01-01', notes: none}
//! ";
//!
//! let config = from_str(yaml, ConfigFormat::Yaml).unwrap();
//! assert_eq!(config.name, "B92");
//! assert_eq!(config.parameters.count_or("N", 0).unwrap(), 1000);
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod params;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, from_document, from_str, load};
pub use model::{
    ComplexNumber, Device, ErrorCorrection, Measurements, MetaInfo, Observed, POVMElement,
    Postprocessing, PrivacyAmplification, ProtocolConfig, SecurityGoal, State,
};
pub use params::{ParamValue, Parameters};
