//! Coq proof-instance generation and verification.
//!
//! The last two pipeline stages:
//!
//! ```text
//! ProtocolConfig + Certificate -> InstanceGenerator -> b92_inst.v -> Verifier
//! ```
//!
//! - [`instance`]: renders the compiled-in B92 template with deterministic
//!   10-digit real literals and writes it to disk.
//! - [`verify`]: the [`Verifier`] capability and [`CoqcVerifier`], which
//!   runs `coqc` as a subprocess and captures its output.
//!
//! # Example
//!
//! ```rust
//! use qkdv_coq::{InstanceValues, render_values};
//!
//! let source = render_values(InstanceValues {
//!     n: 1000,
//!     p_psi0: 0.5,
//!     p_psi1: 0.5,
//!     delta_ph_lower: 0.08,
//!     delta_ph_upper: 0.081,
//!     epsilon: 1e-6,
//! })
//! .unwrap();
//! assert!(source.contains("Definition delta_ph_lower : R := (0.0800000000)%R."));
//! ```

pub mod error;
pub mod instance;
pub mod verify;

pub use error::{GenResult, GenerateError};
pub use instance::{
    CoqInt, CoqReal, DEFAULT_OUTPUT, InstanceGenerator, InstanceValues, render, render_values,
};
pub use verify::{
    CoqcVerifier, DEFAULT_PROVER, ExternalToolError, VerificationReport, Verifier,
};
