//! Coq proof-instance generator.
//!
//! Renders the protocol parameters and the certified `delta_ph` interval into
//! `templates/b92_inst.v`. The template is compiled with the crate, so every
//! placeholder is checked against [`InstanceValues`] at build time: a
//! misspelled or missing placeholder is a compile error, never a blank.
//!
//! Every real is written with exactly 10 fractional digits as
//! `(<digits>)%R`. The same inputs therefore always give byte-identical
//! output, which downstream proof-checking reproducibility relies on.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;
use tracing::{debug, info};

use qkdv_cert::Certificate;
use qkdv_config::ProtocolConfig;

use crate::error::{GenResult, GenerateError};

/// Default artifact location, relative to the working directory.
pub const DEFAULT_OUTPUT: &str = "coq/Generated/b92_inst.v";

/// Default for `parameters.p_psi0`.
pub const DEFAULT_P_PSI0: f64 = 0.5;

/// Default for `parameters.p_psi1`.
pub const DEFAULT_P_PSI1: f64 = 0.5;

/// Default for `parameters.N`.
pub const DEFAULT_N: u64 = 1000;

/// Fractional digits used for every real literal.
pub const REAL_DIGITS: usize = 10;

/// Coq real literal: `(0.0800000000)%R`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoqReal(pub f64);

impl fmt::Display for CoqReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // -0.0 would otherwise print with a sign.
        let value = if self.0 == 0.0 { 0.0 } else { self.0 };
        write!(f, "({value:.REAL_DIGITS$})%R")
    }
}

/// Coq integer literal: `(1000)%Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoqInt(pub u64);

impl fmt::Display for CoqInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})%Z", self.0)
    }
}

/// The scalars substituted into the template.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceValues {
    pub n: u64,
    pub p_psi0: f64,
    pub p_psi1: f64,
    pub delta_ph_lower: f64,
    pub delta_ph_upper: f64,
    pub epsilon: f64,
}

impl InstanceValues {
    /// Collect the template scalars from a config and a certificate.
    ///
    /// `p_psi0`, `p_psi1` and `N` fall back to their defaults when absent;
    /// a present but mistyped value is an error.
    pub fn extract(config: &ProtocolConfig, certificate: &Certificate) -> GenResult<Self> {
        let params = &config.parameters;
        Ok(Self {
            n: params.count_or("N", DEFAULT_N)?,
            p_psi0: params.real_or("p_psi0", DEFAULT_P_PSI0)?,
            p_psi1: params.real_or("p_psi1", DEFAULT_P_PSI1)?,
            delta_ph_lower: certificate.delta_ph_interval.lower,
            delta_ph_upper: certificate.delta_ph_interval.upper,
            epsilon: config.security_goal.epsilon,
        })
    }

    fn to_template(self) -> GenResult<B92Instance> {
        Ok(B92Instance {
            n: CoqInt(self.n),
            p_psi0: real("p_psi0", self.p_psi0)?,
            p_psi1: real("p_psi1", self.p_psi1)?,
            delta_ph_lower: real("delta_ph_lower", self.delta_ph_lower)?,
            delta_ph_upper: real("delta_ph_upper", self.delta_ph_upper)?,
            epsilon: real("epsilon", self.epsilon)?,
        })
    }
}

fn real(name: &'static str, value: f64) -> GenResult<CoqReal> {
    if value.is_finite() {
        Ok(CoqReal(value))
    } else {
        Err(GenerateError::NonFinite { name, value })
    }
}

#[derive(Template)]
#[template(path = "b92_inst.v", escape = "none")]
struct B92Instance {
    n: CoqInt,
    p_psi0: CoqReal,
    p_psi1: CoqReal,
    delta_ph_lower: CoqReal,
    delta_ph_upper: CoqReal,
    epsilon: CoqReal,
}

/// Render template values to Coq source.
pub fn render_values(values: InstanceValues) -> GenResult<String> {
    let mut source = values.to_template()?.render()?;
    if !source.ends_with('\n') {
        source.push('\n');
    }
    Ok(source)
}

/// Render a proof instance to Coq source without touching the filesystem.
pub fn render(config: &ProtocolConfig, certificate: &Certificate) -> GenResult<String> {
    let values = InstanceValues::extract(config, certificate)?;
    debug!("Rendering proof instance with {values:?}");
    render_values(values)
}

/// Writes proof instances to a fixed location.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    output: PathBuf,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT)
    }
}

impl InstanceGenerator {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Target path of the generated artifact.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Render and write the proof instance, returning its path.
    ///
    /// Parent directories are created as needed and an existing file is
    /// overwritten. The write is not atomic.
    pub fn generate(&self, config: &ProtocolConfig, certificate: &Certificate) -> GenResult<PathBuf> {
        let source = render(config, certificate)?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| GenerateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.output, source).map_err(|source| GenerateError::Io {
            path: self.output.clone(),
            source,
        })?;

        info!("Wrote proof instance {}", self.output.display());
        Ok(self.output.clone())
    }
}
