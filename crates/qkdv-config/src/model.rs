//! Protocol instance model.
//!
//! A [`ProtocolConfig`] is built once per run by the loader and is never
//! mutated afterwards. The state vectors and POVM matrices are carried as-is:
//! normalization and positivity are the numeric solver's concern.

use num_complex::Complex64;

use crate::params::Parameters;

/// Complex amplitude used in state vectors and POVM matrices.
pub type ComplexNumber = Complex64;

/// Complete description of one QKD protocol instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolConfig {
    /// Protocol name (e.g. `B92`).
    pub name: String,
    /// Free-text description. Empty when not given.
    pub description: String,
    /// Open-ended numeric/scalar parameters, looked up with defaults at the
    /// point of use.
    pub parameters: Parameters,
    /// Signal states prepared by the sender.
    pub states: Vec<State>,
    /// Receiver measurement description.
    pub measurements: Measurements,
    /// Physical device characteristics.
    pub device: Device,
    /// Classical postprocessing pipeline.
    pub postprocessing: Postprocessing,
    /// Empirical statistics observed in the run.
    pub observed: Observed,
    /// Security target for the generated proof.
    pub security_goal: SecurityGoal,
    /// Authoring metadata.
    pub meta: MetaInfo,
}

/// A prepared quantum state.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    /// State label (e.g. `psi0`).
    pub label: String,
    /// Prior probability of preparing this state.
    pub p: f64,
    /// State vector amplitudes.
    pub vec: Vec<ComplexNumber>,
}

/// One POVM element of the receiver's measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct POVMElement {
    /// Outcome label.
    pub label: String,
    /// Operator matrix, row-major. Always rectangular.
    pub matrix: Vec<Vec<ComplexNumber>>,
}

impl POVMElement {
    /// Matrix shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        let rows = self.matrix.len();
        let cols = self.matrix.first().map_or(0, Vec::len);
        (rows, cols)
    }
}

/// Measurement block.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurements {
    /// Whether the solver should normalize the POVM before use.
    pub normalize: bool,
    /// POVM elements.
    pub povm: Vec<POVMElement>,
}

impl Default for Measurements {
    fn default() -> Self {
        Self {
            normalize: true,
            povm: Vec::new(),
        }
    }
}

/// Device characteristics. Values are type-checked but not range-checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Device {
    /// Channel transmittance.
    pub eta: f64,
    /// Dark-count probability per detection window.
    pub dark_count: f64,
    /// Detector efficiency.
    pub detector_efficiency: f64,
}

/// Error-correction stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCorrection {
    pub scheme: String,
    /// Target frame error rate.
    pub target_ferr: f64,
    /// Inefficiency factor `f` relative to the Shannon limit.
    pub inefficiency_f: f64,
}

/// Privacy-amplification stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PrivacyAmplification {
    pub method: String,
    pub hash_family: String,
    pub security_parameter: f64,
}

/// Classical postprocessing description.
#[derive(Debug, Clone, PartialEq)]
pub struct Postprocessing {
    pub sifting: String,
    pub error_correction: ErrorCorrection,
    pub privacy_amplification: PrivacyAmplification,
}

/// Observed statistics. These are the only values the placeholder bound
/// estimator reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observed {
    /// Probability of a conclusive outcome.
    pub p_conclusive: f64,
    /// Error rate among conclusive outcomes.
    pub error_rate_conclusive: f64,
    /// Probability of an inconclusive outcome.
    pub p_inconclusive: f64,
}

/// Security target.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityGoal {
    /// Label of the secured output (e.g. `key`).
    pub output: String,
    /// Total security parameter budget.
    pub epsilon: f64,
    /// Documentation-only hint copied into reports.
    pub formula_hint: String,
}

/// Authoring metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaInfo {
    pub author: String,
    pub email: String,
    pub date: String,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_povm_shape() {
        let one = ComplexNumber::new(1.0, 0.0);
        let zero = ComplexNumber::new(0.0, 0.0);
        let elem = POVMElement {
            label: "E0".into(),
            matrix: vec![vec![one, zero], vec![zero, zero]],
        };
        assert_eq!(elem.shape(), (2, 2));
    }

    #[test]
    fn test_empty_povm_shape() {
        let elem = POVMElement {
            label: "empty".into(),
            matrix: vec![],
        };
        assert_eq!(elem.shape(), (0, 0));
    }

    #[test]
    fn test_measurements_default_normalizes() {
        let m = Measurements::default();
        assert!(m.normalize);
        assert!(m.povm.is_empty());
    }
}
