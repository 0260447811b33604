//! Typed parameter store.
//!
//! The `parameters` section of a protocol document is open-ended. Instead of
//! threading an untyped map through the pipeline, values are kept as
//! [`ParamValue`]s and read with an explicit lookup-with-default contract at
//! the point of use.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A single scalar parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl ParamValue {
    fn kind(&self) -> &'static str {
        match self {
            ParamValue::Integer(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Bool(_) => "bool",
            ParamValue::Text(_) => "string",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Ordered key/value store of protocol parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw lookup.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a real-valued parameter, falling back to `default` when absent.
    ///
    /// Integers, floats and numeric strings coerce; booleans, other text and
    /// non-finite values fail with a validation error naming
    /// `parameters.<key>`.
    pub fn real_or(&self, key: &str, default: f64) -> ConfigResult<f64> {
        let Some(value) = self.values.get(key) else {
            return Ok(default);
        };
        let invalid = |reason: String| ConfigError::validation(param_path(key), reason);
        let real = match value {
            ParamValue::Float(v) => *v,
            ParamValue::Integer(v) => *v as f64,
            ParamValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| invalid(format!("expected a number, found {value}")))?,
            ParamValue::Bool(_) => {
                return Err(invalid(format!("expected a number, found {}", value.kind())));
            }
        };
        if real.is_finite() {
            Ok(real)
        } else {
            Err(invalid(format!("expected a finite number, found {value}")))
        }
    }

    /// Read a non-negative integral parameter, falling back to `default`
    /// when absent.
    ///
    /// Floats are accepted only when they carry no fractional part.
    pub fn count_or(&self, key: &str, default: u64) -> ConfigResult<u64> {
        let Some(value) = self.values.get(key) else {
            return Ok(default);
        };
        let invalid = |reason: String| ConfigError::validation(param_path(key), reason);
        match value {
            ParamValue::Integer(v) => {
                u64::try_from(*v).map_err(|_| invalid(format!("expected a non-negative integer, found {v}")))
            }
            ParamValue::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && *v >= 0.0 && *v <= u64::MAX as f64 {
                    Ok(*v as u64)
                } else {
                    Err(invalid(format!("expected a non-negative integer, found {v}")))
                }
            }
            ParamValue::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid(format!("expected a non-negative integer, found {value}"))),
            ParamValue::Bool(_) => Err(invalid(format!(
                "expected a non-negative integer, found {}",
                value.kind()
            ))),
        }
    }
}

impl FromIterator<(String, ParamValue)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn param_path(key: &str) -> String {
    format!("parameters.{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_or_default_when_absent() {
        let params = Parameters::new();
        assert_eq!(params.real_or("p_psi0", 0.5).unwrap(), 0.5);
    }

    #[test]
    fn test_real_or_coerces_integer() {
        let params = Parameters::new().with("p_psi0", 1_i64);
        assert_eq!(params.real_or("p_psi0", 0.5).unwrap(), 1.0);
    }

    #[test]
    fn test_real_or_parses_numeric_text() {
        let params = Parameters::new().with("p_psi1", "0.25");
        assert_eq!(params.real_or("p_psi1", 0.5).unwrap(), 0.25);
    }

    #[test]
    fn test_real_or_rejects_bool() {
        let params = Parameters::new().with("p_psi0", true);
        let err = params.real_or("p_psi0", 0.5).unwrap_err();
        assert_eq!(err.field_path(), Some("parameters.p_psi0"));
    }

    #[test]
    fn test_real_or_rejects_word() {
        let params = Parameters::new().with("p_psi0", "half");
        assert!(params.real_or("p_psi0", 0.5).is_err());
    }

    #[test]
    fn test_real_or_rejects_non_finite() {
        for text in ["NaN", "inf", "-Infinity"] {
            let params = Parameters::new().with("p_psi0", text);
            let err = params.real_or("p_psi0", 0.5).unwrap_err();
            assert_eq!(err.field_path(), Some("parameters.p_psi0"));
        }
        let params = Parameters::new().with("p_psi1", f64::INFINITY);
        assert!(params.real_or("p_psi1", 0.5).is_err());
    }

    #[test]
    fn test_count_or_parses_integral_text() {
        let params = Parameters::new().with("N", " 4096 ");
        assert_eq!(params.count_or("N", 1000).unwrap(), 4096);
        let params = Parameters::new().with("N", "4096.5");
        assert!(params.count_or("N", 1000).is_err());
    }

    #[test]
    fn test_size_queries() {
        let mut params = Parameters::new();
        assert!(params.is_empty());
        assert!(!params.contains("N"));
        params.insert("N", 1000_i64);
        params.insert("N", 2000_i64);
        assert!(params.contains("N"));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("N"), Some(&ParamValue::Integer(2000)));
    }

    #[test]
    fn test_count_or_default_when_absent() {
        assert_eq!(Parameters::new().count_or("N", 1000).unwrap(), 1000);
    }

    #[test]
    fn test_count_or_accepts_integral_float() {
        let params = Parameters::new().with("N", 2048.0);
        assert_eq!(params.count_or("N", 1000).unwrap(), 2048);
    }

    #[test]
    fn test_count_or_rejects_fractional_float() {
        let params = Parameters::new().with("N", 10.5);
        let err = params.count_or("N", 1000).unwrap_err();
        assert_eq!(err.field_path(), Some("parameters.N"));
    }

    #[test]
    fn test_count_or_rejects_negative() {
        let params = Parameters::new().with("N", -3_i64);
        assert!(params.count_or("N", 1000).is_err());
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let params = Parameters::new()
            .with("p_psi1", 0.5)
            .with("N", 1000_i64)
            .with("p_psi0", 0.5);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["N", "p_psi0", "p_psi1"]);
    }
}
