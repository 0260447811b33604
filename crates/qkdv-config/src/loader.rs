//! Configuration loader: TOML/YAML documents into [`ProtocolConfig`].
//!
//! Both surface formats are first parsed into the same document tree
//! (`serde_json::Value`). Everything after that point is format-agnostic, so
//! an equivalent TOML and YAML document always produce equal configs.
//!
//! Field access goes through `Node`, a cursor that remembers its dotted
//! path so every validation error names the exact offending field
//! (`device.eta`, `states[1].vec[0].re`, ...).

use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    ComplexNumber, Device, ErrorCorrection, Measurements, MetaInfo, Observed, POVMElement,
    Postprocessing, PrivacyAmplification, ProtocolConfig, SecurityGoal, State,
};
use crate::params::{ParamValue, Parameters};

/// Key the `toml` deserializer uses to carry native date/time values.
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// Supported surface formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Map a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Detect the format of a config path from its extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: ext.to_string(),
        })
    }

    /// Parse source text into the shared document tree.
    pub fn parse(self, source: &str) -> ConfigResult<Value> {
        let parsed = match self {
            Self::Toml => toml::from_str::<Value>(source).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml_ng::from_str::<Value>(source).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            format: self,
            message,
        })
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => write!(f, "TOML"),
            Self::Yaml => write!(f, "YAML"),
        }
    }
}

/// Load a protocol configuration from a `.toml`, `.yaml` or `.yml` file.
pub fn load(path: impl AsRef<Path>) -> ConfigResult<ProtocolConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let format = ConfigFormat::from_path(path)?;
    debug!("Loading {} config from {}", format, path.display());

    let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_str(&source, format)?;

    info!(
        "Loaded protocol '{}' ({} states, {} POVM elements)",
        config.name,
        config.states.len(),
        config.measurements.povm.len()
    );
    Ok(config)
}

/// Parse a protocol configuration from source text in the given format.
pub fn from_str(source: &str, format: ConfigFormat) -> ConfigResult<ProtocolConfig> {
    let document = format.parse(source)?;
    from_document(&document)
}

/// Map an already-parsed document tree onto the protocol model.
pub fn from_document(document: &Value) -> ConfigResult<ProtocolConfig> {
    let root = Node::root(document);
    root.expect_map()?;

    let identity = resolve_identity(&root)?;

    Ok(ProtocolConfig {
        name: identity.name,
        description: identity.description,
        parameters: parameters(&root)?,
        states: states(&root)?,
        measurements: measurements(&root)?,
        device: device(&root)?,
        postprocessing: postprocessing(&root)?,
        observed: observed(&root)?,
        security_goal: security_goal(&root)?,
        meta: meta(&root)?,
    })
}

// ============================================================================
// Identity resolution
// ============================================================================

/// Protocol name and description.
#[derive(Debug)]
struct Identity {
    name: String,
    description: String,
}

/// A resolution stage: `None` when the stage does not apply to the document.
type IdentityResolver = fn(&Node<'_>) -> Option<ConfigResult<Identity>>;

/// Stages in priority order: the `protocol` section, then the legacy flat
/// top-level `name`.
const IDENTITY_RESOLVERS: [IdentityResolver; 2] = [identity_from_section, identity_from_flat];

fn resolve_identity(root: &Node<'_>) -> ConfigResult<Identity> {
    for resolve in IDENTITY_RESOLVERS {
        if let Some(identity) = resolve(root) {
            return identity;
        }
    }
    Err(ConfigError::validation(
        "protocol.name",
        "missing protocol name (expected a `protocol` section or a top-level `name`)",
    ))
}

fn identity_from_section(root: &Node<'_>) -> Option<ConfigResult<Identity>> {
    let section = root.optional("protocol")?;
    Some(section.expect_map().and_then(|()| {
        Ok(Identity {
            name: section.string("name")?,
            description: section.optional_string("description")?.unwrap_or_default(),
        })
    }))
}

fn identity_from_flat(root: &Node<'_>) -> Option<ConfigResult<Identity>> {
    let name = root.optional("name")?;
    Some(name.as_string().and_then(|name| {
        Ok(Identity {
            name,
            description: root.optional_string("description")?.unwrap_or_default(),
        })
    }))
}

// ============================================================================
// Sections
// ============================================================================

fn parameters(root: &Node<'_>) -> ConfigResult<Parameters> {
    let Some(section) = root.optional("parameters") else {
        return Ok(Parameters::new());
    };
    section
        .entries()?
        .into_iter()
        .map(|(key, node)| -> ConfigResult<(String, ParamValue)> {
            Ok((key.to_string(), node.as_param()?))
        })
        .collect()
}

fn states(root: &Node<'_>) -> ConfigResult<Vec<State>> {
    let Some(list) = root.optional("states") else {
        return Ok(Vec::new());
    };
    list.items()?
        .iter()
        .map(|state| -> ConfigResult<State> {
            state.expect_map()?;
            Ok(State {
                label: state.string("label")?,
                p: state.real("p")?,
                vec: state
                    .field("vec")?
                    .items()?
                    .iter()
                    .map(Node::as_complex)
                    .collect::<ConfigResult<_>>()?,
            })
        })
        .collect()
}

fn measurements(root: &Node<'_>) -> ConfigResult<Measurements> {
    let Some(section) = root.optional("measurements") else {
        return Ok(Measurements::default());
    };
    section.expect_map()?;

    let normalize = match section.optional("normalize") {
        Some(flag) => flag.as_bool()?,
        None => true,
    };
    let povm = match section.optional("povm") {
        Some(list) => list
            .items()?
            .iter()
            .map(|element| -> ConfigResult<POVMElement> {
                element.expect_map()?;
                Ok(POVMElement {
                    label: element.string("label")?,
                    matrix: element.field("matrix")?.as_matrix()?,
                })
            })
            .collect::<ConfigResult<_>>()?,
        None => Vec::new(),
    };

    Ok(Measurements { normalize, povm })
}

fn device(root: &Node<'_>) -> ConfigResult<Device> {
    let section = root.section("device")?;
    Ok(Device {
        eta: section.real("eta")?,
        dark_count: section.real("dark_count")?,
        detector_efficiency: section.real("detector_efficiency")?,
    })
}

fn postprocessing(root: &Node<'_>) -> ConfigResult<Postprocessing> {
    let section = root.section("postprocessing")?;

    let ec = section.section("error_correction")?;
    let error_correction = ErrorCorrection {
        scheme: ec.string("scheme")?,
        target_ferr: ec.real("target_ferr")?,
        inefficiency_f: ec.real("inefficiency_f")?,
    };

    let pa = section.section("privacy_amplification")?;
    let privacy_amplification = PrivacyAmplification {
        method: pa.string("method")?,
        hash_family: pa.string("hash_family")?,
        security_parameter: pa.real("security_parameter")?,
    };

    Ok(Postprocessing {
        sifting: section.string("sifting")?,
        error_correction,
        privacy_amplification,
    })
}

fn observed(root: &Node<'_>) -> ConfigResult<Observed> {
    let section = root.section("observed")?;
    Ok(Observed {
        p_conclusive: section.real("p_conclusive")?,
        error_rate_conclusive: section.real("error_rate_conclusive")?,
        p_inconclusive: section.real("p_inconclusive")?,
    })
}

fn security_goal(root: &Node<'_>) -> ConfigResult<SecurityGoal> {
    let section = root.section("security_goal")?;
    Ok(SecurityGoal {
        output: section.string("output")?,
        epsilon: section.real("epsilon")?,
        formula_hint: section.string("formula_hint")?,
    })
}

fn meta(root: &Node<'_>) -> ConfigResult<MetaInfo> {
    let section = root.section("meta")?;
    Ok(MetaInfo {
        author: section.string("author")?,
        email: section.string("email")?,
        date: section.string("date")?,
        notes: section.string("notes")?,
    })
}

// ============================================================================
// Path-tracking cursor
// ============================================================================

/// A value in the document tree together with its field path.
#[derive(Debug, Clone)]
struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> Node<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            value,
            path: String::new(),
        }
    }

    fn display_path(&self) -> &str {
        if self.path.is_empty() { "<root>" } else { &self.path }
    }

    fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::validation(self.display_path(), message)
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        }
    }

    fn as_map(&self) -> ConfigResult<&'a Map<String, Value>> {
        self.value
            .as_object()
            .ok_or_else(|| self.invalid(format!("expected a mapping, found {}", kind(self.value))))
    }

    fn expect_map(&self) -> ConfigResult<()> {
        self.as_map().map(|_| ())
    }

    /// Child node, or `None` when absent or null.
    fn optional(&self, key: &str) -> Option<Node<'a>> {
        let value = self.value.as_object()?.get(key)?;
        if value.is_null() {
            return None;
        }
        Some(Node {
            value,
            path: self.child_path(key),
        })
    }

    /// Required child node.
    ///
    /// Native `nan`/`inf` literals reach the tree as null, so a present
    /// null is reported separately from a missing key.
    fn field(&self, key: &str) -> ConfigResult<Node<'a>> {
        let map = self.as_map()?;
        match map.get(key) {
            None => Err(ConfigError::validation(
                self.child_path(key),
                "missing required field",
            )),
            Some(Value::Null) => Err(ConfigError::validation(
                self.child_path(key),
                "value is null or not a finite number",
            )),
            Some(value) => Ok(Node {
                value,
                path: self.child_path(key),
            }),
        }
    }

    /// Required child mapping.
    fn section(&self, key: &str) -> ConfigResult<Node<'a>> {
        let node = self.field(key)?;
        node.expect_map()?;
        Ok(node)
    }

    fn entries(&self) -> ConfigResult<Vec<(&'a str, Node<'a>)>> {
        Ok(self
            .as_map()?
            .iter()
            .map(|(key, value)| {
                (
                    key.as_str(),
                    Node {
                        value,
                        path: self.child_path(key),
                    },
                )
            })
            .collect())
    }

    fn items(&self) -> ConfigResult<Vec<Node<'a>>> {
        let items = self
            .value
            .as_array()
            .ok_or_else(|| self.invalid(format!("expected a sequence, found {}", kind(self.value))))?;
        Ok(items
            .iter()
            .enumerate()
            .map(|(i, value)| Node {
                value,
                path: format!("{}[{i}]", self.path),
            })
            .collect())
    }

    fn real(&self, key: &str) -> ConfigResult<f64> {
        self.field(key)?.as_f64()
    }

    fn string(&self, key: &str) -> ConfigResult<String> {
        self.field(key)?.as_string()
    }

    fn optional_string(&self, key: &str) -> ConfigResult<Option<String>> {
        self.optional(key).map(|node| node.as_string()).transpose()
    }

    /// Finite numbers, or strings holding one. `"NaN"` and `"inf"` are
    /// rejected.
    fn as_f64(&self) -> ConfigResult<f64> {
        let value = match self.value {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| self.invalid(format!("number {n} is not representable as f64")))?,
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| self.invalid(format!("expected a number, found string {s:?}")))?,
            other => return Err(self.invalid(format!("expected a number, found {}", kind(other)))),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(self.invalid(format!("expected a finite number, found {value}")))
        }
    }

    /// Strings, or scalars rendered as text. TOML native dates render to
    /// their RFC 3339 form.
    fn as_string(&self) -> ConfigResult<String> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Object(map) => match (map.len(), map.get(TOML_DATETIME_KEY)) {
                (1, Some(Value::String(datetime))) => Ok(datetime.clone()),
                _ => Err(self.invalid("expected a string, found mapping")),
            },
            other => Err(self.invalid(format!("expected a string, found {}", kind(other)))),
        }
    }

    fn as_bool(&self) -> ConfigResult<bool> {
        self.value
            .as_bool()
            .ok_or_else(|| self.invalid(format!("expected a bool, found {}", kind(self.value))))
    }

    /// `{re, im}` mapping.
    fn as_complex(&self) -> ConfigResult<ComplexNumber> {
        self.expect_map()?;
        Ok(ComplexNumber::new(self.real("re")?, self.real("im")?))
    }

    /// Rectangular 2-D sequence of `{re, im}` mappings.
    fn as_matrix(&self) -> ConfigResult<Vec<Vec<ComplexNumber>>> {
        let rows = self
            .items()?
            .iter()
            .map(|row| -> ConfigResult<Vec<ComplexNumber>> {
                row.items()?.iter().map(Node::as_complex).collect()
            })
            .collect::<ConfigResult<Vec<Vec<ComplexNumber>>>>()?;

        if let Some(first) = rows.first() {
            let width = first.len();
            if let Some(i) = rows.iter().position(|row| row.len() != width) {
                return Err(ConfigError::validation(
                    format!("{}[{i}]", self.path),
                    format!(
                        "ragged matrix: row has {} entries, expected {width}",
                        rows[i].len()
                    ),
                ));
            }
        }
        Ok(rows)
    }

    fn as_param(&self) -> ConfigResult<ParamValue> {
        match self.value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(ParamValue::Integer(i)),
                None => n
                    .as_f64()
                    .map(ParamValue::Float)
                    .ok_or_else(|| self.invalid(format!("number {n} is not representable"))),
            },
            Value::Bool(b) => Ok(ParamValue::Bool(*b)),
            Value::String(s) => Ok(ParamValue::Text(s.clone())),
            other => Err(self.invalid(format!(
                "parameters must be scalars, found {}",
                kind(other)
            ))),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = r"
name: B92
parameters:
  N: 500
device: {eta: 0.9, dark_count: 1.0e-6, detector_efficiency: 0.8}
postprocessing:
  sifting: standard
  error_correction: {scheme: LDPC, target_ferr: 0.001, inefficiency_f: 1.16}
  privacy_amplification: {method: toeplitz, hash_family: universal2, security_parameter: 1.0e-10}
observed: {p_conclusive: 0.25, error_rate_conclusive: 0.05, p_inconclusive: 0.75}
security_goal: {output: key, epsilon: 1.0e-6, formula_hint: 'l <= n(1 - h(delta_ph))'}
meta: {author: lab, email: lab@example.org, date: '2025-01-01', notes: none}
";

    fn yaml(source: &str) -> ConfigResult<ProtocolConfig> {
        from_str(source, ConfigFormat::Yaml)
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("YAML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("yml"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigFormat::from_path(Path::new("protocol.json")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { ref extension, .. } if extension == "json"));
    }

    #[test]
    fn test_flat_name_fallback() {
        let config = yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.name, "B92");
        assert_eq!(config.description, "");
        assert!(config.states.is_empty());
        assert!(config.measurements.normalize);
    }

    #[test]
    fn test_protocol_section_wins_over_flat_name() {
        let source = format!(
            "protocol: {{name: B92-section, description: two states}}\n{MINIMAL_YAML}"
        );
        let config = yaml(&source).unwrap();
        assert_eq!(config.name, "B92-section");
        assert_eq!(config.description, "two states");
    }

    #[test]
    fn test_protocol_section_without_name() {
        let source = format!("protocol: {{description: nameless}}\n{MINIMAL_YAML}");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("protocol.name"));
    }

    #[test]
    fn test_missing_name_everywhere() {
        let source = MINIMAL_YAML.replace("name: B92\n", "");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("protocol.name"));
    }

    #[test]
    fn test_missing_device_field_names_path() {
        let source = MINIMAL_YAML.replace("eta: 0.9, ", "");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("device.eta"));
    }

    #[test]
    fn test_missing_section() {
        let source = MINIMAL_YAML.replace(
            "observed: {p_conclusive: 0.25, error_rate_conclusive: 0.05, p_inconclusive: 0.75}\n",
            "",
        );
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("observed"));
    }

    #[test]
    fn test_non_numeric_field() {
        let source = MINIMAL_YAML.replace("epsilon: 1.0e-6", "epsilon: tiny");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("security_goal.epsilon"));
    }

    #[test]
    fn test_numeric_string_coerces() {
        let source = MINIMAL_YAML.replace("eta: 0.9", "eta: '0.9'");
        let config = yaml(&source).unwrap();
        assert_eq!(config.device.eta, 0.9);
    }

    #[test]
    fn test_nan_string_rejected() {
        let source = MINIMAL_YAML.replace("error_rate_conclusive: 0.05", "error_rate_conclusive: 'NaN'");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("observed.error_rate_conclusive"));
    }

    #[test]
    fn test_infinite_string_rejected() {
        for text in ["'inf'", "'-infinity'"] {
            let source = MINIMAL_YAML.replace(
                "error_rate_conclusive: 0.05",
                &format!("error_rate_conclusive: {text}"),
            );
            let err = yaml(&source).unwrap_err();
            assert_eq!(err.field_path(), Some("observed.error_rate_conclusive"));
        }
    }

    #[test]
    fn test_native_nan_reports_non_finite() {
        let source = MINIMAL_YAML.replace("error_rate_conclusive: 0.05", "error_rate_conclusive: .nan");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("observed.error_rate_conclusive"));
        assert!(err.to_string().contains("not a finite number"), "{err}");
    }

    #[test]
    fn test_missing_field_message() {
        let source = MINIMAL_YAML.replace(", p_inconclusive: 0.75", "");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("observed.p_inconclusive"));
        assert!(err.to_string().contains("missing required field"), "{err}");
    }

    #[test]
    fn test_states_and_vectors() {
        let source = format!(
            "{MINIMAL_YAML}states:\n  - label: psi0\n    p: 0.5\n    vec: [{{re: 1.0, im: 0.0}}, {{re: 0.0, im: 0.0}}]\n"
        );
        let config = yaml(&source).unwrap();
        assert_eq!(config.states.len(), 1);
        assert_eq!(config.states[0].vec[0], ComplexNumber::new(1.0, 0.0));
    }

    #[test]
    fn test_bad_complex_entry_path() {
        let source = format!(
            "{MINIMAL_YAML}states:\n  - label: psi0\n    p: 0.5\n    vec: [{{re: 1.0}}]\n"
        );
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("states[0].vec[0].im"));
    }

    #[test]
    fn test_ragged_matrix_rejected() {
        let source = format!(
            "{MINIMAL_YAML}measurements:\n  povm:\n    - label: E0\n      matrix:\n        - [{{re: 1, im: 0}}, {{re: 0, im: 0}}]\n        - [{{re: 0, im: 0}}]\n"
        );
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("measurements.povm[0].matrix[1]"));
    }

    #[test]
    fn test_parameters_typed() {
        let config = yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.parameters.get("N"), Some(&ParamValue::Integer(500)));
    }

    #[test]
    fn test_nested_parameter_rejected() {
        let source = MINIMAL_YAML.replace("  N: 500", "  N: [1, 2]");
        let err = yaml(&source).unwrap_err();
        assert_eq!(err.field_path(), Some("parameters.N"));
    }

    #[test]
    fn test_root_must_be_mapping() {
        let err = yaml("- 1\n- 2\n").unwrap_err();
        assert_eq!(err.field_path(), Some("<root>"));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = from_str("[protocol\nname = ", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: ConfigFormat::Toml, .. }));
    }

    #[test]
    fn test_toml_native_date() {
        let source = r#"
name = "B92"
[device]
eta = 0.9
dark_count = 1e-6
detector_efficiency = 0.8
[postprocessing]
sifting = "standard"
[postprocessing.error_correction]
scheme = "LDPC"
target_ferr = 0.001
inefficiency_f = 1.16
[postprocessing.privacy_amplification]
method = "toeplitz"
hash_family = "universal2"
security_parameter = 1e-10
[observed]
p_conclusive = 0.25
error_rate_conclusive = 0.05
p_inconclusive = 0.75
[security_goal]
output = "key"
epsilon = 1e-6
formula_hint = "none"
[meta]
author = "lab"
email = "lab@example.org"
date = 2025-01-01
notes = "none"
"#;
        let config = from_str(source, ConfigFormat::Toml).unwrap();
        assert_eq!(config.meta.date, "2025-01-01");
    }
}
