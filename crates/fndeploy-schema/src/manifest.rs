use crate::apis::ApiSpec;
use crate::params::ParamSpec;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to parse {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("api '{api}' uses unsupported HTTP method '{method}'")]
    InvalidApiMethod { api: String, method: String },
}

/// A decoded manifest or deployment descriptor.
///
/// Both documents share one shape: a deployment descriptor simply omits the
/// executable definitions and carries only `inputs` and `annotations`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ManifestDocument {
    /// Deprecated single-package form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, PackageSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSpec>,
    /// Path of the file this document was decoded from. Empty for inline input.
    #[serde(skip)]
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, PackageSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PackageSpec {
    /// Only meaningful for the single-package form; map entries are named by their key.
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub license: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionSpec>,
    #[serde(default)]
    pub sequences: BTreeMap<String, SequenceSpec>,
    #[serde(default)]
    pub triggers: BTreeMap<String, TriggerSpec>,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSpec>,
    #[serde(default)]
    pub apis: BTreeMap<String, ApiSpec>,
    #[serde(default, alias = "parameters")]
    pub inputs: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    #[serde(default)]
    pub function: String,
    /// Deprecated alias of `function`.
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub runtime: String,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, alias = "parameters")]
    pub inputs: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub outputs: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
    /// One of `true`, `false`, `yes`, `no`, `raw` or empty.
    #[serde(default, rename = "web-export", deserialize_with = "scalar_string")]
    pub web_export: String,
    #[serde(default)]
    pub limits: Option<LimitsSpec>,
}

impl ActionSpec {
    /// The source path, falling back to the deprecated `location` key.
    pub fn source(&self) -> &str {
        if self.function.is_empty() {
            &self.location
        } else {
            &self.function
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LimitsSpec {
    pub timeout: Option<i64>,
    pub memory_size: Option<i64>,
    pub log_size: Option<i64>,
    pub concurrent_activations: Option<i64>,
    pub user_invocation_rate: Option<i64>,
    pub code_size: Option<i64>,
    pub parameter_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SequenceSpec {
    /// Comma-separated, ordered list of action references.
    #[serde(default)]
    pub actions: String,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TriggerSpec {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub feed: String,
    /// Deprecated alias of `feed`.
    #[serde(default)]
    pub source: String,
    #[serde(default, alias = "parameters")]
    pub inputs: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default)]
    pub namespace: String,
    pub trigger: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default, alias = "parameters")]
    pub inputs: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

/// Accept any YAML scalar for a string field, so `version: 1.2` or
/// `web-export: true` decode the same as their quoted forms.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar value, found {other:?}"
        ))),
    }
}

pub fn parse_manifest_str(input: &str) -> Result<ManifestDocument, ManifestError> {
    Ok(serde_yaml::from_str(input)?)
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<ManifestDocument, ManifestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut document: ManifestDocument =
        serde_yaml::from_str(&content).map_err(|source| ManifestError::ParseFile {
            path: path.to_path_buf(),
            source,
        })?;
    document.file_path = path.to_path_buf();
    Ok(document)
}
