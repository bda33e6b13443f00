use fndeploy_schema::ApiDoc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single parameter or annotation entry. Keys are unique within a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Value,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

pub fn find_key<'a>(list: &'a [KeyValue], key: &str) -> Option<&'a KeyValue> {
    list.iter().find(|kv| kv.key == key)
}

pub fn remove_key(list: &mut Vec<KeyValue>, key: &str) {
    list.retain(|kv| kv.key != key);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub namespace: String,
    pub publish: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
}

/// Executable payload of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exec {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Fully-qualified component paths, in execution order. Sequences only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
    #[serde(default)]
    pub binary: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<i64>,
}

impl Limits {
    pub fn is_empty(&self) -> bool {
        self.timeout.is_none() && self.memory.is_none() && self.logs.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub namespace: String,
    pub publish: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<Exec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Limits>,
}

impl Action {
    pub fn kind(&self) -> Option<&str> {
        self.exec.as_ref().map(|e| e.kind.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub name: String,
    pub namespace: String,
    pub publish: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub namespace: String,
    pub publish: bool,
    pub trigger: String,
    /// Package-qualified action reference.
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCreateRequest {
    pub api_doc: ApiDoc,
}

/// A composed action together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: Action,
    pub package_name: String,
    /// Resolved source path for code actions, the sequence name for sequences,
    /// empty for stub actions.
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// A system-provided package referenced by path.
    Binding,
    /// A package fetched from a repository.
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Checkout directory for remote packages.
    pub project_path: PathBuf,
    pub package_name: String,
    pub location: String,
    pub version: String,
    pub kind: DependencyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<KeyValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<KeyValue>,
}

impl DependencyRecord {
    pub fn is_binding(&self) -> bool {
        self.kind == DependencyKind::Binding
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePlan {
    pub package: Package,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionRecord>,
    #[serde(default)]
    pub sequences: BTreeMap<String, ActionRecord>,
}

impl PackagePlan {
    pub fn new(package: Package) -> Self {
        Self {
            package,
            actions: BTreeMap::new(),
            sequences: BTreeMap::new(),
        }
    }
}

/// Everything composed from one manifest document.
///
/// Triggers and rules are deployment-wide on the platform, so they are kept
/// outside the per-package plans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub packages: BTreeMap<String, PackagePlan>,
    #[serde(default)]
    pub triggers: BTreeMap<String, Trigger>,
    #[serde(default)]
    pub rules: BTreeMap<String, Rule>,
    #[serde(default)]
    pub apis: Vec<ApiCreateRequest>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyRecord>,
}

impl DeploymentPlan {
    pub fn action_count(&self) -> usize {
        self.packages.values().map(|p| p.actions.len()).sum()
    }

    pub fn sequence_count(&self) -> usize {
        self.packages.values().map(|p| p.sequences.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remove_key_drops_every_match() {
        let mut list = vec![
            KeyValue::new("a", 1),
            KeyValue::new("b", 2),
            KeyValue::new("a", 3),
        ];
        remove_key(&mut list, "a");
        assert_eq!(list, vec![KeyValue::new("b", 2)]);
        assert!(find_key(&list, "a").is_none());
        assert_eq!(find_key(&list, "b").map(|kv| &kv.value), Some(&json!(2)));
    }

    #[test]
    fn exec_omits_empty_fields() {
        let exec = Exec {
            kind: "nodejs:6".to_owned(),
            code: Some("x".to_owned()),
            ..Exec::default()
        };
        let v = serde_json::to_value(&exec).unwrap();
        assert_eq!(v, json!({"kind": "nodejs:6", "code": "x", "binary": false}));
    }

    #[test]
    fn empty_limits() {
        assert!(Limits::default().is_empty());
        assert!(!Limits {
            memory: Some(256),
            ..Limits::default()
        }
        .is_empty());
    }
}
