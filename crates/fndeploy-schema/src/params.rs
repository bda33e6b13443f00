use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Keywords that may appear in the multi-line parameter form.
const DECLARATION_KEYS: &[&str] = &["type", "value", "default", "description", "required"];

/// A named input or output declaration.
///
/// Parameters come in two shapes: the single-line form `name: <value>` and the
/// multi-line form, a mapping built only from [`DECLARATION_KEYS`] that names
/// at least one of `type`, `value` or `default`. Any other mapping is treated
/// as a literal JSON-like value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamSpec {
    Declared(ParamDeclaration),
    Value(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDeclaration {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl ParamSpec {
    /// The literal value carried by the declaration, ignoring its type.
    ///
    /// Deployment descriptors only supply values, so this is what the
    /// override merge reads.
    pub fn raw_value(&self) -> Option<&Value> {
        match self {
            Self::Declared(decl) => decl.value.as_ref().or(decl.default.as_ref()),
            Self::Value(Value::Null) => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl<'de> Deserialize<'de> for ParamSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        if is_declaration(&raw) {
            serde_yaml::from_value(raw)
                .map(ParamSpec::Declared)
                .map_err(serde::de::Error::custom)
        } else {
            Ok(ParamSpec::Value(raw))
        }
    }
}

fn is_declaration(raw: &Value) -> bool {
    let Value::Mapping(map) = raw else {
        return false;
    };
    let keys: Vec<Option<&str>> = map.keys().map(Value::as_str).collect();
    !keys.is_empty()
        && keys
            .iter()
            .all(|k| k.is_some_and(|k| DECLARATION_KEYS.contains(&k)))
        && keys
            .iter()
            .any(|k| matches!(k, Some("type" | "value" | "default")))
}
