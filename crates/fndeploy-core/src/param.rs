use crate::entity::KeyValue;
use crate::ComposeError;
use fndeploy_schema::{Interpolator, ParamDeclaration, ParamSpec};
use serde_json::{Map, Number, Value as Json};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

const PARAM_TYPES: &[&str] = &["string", "integer", "float", "boolean", "json"];

/// Resolve one input or output declaration.
///
/// Variable references are interpolated first, recursively through nested
/// values. A declared type with nothing to resolve yields the type's zero
/// value; no type and no value yields `None`, and callers omit the entry.
pub fn resolve_param(
    name: &str,
    spec: &ParamSpec,
    file_path: &Path,
    interpolator: &Interpolator,
) -> Result<Option<Json>, ComposeError> {
    match spec {
        ParamSpec::Value(raw) => Ok(non_null(yaml_to_json(
            &interpolator.interpolate_value(raw),
        ))),
        ParamSpec::Declared(decl) => resolve_declared(name, decl, file_path, interpolator),
    }
}

fn resolve_declared(
    name: &str,
    decl: &ParamDeclaration,
    file_path: &Path,
    interpolator: &Interpolator,
) -> Result<Option<Json>, ComposeError> {
    let failure = |reason: String| ComposeError::ParameterResolution {
        name: name.to_owned(),
        path: file_path.to_path_buf(),
        reason,
    };

    let kind = match decl.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(k) => {
            let k = k.to_lowercase();
            if !PARAM_TYPES.contains(&k.as_str()) {
                return Err(failure(format!("unsupported type '{k}'")));
            }
            Some(k)
        }
        None => None,
    };

    let raw = [decl.value.as_ref(), decl.default.as_ref()]
        .into_iter()
        .flatten()
        .find(|v| !v.is_null())
        .and_then(|v| non_null(yaml_to_json(&interpolator.interpolate_value(v))));

    match (kind.as_deref(), raw) {
        (None, raw) => Ok(raw),
        (Some(kind), None) => Ok(Some(zero_value(kind))),
        (Some(kind), Some(value)) => coerce(kind, value).map(Some).map_err(failure),
    }
}

fn zero_value(kind: &str) -> Json {
    match kind {
        "integer" => Json::from(0),
        "float" => Json::from(0.0),
        "boolean" => Json::Bool(false),
        "json" => Json::Object(Map::new()),
        _ => Json::String(String::new()),
    }
}

/// Check `value` against the declared type. Strings, which is what
/// interpolated references produce, are parsed into the declared type.
fn coerce(kind: &str, value: Json) -> Result<Json, String> {
    let mismatch = |found: &Json| format!("expected {kind}, found {}", describe(found));
    match (kind, value) {
        ("string", v @ Json::String(_)) | ("boolean", v @ Json::Bool(_)) => Ok(v),
        ("json", v @ (Json::Object(_) | Json::Array(_))) => Ok(v),
        ("integer", Json::Number(n)) if n.is_i64() || n.is_u64() => Ok(Json::Number(n)),
        ("float", Json::Number(n)) => Ok(Json::Number(n)),
        ("integer", Json::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Json::from)
            .map_err(|_| format!("expected integer, found '{s}'")),
        ("float", Json::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Json::Number)
            .ok_or_else(|| format!("expected float, found '{s}'")),
        ("boolean", Json::String(s)) => match s.trim() {
            "true" => Ok(Json::Bool(true)),
            "false" => Ok(Json::Bool(false)),
            _ => Err(format!("expected boolean, found '{s}'")),
        },
        ("json", Json::String(s)) => {
            serde_json::from_str(&s).map_err(|e| format!("invalid json value: {e}"))
        }
        (_, other) => Err(mismatch(&other)),
    }
}

fn describe(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(n) if n.is_f64() => "float",
        Json::Number(_) => "integer",
        Json::String(_) => "string",
        Json::Array(_) => "sequence",
        Json::Object(_) => "mapping",
    }
}

fn non_null(value: Json) -> Option<Json> {
    (!value.is_null()).then_some(value)
}

/// Resolve a whole input map into a parameter list, omitting `None` results.
pub fn resolve_params(
    inputs: &BTreeMap<String, ParamSpec>,
    file_path: &Path,
    interpolator: &Interpolator,
) -> Result<Vec<KeyValue>, ComposeError> {
    let mut params = Vec::with_capacity(inputs.len());
    for (name, spec) in inputs {
        if let Some(value) = resolve_param(name, spec, file_path, interpolator)? {
            params.push(KeyValue::new(name.clone(), value));
        }
    }
    Ok(params)
}

/// Annotations only go through variable interpolation. Null values are dropped.
pub fn resolve_annotations(
    annotations: &BTreeMap<String, Yaml>,
    interpolator: &Interpolator,
) -> Vec<KeyValue> {
    annotations
        .iter()
        .filter_map(|(name, raw)| {
            non_null(yaml_to_json(&interpolator.interpolate_value(raw)))
                .map(|value| KeyValue::new(name.clone(), value))
        })
        .collect()
}

/// Convert a decoded YAML value into the JSON shape the platform expects.
///
/// Tags are dropped. Non-scalar mapping keys cannot be represented and are
/// skipped with a warning.
pub fn yaml_to_json(value: &Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(*b),
        Yaml::Number(n) => number_to_json(n),
        Yaml::String(s) => Json::String(s.clone()),
        Yaml::Sequence(items) => Json::Array(items.iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Json::Object(
            map.iter()
                .filter_map(|(k, v)| Some((mapping_key(k)?, yaml_to_json(v))))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

fn number_to_json(n: &serde_yaml::Number) -> Json {
    if let Some(i) = n.as_i64() {
        return Json::from(i);
    }
    if let Some(u) = n.as_u64() {
        return Json::from(u);
    }
    n.as_f64()
        .and_then(Number::from_f64)
        .map_or(Json::Null, Json::Number)
}

fn mapping_key(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        other => {
            warn!("dropping non-scalar mapping key {other:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(yaml: &str) -> ParamSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn resolve(yaml: &str, interpolator: &Interpolator) -> Result<Option<Json>, ComposeError> {
        resolve_param("p", &spec(yaml), Path::new("manifest.yaml"), interpolator)
    }

    fn plain(yaml: &str) -> Option<Json> {
        resolve(yaml, &Interpolator::default()).unwrap()
    }

    #[test]
    fn single_line_values_keep_their_type() {
        assert_eq!(plain("hello"), Some(json!("hello")));
        assert_eq!(plain("42"), Some(json!(42)));
        assert_eq!(plain("true"), Some(json!(true)));
        assert_eq!(plain("{a: 1, b: [x, y]}"), Some(json!({"a": 1, "b": ["x", "y"]})));
        assert_eq!(plain("~"), None);
    }

    #[test]
    fn declared_value_then_default() {
        assert_eq!(plain("{type: string, value: a, default: b}"), Some(json!("a")));
        assert_eq!(plain("{type: string, default: b}"), Some(json!("b")));
        assert_eq!(plain("{value: 7}"), Some(json!(7)));
    }

    #[test]
    fn declared_type_without_value_is_zero() {
        assert_eq!(plain("{type: string}"), Some(json!("")));
        assert_eq!(plain("{type: integer}"), Some(json!(0)));
        assert_eq!(plain("{type: float}"), Some(json!(0.0)));
        assert_eq!(plain("{type: boolean}"), Some(json!(false)));
        assert_eq!(plain("{type: json}"), Some(json!({})));
        assert_eq!(plain("{description: nothing here, default: ~}"), None);
    }

    #[test]
    fn environment_references_are_substituted_and_coerced() {
        let env = Interpolator::isolated(BTreeMap::new())
            .with_var("PORT", "8080")
            .with_var("USER_NAME", "ada");
        assert_eq!(
            resolve("{type: integer, value: $PORT}", &env).unwrap(),
            Some(json!(8080))
        );
        assert_eq!(
            resolve("{type: string, value: \"hi ${USER_NAME}\"}", &env).unwrap(),
            Some(json!("hi ada"))
        );
        assert_eq!(
            resolve("{nested: [\"$USER_NAME\"]}", &env).unwrap(),
            Some(json!({"nested": ["ada"]}))
        );
    }

    #[test]
    fn type_mismatch_is_an_error() {
        let err = resolve("{type: integer, value: many}", &Interpolator::default()).unwrap_err();
        match err {
            ComposeError::ParameterResolution { name, path, reason } => {
                assert_eq!(name, "p");
                assert_eq!(path, Path::new("manifest.yaml"));
                assert!(reason.contains("integer"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(resolve("{type: boolean, value: 3}", &Interpolator::default()).is_err());
    }

    #[test]
    fn unknown_type_is_an_error() {
        assert!(resolve("{type: decimal, value: 3}", &Interpolator::default()).is_err());
    }

    #[test]
    fn json_strings_are_parsed() {
        assert_eq!(
            plain("{type: json, value: '{\"k\": [1, 2]}'}"),
            Some(json!({"k": [1, 2]}))
        );
    }

    #[test]
    fn resolve_params_omits_nil_entries() {
        let inputs: BTreeMap<String, ParamSpec> =
            serde_yaml::from_str("{a: 1, b: ~, c: {type: string}}").unwrap();
        let params = resolve_params(&inputs, Path::new("m.yaml"), &Interpolator::default()).unwrap();
        assert_eq!(
            params,
            vec![KeyValue::new("a", 1), KeyValue::new("c", "")]
        );
    }

    #[test]
    fn annotations_are_interpolated() {
        let annotations: BTreeMap<String, Yaml> =
            serde_yaml::from_str("{owner: $TEAM, empty: ~}").unwrap();
        let env = Interpolator::isolated(BTreeMap::new()).with_var("TEAM", "infra");
        assert_eq!(
            resolve_annotations(&annotations, &env),
            vec![KeyValue::new("owner", "infra")]
        );
    }
}
