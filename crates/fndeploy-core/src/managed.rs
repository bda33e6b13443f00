use crate::entity::KeyValue;
use crate::ComposeError;
use fndeploy_schema::ManifestDocument;
use serde_json::json;

pub const MANAGED_ANNOTATION: &str = "whisk-managed";

/// Deterministic digest of a manifest document.
///
/// Hashes the canonical YAML rendering, so formatting and comments in the
/// source file do not change the result.
pub fn project_hash(document: &ManifestDocument) -> Result<String, ComposeError> {
    let canonical =
        serde_yaml::to_string(document).map_err(|e| ComposeError::Serialization(e.to_string()))?;
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

/// Build the annotation that marks entities as owned by this project.
pub fn managed_annotation(document: &ManifestDocument) -> Result<KeyValue, ComposeError> {
    let project_name = document
        .project_name()
        .ok_or_else(|| ComposeError::MissingProjectName {
            path: document.file_path.clone(),
        })?;
    Ok(KeyValue::new(
        MANAGED_ANNOTATION,
        json!({
            "projectName": project_name,
            "projectHash": project_hash(document)?,
            "file": document.file_path.display().to_string(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fndeploy_schema::parse_manifest_str;

    #[test]
    fn annotation_names_the_project() {
        let doc = parse_manifest_str("project:\n  name: shop\n  packages:\n    cart: {}\n").unwrap();
        let kv = managed_annotation(&doc).unwrap();
        assert_eq!(kv.key, MANAGED_ANNOTATION);
        assert_eq!(kv.value["projectName"], "shop");
        assert_eq!(kv.value["projectHash"].as_str().map(str::len), Some(64));
    }

    #[test]
    fn hash_ignores_formatting() {
        let a = parse_manifest_str("project: {name: shop}").unwrap();
        let b = parse_manifest_str("# comment\nproject:\n  name:   shop\n").unwrap();
        let c = parse_manifest_str("project: {name: mall}").unwrap();
        assert_eq!(project_hash(&a).unwrap(), project_hash(&b).unwrap());
        assert_ne!(project_hash(&a).unwrap(), project_hash(&c).unwrap());
    }

    #[test]
    fn missing_project_name_is_an_error() {
        let doc = parse_manifest_str("packages:\n  cart: {}\n").unwrap();
        assert!(matches!(
            managed_annotation(&doc),
            Err(ComposeError::MissingProjectName { .. })
        ));
    }
}
