use crate::composer::ComposeContext;
use crate::entity::{DependencyKind, DependencyRecord};
use crate::param::{resolve_annotations, resolve_params};
use crate::ComposeError;
use fndeploy_schema::PackageSpec;
use std::collections::BTreeMap;

pub const DEFAULT_DEPENDENCY_VERSION: &str = "master";

const SYSTEM_NAMESPACE: &str = "whisk.system";
const GITHUB_HOST: &str = "github.com";

/// A dependency location after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLocation {
    pub kind: DependencyKind,
    pub location: String,
    pub base_repo: Option<String>,
    pub sub_folder: Option<String>,
}

/// Classify a dependency location as a system binding or a GitHub package.
///
/// Bindings are normalised to start with `/`; GitHub references gain an
/// explicit `https://` scheme. Returns `None` for anything else.
pub fn classify_location(location: &str) -> Option<ClassifiedLocation> {
    let location = location.trim();
    if location.starts_with(SYSTEM_NAMESPACE)
        || location.starts_with(&format!("/{SYSTEM_NAMESPACE}"))
    {
        let location = if location.starts_with('/') {
            location.to_owned()
        } else {
            format!("/{location}")
        };
        return Some(ClassifiedLocation {
            kind: DependencyKind::Binding,
            location,
            base_repo: None,
            sub_folder: None,
        });
    }

    let without_scheme = location
        .strip_prefix("https://")
        .or_else(|| location.strip_prefix("http://"))
        .unwrap_or(location);
    let path = without_scheme.strip_prefix(GITHUB_HOST)?.strip_prefix('/')?;

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let sub_folder: Vec<&str> = segments.collect();

    let location = if location.starts_with("https://") || location.starts_with("http://") {
        location.to_owned()
    } else {
        format!("https://{location}")
    };
    Some(ClassifiedLocation {
        kind: DependencyKind::Remote,
        location,
        base_repo: Some(format!("https://{GITHUB_HOST}/{owner}/{repo}")),
        sub_folder: (!sub_folder.is_empty()).then(|| sub_folder.join("/")),
    })
}

/// Compose the dependencies of one package, keyed `<package>:<dependency>`.
pub fn compose_dependencies(
    ctx: &ComposeContext<'_>,
    package_name: &str,
    package: &PackageSpec,
) -> Result<BTreeMap<String, DependencyRecord>, ComposeError> {
    let project_path = ctx.manifest_dir().join("Packages");
    let mut records = BTreeMap::new();

    for (key, spec) in &package.dependencies {
        let classified =
            classify_location(&spec.location).ok_or_else(|| ComposeError::UnknownDependencyType {
                dependency: key.clone(),
                location: spec.location.clone(),
            })?;
        let version = if spec.version.is_empty() {
            DEFAULT_DEPENDENCY_VERSION.to_owned()
        } else {
            spec.version.clone()
        };

        records.insert(
            format!("{package_name}:{key}"),
            DependencyRecord {
                project_path: project_path.clone(),
                package_name: package_name.to_owned(),
                location: classified.location,
                version,
                kind: classified.kind,
                base_repo: classified.base_repo,
                sub_folder: classified.sub_folder,
                parameters: resolve_params(&spec.inputs, ctx.manifest_path, ctx.interpolator)?,
                annotations: resolve_annotations(&spec.annotations, ctx.interpolator),
            },
        );
    }
    Ok(records)
}
