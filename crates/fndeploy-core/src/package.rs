use crate::composer::ComposeContext;
use crate::entity::Package;
use crate::param::{resolve_annotations, resolve_params};
use crate::ComposeError;
use fndeploy_schema::PackageSpec;
use tracing::warn;

pub const DEFAULT_PACKAGE_VERSION: &str = "0.0.1";
pub const DEFAULT_PACKAGE_LICENSE: &str = "unlicensed";

/// SPDX identifiers accepted without a warning.
const KNOWN_LICENSES: &[&str] = &[
    "0BSD",
    "AGPL-3.0",
    "Apache-1.1",
    "Apache-2.0",
    "Artistic-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSL-1.0",
    "CC0-1.0",
    "CC-BY-4.0",
    "EPL-1.0",
    "EPL-2.0",
    "EUPL-1.2",
    "GPL-2.0",
    "GPL-3.0",
    "ISC",
    "LGPL-2.1",
    "LGPL-3.0",
    "MIT",
    "MPL-2.0",
    "Unlicense",
    "Zlib",
    DEFAULT_PACKAGE_LICENSE,
];

pub fn is_known_license(license: &str) -> bool {
    KNOWN_LICENSES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(license.trim()))
}

/// Compose a package entity. Version and license are checked and defaulted
/// but are not part of the platform entity.
pub fn compose_package(
    ctx: &ComposeContext<'_>,
    name: &str,
    spec: &PackageSpec,
) -> Result<Package, ComposeError> {
    if spec.version.is_empty() {
        warn!("package {name} has no version, using default {DEFAULT_PACKAGE_VERSION}");
        warn!("package {name}: version is not saved on the platform");
    }
    if spec.license.is_empty() {
        warn!("package {name} has no license, using default {DEFAULT_PACKAGE_LICENSE}");
        warn!("package {name}: license is not saved on the platform");
    } else if !is_known_license(&spec.license) {
        warn!("package {name} declares unrecognized license '{}'", spec.license);
    }

    let parameters = resolve_params(&spec.inputs, ctx.manifest_path, ctx.interpolator)?;
    let mut annotations = resolve_annotations(&spec.annotations, ctx.interpolator);
    ctx.append_managed(&mut annotations);

    Ok(Package {
        name: name.to_owned(),
        namespace: ctx.namespace_or(&spec.namespace),
        publish: false,
        parameters,
        annotations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposeConfig;
    use crate::entity::KeyValue;
    use fndeploy_schema::Interpolator;
    use std::path::Path;

    #[test]
    fn licenses_match_case_insensitively() {
        assert!(is_known_license("apache-2.0"));
        assert!(is_known_license("MIT"));
        assert!(is_known_license("unlicensed"));
        assert!(!is_known_license("proprietary-ish"));
    }

    #[test]
    fn package_gets_params_annotations_and_managed_marker() {
        let spec: PackageSpec = serde_yaml::from_str(
            "namespace: guest\ninputs:\n  region: eu\nannotations:\n  owner: team\n",
        )
        .unwrap();
        let config = ComposeConfig::default();
        let interpolator = Interpolator::default();
        let mut ctx = ComposeContext::new(&config, &interpolator, Path::new("manifest.yaml"));
        ctx.managed = Some(KeyValue::new("whisk-managed", "marker"));

        let package = compose_package(&ctx, "shop", &spec).unwrap();
        assert_eq!(package.name, "shop");
        assert_eq!(package.namespace, "guest");
        assert!(!package.publish);
        assert_eq!(package.parameters, vec![KeyValue::new("region", "eu")]);
        assert_eq!(
            package.annotations,
            vec![
                KeyValue::new("owner", "team"),
                KeyValue::new("whisk-managed", "marker"),
            ]
        );
    }
}
