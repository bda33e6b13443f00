use crate::manifest::{ManifestDocument, PackageSpec};
use std::collections::BTreeMap;

/// Which part of the document supplied the authoritative package map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSource {
    /// Deprecated top-level `package` with a non-empty `name`.
    Single,
    /// Top-level `packages` map.
    Packages,
    /// Deprecated `project.package` with a non-empty `name`.
    ProjectSingle,
    /// `project.packages` map (possibly empty).
    Project,
}

impl PackageSource {
    pub fn is_deprecated(self) -> bool {
        matches!(self, Self::Single | Self::ProjectSingle)
    }
}

/// The normalized package map of one document, keyed by package name.
#[derive(Debug, Clone)]
pub struct PackageSet<'a> {
    pub source: PackageSource,
    pub packages: BTreeMap<&'a str, &'a PackageSpec>,
}

impl PackageSet<'_> {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

impl ManifestDocument {
    /// Resolve the authoritative package map.
    ///
    /// Precedence: a named top-level `package`, then a non-empty `packages`
    /// map, then a named `project.package`, then `project.packages`. Exactly
    /// one source wins; the others are ignored.
    pub fn resolve_packages(&self) -> PackageSet<'_> {
        if let Some(pkg) = self.package.as_ref().filter(|p| !p.name.is_empty()) {
            return single(PackageSource::Single, pkg);
        }
        if !self.packages.is_empty() {
            return map(PackageSource::Packages, &self.packages);
        }
        let Some(project) = self.project.as_ref() else {
            return PackageSet {
                source: PackageSource::Project,
                packages: BTreeMap::new(),
            };
        };
        if let Some(pkg) = project.package.as_ref().filter(|p| !p.name.is_empty()) {
            return single(PackageSource::ProjectSingle, pkg);
        }
        map(PackageSource::Project, &project.packages)
    }

    /// Name of the enclosing project, if the document declares one.
    pub fn project_name(&self) -> Option<&str> {
        self.project
            .as_ref()
            .map(|p| p.name.as_str())
            .filter(|n| !n.is_empty())
    }
}

fn single(source: PackageSource, pkg: &PackageSpec) -> PackageSet<'_> {
    PackageSet {
        source,
        packages: BTreeMap::from([(pkg.name.as_str(), pkg)]),
    }
}

fn map(source: PackageSource, packages: &BTreeMap<String, PackageSpec>) -> PackageSet<'_> {
    PackageSet {
        source,
        packages: packages.iter().map(|(k, v)| (k.as_str(), v)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use crate::manifest::parse_manifest_str;
    use crate::packages::PackageSource;

    #[test]
    fn named_single_package_wins() {
        let manifest = parse_manifest_str(
            r"
package:
  name: legacy
packages:
  modern: {}
",
        )
        .unwrap();
        let set = manifest.resolve_packages();
        assert_eq!(set.source, PackageSource::Single);
        assert!(set.source.is_deprecated());
        assert_eq!(set.packages.keys().copied().collect::<Vec<_>>(), vec!["legacy"]);
    }

    #[test]
    fn unnamed_single_package_falls_through() {
        let manifest = parse_manifest_str(
            r"
package:
  version: 1.0.0
packages:
  modern: {}
",
        )
        .unwrap();
        let set = manifest.resolve_packages();
        assert_eq!(set.source, PackageSource::Packages);
        assert!(set.packages.contains_key("modern"));
    }

    #[test]
    fn project_packages_used_when_top_level_empty() {
        let manifest = parse_manifest_str(
            r"
project:
  name: shop
  packages:
    cart: {}
    billing: {}
",
        )
        .unwrap();
        let set = manifest.resolve_packages();
        assert_eq!(set.source, PackageSource::Project);
        assert_eq!(set.len(), 2);
        assert_eq!(manifest.project_name(), Some("shop"));
    }

    #[test]
    fn project_single_package_precedes_project_map() {
        let manifest = parse_manifest_str(
            r"
project:
  package:
    name: solo
  packages:
    ignored: {}
",
        )
        .unwrap();
        let set = manifest.resolve_packages();
        assert_eq!(set.source, PackageSource::ProjectSingle);
        assert!(set.packages.contains_key("solo"));
    }

    #[test]
    fn empty_document_resolves_to_nothing() {
        let manifest = parse_manifest_str("{}").unwrap();
        let set = manifest.resolve_packages();
        assert!(set.is_empty());
        assert_eq!(manifest.project_name(), None);
    }
}
