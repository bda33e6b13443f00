use crate::action::compose_actions;
use crate::api::compose_apis;
use crate::config::ComposeConfig;
use crate::dependency::compose_dependencies;
use crate::entity::{
    remove_key, ActionRecord, ApiCreateRequest, DependencyRecord, DeploymentPlan, KeyValue, Package,
    PackagePlan, Rule, Trigger,
};
use crate::managed::managed_annotation;
use crate::merge::OverrideMerger;
use crate::package::compose_package;
use crate::rule::compose_rules;
use crate::sequence::compose_sequences;
use crate::trigger::compose_triggers;
use crate::ComposeError;
use fndeploy_schema::{parse_manifest_file, Interpolator, ManifestDocument, PackageSet};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Everything a single-section composer needs besides the section itself.
#[derive(Debug, Clone)]
pub struct ComposeContext<'a> {
    pub config: &'a ComposeConfig,
    pub interpolator: &'a Interpolator,
    /// File the manifest was decoded from; relative sources resolve against its directory.
    pub manifest_path: &'a Path,
    /// Set in managed mode, appended after user annotations on every entity.
    /// A user annotation with the same key is replaced.
    pub managed: Option<KeyValue>,
}

impl<'a> ComposeContext<'a> {
    pub fn new(
        config: &'a ComposeConfig,
        interpolator: &'a Interpolator,
        manifest_path: &'a Path,
    ) -> Self {
        Self {
            config,
            interpolator,
            manifest_path,
            managed: None,
        }
    }

    pub fn manifest_dir(&self) -> &'a Path {
        self.manifest_path.parent().unwrap_or(Path::new(""))
    }

    /// The entity's own namespace, or the configured default.
    pub fn namespace_or(&self, declared: &str) -> String {
        if declared.is_empty() {
            self.config.namespace.clone()
        } else {
            self.interpolator.interpolate_str(declared)
        }
    }

    pub(crate) fn append_managed(&self, annotations: &mut Vec<KeyValue>) {
        if let Some(ma) = &self.managed {
            remove_key(annotations, &ma.key);
            annotations.push(ma.clone());
        }
    }
}

/// Fans the section composers out over every package of a manifest.
///
/// Every aggregate call is fail-fast: the first error from any package aborts
/// the call and nothing partial is returned.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    config: ComposeConfig,
    interpolator: Interpolator,
}

impl Composer {
    pub fn new(config: ComposeConfig, interpolator: Interpolator) -> Self {
        Self {
            config,
            interpolator,
        }
    }

    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    pub fn context<'a>(
        &'a self,
        document: &'a ManifestDocument,
    ) -> Result<ComposeContext<'a>, ComposeError> {
        let mut ctx = ComposeContext::new(&self.config, &self.interpolator, &document.file_path);
        if self.config.managed {
            ctx.managed = Some(managed_annotation(document)?);
        }
        Ok(ctx)
    }

    fn package_set<'d>(document: &'d ManifestDocument) -> PackageSet<'d> {
        let set = document.resolve_packages();
        if set.source.is_deprecated() {
            warn!("the 'package' key is deprecated, use 'packages' instead");
        }
        set
    }

    pub fn compose_packages_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<BTreeMap<String, Package>, ComposeError> {
        let ctx = self.context(document)?;
        let mut packages = BTreeMap::new();
        for (name, spec) in Self::package_set(document).packages {
            packages.insert(name.to_owned(), compose_package(&ctx, name, spec)?);
        }
        Ok(packages)
    }

    pub fn compose_actions_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<Vec<ActionRecord>, ComposeError> {
        let ctx = self.context(document)?;
        let mut records = Vec::new();
        for (name, spec) in document.resolve_packages().packages {
            records.extend(compose_actions(&ctx, name, &spec.actions)?);
        }
        Ok(records)
    }

    pub fn compose_sequences_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<Vec<ActionRecord>, ComposeError> {
        let ctx = self.context(document)?;
        let mut records = Vec::new();
        for (name, spec) in document.resolve_packages().packages {
            records.extend(compose_sequences(&ctx, name, &spec.sequences));
        }
        Ok(records)
    }

    pub fn compose_triggers_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<Vec<Trigger>, ComposeError> {
        let ctx = self.context(document)?;
        let mut triggers = Vec::new();
        for spec in document.resolve_packages().packages.values() {
            triggers.extend(compose_triggers(&ctx, spec)?);
        }
        Ok(triggers)
    }

    pub fn compose_rules_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<Vec<Rule>, ComposeError> {
        let ctx = self.context(document)?;
        let mut rules = Vec::new();
        for (name, spec) in document.resolve_packages().packages {
            rules.extend(compose_rules(&ctx, name, spec));
        }
        Ok(rules)
    }

    pub fn compose_apis_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<Vec<ApiCreateRequest>, ComposeError> {
        let ctx = self.context(document)?;
        let mut requests = Vec::new();
        for (name, spec) in document.resolve_packages().packages {
            requests.extend(compose_apis(&ctx, name, spec)?);
        }
        Ok(requests)
    }

    pub fn compose_dependencies_from_all_packages(
        &self,
        document: &ManifestDocument,
    ) -> Result<BTreeMap<String, DependencyRecord>, ComposeError> {
        let ctx = self.context(document)?;
        let mut records = BTreeMap::new();
        for (name, spec) in document.resolve_packages().packages {
            records.extend(compose_dependencies(&ctx, name, spec)?);
        }
        Ok(records)
    }

    /// Compose every section of every package into one plan.
    pub fn compose_plan(&self, document: &ManifestDocument) -> Result<DeploymentPlan, ComposeError> {
        let ctx = self.context(document)?;
        let mut plan = DeploymentPlan::default();

        for (name, spec) in Self::package_set(document).packages {
            debug!("composing package {name}");
            let mut package_plan = PackagePlan::new(compose_package(&ctx, name, spec)?);
            for record in compose_actions(&ctx, name, &spec.actions)? {
                package_plan
                    .actions
                    .insert(record.action.name.clone(), record);
            }
            for record in compose_sequences(&ctx, name, &spec.sequences) {
                package_plan
                    .sequences
                    .insert(record.action.name.clone(), record);
            }
            for trigger in compose_triggers(&ctx, spec)? {
                if plan.triggers.contains_key(&trigger.name) {
                    warn!(
                        "trigger {} is declared in more than one package, keeping the last",
                        trigger.name
                    );
                }
                plan.triggers.insert(trigger.name.clone(), trigger);
            }
            for rule in compose_rules(&ctx, name, spec) {
                if plan.rules.contains_key(&rule.name) {
                    warn!(
                        "rule {} is declared in more than one package, keeping the last",
                        rule.name
                    );
                }
                plan.rules.insert(rule.name.clone(), rule);
            }
            plan.apis.extend(compose_apis(&ctx, name, spec)?);
            plan.dependencies
                .extend(compose_dependencies(&ctx, name, spec)?);
            plan.packages.insert(name.to_owned(), package_plan);
        }

        info!(
            "composed {} package(s), {} action(s), {} sequence(s), {} trigger(s), {} rule(s)",
            plan.packages.len(),
            plan.action_count(),
            plan.sequence_count(),
            plan.triggers.len(),
            plan.rules.len()
        );
        Ok(plan)
    }

    /// Parse and compose a manifest, then apply the deployment descriptor if one is given.
    pub fn build_plan(
        &self,
        manifest_path: &Path,
        deployment_path: Option<&Path>,
    ) -> Result<DeploymentPlan, ComposeError> {
        info!("composing {}", manifest_path.display());
        let manifest = parse_manifest_file(manifest_path)?;
        let mut plan = self.compose_plan(&manifest)?;

        if let Some(path) = deployment_path {
            info!("applying deployment {}", path.display());
            let deployment = parse_manifest_file(path)?;
            OverrideMerger::new(&self.config, &self.interpolator).apply(&deployment, &mut plan)?;
        }
        Ok(plan)
    }
}
