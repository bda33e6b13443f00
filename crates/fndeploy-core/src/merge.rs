//! Deployment descriptor overrides.
//!
//! A deployment descriptor addresses already-composed entities by package,
//! action and trigger name. Its inputs win over the manifest's and may add new
//! keys; its annotations may only overwrite keys the manifest already set.

use crate::config::ComposeConfig;
use crate::entity::{find_key, DeploymentPlan, KeyValue};
use crate::param::yaml_to_json;
use crate::ComposeError;
use fndeploy_schema::{Interpolator, ManifestDocument, PackageSet, ParamSpec};
use serde_yaml::Value as Yaml;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub struct OverrideMerger<'a> {
    config: &'a ComposeConfig,
    interpolator: &'a Interpolator,
}

impl<'a> OverrideMerger<'a> {
    pub fn new(config: &'a ComposeConfig, interpolator: &'a Interpolator) -> Self {
        Self {
            config,
            interpolator,
        }
    }

    /// Apply `deployment` to `plan` in place: packages, then actions, then triggers.
    pub fn apply(
        &self,
        deployment: &ManifestDocument,
        plan: &mut DeploymentPlan,
    ) -> Result<(), ComposeError> {
        let packages = deployment.resolve_packages();
        if packages.source.is_deprecated() {
            warn!("the 'package' key in the deployment file is deprecated, use 'packages' instead");
        }
        let path = deployment.file_path.as_path();

        self.bind_packages(&packages, path, plan)?;
        self.bind_actions(&packages, path, plan)?;
        self.bind_triggers(&packages, path, plan)
    }

    fn bind_packages(
        &self,
        packages: &PackageSet<'_>,
        path: &Path,
        plan: &mut DeploymentPlan,
    ) -> Result<(), ComposeError> {
        for (name, spec) in &packages.packages {
            let Some(composed) = plan.packages.get_mut(*name) else {
                warn!("package {name} in the deployment file does not match the manifest");
                if self.config.skip_unmatched_packages {
                    continue;
                }
                break;
            };
            self.merge_inputs(&spec.inputs, &mut composed.package.parameters);
            merge_annotations(path, &spec.annotations, &mut composed.package.annotations)?;
        }
        Ok(())
    }

    fn bind_actions(
        &self,
        packages: &PackageSet<'_>,
        path: &Path,
        plan: &mut DeploymentPlan,
    ) -> Result<(), ComposeError> {
        for (name, spec) in &packages.packages {
            let Some(composed) = plan.packages.get_mut(*name) else {
                if self.config.skip_unmatched_packages {
                    continue;
                }
                break;
            };
            for (action_name, action) in &spec.actions {
                let Some(record) = composed.actions.get_mut(action_name) else {
                    debug!("action {name}/{action_name} in the deployment file is not in the manifest");
                    continue;
                };
                self.merge_inputs(&action.inputs, &mut record.action.parameters);
                merge_annotations(path, &action.annotations, &mut record.action.annotations)?;
            }
        }
        Ok(())
    }

    /// Triggers are matched against the whole plan, not per package.
    fn bind_triggers(
        &self,
        packages: &PackageSet<'_>,
        path: &Path,
        plan: &mut DeploymentPlan,
    ) -> Result<(), ComposeError> {
        for spec in packages.packages.values() {
            for (trigger_name, trigger) in &spec.triggers {
                let Some(composed) = plan.triggers.get_mut(trigger_name) else {
                    debug!("trigger {trigger_name} in the deployment file is not in the manifest");
                    continue;
                };
                self.merge_inputs(&trigger.inputs, &mut composed.parameters);
                merge_annotations(path, &trigger.annotations, &mut composed.annotations)?;
            }
        }
        Ok(())
    }

    /// Deployment values first, then every composed key they do not already set.
    /// Nothing changes when the deployment declares no inputs.
    pub fn merge_inputs(&self, inputs: &BTreeMap<String, ParamSpec>, params: &mut Vec<KeyValue>) {
        if inputs.is_empty() {
            return;
        }
        let mut merged: Vec<KeyValue> = inputs
            .iter()
            .filter_map(|(key, spec)| {
                let value = yaml_to_json(&self.interpolator.interpolate_value(spec.raw_value()?));
                (!value.is_null()).then(|| KeyValue::new(key.clone(), value))
            })
            .collect();
        for kv in std::mem::take(params) {
            if find_key(&merged, &kv.key).is_none() {
                merged.push(kv);
            }
        }
        *params = merged;
    }
}

/// Overwrite existing annotations. A key the manifest never set is an error.
pub fn merge_annotations(
    path: &Path,
    annotations: &BTreeMap<String, Yaml>,
    composed: &mut [KeyValue],
) -> Result<(), ComposeError> {
    for (key, raw) in annotations {
        let Some(slot) = composed.iter_mut().find(|kv| kv.key == *key) else {
            return Err(ComposeError::DeploymentFormat {
                path: path.to_path_buf(),
                key: key.clone(),
            });
        };
        slot.value = yaml_to_json(raw);
    }
    Ok(())
}
