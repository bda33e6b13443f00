use crate::composer::ComposeContext;
use crate::entity::Rule;
use crate::sequence::qualify_action;
use fndeploy_schema::PackageSpec;

/// Compose the rules of one package. The target action is qualified with the
/// package name the same way sequence components are.
pub fn compose_rules(ctx: &ComposeContext<'_>, package_name: &str, package: &PackageSpec) -> Vec<Rule> {
    let interpolate = |s: &str| ctx.interpolator.interpolate_str(s);
    package
        .rules
        .iter()
        .map(|(name, spec)| Rule {
            name: interpolate(name),
            namespace: ctx.namespace_or(&spec.namespace),
            publish: false,
            trigger: interpolate(&spec.trigger),
            action: qualify_action(package_name, &interpolate(&spec.action)),
        })
        .collect()
}
