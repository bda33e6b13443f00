use crate::composer::ComposeContext;
use crate::entity::{Action, ActionRecord, Exec};
use crate::param::resolve_annotations;
use fndeploy_schema::SequenceSpec;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

pub const SEQUENCE_KIND: &str = "sequence";

/// Qualify a bare action reference with its owning package.
///
/// References that already contain a `/` are returned trimmed but otherwise
/// unchanged.
pub fn qualify_action(package_name: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.contains('/') {
        reference.to_owned()
    } else {
        format!("{package_name}/{reference}")
    }
}

/// Turn a comma-separated action list into fully-qualified component paths,
/// preserving order and duplicates.
pub fn sequence_components(namespace: &str, package_name: &str, actions: &str) -> Vec<String> {
    let namespace = namespace.trim_matches('/');
    actions
        .split(',')
        .map(str::trim)
        .filter(|element| {
            if element.is_empty() {
                warn!("ignoring empty element in sequence list '{actions}'");
            }
            !element.is_empty()
        })
        .map(|element| {
            let qualified = qualify_action(package_name, element);
            format!("/{namespace}/{}", qualified.trim_start_matches('/'))
        })
        .collect()
}

pub fn compose_sequences(
    ctx: &ComposeContext<'_>,
    package_name: &str,
    sequences: &BTreeMap<String, SequenceSpec>,
) -> Vec<ActionRecord> {
    sequences
        .iter()
        .map(|(name, spec)| {
            let mut annotations = resolve_annotations(&spec.annotations, ctx.interpolator);
            ctx.append_managed(&mut annotations);
            let action = Action {
                name: name.clone(),
                namespace: ctx.config.namespace.clone(),
                publish: false,
                exec: Some(Exec {
                    kind: SEQUENCE_KIND.to_owned(),
                    components: sequence_components(&ctx.config.namespace, package_name, &spec.actions),
                    ..Exec::default()
                }),
                parameters: Vec::new(),
                annotations,
                limits: None,
            };
            ActionRecord {
                action,
                package_name: package_name.to_owned(),
                file_path: PathBuf::from(name),
            }
        })
        .collect()
}
