use crate::composer::ComposeContext;
use crate::entity::{find_key, remove_key, KeyValue, Trigger};
use crate::param::{resolve_annotations, resolve_params};
use crate::ComposeError;
use fndeploy_schema::{PackageSpec, TriggerSpec};
use tracing::warn;

pub const FEED_ANNOT: &str = "feed";

pub fn compose_trigger(
    ctx: &ComposeContext<'_>,
    name: &str,
    spec: &TriggerSpec,
) -> Result<Trigger, ComposeError> {
    if !spec.source.is_empty() {
        warn!("trigger {name}: the 'source' key is deprecated, use 'feed' instead");
    }
    let feed = if spec.feed.is_empty() {
        &spec.source
    } else {
        &spec.feed
    };

    let mut annotations = resolve_annotations(&spec.annotations, ctx.interpolator);
    if !feed.is_empty() {
        if find_key(&annotations, FEED_ANNOT).is_some() {
            warn!("trigger {name}: annotation '{FEED_ANNOT}' is replaced by the declared feed");
            remove_key(&mut annotations, FEED_ANNOT);
        }
        annotations.insert(0, KeyValue::new(FEED_ANNOT, feed.as_str()));
    }
    ctx.append_managed(&mut annotations);

    Ok(Trigger {
        name: ctx.interpolator.interpolate_str(name),
        namespace: ctx.namespace_or(&spec.namespace),
        publish: false,
        parameters: resolve_params(&spec.inputs, ctx.manifest_path, ctx.interpolator)?,
        annotations,
    })
}

pub fn compose_triggers(
    ctx: &ComposeContext<'_>,
    package: &PackageSpec,
) -> Result<Vec<Trigger>, ComposeError> {
    package
        .triggers
        .iter()
        .map(|(name, spec)| compose_trigger(ctx, name, spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposeConfig;
    use fndeploy_schema::Interpolator;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn compose(yaml: &str, interpolator: &Interpolator) -> Trigger {
        let spec: TriggerSpec = serde_yaml::from_str(yaml).unwrap();
        let config = ComposeConfig::default();
        let ctx = ComposeContext::new(&config, interpolator, Path::new("manifest.yaml"));
        compose_trigger(&ctx, "${TRIGGER}", &spec).unwrap()
    }

    #[test]
    fn source_becomes_feed_annotation_first() {
        let env = Interpolator::isolated(BTreeMap::new()).with_var("TRIGGER", "every-minute");
        let trigger = compose(
            "source: /whisk.system/alarms/alarm\nannotations: {owner: ops}\ninputs: {cron: '* * * * *'}",
            &env,
        );
        assert_eq!(trigger.name, "every-minute");
        assert_eq!(
            trigger.annotations,
            vec![
                KeyValue::new("feed", "/whisk.system/alarms/alarm"),
                KeyValue::new("owner", "ops"),
            ]
        );
        assert_eq!(trigger.parameters, vec![KeyValue::new("cron", "* * * * *")]);
    }

    #[test]
    fn feed_takes_precedence_over_source() {
        let trigger = compose(
            "feed: /guest/feeds/new\nsource: /guest/feeds/old",
            &Interpolator::default(),
        );
        assert_eq!(
            trigger.annotations,
            vec![KeyValue::new("feed", "/guest/feeds/new")]
        );
    }

    #[test]
    fn declared_feed_replaces_feed_annotation() {
        let trigger = compose(
            "feed: /whisk.system/alarms/alarm\nannotations: {feed: other, owner: ops}",
            &Interpolator::default(),
        );
        assert_eq!(
            trigger.annotations,
            vec![
                KeyValue::new("feed", "/whisk.system/alarms/alarm"),
                KeyValue::new("owner", "ops"),
            ]
        );
    }

    #[test]
    fn managed_annotation_replaces_user_entry() {
        let spec: TriggerSpec =
            serde_yaml::from_str("annotations: {whisk-managed: mine, owner: ops}").unwrap();
        let config = ComposeConfig::default();
        let interpolator = Interpolator::default();
        let mut ctx = ComposeContext::new(&config, &interpolator, Path::new("manifest.yaml"));
        ctx.managed = Some(KeyValue::new("whisk-managed", "project"));

        let trigger = compose_trigger(&ctx, "tick", &spec).unwrap();
        assert_eq!(
            trigger.annotations,
            vec![
                KeyValue::new("owner", "ops"),
                KeyValue::new("whisk-managed", "project"),
            ]
        );
    }

    #[test]
    fn no_feed_no_annotation() {
        let trigger = compose("{}", &Interpolator::default());
        assert!(trigger.annotations.is_empty());
        assert_eq!(trigger.name, "");
    }
}
