use super::{json_pretty, label, ComposeArgs, EXIT_SUCCESS};
use fndeploy_core::{DeploymentPlan, FEED_ANNOT};
use std::path::Path;

pub fn run(args: &ComposeArgs, config_path: Option<&Path>, json: bool) -> Result<u8, String> {
    let plan = args.build(config_path)?;
    if json {
        println!("{}", json_pretty(&plan)?);
    } else {
        print_summary(&plan);
    }
    Ok(EXIT_SUCCESS)
}

fn print_summary(plan: &DeploymentPlan) {
    for (name, composed) in &plan.packages {
        println!(
            "{} {name} ({})",
            label("package"),
            composed.package.namespace
        );
        for (action_name, record) in &composed.actions {
            println!(
                "  {} {name}/{action_name} [{}]",
                label("action"),
                record.action.kind().unwrap_or("none")
            );
        }
        for (seq_name, record) in &composed.sequences {
            let components = record
                .action
                .exec
                .as_ref()
                .map(|exec| exec.components.join(" -> "))
                .unwrap_or_default();
            println!("  {} {name}/{seq_name}: {components}", label("sequence"));
        }
    }
    for (name, trigger) in &plan.triggers {
        match trigger.annotations.iter().find(|kv| kv.key == FEED_ANNOT) {
            Some(feed) => println!("{} {name} (feed {})", label("trigger"), feed.value),
            None => println!("{} {name}", label("trigger")),
        }
    }
    for (name, rule) in &plan.rules {
        println!(
            "{} {name}: {} -> {}",
            label("rule"),
            rule.trigger,
            rule.action
        );
    }
    for request in &plan.apis {
        let doc = &request.api_doc;
        println!(
            "{} {} {}{} -> {}",
            label("api"),
            doc.gateway_method,
            doc.gateway_base_path,
            doc.gateway_rel_path,
            doc.action.name
        );
    }
    for (key, dep) in &plan.dependencies {
        let kind = if dep.is_binding() { "binding" } else { "remote" };
        println!(
            "{} {key} ({kind}) {}@{}",
            label("dependency"),
            dep.location,
            dep.version
        );
    }
}
