use super::{json_pretty, ComposeArgs, EXIT_SUCCESS};
use std::path::Path;

pub fn run(args: &ComposeArgs, config_path: Option<&Path>, json: bool) -> Result<u8, String> {
    let plan = args.build(config_path)?;

    if json {
        let payload = serde_json::json!({
            "valid": true,
            "manifest": args.manifest.display().to_string(),
            "packages": plan.packages.len(),
            "actions": plan.action_count(),
            "sequences": plan.sequence_count(),
            "triggers": plan.triggers.len(),
            "rules": plan.rules.len(),
            "apis": plan.apis.len(),
            "dependencies": plan.dependencies.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} {} is valid: {} package(s), {} action(s), {} sequence(s), {} trigger(s), {} rule(s), {} api(s), {} dependency(ies)",
            console::style("✓").green(),
            args.manifest.display(),
            plan.packages.len(),
            plan.action_count(),
            plan.sequence_count(),
            plan.triggers.len(),
            plan.rules.len(),
            plan.apis.len(),
            plan.dependencies.len(),
        );
    }
    Ok(EXIT_SUCCESS)
}
