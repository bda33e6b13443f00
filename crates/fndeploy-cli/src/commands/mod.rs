pub mod completions;
pub mod compose;
pub mod runtimes;
pub mod validate;

use clap::Args;
use fndeploy_core::{ComposeConfig, Composer, DeploymentPlan};
use fndeploy_schema::Interpolator;
use std::path::{Path, PathBuf};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_RUNTIME_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn label(kind: &str) -> String {
    use console::Style;
    let padded = format!("{kind:<10}");
    match kind {
        "package" => Style::new().bold().apply_to(padded).to_string(),
        "action" | "sequence" => Style::new().green().apply_to(padded).to_string(),
        "trigger" => Style::new().yellow().apply_to(padded).to_string(),
        "rule" => Style::new().cyan().apply_to(padded).to_string(),
        "api" => Style::new().magenta().apply_to(padded).to_string(),
        "dependency" => Style::new().blue().apply_to(padded).to_string(),
        _ => padded,
    }
}

/// Inputs shared by `compose` and `validate`.
#[derive(Debug, Args)]
pub struct ComposeArgs {
    /// Path to the manifest YAML file.
    #[arg(default_value = "manifest.yaml")]
    pub manifest: PathBuf,
    /// Deployment descriptor whose values override the manifest.
    #[arg(short, long)]
    pub deployment: Option<PathBuf>,
    /// Namespace for entities that do not declare one.
    #[arg(long)]
    pub namespace: Option<String>,
    /// Keep a declared runtime even when it does not match the source file extension.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    /// Tag every entity with the project's managed annotation.
    #[arg(long, default_value_t = false)]
    pub managed: bool,
    /// Keep merging after a deployment package that is missing from the manifest.
    #[arg(long, default_value_t = false)]
    pub skip_unmatched_packages: bool,
    /// Set an interpolation variable, shadowing the environment (repeatable).
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

impl ComposeArgs {
    /// Config file first, then command-line flags on top.
    pub fn config(&self, config_path: Option<&Path>) -> Result<ComposeConfig, String> {
        let mut config = match config_path {
            Some(path) => ComposeConfig::load(path),
            None => ComposeConfig::load_default(),
        }
        .map_err(|e| e.to_string())?;

        if let Some(namespace) = &self.namespace {
            config.namespace.clone_from(namespace);
        }
        config.strict |= self.strict;
        config.managed |= self.managed;
        config.skip_unmatched_packages |= self.skip_unmatched_packages;
        Ok(config)
    }

    pub fn interpolator(&self) -> Interpolator {
        self.vars
            .iter()
            .fold(Interpolator::from_env(), |interp, (key, value)| {
                interp.with_var(key, value)
            })
    }

    pub fn build(&self, config_path: Option<&Path>) -> Result<DeploymentPlan, String> {
        let composer = Composer::new(self.config(config_path)?, self.interpolator());
        composer
            .build_plan(&self.manifest, self.deployment.as_deref())
            .map_err(|e| e.to_string())
    }
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}
