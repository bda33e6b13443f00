use crate::ComposeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_NAMESPACE: &str = "_";

/// Settings read once per invocation and handed to every composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposeConfig {
    /// Namespace used for sequence components and for entities that do not
    /// declare their own.
    pub namespace: String,
    /// Keep a declared runtime even when it disagrees with the source extension.
    pub strict: bool,
    /// Tag every entity with the managed-deployment annotation.
    pub managed: bool,
    /// During the override merge, skip a deployment package with no composed
    /// counterpart instead of ending the package scan.
    pub skip_unmatched_packages: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            strict: false,
            managed: false,
            skip_unmatched_packages: false,
        }
    }
}

impl ComposeConfig {
    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ComposeError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ComposeError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Load `~/.config/fndeploy/config.toml`, or defaults when it is absent.
    pub fn load_default() -> Result<Self, ComposeError> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/fndeploy/config.toml"))
}
