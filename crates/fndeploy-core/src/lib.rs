//! Composition engine for fndeploy.
//!
//! This crate turns a decoded manifest into platform entities ready for
//! submission: the parameter resolver, one composer per manifest section
//! (packages, actions, sequences, triggers, rules, APIs, dependencies), the
//! web-export annotation shaping, and the `Composer` that fans them out over
//! every package of a document into a `DeploymentPlan`. The `OverrideMerger`
//! then applies a deployment descriptor's inputs and annotations to that plan
//! in place.

pub mod action;
pub mod api;
pub mod composer;
pub mod config;
pub mod dependency;
pub mod entity;
pub mod managed;
pub mod merge;
pub mod package;
pub mod param;
pub mod rule;
pub mod sequence;
pub mod trigger;
pub mod web;

pub use action::{decide_runtime, RuntimeDecision, SourceKind};
pub use composer::{ComposeContext, Composer};
pub use config::ComposeConfig;
pub use dependency::DEFAULT_DEPENDENCY_VERSION;
pub use entity::{
    Action, ActionRecord, ApiCreateRequest, DependencyKind, DependencyRecord, DeploymentPlan,
    Exec, KeyValue, Limits, Package, PackagePlan, Rule, Trigger,
};
pub use managed::{managed_annotation, MANAGED_ANNOTATION};
pub use merge::OverrideMerger;
pub use param::{resolve_param, yaml_to_json};
pub use trigger::FEED_ANNOT;
pub use web::{web_action, FINAL_ANNOT, RAW_HTTP_ANNOT, WEB_EXPORT_ANNOT};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("manifest error: {0}")]
    Manifest(#[from] fndeploy_schema::ManifestError),
    #[error("runtime error: {0}")]
    Runtime(#[from] fndeploy_runtime::RuntimeError),
    #[error("manifest error: cannot resolve parameter '{name}' in {}: {reason}", path.display())]
    ParameterResolution {
        name: String,
        path: PathBuf,
        reason: String,
    },
    #[error(
        "runtime error: {message} (file: {}, action: {action}, runtime: {runtime}, supported runtimes: {})",
        file.display(),
        supported.join(", ")
    )]
    InvalidRuntime {
        message: String,
        file: PathBuf,
        action: String,
        runtime: String,
        supported: Vec<String>,
    },
    #[error(
        "runtime error: dependency '{dependency}' has unknown location '{location}'; only /whisk.system bindings and github.com packages are supported"
    )]
    UnknownDependencyType {
        dependency: String,
        location: String,
    },
    #[error("manifest error: invalid web-export mode '{0}' (expected yes, true, no, false or raw)")]
    WebMode(String),
    #[error(
        "deployment error: annotation key '{key}' in {} does not exist in the manifest",
        path.display()
    )]
    DeploymentFormat { path: PathBuf, key: String },
    #[error("manifest error: managed deployment requires a project name in {}", path.display())]
    MissingProjectName { path: PathBuf },
    #[error("config error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_category_prefix() {
        let web = ComposeError::WebMode("sometimes".to_owned());
        assert!(web.to_string().starts_with("manifest error:"));

        let dep = ComposeError::DeploymentFormat {
            path: PathBuf::from("deployment.yaml"),
            key: "owner".to_owned(),
        };
        assert!(dep.to_string().starts_with("deployment error:"));
        assert!(dep.to_string().contains("owner"));

        let rt = ComposeError::InvalidRuntime {
            message: "runtime is missing".to_owned(),
            file: PathBuf::from("app.zip"),
            action: "hello".to_owned(),
            runtime: String::new(),
            supported: vec!["nodejs:6".to_owned(), "python:3".to_owned()],
        };
        let msg = rt.to_string();
        assert!(msg.starts_with("runtime error:"));
        assert!(msg.contains("nodejs:6, python:3"));
    }
}
