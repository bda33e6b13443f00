//! Manifest and deployment descriptor model for fndeploy.
//!
//! This crate defines the schema layer: strict YAML decoding of manifest and
//! deployment documents (`ManifestDocument`), parameter declarations
//! (`ParamSpec`), resolution of the authoritative package map
//! (`ManifestDocument::resolve_packages`), `${VAR}` interpolation
//! (`Interpolator`), and expansion of API gateway definitions (`ApiDoc`).

pub mod apis;
pub mod interpolate;
pub mod manifest;
pub mod packages;
pub mod params;

pub use apis::{ApiAction, ApiDoc, ApiSpec};
pub use interpolate::Interpolator;
pub use manifest::{
    parse_manifest_file, parse_manifest_str, ActionSpec, DependencySpec, LimitsSpec,
    ManifestDocument, ManifestError, PackageSpec, ProjectSpec, RuleSpec, SequenceSpec,
    TriggerSpec,
};
pub use packages::{PackageSet, PackageSource};
pub use params::{ParamDeclaration, ParamSpec};
