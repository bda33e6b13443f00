use crate::composer::ComposeContext;
use crate::entity::{Action, ActionRecord, Exec, Limits};
use crate::param::{resolve_annotations, resolve_params};
use crate::web::web_action;
use crate::ComposeError;
use fndeploy_runtime::{
    default_kind_for_extension, file_extension, is_consistent_with_extension,
    is_supported_runtime, list_supported_runtimes, load_code, pack_directory, LimitCheck,
    LoadedCode, ScratchArchive, LOG_SIZE, MEMORY, TIMEOUT, UNSUPPORTED_LIMITS,
    ZIP_FILE_EXTENSION,
};
use fndeploy_schema::{ActionSpec, LimitsSpec};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RUNTIME_HINT: &str = "Please specify one of the supported runtimes in the manifest";
const RUNTIME_NOT_SPECIFIED: &str = "Not Specified in Manifest YAML";

/// What an action's source turned out to be on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind<'a> {
    /// No `function`: the action carries no code.
    Stub,
    /// A directory packed into a zip, or a `.zip` file.
    Archive,
    /// A single file with this extension (without the dot).
    File { ext: &'a str },
}

/// How a declared runtime is reconciled with the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeDecision {
    /// Use the declared runtime.
    Declared,
    /// Declared runtime disagrees with the extension; strict mode keeps it.
    DeclaredOverMismatch,
    /// Declared runtime disagrees with the extension; the inferred kind is kept.
    InferredOverMismatch,
    /// Declared runtime is unknown; the inferred kind (possibly none) is kept.
    InferredOverUnsupported,
    /// Declared runtime is unknown for an archive, which has nothing to fall back to.
    Invalid,
}

/// Reconcile a non-empty declared runtime with the action source.
pub fn decide_runtime(source: SourceKind<'_>, declared: &str, strict: bool) -> RuntimeDecision {
    let supported = is_supported_runtime(declared);
    match source {
        SourceKind::Archive | SourceKind::Stub if supported => RuntimeDecision::Declared,
        SourceKind::Archive => RuntimeDecision::Invalid,
        SourceKind::Stub => RuntimeDecision::InferredOverUnsupported,
        SourceKind::File { ext } => {
            let inferred = default_kind_for_extension(ext);
            match (supported, inferred) {
                (false, _) => RuntimeDecision::InferredOverUnsupported,
                (true, None) => RuntimeDecision::Declared,
                (true, Some(_)) if is_consistent_with_extension(ext, declared) => {
                    RuntimeDecision::Declared
                }
                (true, Some(_)) if strict => RuntimeDecision::DeclaredOverMismatch,
                (true, Some(_)) => RuntimeDecision::InferredOverMismatch,
            }
        }
    }
}

/// Loaded action code. A packed directory's archive lives as long as this value.
struct LoadedSource {
    path: PathBuf,
    ext: String,
    archive: bool,
    code: LoadedCode,
    _scratch: Option<ScratchArchive>,
}

impl LoadedSource {
    fn kind(&self) -> SourceKind<'_> {
        if self.archive {
            SourceKind::Archive
        } else {
            SourceKind::File { ext: &self.ext }
        }
    }

    fn inferred_kind(&self) -> Option<&'static str> {
        if self.archive {
            None
        } else {
            default_kind_for_extension(&self.ext)
        }
    }
}

fn invalid_runtime(message: &str, file: &Path, action: &str, runtime: &str) -> ComposeError {
    ComposeError::InvalidRuntime {
        message: format!("{message}. {RUNTIME_HINT}"),
        file: file.to_path_buf(),
        action: action.to_owned(),
        runtime: runtime.to_owned(),
        supported: list_supported_runtimes(),
    }
}

fn load_source(name: &str, spec: &ActionSpec, path: PathBuf) -> Result<LoadedSource, ComposeError> {
    if path.is_dir() {
        if spec.runtime.is_empty() {
            return Err(invalid_runtime(
                "runtime is missing for a directory action",
                &path,
                name,
                RUNTIME_NOT_SPECIFIED,
            ));
        }
        let scratch = pack_directory(&path)?;
        let code = load_code(scratch.path(), ZIP_FILE_EXTENSION)?;
        debug!("packed action {name} from {}", path.display());
        return Ok(LoadedSource {
            path,
            ext: ZIP_FILE_EXTENSION.to_owned(),
            archive: true,
            code,
            _scratch: Some(scratch),
        });
    }

    let ext = file_extension(&path);
    let is_zip = ext == ZIP_FILE_EXTENSION;
    if spec.runtime.is_empty() {
        if is_zip {
            return Err(invalid_runtime(
                "runtime is missing for a zip action",
                &path,
                name,
                RUNTIME_NOT_SPECIFIED,
            ));
        }
        if default_kind_for_extension(&ext).is_none() {
            return Err(invalid_runtime(
                "failed to discover the runtime from the action source file",
                &path,
                name,
                RUNTIME_NOT_SPECIFIED,
            ));
        }
    }

    let code = load_code(&path, &ext)?;
    Ok(LoadedSource {
        path,
        ext,
        archive: is_zip,
        code,
        _scratch: None,
    })
}

/// Pick the exec kind, warning or failing per [`decide_runtime`].
fn reconcile_runtime(
    ctx: &ComposeContext<'_>,
    name: &str,
    spec: &ActionSpec,
    source: Option<&LoadedSource>,
) -> Result<Option<String>, ComposeError> {
    let inferred = source.and_then(LoadedSource::inferred_kind);
    if spec.runtime.is_empty() {
        return Ok(inferred.map(str::to_owned));
    }

    let kind = source.map_or(SourceKind::Stub, LoadedSource::kind);
    let declared = spec.runtime.as_str();
    match decide_runtime(kind, declared, ctx.config.strict) {
        RuntimeDecision::Declared => Ok(Some(declared.to_owned())),
        RuntimeDecision::DeclaredOverMismatch => {
            warn!(
                "runtime {declared} of action {name} does not match the source file extension; keeping it in strict mode"
            );
            Ok(Some(declared.to_owned()))
        }
        RuntimeDecision::InferredOverMismatch => {
            warn!("runtime {declared} of action {name} does not match the source file extension");
            if let Some(k) = inferred {
                warn!("runtime of action {name} changed to {k}");
            }
            Ok(inferred.map(str::to_owned))
        }
        RuntimeDecision::InferredOverUnsupported => {
            warn!("runtime {declared} of action {name} is not supported");
            match inferred {
                Some(k) => warn!("runtime of action {name} changed to {k}"),
                None if source.is_some() => {
                    warn!("runtime of action {name} changed to an empty kind");
                }
                None => {}
            }
            Ok(inferred.map(str::to_owned))
        }
        RuntimeDecision::Invalid => {
            let file = source.map_or_else(PathBuf::new, |s| s.path.clone());
            Err(invalid_runtime(
                "the declared runtime is not supported",
                &file,
                name,
                declared,
            ))
        }
    }
}

/// Validate limits against platform bounds. Out-of-range values are dropped
/// with a warning; `None` when nothing valid remains.
pub fn compose_limits(action: &str, spec: &LimitsSpec) -> Option<Limits> {
    let mut limits = Limits::default();
    for (bounds, value, slot) in [
        (TIMEOUT, spec.timeout, &mut limits.timeout),
        (MEMORY, spec.memory_size, &mut limits.memory),
        (LOG_SIZE, spec.log_size, &mut limits.logs),
    ] {
        match bounds.check(value) {
            LimitCheck::Absent => {}
            LimitCheck::Valid(v) => *slot = Some(v),
            LimitCheck::OutOfRange(v) => warn!(
                "limit {} = {v} of action {action} is outside {}..={}, ignoring it",
                bounds.name, bounds.min, bounds.max
            ),
        }
    }

    let unsupported = [
        spec.concurrent_activations,
        spec.user_invocation_rate,
        spec.code_size,
        spec.parameter_size,
    ];
    for (limit, value) in UNSUPPORTED_LIMITS.iter().zip(unsupported) {
        if value.is_some_and(|v| v != 0) {
            warn!("limit {limit} of action {action} is not supported and will be ignored");
        }
    }

    (!limits.is_empty()).then_some(limits)
}

/// Compose one action declaration into a platform action.
pub fn compose_action(
    ctx: &ComposeContext<'_>,
    package_name: &str,
    name: &str,
    spec: &ActionSpec,
) -> Result<ActionRecord, ComposeError> {
    let source = spec.source();
    let loaded = if source.is_empty() {
        debug!("action {name} has no function, composing it as a stub");
        None
    } else {
        Some(load_source(name, spec, ctx.manifest_dir().join(source))?)
    };

    let kind = reconcile_runtime(ctx, name, spec, loaded.as_ref())?;
    let main = (!spec.main.is_empty()).then(|| spec.main.clone());
    let exec = match (&loaded, kind) {
        (Some(src), kind) => Some(Exec {
            kind: kind.unwrap_or_default(),
            code: Some(src.code.code.clone()),
            main,
            components: Vec::new(),
            binary: src.code.binary,
        }),
        (None, Some(kind)) => Some(Exec {
            kind,
            main,
            ..Exec::default()
        }),
        (None, None) => None,
    };

    let parameters = resolve_params(&spec.inputs, ctx.manifest_path, ctx.interpolator)?;
    let outputs = resolve_params(&spec.outputs, ctx.manifest_path, ctx.interpolator)?;
    if !outputs.is_empty() {
        debug!(
            "action {name} declares {} output(s); outputs are validated but not deployed",
            outputs.len()
        );
    }

    let mut annotations = resolve_annotations(&spec.annotations, ctx.interpolator);
    ctx.append_managed(&mut annotations);
    if spec.web_export == "true" {
        annotations = web_action("yes", Some(annotations), false)?.unwrap_or_default();
    } else if !spec.web_export.is_empty() {
        debug!(
            "action {name} has web-export '{}', leaving annotations unchanged",
            spec.web_export
        );
    }

    let limits = spec.limits.as_ref().and_then(|l| compose_limits(name, l));

    let action = Action {
        name: name.to_owned(),
        namespace: ctx.namespace_or(&spec.namespace),
        publish: false,
        exec,
        parameters,
        annotations,
        limits,
    };
    Ok(ActionRecord {
        action,
        package_name: package_name.to_owned(),
        file_path: loaded.map(|l| l.path).unwrap_or_default(),
    })
}

pub fn compose_actions(
    ctx: &ComposeContext<'_>,
    package_name: &str,
    actions: &BTreeMap<String, ActionSpec>,
) -> Result<Vec<ActionRecord>, ComposeError> {
    actions
        .iter()
        .map(|(name, spec)| compose_action(ctx, package_name, name, spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComposeConfig;
    use fndeploy_schema::Interpolator;
    use std::fs;

    fn action(yaml: &str) -> ActionSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn compose_in(dir: &Path, config: &ComposeConfig, yaml: &str) -> Result<ActionRecord, ComposeError> {
        let interpolator = Interpolator::default();
        let manifest = dir.join("manifest.yaml");
        let ctx = ComposeContext::new(config, &interpolator, &manifest);
        compose_action(&ctx, "pkg", "act", &action(yaml))
    }

    #[test]
    fn runtime_decision_table() {
        use RuntimeDecision::{
            Declared, DeclaredOverMismatch, InferredOverMismatch, InferredOverUnsupported, Invalid,
        };
        let js = SourceKind::File { ext: "js" };
        let sh = SourceKind::File { ext: "sh" };
        let cases = [
            (SourceKind::Archive, "python:3", false, Declared),
            (SourceKind::Archive, "cobol:85", false, Invalid),
            (SourceKind::Stub, "nodejs:8", false, Declared),
            (SourceKind::Stub, "cobol:85", false, InferredOverUnsupported),
            (js, "nodejs:10", false, Declared),
            (js, "python:3", false, InferredOverMismatch),
            (js, "python:3", true, DeclaredOverMismatch),
            (js, "cobol:85", true, InferredOverUnsupported),
            (sh, "blackbox", false, Declared),
            (sh, "cobol:85", false, InferredOverUnsupported),
            (sh, "cobol:85", true, InferredOverUnsupported),
        ];
        for (source, declared, strict, expected) in cases {
            assert_eq!(
                decide_runtime(source, declared, strict),
                expected,
                "{source:?} / {declared} / strict={strict}"
            );
        }
    }

    #[test]
    fn limits_drop_out_of_range_fields() {
        let spec = LimitsSpec {
            timeout: Some(50),
            memory_size: Some(256),
            log_size: Some(5),
            code_size: Some(1),
            ..LimitsSpec::default()
        };
        assert_eq!(
            compose_limits("a", &spec),
            Some(Limits {
                timeout: None,
                memory: Some(256),
                logs: Some(5),
            })
        );
    }

    #[test]
    fn limits_absent_when_nothing_valid() {
        let spec = LimitsSpec {
            timeout: Some(1),
            memory_size: Some(4096),
            ..LimitsSpec::default()
        };
        assert_eq!(compose_limits("a", &spec), None);
    }

    #[test]
    fn extension_infers_kind() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.py"), "def main(a):\n  return a\n").unwrap();

        let record = compose_in(dir.path(), &ComposeConfig::default(), "function: hello.py").unwrap();
        let exec = record.action.exec.unwrap();
        assert_eq!(exec.kind, "python:2");
        assert!(!exec.binary);
        assert!(exec.code.unwrap().contains("def main"));
        assert_eq!(record.file_path, dir.path().join("hello.py"));
    }

    #[test]
    fn unknown_extension_without_runtime_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.sh"), "echo hi").unwrap();

        let err = compose_in(dir.path(), &ComposeConfig::default(), "function: run.sh").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidRuntime { .. }));
    }

    #[test]
    fn unsupported_runtime_on_unknown_extension_is_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.sh"), "echo hi").unwrap();

        let record = compose_in(
            dir.path(),
            &ComposeConfig::default(),
            "function: run.sh\nruntime: cobol:85",
        )
        .unwrap();
        let exec = record.action.exec.unwrap();
        assert_eq!(exec.kind, "");
        assert_eq!(exec.code.as_deref(), Some("echo hi"));
    }

    #[test]
    fn unsupported_runtime_on_zip_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.zip"), b"PK\x05\x06").unwrap();

        let err = compose_in(
            dir.path(),
            &ComposeConfig::default(),
            "function: app.zip\nruntime: cobol:85",
        )
        .unwrap_err();
        assert!(matches!(err, ComposeError::InvalidRuntime { .. }));
    }

    #[test]
    fn blackbox_binary_is_base64_encoded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("exec"), [0x7f, b'E', b'L', b'F', 0xff]).unwrap();

        let record = compose_in(
            dir.path(),
            &ComposeConfig::default(),
            "function: exec\nruntime: blackbox",
        )
        .unwrap();
        let exec = record.action.exec.unwrap();
        assert_eq!(exec.kind, "blackbox");
        assert!(exec.binary);
        assert_eq!(exec.code.as_deref(), Some("f0VMRv8="));
    }

    #[test]
    fn zip_without_runtime_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.zip"), b"PK\x05\x06").unwrap();

        let err = compose_in(dir.path(), &ComposeConfig::default(), "function: app.zip").unwrap_err();
        assert!(matches!(err, ComposeError::InvalidRuntime { .. }));
    }

    #[test]
    fn mismatch_keeps_inferred_kind_unless_strict() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.js"), "function main() {}").unwrap();
        let yaml = "function: hello.js\nruntime: python:3";

        let lenient = compose_in(dir.path(), &ComposeConfig::default(), yaml).unwrap();
        assert_eq!(lenient.action.kind(), Some("nodejs:6"));

        let strict = ComposeConfig {
            strict: true,
            ..ComposeConfig::default()
        };
        let strict = compose_in(dir.path(), &strict, yaml).unwrap();
        assert_eq!(strict.action.kind(), Some("python:3"));
    }

    #[test]
    fn stub_action_has_no_exec() {
        let dir = tempfile::tempdir().unwrap();
        let record = compose_in(dir.path(), &ComposeConfig::default(), "annotations: {a: 1}").unwrap();
        assert!(record.action.exec.is_none());
        assert_eq!(record.file_path, PathBuf::new());
        assert_eq!(record.action.namespace, "_");
    }

    #[test]
    fn location_is_used_when_function_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("legacy.js"), "function main() {}").unwrap();
        let record = compose_in(dir.path(), &ComposeConfig::default(), "location: legacy.js").unwrap();
        assert_eq!(record.action.kind(), Some("nodejs:6"));
    }

    #[test]
    fn main_is_attached_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Hello.jar"), [0u8, 1, 2]).unwrap();
        let record = compose_in(
            dir.path(),
            &ComposeConfig::default(),
            "function: Hello.jar\nmain: com.example.Hello",
        )
        .unwrap();
        let exec = record.action.exec.unwrap();
        assert_eq!(exec.kind, "java");
        assert!(exec.binary);
        assert_eq!(exec.main.as_deref(), Some("com.example.Hello"));
    }
}
