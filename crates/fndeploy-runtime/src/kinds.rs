use serde::Serialize;

pub const ZIP_FILE_EXTENSION: &str = "zip";
pub const JAR_FILE_EXTENSION: &str = "jar";

/// A runtime family and the concrete kinds the platform accepts for it.
/// The first kind is the family default.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RuntimeFamily {
    pub name: &'static str,
    pub kinds: &'static [&'static str],
}

impl RuntimeFamily {
    pub fn default_kind(&self) -> &'static str {
        self.kinds[0]
    }

    pub fn accepts(&self, kind: &str) -> bool {
        self.kinds.contains(&kind)
    }
}

pub const SUPPORTED_RUNTIMES: &[RuntimeFamily] = &[
    RuntimeFamily {
        name: "nodejs",
        kinds: &["nodejs:6", "nodejs:8", "nodejs:10"],
    },
    RuntimeFamily {
        name: "python",
        kinds: &["python:2", "python:3"],
    },
    RuntimeFamily {
        name: "swift",
        kinds: &["swift:3.1.1", "swift:4.1"],
    },
    RuntimeFamily {
        name: "php",
        kinds: &["php:7.1", "php:7.2"],
    },
    RuntimeFamily {
        name: "java",
        kinds: &["java"],
    },
    RuntimeFamily {
        name: "ruby",
        kinds: &["ruby:2.5"],
    },
    RuntimeFamily {
        name: "blackbox",
        kinds: &["blackbox"],
    },
];

/// Source file extension (without the dot) → runtime family name.
pub const FILE_EXTENSION_RUNTIMES: &[(&str, &str)] = &[
    ("js", "nodejs"),
    ("py", "python"),
    ("swift", "swift"),
    ("php", "php"),
    ("jar", "java"),
    ("rb", "ruby"),
];

pub fn family_for_extension(ext: &str) -> Option<&'static RuntimeFamily> {
    let (_, family) = FILE_EXTENSION_RUNTIMES.iter().find(|(e, _)| *e == ext)?;
    SUPPORTED_RUNTIMES.iter().find(|f| f.name == *family)
}

/// Default runtime kind for a source extension, e.g. `js` → `nodejs:6`.
pub fn default_kind_for_extension(ext: &str) -> Option<&'static str> {
    family_for_extension(ext).map(RuntimeFamily::default_kind)
}

pub fn is_supported_runtime(kind: &str) -> bool {
    SUPPORTED_RUNTIMES.iter().any(|f| f.accepts(kind))
}

/// True when `kind` belongs to the family the extension maps to.
pub fn is_consistent_with_extension(ext: &str, kind: &str) -> bool {
    family_for_extension(ext).is_some_and(|f| f.accepts(kind))
}

/// Archives and compiled artifacts are shipped base64-encoded.
pub fn is_binary_extension(ext: &str) -> bool {
    ext == ZIP_FILE_EXTENSION || ext == JAR_FILE_EXTENSION
}

pub fn list_supported_runtimes() -> Vec<String> {
    SUPPORTED_RUNTIMES
        .iter()
        .flat_map(|f| f.kinds.iter().map(|k| (*k).to_owned()))
        .collect()
}
