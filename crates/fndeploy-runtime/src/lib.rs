//! Runtime tables and action code packaging for fndeploy.
//!
//! This crate holds the static configuration the composers consult: the
//! file-extension → runtime-family table, the supported runtime kinds
//! (`SUPPORTED_RUNTIMES`), platform limit bounds (`LimitBounds`), plus the
//! packaging step that turns a directory into a scoped temporary zip archive
//! (`pack_directory`) and the loader that reads action code as text or base64
//! (`load_code`).

pub mod archive;
pub mod code;
pub mod kinds;
pub mod limits;

pub use archive::{pack_directory, ScratchArchive};
pub use code::{file_extension, load_code, LoadedCode};
pub use kinds::{
    default_kind_for_extension, family_for_extension, is_binary_extension,
    is_consistent_with_extension, is_supported_runtime, list_supported_runtimes, RuntimeFamily,
    FILE_EXTENSION_RUNTIMES, JAR_FILE_EXTENSION, SUPPORTED_RUNTIMES, ZIP_FILE_EXTENSION,
};
pub use limits::{LimitBounds, LimitCheck, LOG_SIZE, MEMORY, TIMEOUT, UNSUPPORTED_LIMITS};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("packaging failed for {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl RuntimeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_display_names_path() {
        let e = RuntimeError::io(
            "src/blob.js",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(e.to_string().contains("src/blob.js"));
    }
}
