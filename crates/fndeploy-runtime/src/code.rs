use crate::kinds::is_binary_extension;
use crate::RuntimeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Action code as it is attached to an exec payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCode {
    pub code: String,
    /// True when `code` holds base64-encoded bytes.
    pub binary: bool,
}

/// Extension of `path` without the leading dot, or `""` when it has none.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Read action code from disk.
///
/// Zip and jar files are base64-encoded, as is any other file that is not
/// UTF-8 text (a native executable for a docker action, say).
pub fn load_code(path: &Path, ext: &str) -> Result<LoadedCode, RuntimeError> {
    let bytes = fs::read(path).map_err(|e| RuntimeError::io(path, e))?;
    if is_binary_extension(ext) {
        return Ok(LoadedCode {
            code: STANDARD.encode(&bytes),
            binary: true,
        });
    }
    match String::from_utf8(bytes) {
        Ok(code) => Ok(LoadedCode {
            code,
            binary: false,
        }),
        Err(e) => {
            debug!("{} is not UTF-8 text, encoding it as binary", path.display());
            Ok(LoadedCode {
                code: STANDARD.encode(e.as_bytes()),
                binary: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_without_dot() {
        assert_eq!(file_extension(Path::new("src/hello.js")), "js");
        assert_eq!(file_extension(Path::new("build/app.tar.zip")), "zip");
        assert_eq!(file_extension(Path::new("bin/exec")), "");
    }

    #[test]
    fn text_sources_are_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.py");
        fs::write(&path, "def main(args):\n    return args\n").unwrap();

        let loaded = load_code(&path, "py").unwrap();
        assert!(!loaded.binary);
        assert_eq!(loaded.code, "def main(args):\n    return args\n");
    }

    #[test]
    fn archives_are_base64_encoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.jar");
        fs::write(&path, [0xca, 0xfe, 0xba, 0xbe]).unwrap();

        let loaded = load_code(&path, "jar").unwrap();
        assert!(loaded.binary);
        assert_eq!(loaded.code, "yv66vg==");
    }

    #[test]
    fn non_utf8_source_is_encoded_as_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exec");
        fs::write(&path, [0x7f, b'E', b'L', b'F', 0xff]).unwrap();

        let loaded = load_code(&path, "").unwrap();
        assert!(loaded.binary);
        assert_eq!(loaded.code, "f0VMRv8=");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_code(&dir.path().join("absent.js"), "js"),
            Err(RuntimeError::Io { .. })
        ));
    }
}
