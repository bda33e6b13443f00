use crate::RuntimeError;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// A zip archive written next to the directory it was packed from.
///
/// The file is removed when the value is dropped, so an archive never
/// outlives the composition call that created it.
#[derive(Debug)]
pub struct ScratchArchive {
    file: NamedTempFile,
}

impl ScratchArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Pack a directory into a deterministic zip archive.
///
/// Entries are sorted by relative path and stamped with a fixed timestamp;
/// permissions are preserved. Symlinks and special files are skipped with a
/// warning.
pub fn pack_directory(source_dir: &Path) -> Result<ScratchArchive, RuntimeError> {
    let parent = source_dir
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let stem = source_dir
        .file_name()
        .map_or_else(|| "action".to_owned(), |n| n.to_string_lossy().into_owned());

    let mut file = tempfile::Builder::new()
        .prefix(&format!("{stem}."))
        .suffix(".zip")
        .tempfile_in(parent)
        .map_err(|e| RuntimeError::io(parent, e))?;

    let mut entries = collect_entries(source_dir, source_dir)?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let archive_path = file.path().to_path_buf();
    let zip_err = |source| RuntimeError::Archive {
        path: archive_path.clone(),
        source,
    };

    let mut zip = ZipWriter::new(file.as_file_mut());
    let base = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    for (rel_path, full_path) in &entries {
        let meta = full_path
            .symlink_metadata()
            .map_err(|e| RuntimeError::io(full_path, e))?;
        let options = base.unix_permissions(meta.permissions().mode());
        let ft = meta.file_type();
        if ft.is_dir() {
            zip.add_directory(rel_path.clone(), options).map_err(zip_err)?;
        } else if ft.is_file() {
            zip.start_file(rel_path.clone(), options).map_err(zip_err)?;
            let mut src = fs::File::open(full_path).map_err(|e| RuntimeError::io(full_path, e))?;
            io::copy(&mut src, &mut zip).map_err(|e| RuntimeError::io(full_path, e))?;
        } else {
            warn!("skipping unsupported file type in action directory: {rel_path}");
        }
    }
    zip.finish().map_err(zip_err)?;

    debug!(
        "packed {} entries from {} into {}",
        entries.len(),
        source_dir.display(),
        archive_path.display()
    );
    Ok(ScratchArchive { file })
}

/// Recursively collect (relative_path, full_path) pairs from a directory tree.
fn collect_entries(root: &Path, current: &Path) -> Result<Vec<(String, PathBuf)>, RuntimeError> {
    let mut result = Vec::new();
    for entry in fs::read_dir(current).map_err(|e| RuntimeError::io(current, e))? {
        let entry = entry.map_err(|e| RuntimeError::io(current, e))?;
        let full = entry.path();
        let rel = full
            .strip_prefix(root)
            .map_err(|e| RuntimeError::io(&full, io::Error::other(format!("path strip: {e}"))))?
            .to_string_lossy()
            .replace('\\', "/");

        let meta = full
            .symlink_metadata()
            .map_err(|e| RuntimeError::io(&full, e))?;
        if meta.is_dir() {
            result.push((format!("{rel}/"), full.clone()));
            result.extend(collect_entries(root, &full)?);
        } else {
            result.push((rel, full));
        }
    }
    Ok(result)
}
