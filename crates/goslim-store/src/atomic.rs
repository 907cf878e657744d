use std::fs::{self, File};
use std::io;
use std::path::Path;

use tempfile::NamedTempFile;

/// Copy `src` over `dest` so readers of `dest` see either the old or the new
/// content, never a partial file.
///
/// The copy lands in a temporary file in `dest`'s directory, is synced, and
/// is then renamed over `dest`. Works when `src` is on another filesystem.
pub(crate) fn copy_atomically(src: &Path, dest: &Path) -> io::Result<u64> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut input = File::open(src)?;
    let permissions = input.metadata()?.permissions();

    let mut tmp = NamedTempFile::new_in(dir)?;
    let bytes = io::copy(&mut input, tmp.as_file_mut())?;
    // Temp files are created owner-only; keep the source's mode instead.
    tmp.as_file().set_permissions(permissions)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;

    if let Ok(dir) = File::open(dir) {
        let _ = dir.sync_all();
    }
    Ok(bytes)
}

/// Byte length of `path`, if it exists.
pub(crate) fn existing_len(path: &Path) -> io::Result<Option<u64>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
