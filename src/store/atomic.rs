// Scoped temp-file writes: a destination path only ever holds a complete file.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{LauncherError, Result};

/// Write `data` to `dest` through a temp file in the same directory, then rename.
///
/// Missing parent directories are created. The temp file is removed if any
/// step fails, so `dest` is either absent, untouched, or fully written.
pub fn write_atomic(dest: &Path, data: &[u8]) -> Result<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| LauncherError::filesystem(parent, e))?;

    let mut tmp =
        NamedTempFile::new_in(parent).map_err(|e| LauncherError::filesystem(parent, e))?;
    tmp.write_all(data)
        .map_err(|e| LauncherError::filesystem(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| LauncherError::filesystem(tmp.path(), e))?;
    tmp.persist(dest)
        .map_err(|e| LauncherError::filesystem(dest, e.error))?;

    debug!("wrote {} ({} bytes)", dest.display(), data.len());
    Ok(())
}
