//! Crash-safe save output.
//!
//! Bytes go to a temporary file beside the target, which is then renamed over
//! it. An existing target is first copied to the first free `<name>.bakN`.

use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

/// `save.sav` -> `save.sav.bak3`.
fn backup_name(target: &Path, n: u32) -> PathBuf {
    let mut name: OsString = target.as_os_str().to_owned();
    name.push(format!(".bak{n}"));
    PathBuf::from(name)
}

/// First `.bakN` path that does not exist yet.
pub fn next_backup_path(target: &Path) -> PathBuf {
    (1..)
        .map(|n| backup_name(target, n))
        .find(|p| !p.exists())
        .unwrap_or_else(|| backup_name(target, 0))
}

/// Copy `target` to a fresh backup. Returns `None` when there is nothing to back up.
pub fn backup(target: &Path) -> io::Result<Option<PathBuf>> {
    if !target.exists() {
        return Ok(None);
    }
    let path = next_backup_path(target);
    fs::copy(target, &path)?;
    info!(backup = %path.display(), "backed up existing save");
    Ok(Some(path))
}

/// Back up `target` if it exists, then replace it with `bytes` atomically.
pub fn write_with_backup(target: &Path, bytes: &[u8]) -> io::Result<Option<PathBuf>> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let backup = backup(target)?;
    tmp.persist(target).map_err(|e| e.error)?;
    debug!(target = %target.display(), bytes = bytes.len(), "wrote save");
    Ok(backup)
}
