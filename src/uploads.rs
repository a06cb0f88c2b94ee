//! Relocation of upload files into the new directory layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

pub const PUBLIC_DIR: &str = "uploads";
pub const ADMIN_DIR: &str = "uploads_admin";

/// A legacy path anywhere under the admin upload area marks the record as
/// administrator-originated.
pub fn is_admin_path(path: &str) -> bool {
    path.contains(ADMIN_DIR)
}

pub fn dest_dir(root: &Path, is_admin: bool) -> PathBuf {
    root.join(if is_admin { ADMIN_DIR } else { PUBLIC_DIR })
}

/// Where `src` lands inside `dir`, keeping its original file name.
pub fn dest_path(dir: &Path, src: &Path) -> io::Result<PathBuf> {
    let name = src.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("upload path '{}' has no file name", src.display()),
        )
    })?;
    Ok(dir.join(name))
}

/// Creation time of the file in milliseconds since the Unix epoch.
///
/// Falls back to mtime where the filesystem does not expose a birth time.
pub fn creation_time_ms(path: &Path) -> io::Result<i64> {
    let meta = fs::metadata(path)?;
    let created = meta.created().or_else(|_| meta.modified())?;
    Ok(DateTime::<Utc>::from(created).timestamp_millis())
}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Failed(String),
}

/// Move `src` into `dir`, creating `dir` first if needed.
///
/// A failed rename is reported in the outcome rather than as an error; the
/// returned path is the intended destination either way.
pub fn relocate(src: &Path, dir: &Path) -> io::Result<(PathBuf, MoveOutcome)> {
    fs::create_dir_all(dir)?;
    let dest = dest_path(dir, src)?;
    let outcome = match fs::rename(src, &dest) {
        Ok(()) => MoveOutcome::Moved,
        Err(err) => MoveOutcome::Failed(err.to_string()),
    };
    Ok((dest, outcome))
}
