use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::error::{MigrateError, Result};

const LOCK_FILE: &str = "migrate.lock";

/// Exclusive lock guarding a migration run.
///
/// Two concurrent runs would race each other's file renames, so a run holds
/// this for its whole duration. The OS releases the lock when the guard is
/// dropped.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
}

impl RunLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| MigrateError::Locked(path.display().to_string()))?;

        Ok(Self { _file: file })
    }
}
