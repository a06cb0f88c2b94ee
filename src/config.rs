use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::uploads;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_redis_port() -> u16 {
    6379
}

impl RedisSettings {
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}:{}/", password, self.host, self.port),
            None => format!("redis://{}:{}/", self.host, self.port),
        }
    }
}

/// What to do with a record whose backing file could not be moved.
///
/// `WriteRecord` still writes the record pointing at the intended new path,
/// leaving the file at its old location for a manual follow-up move.
/// `SkipRecord` drops the record instead.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveFailurePolicy {
    #[default]
    WriteRecord,
    SkipRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory of the legacy disk cache.
    pub cache_path: PathBuf,
    pub redis: RedisSettings,
    /// Root under which `uploads/` and `uploads_admin/` are created.
    pub new_uploads_path: PathBuf,
    #[serde(default)]
    pub on_move_failure: MoveFailurePolicy,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MigrateError::ConfigNotFound(path.display().to_string()));
        }
        let data = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&data)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The upload root must not itself be one of the reserved subdirectory
    /// names, or relocated files would nest a second level deep.
    pub fn validate(&self) -> Result<()> {
        let name = self
            .new_uploads_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name == uploads::PUBLIC_DIR || name == uploads::ADMIN_DIR {
            return Err(MigrateError::InvalidConfig(format!(
                "new_uploads_path must not end in the reserved directory name '{name}'"
            )));
        }
        Ok(())
    }
}
