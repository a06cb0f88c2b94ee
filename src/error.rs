use thiserror::Error;

/// Which of the two stores a fatal failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSide {
    Legacy,
    Destination,
}

impl std::fmt::Display for StoreSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("{0} store failed its connectivity probe")]
    Connectivity(StoreSide),

    #[error("settings file '{0}' not found")]
    ConfigNotFound(String),

    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    #[error("another migration holds the run lock: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cache database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl MigrateError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Connectivity(StoreSide::Legacy) => "legacy_unreachable",
            Self::Connectivity(StoreSide::Destination) => "destination_unreachable",
            Self::ConfigNotFound(_) => "config_not_found",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Db(_) => "db_error",
            Self::Redis(_) => "redis_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
