use serde::{Deserialize, Serialize};

/// Key prefix the new service expects on every record.
pub const KEY_PREFIX: &str = "ihacdn";

const SHORT_TYPE: &str = "short";

pub fn prefixed_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// A record as stored by the legacy cache. Anything with `type` other than
/// `"short"` is an uploaded-file reference.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Typed view of a legacy record with its required fields present.
#[derive(Debug, PartialEq)]
pub enum RecordKind<'a> {
    Short { target: &'a str },
    File { path: &'a str, mimetype: &'a str },
}

impl LegacyRecord {
    /// Returns `None` when the record is missing a field its kind requires.
    pub fn classify(&self) -> Option<RecordKind<'_>> {
        if self.kind == SHORT_TYPE {
            self.target
                .as_deref()
                .map(|target| RecordKind::Short { target })
        } else {
            match (self.path.as_deref(), self.mimetype.as_deref()) {
                (Some(path), Some(mimetype)) => Some(RecordKind::File { path, mimetype }),
                _ => None,
            }
        }
    }
}

/// A record in the shape the new service reads. Field order is part of the
/// wire format: the destination value is compared byte-for-byte across
/// repeated migration runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewRecord {
    Short {
        #[serde(rename = "type")]
        kind: String,
        target: String,
    },
    File {
        #[serde(rename = "type")]
        kind: String,
        is_admin: bool,
        path: String,
        mimetype: String,
        time_added: i64,
    },
}

impl NewRecord {
    pub fn short(target: &str) -> Self {
        Self::Short {
            kind: SHORT_TYPE.to_string(),
            target: target.to_string(),
        }
    }

    pub fn file(kind: &str, is_admin: bool, path: String, mimetype: &str, time_added: i64) -> Self {
        Self::File {
            kind: kind.to_string(),
            is_admin,
            path,
            mimetype: mimetype.to_string(),
            time_added,
        }
    }
}
