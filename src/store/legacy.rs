use std::fs;
use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;

const SENTINEL_KEY: &str = "ping";
const SENTINEL_VALUE: &str = "pong";

/// The legacy embedded cache: a `cache.db` SQLite file inside the cache
/// directory, holding one `cache(key, value)` table.
pub struct LegacyStore {
    conn: Connection,
}

impl LegacyStore {
    /// Open the cache database inside `dir`, creating both on first use the
    /// way the legacy cache itself does.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join("cache.db"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache (
                key BLOB PRIMARY KEY,
                value TEXT
            );",
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache WHERE key = ?1",
                params![key],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(value.flatten())
    }

    /// Returns whether the write took effect, mirroring the legacy cache's
    /// success flag.
    pub fn set(&self, key: &str, value: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR REPLACE INTO cache (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(changed == 1)
    }

    /// All scalar record keys in insertion order.
    ///
    /// The legacy cache also holds entries keyed by composite values, stored
    /// as raw blobs. Those, NULL keys, and empty keys are not record
    /// identifiers and are skipped silently.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM cache ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, Value>(0))?;

        let mut keys = Vec::new();
        for row in rows {
            if let Value::Text(key) = row?
                && !key.is_empty()
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Sentinel probe: write `ping -> pong` if absent, then read it back.
    pub fn ping(&self) -> Result<bool> {
        let mut value = self.get(SENTINEL_KEY)?;
        if value.is_none() {
            if !self.set(SENTINEL_KEY, SENTINEL_VALUE)? {
                return Ok(false);
            }
            value = self.get(SENTINEL_KEY)?;
        }
        Ok(value.as_deref() == Some(SENTINEL_VALUE))
    }
}
