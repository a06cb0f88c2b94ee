use std::collections::BTreeMap;

use redis::{Client, Commands, Connection};

use crate::config::RedisSettings;
use crate::error::Result;

/// Key-value sink the migration writes into.
pub trait Destination {
    fn get(&mut self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// The networked redis destination.
///
/// Construction only parses the connection URL; the TCP connection is opened
/// lazily, so an unreachable server surfaces at the connectivity probe
/// rather than at startup.
pub struct RedisStore {
    client: Client,
    conn: Option<Connection>,
}

impl RedisStore {
    pub fn connect(settings: &RedisSettings) -> Result<Self> {
        let client = Client::open(settings.url())?;
        Ok(Self { client, conn: None })
    }

    fn conn(&mut self) -> Result<&mut Connection> {
        match self.conn {
            Some(ref mut conn) => Ok(conn),
            None => {
                let conn = self.client.get_connection()?;
                Ok(self.conn.insert(conn))
            }
        }
    }
}

impl Destination for RedisStore {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn()?.get(key)?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn()?.set::<_, _, ()>(key, value)?;
        Ok(())
    }
}

/// In-memory destination backing dry runs; integration tests use it to
/// inspect what a real run would have written.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

impl Destination for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
