use colored::Colorize;

use crate::config::Settings;
use crate::error::{MigrateError, Result, StoreSide};
use crate::output::Format;
use crate::store::destination::{Destination, RedisStore};
use crate::store::legacy::LegacyStore;

/// Probe both stores. Either failure is fatal and aborts before any record
/// is touched.
pub fn verify_connectivity(legacy: &LegacyStore, dest: &mut dyn Destination) -> Result<()> {
    if !legacy.ping()? {
        return Err(MigrateError::Connectivity(StoreSide::Legacy));
    }
    // Any error from a simple read means the destination is unreachable.
    dest.get("ping")
        .map_err(|_| MigrateError::Connectivity(StoreSide::Destination))?;
    Ok(())
}

pub fn run(settings: &Settings, format: Format) -> Result<()> {
    let legacy = LegacyStore::open(&settings.cache_path)?;
    let mut dest = RedisStore::connect(&settings.redis)?;
    verify_connectivity(&legacy, &mut dest)?;

    match format {
        Format::Json => println!(
            "{}",
            serde_json::json!({"legacy": "ok", "destination": "ok"})
        ),
        Format::Pretty => {
            println!("{} legacy store reachable", "ok".green().bold());
            println!("{} destination store reachable", "ok".green().bold());
        }
        Format::Minimal => println!("legacy=ok destination=ok"),
    }
    Ok(())
}
