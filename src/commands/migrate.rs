use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::commands::check;
use crate::config::{MoveFailurePolicy, Settings};
use crate::error::Result;
use crate::model::{self, LegacyRecord, NewRecord, RecordKind};
use crate::output::{Format, Progress};
use crate::store::destination::{Destination, MemoryStore, RedisStore};
use crate::store::legacy::LegacyStore;
use crate::store::lock::RunLock;
use crate::uploads::{self, MoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Parse,
    MissingFile,
    MoveFailed,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse => write!(f, "parse"),
            Self::MissingFile => write!(f, "missing_file"),
            Self::MoveFailed => write!(f, "move_failed"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkippedRecord {
    pub key: String,
    pub reason: SkipReason,
    pub detail: String,
}

/// Summary of one migration pass. Per-record skips never abort the run;
/// they are collected here and the process still exits 0.
#[derive(Debug, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub keys: usize,
    pub migrated_short: usize,
    pub migrated_files: usize,
    pub skipped: Vec<SkippedRecord>,
    pub move_warnings: Vec<String>,
}

impl MigrationReport {
    fn new(dry_run: bool, keys: usize) -> Self {
        Self {
            dry_run,
            keys,
            migrated_short: 0,
            migrated_files: 0,
            skipped: Vec::new(),
            move_warnings: Vec::new(),
        }
    }
}

/// Per-record result: either a record to write under the prefixed key, or a
/// reason the record was dropped.
#[derive(Debug)]
enum RecordOutcome {
    Migrated {
        record: NewRecord,
        warning: Option<String>,
    },
    Skipped {
        reason: SkipReason,
        detail: String,
    },
}

pub fn run(settings: &Settings, dry_run: bool, format: Format) -> Result<()> {
    let progress = Progress::new(format);
    progress.phase("Opening stores...");
    let legacy = LegacyStore::open(&settings.cache_path)?;

    let report = if dry_run {
        // Writes land in memory and are discarded; no lock needed.
        let mut dest = MemoryStore::new();
        progress.phase("Checking connection to both stores...");
        check::verify_connectivity(&legacy, &mut dest)?;
        migrate_all(&legacy, &mut dest, settings, true, &progress)?
    } else {
        let _lock = RunLock::acquire(&settings.cache_path)?;
        let mut dest = RedisStore::connect(&settings.redis)?;
        progress.phase("Checking connection to both stores...");
        check::verify_connectivity(&legacy, &mut dest)?;
        migrate_all(&legacy, &mut dest, settings, false, &progress)?
    };

    print_report(&report, format)
}

/// Drive the whole pass: enumerate, transform, write, aggregate.
pub fn migrate_all(
    legacy: &LegacyStore,
    dest: &mut dyn Destination,
    settings: &Settings,
    dry_run: bool,
    progress: &Progress,
) -> Result<MigrationReport> {
    let keys = legacy.keys()?;
    progress.phase(&format!("Processing {} keys", keys.len()));

    let mut report = MigrationReport::new(dry_run, keys.len());
    for key in keys {
        let raw = legacy.get(&key)?;
        match migrate_record(settings, &key, raw.as_deref(), dry_run, progress)? {
            RecordOutcome::Migrated { record, warning } => {
                match record {
                    NewRecord::Short { .. } => report.migrated_short += 1,
                    NewRecord::File { .. } => report.migrated_files += 1,
                }
                if let Some(warning) = warning {
                    report.move_warnings.push(format!("{key}: {warning}"));
                }
                dest.set(&model::prefixed_key(&key), &serde_json::to_string(&record)?)?;
            }
            RecordOutcome::Skipped { reason, detail } => {
                report.skipped.push(SkippedRecord {
                    key,
                    reason,
                    detail,
                });
            }
        }
    }
    Ok(report)
}

fn migrate_record(
    settings: &Settings,
    key: &str,
    raw: Option<&str>,
    dry_run: bool,
    progress: &Progress,
) -> Result<RecordOutcome> {
    let Some(raw) = raw else {
        progress.error(&format!("failed to parse {key}: value missing"));
        return Ok(RecordOutcome::Skipped {
            reason: SkipReason::Parse,
            detail: "value missing from cache".into(),
        });
    };

    let legacy: LegacyRecord = match serde_json::from_str(raw) {
        Ok(record) => record,
        Err(_) => {
            progress.error(&format!("failed to parse {key}: {raw}"));
            return Ok(RecordOutcome::Skipped {
                reason: SkipReason::Parse,
                detail: raw.to_string(),
            });
        }
    };

    match legacy.classify() {
        Some(RecordKind::Short { target }) => {
            progress.record("short", key);
            Ok(RecordOutcome::Migrated {
                record: NewRecord::short(target),
                warning: None,
            })
        }
        Some(RecordKind::File { path, mimetype }) => {
            progress.record("file", key);
            migrate_file(settings, &legacy, path, mimetype, dry_run, progress)
        }
        None => {
            progress.error(&format!("failed to parse {key}: {raw}"));
            Ok(RecordOutcome::Skipped {
                reason: SkipReason::Parse,
                detail: format!("record missing required fields: {raw}"),
            })
        }
    }
}

fn migrate_file(
    settings: &Settings,
    legacy: &LegacyRecord,
    path: &str,
    mimetype: &str,
    dry_run: bool,
    progress: &Progress,
) -> Result<RecordOutcome> {
    let src = Path::new(path);
    let is_admin = uploads::is_admin_path(path);

    // The file must be present to read its creation time; otherwise the
    // whole record is skipped, with no destination write.
    let time_added = match uploads::creation_time_ms(src) {
        Ok(ms) => ms,
        Err(err) => {
            progress.error(&format!("missing file '{path}', skipping record ({err})"));
            return Ok(RecordOutcome::Skipped {
                reason: SkipReason::MissingFile,
                detail: err.to_string(),
            });
        }
    };

    let dir = uploads::dest_dir(&settings.new_uploads_path, is_admin);
    let (new_path, warning) = if dry_run {
        (uploads::dest_path(&dir, src)?, None)
    } else {
        let (new_path, outcome) = uploads::relocate(src, &dir)?;
        match outcome {
            MoveOutcome::Moved => (new_path, None),
            MoveOutcome::Failed(err) => {
                progress.warn(&format!("failed to move '{path}': {err}"));
                if settings.on_move_failure == MoveFailurePolicy::SkipRecord {
                    return Ok(RecordOutcome::Skipped {
                        reason: SkipReason::MoveFailed,
                        detail: err,
                    });
                }
                // WriteRecord policy: the record carries the intended path
                // even though the file is still at the old one.
                (new_path, Some(err))
            }
        }
    };

    Ok(RecordOutcome::Migrated {
        record: NewRecord::file(
            &legacy.kind,
            is_admin,
            new_path.to_string_lossy().into_owned(),
            mimetype,
            time_added,
        ),
        warning,
    })
}

fn print_report(report: &MigrationReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            let mode = if report.dry_run { "dry-run" } else { "apply" };
            println!(
                "\n{} {}",
                "migration".bold(),
                format!("({mode})").dimmed()
            );
            println!("  {} {}", "keys:".dimmed(), report.keys);
            println!(
                "  {} {} short-links, {} files",
                "migrated:".dimmed(),
                report.migrated_short,
                report.migrated_files
            );

            if !report.skipped.is_empty() {
                println!("\n{}", "Skipped".yellow().bold());
                for skip in &report.skipped {
                    println!(
                        "  - {}: {} ({})",
                        skip.key,
                        skip.reason.to_string().yellow(),
                        skip.detail
                    );
                }
            }

            if !report.move_warnings.is_empty() {
                println!("\n{}", "Move warnings".yellow().bold());
                for warning in &report.move_warnings {
                    println!("  - {}", warning.yellow());
                }
            }

            if report.skipped.is_empty() && report.move_warnings.is_empty() {
                println!("\n{}", "All records migrated cleanly.".green());
            }
        }
        Format::Minimal => {
            println!(
                "dry_run={} keys={} short={} files={} skipped={} move_warnings={}",
                report.dry_run,
                report.keys,
                report.migrated_short,
                report.migrated_files,
                report.skipped.len(),
                report.move_warnings.len()
            );
        }
    }
    Ok(())
}
