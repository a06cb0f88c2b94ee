use std::fs;
use std::path::Path;

use tempfile::tempdir;

use ihacdn_migrate::commands::check::verify_connectivity;
use ihacdn_migrate::commands::migrate::{SkipReason, migrate_all};
use ihacdn_migrate::config::{MoveFailurePolicy, RedisSettings, Settings};
use ihacdn_migrate::output::{Format, Progress};
use ihacdn_migrate::store::destination::MemoryStore;
use ihacdn_migrate::store::legacy::LegacyStore;
use ihacdn_migrate::uploads;

fn settings(root: &Path) -> Settings {
    Settings {
        cache_path: root.join("diskcache"),
        redis: RedisSettings {
            host: "127.0.0.1".into(),
            port: 6379,
            password: None,
        },
        new_uploads_path: root.join("new"),
        on_move_failure: MoveFailurePolicy::WriteRecord,
    }
}

fn quiet() -> Progress {
    Progress::new(Format::Json)
}

#[test]
fn short_link_record_migrates_verbatim() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();
    legacy
        .set("abc123", r#"{"type":"short","target":"https://example.com"}"#)
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.migrated_short, 1);
    assert_eq!(report.migrated_files, 0);
    assert!(report.skipped.is_empty());
    assert_eq!(
        dest.entries().get("ihacdnabc123").map(String::as_str),
        Some(r#"{"type":"short","target":"https://example.com"}"#)
    );
    // Short-links never touch the filesystem.
    assert!(!settings.new_uploads_path.exists());
}

#[test]
fn file_record_moves_file_and_rewrites_path() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();

    let old_dir = dir.path().join("old").join("uploads");
    fs::create_dir_all(&old_dir).unwrap();
    let old_path = old_dir.join("photo.png");
    fs::write(&old_path, b"png-bytes").unwrap();
    let expected_time = uploads::creation_time_ms(&old_path).unwrap();

    legacy
        .set(
            "xyz789",
            &format!(
                r#"{{"type":"file","path":"{}","mimetype":"image/png"}}"#,
                old_path.display()
            ),
        )
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.migrated_files, 1);
    assert!(report.move_warnings.is_empty());

    let new_path = settings.new_uploads_path.join("uploads").join("photo.png");
    assert!(new_path.exists());
    assert!(!old_path.exists());

    let expected = format!(
        r#"{{"type":"file","is_admin":false,"path":"{}","mimetype":"image/png","time_added":{}}}"#,
        new_path.display(),
        expected_time
    );
    assert_eq!(
        dest.entries().get("ihacdnxyz789").map(String::as_str),
        Some(expected.as_str())
    );
}

#[test]
fn admin_uploads_land_in_admin_directory() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();

    let old_dir = dir.path().join("old").join("uploads_admin");
    fs::create_dir_all(&old_dir).unwrap();
    let old_path = old_dir.join("secret.pdf");
    fs::write(&old_path, b"pdf").unwrap();

    legacy
        .set(
            "adm1",
            &format!(
                r#"{{"type":"file","path":"{}","mimetype":"application/pdf"}}"#,
                old_path.display()
            ),
        )
        .unwrap();

    let mut dest = MemoryStore::new();
    migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    let new_path = settings
        .new_uploads_path
        .join("uploads_admin")
        .join("secret.pdf");
    assert!(new_path.exists());

    let record: serde_json::Value =
        serde_json::from_str(dest.entries().get("ihacdnadm1").unwrap()).unwrap();
    assert_eq!(record["is_admin"], serde_json::json!(true));
    assert_eq!(record["path"], serde_json::json!(new_path.display().to_string()));
}

#[test]
fn parse_failure_skips_record_and_continues() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();
    legacy.set("bad", "definitely not json").unwrap();
    legacy
        .set("good", r#"{"type":"short","target":"https://example.com"}"#)
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.migrated_short, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].key, "bad");
    assert_eq!(report.skipped[0].reason, SkipReason::Parse);
    assert!(!dest.entries().contains_key("ihacdnbad"));
    assert!(dest.entries().contains_key("ihacdngood"));
}

#[test]
fn file_record_missing_required_field_is_a_parse_skip() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();
    legacy
        .set("nomime", r#"{"type":"file","path":"/tmp/x.png"}"#)
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::Parse);
    assert!(dest.entries().is_empty());
}

#[test]
fn missing_file_skips_entire_record() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();
    legacy
        .set(
            "ghost",
            &format!(
                r#"{{"type":"file","path":"{}","mimetype":"image/png"}}"#,
                dir.path().join("nowhere.png").display()
            ),
        )
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.migrated_files, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::MissingFile);
    assert!(dest.entries().is_empty());
}

#[test]
fn move_failure_still_writes_record_by_default() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();

    let old_path = dir.path().join("stuck.png");
    fs::write(&old_path, b"png").unwrap();

    // A non-empty directory at the destination path makes the rename fail
    // while the source file stays where it is.
    let new_path = settings.new_uploads_path.join("uploads").join("stuck.png");
    fs::create_dir_all(new_path.join("occupied")).unwrap();

    legacy
        .set(
            "stuck",
            &format!(
                r#"{{"type":"file","path":"{}","mimetype":"image/png"}}"#,
                old_path.display()
            ),
        )
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.migrated_files, 1);
    assert_eq!(report.move_warnings.len(), 1);
    assert!(old_path.exists());

    // The record points at the intended new path even though the move
    // failed; that is the documented default policy.
    let record: serde_json::Value =
        serde_json::from_str(dest.entries().get("ihacdnstuck").unwrap()).unwrap();
    assert_eq!(
        record["path"],
        serde_json::json!(new_path.display().to_string())
    );
}

#[test]
fn move_failure_skip_policy_writes_nothing() {
    let dir = tempdir().unwrap();
    let mut settings = settings(dir.path());
    settings.on_move_failure = MoveFailurePolicy::SkipRecord;
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();

    let old_path = dir.path().join("stuck.png");
    fs::write(&old_path, b"png").unwrap();
    let new_path = settings.new_uploads_path.join("uploads").join("stuck.png");
    fs::create_dir_all(new_path.join("occupied")).unwrap();

    legacy
        .set(
            "stuck",
            &format!(
                r#"{{"type":"file","path":"{}","mimetype":"image/png"}}"#,
                old_path.display()
            ),
        )
        .unwrap();

    let mut dest = MemoryStore::new();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(report.migrated_files, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].reason, SkipReason::MoveFailed);
    assert!(dest.entries().is_empty());
    assert!(old_path.exists());
}

#[test]
fn rerun_leaves_destination_content_identical() {
    let dir = tempdir().unwrap();
    let settings = settings(dir.path());
    let legacy = LegacyStore::open(&settings.cache_path).unwrap();

    let old_path = dir.path().join("photo.png");
    fs::write(&old_path, b"png").unwrap();

    legacy
        .set("s1", r#"{"type":"short","target":"https://example.com"}"#)
        .unwrap();
    legacy
        .set(
            "f1",
            &format!(
                r#"{{"type":"file","path":"{}","mimetype":"image/png"}}"#,
                old_path.display()
            ),
        )
        .unwrap();

    let mut dest = MemoryStore::new();
    verify_connectivity(&legacy, &mut dest).unwrap();
    migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();
    let first_pass = dest.entries().clone();

    // The sentinel key is enumerated but never parses as a record.
    assert!(!first_pass.contains_key("ihacdnping"));

    // Second pass: the file has already been moved away from its legacy
    // path, so the file record is skipped and nothing changes.
    verify_connectivity(&legacy, &mut dest).unwrap();
    let report = migrate_all(&legacy, &mut dest, &settings, false, &quiet()).unwrap();

    assert_eq!(dest.entries(), &first_pass);
    assert_eq!(report.migrated_short, 1);
    assert!(
        report
            .skipped
            .iter()
            .any(|s| s.key == "f1" && s.reason == SkipReason::MissingFile)
    );
}
