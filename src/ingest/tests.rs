use std::path::{Path, PathBuf};

use rusqlite::Connection;
use uuid::Uuid;

use crate::config::BloomConfig;
use crate::db;

use super::{IngestError, IngestService};

fn unique_workspace() -> PathBuf {
    let root = std::env::temp_dir().join(format!("bloom-ingest-test-{}", Uuid::now_v7()));
    std::fs::create_dir_all(root.join("in")).expect("workspace should be creatable");
    root
}

fn setup(root: &Path) -> (Connection, BloomConfig) {
    let db_path = root.join("bloom.sqlite");
    let conn = db::open_connection(db_path.to_str().expect("utf8 path")).expect("db should open");
    db::insert_user(&conn, "Alice", "2026-01-01T00:00:00Z").expect("alice should insert");
    db::insert_user(&conn, "bob", "2026-01-01T00:00:00Z").expect("bob should insert");
    let config = BloomConfig {
        in_dir: root.join("in"),
        out_dir: root.join("out"),
        media_url: "/logs/".to_string(),
    };
    (conn, config)
}

fn write_pair(dir: &Path, stem: &str, log: &str, tags: &str) -> (PathBuf, PathBuf) {
    let log_path = dir.join(format!("{stem}.gamelog"));
    let tag_path = dir.join(format!("{stem}.tags"));
    std::fs::write(&log_path, log).expect("log should be writable");
    std::fs::write(&tag_path, tags).expect("tags should be writable");
    (log_path, tag_path)
}

fn game_count(conn: &Connection) -> i64 {
    row_count(conn, "game_logs")
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .expect("count should be readable")
}

#[test]
fn create_new_records_game_and_moves_log_under_its_hash() {
    let root = unique_workspace();
    let (conn, config) = setup(&root);
    let service = IngestService::new(&conn, &config);
    let (log, tags) = write_pair(
        &root.join("in"),
        "match-1",
        "turn 1\nturn 2\n",
        "42, alice, B ob, 0\nrush, early\nturtle\n",
    );

    let game = service.create_new(&log, &tags).expect("ingest should succeed");
    assert_eq!(game.number, 42);
    assert_eq!(game.p1.username, "Alice");
    assert_eq!(game.p2.username, "bob");
    assert!(game.p1.winner);
    assert!(!game.p2.winner);
    assert_eq!(game.file_name, format!("{}.gamelog", game.game_hash));

    assert!(!log.exists());
    assert!(tags.exists());
    let kept = config.out_dir.join(&game.file_name);
    assert_eq!(
        std::fs::read_to_string(kept).expect("kept log should be readable"),
        "turn 1\nturn 2\n"
    );

    assert_eq!(
        db::player_tags(&conn, game.p1.id).expect("p1 tags"),
        vec!["early", "rush"]
    );
    assert_eq!(db::player_tags(&conn, game.p2.id).expect("p2 tags"), vec!["turtle"]);

    let stored = db::get_game_log(&conn, game.id).expect("stored game should be readable");
    assert_eq!(stored, Some(game));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn rejected_inputs_leave_store_and_files_untouched() {
    let root = unique_workspace();
    let (conn, config) = setup(&root);
    let service = IngestService::new(&conn, &config);
    let inbox = root.join("in");

    let (log, tags) = write_pair(&inbox, "unknown", "a", "1, alice, mallory, 1\n");
    let err = service.create_new(&log, &tags).expect_err("unknown user should fail");
    assert!(matches!(err, IngestError::UnknownUser(ref name) if name == "mallory"));
    assert!(log.exists());

    let (log, tags) = write_pair(&inbox, "bad", "b", "1, alice, bob\n");
    let err = service.create_new(&log, &tags).expect_err("bad header should fail");
    assert!(matches!(err, IngestError::InvalidTagFile(_)));

    let missing = inbox.join("missing.gamelog");
    let err = service
        .create_new(&missing, &tags)
        .expect_err("missing log should fail");
    assert!(matches!(err, IngestError::MissingLog(_)));

    assert_eq!(game_count(&conn), 0);
    let players: i64 = conn
        .query_row("SELECT COUNT(*) FROM player_info", [], |row| row.get(0))
        .expect("count should be readable");
    assert_eq!(players, 0);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn identical_log_contents_are_rejected_as_duplicates() {
    let root = unique_workspace();
    let (conn, config) = setup(&root);
    let service = IngestService::new(&conn, &config);
    let inbox = root.join("in");

    let (log, tags) = write_pair(&inbox, "first", "same bytes", "1, alice, bob, 1\n");
    let first = service.create_new(&log, &tags).expect("first ingest should work");

    let (log, tags) = write_pair(&inbox, "second", "same bytes", "2, bob, alice, 0\n");
    let err = service.create_new(&log, &tags).expect_err("duplicate should fail");
    assert!(matches!(err, IngestError::Duplicate(ref hash) if *hash == first.game_hash));
    assert!(log.exists());
    assert_eq!(game_count(&conn), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn scan_inbox_counts_imports_skips_and_errors() {
    let root = unique_workspace();
    let (conn, config) = setup(&root);
    let service = IngestService::new(&conn, &config);
    let inbox = root.join("in");

    let (_, good_tags) = write_pair(&inbox, "a", "game a", "1, alice, bob, 0\n");
    write_pair(&inbox, "b", "game b", "2, alice, nobody, 0\n");
    std::fs::write(inbox.join("c.gamelog"), "orphan").expect("orphan should be writable");

    let first = service.scan_inbox().expect("scan should succeed");
    assert_eq!(first.processed_count, 2);
    assert_eq!(first.imported_count, 1);
    assert_eq!(first.error_count, 1);
    assert!(first
        .last_error
        .as_deref()
        .is_some_and(|message| message.contains("nobody")));
    assert!(!good_tags.exists());

    write_pair(&inbox, "d", "game a", "3, bob, alice, 1\n");
    let second = service.scan_inbox().expect("second scan should succeed");
    assert_eq!(second.skipped_count, 1);
    assert_eq!(second.error_count, 1);
    assert_eq!(game_count(&conn), 1);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn out_dir_blocked_leaves_no_rows_and_keeps_log() {
    let root = unique_workspace();
    let (conn, mut config) = setup(&root);
    std::fs::write(root.join("blocker"), "not a directory")
        .expect("blocker should be writable");
    config.out_dir = root.join("blocker/out");
    let service = IngestService::new(&conn, &config);
    let (log, tags) = write_pair(&root.join("in"), "blocked", "game", "5, alice, bob, 1\nrush\n");

    let err = service.create_new(&log, &tags).expect_err("blocked out_dir should fail");
    assert!(matches!(err, IngestError::Io(_)));
    assert!(log.exists());
    assert!(tags.exists());
    assert_eq!(game_count(&conn), 0);
    assert_eq!(row_count(&conn, "player_info"), 0);
    assert_eq!(row_count(&conn, "player_info_tags"), 0);
    assert_eq!(row_count(&conn, "tags"), 0);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn failed_commit_moves_log_back_and_leaves_no_rows() {
    let root = unique_workspace();
    let (conn, config) = setup(&root);
    conn.execute_batch(
        r#"
CREATE TABLE commit_guard (
    user_id INTEGER REFERENCES users(id) DEFERRABLE INITIALLY DEFERRED
);
CREATE TRIGGER guard_game_77 AFTER INSERT ON game_logs WHEN NEW.number = 77
BEGIN
    INSERT INTO commit_guard (user_id) VALUES (-1);
END;
"#,
    )
    .expect("guard should install");
    let service = IngestService::new(&conn, &config);
    let (log, tags) = write_pair(
        &root.join("in"),
        "guarded",
        "guarded game",
        "77, alice, bob, 0\n",
    );

    let err = service.create_new(&log, &tags).expect_err("commit should fail");
    assert!(matches!(err, IngestError::Db(_)));
    assert_eq!(
        std::fs::read_to_string(&log).expect("log should be back in the inbox"),
        "guarded game"
    );
    let kept = std::fs::read_dir(&config.out_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(kept, 0);
    assert_eq!(game_count(&conn), 0);
    assert_eq!(row_count(&conn, "player_info"), 0);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn scan_keeps_going_after_a_database_failure_on_one_pair() {
    let root = unique_workspace();
    let (conn, config) = setup(&root);
    conn.execute_batch(
        r#"
CREATE TRIGGER reject_game_99 BEFORE INSERT ON game_logs WHEN NEW.number = 99
BEGIN
    SELECT RAISE(ABORT, 'game 99 rejected');
END;
"#,
    )
    .expect("trigger should install");
    let service = IngestService::new(&conn, &config);
    let inbox = root.join("in");

    write_pair(&inbox, "a", "game a", "1, alice, bob, 0\n");
    let (failing_log, failing_tags) = write_pair(&inbox, "b", "game b", "99, bob, alice, 1\n");
    write_pair(&inbox, "c", "game c", "3, bob, alice, 0\n");

    let summary = service.scan_inbox().expect("scan should finish");
    assert_eq!(summary.processed_count, 3);
    assert_eq!(summary.imported_count, 2);
    assert_eq!(summary.error_count, 1);
    assert!(summary
        .last_error
        .as_deref()
        .is_some_and(|message| message.contains("b.gamelog")));
    assert!(failing_log.exists());
    assert!(failing_tags.exists());
    assert_eq!(game_count(&conn), 2);
    assert_eq!(row_count(&conn, "player_info"), 4);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn scan_requires_existing_inbox() {
    let root = unique_workspace();
    let (conn, mut config) = setup(&root);
    config.in_dir = root.join("absent");
    let service = IngestService::new(&conn, &config);
    let err = service.scan_inbox().expect_err("missing inbox should fail");
    assert!(matches!(err, IngestError::MissingInbox(_)));
    let _ = std::fs::remove_dir_all(root);
}
