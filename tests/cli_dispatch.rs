use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(path.join("in")).expect("workspace should be creatable");
    path
}

fn run_bloom(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bloom"))
        .env_remove("BLOOM_IN_PATH")
        .env_remove("BLOOM_OUT_PATH")
        .env("NO_COLOR", "1")
        .arg("--db")
        .arg(root.join("state/bloom.sqlite"))
        .arg("--config")
        .arg(root.join("config.toml"))
        .arg("--in-dir")
        .arg(root.join("in"))
        .arg("--out-dir")
        .arg(root.join("out"))
        .args(args)
        .output()
        .expect("bloom command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn parse_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn drop_pair(root: &Path, stem: &str, log: &str, tags: &str) {
    std::fs::write(root.join("in").join(format!("{stem}.gamelog")), log)
        .expect("log should be writable");
    std::fs::write(root.join("in").join(format!("{stem}.tags")), tags)
        .expect("tags should be writable");
}

#[test]
fn ingest_scan_and_report_round_trip() {
    let root = unique_workspace("bloom-cli-dispatch");
    std::fs::write(root.join("config.toml"), "media_url = \"https://logs.test/\"\n")
        .expect("config should be writable");

    for name in ["alice", "bob", "carol"] {
        assert_success(&run_bloom(&root, &["user", "add", name]));
    }
    assert_failure(&run_bloom(&root, &["user", "add", "Alice"]));

    drop_pair(&root, "one", "game one", "1, alice, bob, 0\nrush\nturtle\n");
    let ingest = run_bloom(
        &root,
        &[
            "ingest",
            root.join("in/one.gamelog").to_str().expect("utf8 path"),
            root.join("in/one.tags").to_str().expect("utf8 path"),
            "--json",
        ],
    );
    assert_success(&ingest);
    let game = parse_json(&ingest);
    let hash = game["game_hash"].as_str().expect("hash should be a string");
    assert_eq!(game["url"], format!("https://logs.test/{hash}.gamelog"));
    assert!(root.join("out").join(format!("{hash}.gamelog")).exists());

    drop_pair(&root, "two", "game two", "2, Carol, alice, 1\nmacro\nrush\n");
    drop_pair(&root, "three", "game three", "3, alice, nobody, 0\n\n\n");
    let scan = run_bloom(&root, &["scan", "--json"]);
    assert_success(&scan);
    let summary = parse_json(&scan);
    assert_eq!(summary["imported_count"], 1);
    assert_eq!(summary["error_count"], 1);

    let mine = run_bloom(&root, &["games", "--user", "alice", "--json"]);
    assert_success(&mine);
    let mine = parse_json(&mine);
    let statuses: Vec<&str> = mine
        .as_array()
        .expect("listing should be an array")
        .iter()
        .map(|row| row["win_status"].as_str().expect("status should be a string"))
        .collect();
    assert_eq!(statuses, vec!["win", "win"]);

    let tagged = run_bloom(&root, &["games", "--tag", "macro", "--json"]);
    assert_success(&tagged);
    let tagged = parse_json(&tagged);
    assert_eq!(tagged[0]["winner"], "alice");

    let stats = run_bloom(&root, &["stats", "--refresh", "--json"]);
    assert_success(&stats);
    let stats = parse_json(&stats);
    assert_eq!(stats[0]["username"], "alice");
    assert_eq!(stats[0]["wins"], 2);
    assert_eq!(stats[0]["ratio"], 100);

    let show = run_bloom(&root, &["show", hash]);
    assert_success(&show);
    assert!(String::from_utf8_lossy(&show.stdout).contains("alice vs. bob"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn failures_exit_non_zero_with_error_prefix() {
    let root = unique_workspace("bloom-cli-failures");

    let vs_only = run_bloom(&root, &["games", "--vs", "bob"]);
    assert_failure(&vs_only);
    assert!(String::from_utf8_lossy(&vs_only.stderr).starts_with("error: "));

    let missing = run_bloom(&root, &["show", "404"]);
    assert_failure(&missing);
    assert!(String::from_utf8_lossy(&missing.stderr).contains("game '404' not found"));

    std::fs::write(root.join("config.toml"), "in_dir = [").expect("config should be writable");
    let bad_config = run_bloom(&root, &["tags"]);
    assert_failure(&bad_config);
    assert!(String::from_utf8_lossy(&bad_config.stderr).contains("config error"));

    let _ = std::fs::remove_dir_all(root);
}
