//! Tests for insert/show/edit/mv/rm/ls/search.

use crate::skip_without_git;
use crate::support::*;

const ALICE: &str = "alice@example.com";

#[test]
fn test_insert_and_show_roundtrip() {
    skip_without_git!();
    let t = Test::init(ALICE);

    let output = t.insert_with("site.com/alice", "p@ss", &["-f", "user=alice"]);
    assert_success(&output);
    assert_stdout_contains(&output, "site.com/alice");

    let output = t.show("site.com/alice");
    assert_success(&output);
    assert_eq!(stdout(&output), "p@ss\n");

    let output = t.run(&["show", "site.com/alice", "--field", "user"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "alice\n");

    let output = t.run(&["show", "site.com/alice", "--json"]);
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["secret"], "p@ss");
    assert_eq!(json["fields"]["user"], "alice");
}

#[test]
fn test_ciphertext_does_not_leak_plaintext() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("token", "very-secret-value")]);
    let raw = std::fs::read(t.store_dir().join("token.age")).unwrap();
    let raw = String::from_utf8_lossy(&raw);
    assert!(!raw.contains("very-secret-value"));
}

#[test]
fn test_insert_existing_requires_force() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("token", "one")]);

    let output = t.insert("token", "two");
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");

    assert_success(&t.insert_with("token", "two", &["--force"]));
    assert_eq!(stdout(&t.show("token")), "two\n");
}

#[test]
fn test_insert_empty_secret_fails() {
    skip_without_git!();
    let t = Test::init(ALICE);
    let output = t.insert("empty", "");
    assert_failure(&output);
    assert_stderr_contains(&output, "empty");
}

#[test]
fn test_rm_then_show_fails() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("token", "one")]);
    assert_success(&t.rm("token"));
    let output = t.show("token");
    assert_failure(&output);
    assert_stderr_contains(&output, "not found");
}

#[test]
fn test_ls_sorted_and_filtered() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("b/two", "2"), ("a", "1"), ("b/one", "1")]);

    let output = t.ls();
    assert_success(&output);
    assert_eq!(stdout(&output), "a\nb/one\nb/two\n");

    let output = t.run(&["ls", "b"]);
    assert_eq!(stdout(&output), "b/one\nb/two\n");

    let output = t.run(&["ls", "--json"]);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["count"], 3);
}

#[test]
fn test_mv_moves_secret() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("old", "v")]);
    assert_success(&t.run(&["mv", "old", "dir/new"]));
    assert_failure(&t.show("old"));
    assert_eq!(stdout(&t.show("dir/new")), "v\n");
}

#[test]
fn test_edit_fields_and_location() {
    skip_without_git!();
    let t = Test::init(ALICE);
    assert_success(&t.insert_with("svc", "pw", &["-f", "user=bob", "-f", "pin=1"]));

    let output = t.run(&["edit", "svc", "--set", "user=carol", "--unset", "pin"]);
    assert_success(&output);
    let output = t.run(&["show", "svc", "--json"]);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["secret"], "pw");
    assert_eq!(json["fields"], serde_json::json!({"user": "carol"}));

    assert_success(&t.run(&["edit", "svc", "--to", "moved/svc"]));
    assert_failure(&t.show("svc"));
    assert_eq!(stdout(&t.show("moved/svc")), "pw\n");

    let output = t.run(&["log", "-n", "1"]);
    assert_stdout_contains(&output, "replaced svc with moved/svc");
}

#[test]
fn test_edit_without_changes_fails() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("svc", "pw")]);
    let output = t.run(&["edit", "svc"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "nothing to change");
}

#[test]
fn test_search_matches_paths_and_fields_not_secrets() {
    skip_without_git!();
    let t = Test::init(ALICE);
    assert_success(&t.insert_with("mail/work", "hunter2", &["-f", "url=mail.example.com"]));
    assert_success(&t.insert("bank", "example"));

    let output = t.run(&["search", "EXAMPLE"]);
    assert_success(&output);
    assert_stdout_contains(&output, "mail/work");
    assert_stdout_contains(&output, "url: mail.example.com");
    assert_stdout_excludes(&output, "bank");

    let output = t.run(&["search", "hunter2"]);
    assert_success(&output);
    assert_stdout_excludes(&output, "mail/work");
}

#[test]
fn test_log_shows_newest_first() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("a", "1"), ("b", "2")]);
    let output = t.run(&["log", "-n", "2"]);
    assert_success(&output);
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("created b"));
    assert!(lines[1].ends_with("created a"));
}
