//! Tests for `cellar init`.

use crate::skip_without_git;
use crate::support::*;

#[test]
fn test_init_creates_repository_and_marker() {
    skip_without_git!();
    let t = Test::init("alice@example.com");

    assert!(t.store_dir().join(".git").exists());
    let marker = std::fs::read_to_string(t.store_dir().join(".age-id")).unwrap();
    assert_eq!(marker.trim(), t.fingerprint("alice@example.com"));

    let output = t.run(&["log"]);
    assert_success(&output);
    assert_stdout_contains(&output, "initialized store with recipients");
}

#[test]
fn test_init_lists_root_recipients() {
    skip_without_git!();
    let t = Test::new();
    assert_success(&t.generate("alice", "alice@example.com"));
    let output = t.init_cmd(&["alice@example.com"]);
    assert_success(&output);
    assert_stdout_contains(&output, "initialized");
    assert_stdout_contains(&output, &t.fingerprint("alice@example.com"));
}

#[test]
fn test_init_twice_fails() {
    skip_without_git!();
    let t = Test::init("alice@example.com");
    let output = t.init_cmd(&["alice@example.com"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "already tracked");
}

#[test]
fn test_init_with_unknown_key_fails() {
    skip_without_git!();
    let t = Test::new();
    let output = t.init_cmd(&["nobody@example.com"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "key not found");
    assert_stderr_contains(&output, "cellar keys list");
}
