//! Error reporting and hints.

use predicates::prelude::*;

use crate::skip_without_git;
use crate::support::*;

#[test]
fn test_commands_before_init_suggest_init() {
    skip_without_git!();
    let t = Test::new();
    let cases: [&[&str]; 3] = [&["ls"], &["show", "x"], &["scan"]];
    for args in cases {
        let output = t.run(args);
        assert_failure(&output);
        assert_stderr_contains(&output, "not a git repository");
        assert_stderr_contains(&output, "cellar init");
    }
}

#[test]
fn test_missing_secret_names_operation_and_path() {
    skip_without_git!();
    let t = Test::init("alice@example.com");
    let output = t.show("nope");
    assert_failure(&output);
    assert_stderr_contains(&output, "read nope:");
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_path_traversal_rejected() {
    skip_without_git!();
    let t = Test::init("alice@example.com");
    let output = t.insert("../outside", "x");
    assert_failure(&output);
    assert_stderr_contains(&output, "invalid path");
    assert!(!t.home.path().join("outside.age").exists());
}

#[test]
fn test_completions_need_no_store() {
    let t = Test::new();
    for shell in ["bash", "zsh", "fish", "powershell"] {
        t.cmd()
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("cellar"));
    }
    assert!(!t.store_dir().exists());
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();
    t.cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
