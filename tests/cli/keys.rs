//! Tests for `cellar keys`.

use predicates::prelude::*;

use crate::support::*;

const ALICE: &str = "alice@example.com";

#[test]
fn test_generate_and_list() {
    let t = Test::new();
    let output = t.generate("alice", ALICE);
    assert_success(&output);
    assert_stdout_contains(&output, "generated");
    assert_stdout_contains(&output, "age1");

    let output = t.run(&["keys", "list"]);
    assert_success(&output);
    assert_stdout_contains(&output, "alice <alice@example.com>");
    assert_stdout_contains(&output, "secret");

    let output = t.run(&["keys", "list", "--secret", "--json"]);
    let keys: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(keys.as_array().unwrap().len(), 1);
    assert_eq!(keys[0]["can_decrypt"], true);
}

#[test]
fn test_generate_rejects_non_positive_expiry() {
    let t = Test::new();
    t.cmd()
        .args(["keys", "generate", "--expires-in", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive"));
    t.cmd()
        .args(["keys", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no keys"));
}

#[test]
fn test_export_import_between_keyrings() {
    let a = Test::new();
    assert_success(&a.generate("alice", ALICE));
    let exported = a.run(&["keys", "export", ALICE]);
    assert_success(&exported);
    assert_stdout_contains(&exported, "age1");

    let b = Test::new();
    let output = b
        .cmd()
        .args(["keys", "import"])
        .write_stdin(exported.stdout.clone())
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "imported public key");
    assert_eq!(b.fingerprint(ALICE), a.fingerprint(ALICE));

    // nothing new the second time
    let output = b
        .cmd()
        .args(["keys", "import"])
        .write_stdin(exported.stdout)
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "no new keys");

    assert_success(&b.run(&["keys", "trust", ALICE]));
    let output = b.run(&["keys", "list", "--json"]);
    let keys: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(keys[0]["trusted"], true);

    assert_success(&b.run(&["keys", "delete", ALICE]));
    let output = b.run(&["keys", "list", "--json"]);
    assert_eq!(stdout(&output).trim(), "[]");
}

#[test]
fn test_delete_own_key_needs_secret_first() {
    let t = Test::new();
    assert_success(&t.generate("alice", ALICE));

    let output = t.run(&["keys", "delete", ALICE]);
    assert_failure(&output);
    assert_stderr_contains(&output, "delete it first");

    assert_success(&t.run(&["keys", "delete", ALICE, "--secret"]));
    assert_success(&t.run(&["keys", "delete", ALICE]));
}
