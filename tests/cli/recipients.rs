//! Tests for recipients, reinit and scan.

use crate::skip_without_git;
use crate::support::*;

const ALICE: &str = "alice@example.com";
const BOB: &str = "bob@example.com";

fn scan(t: &Test) -> serde_json::Value {
    let output = t.run(&["scan", "--json"]);
    assert_success(&output);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_add_and_remove_recipient() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("a", "1"), ("b/c", "2")]);
    assert_success(&t.generate("bob", BOB));
    let (alice, bob) = (t.fingerprint(ALICE), t.fingerprint(BOB));

    let output = t.run(&["recipients", "add", BOB]);
    assert_success(&output);
    assert_stdout_contains(&output, "reencrypted");

    let report = scan(&t);
    assert_eq!(report["files"], 2);
    assert_eq!(report["per_key"][&alice], 2);
    assert_eq!(report["per_key"][&bob], 2);

    assert_success(&t.run(&["recipients", "rm", ALICE]));
    let report = scan(&t);
    assert!(report["per_key"].get(&alice).is_none());
    assert_eq!(report["per_key"][&bob], 2);

    let output = t.run(&["recipients", "list", "--json"]);
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list["recipients"].as_array().unwrap().len(), 1);
    assert_eq!(list["recipients"][0]["fingerprint"], bob);

    // bob's key was generated here, so secrets remain readable
    assert_eq!(stdout(&t.show("b/c")), "2\n");
}

#[test]
fn test_add_existing_recipient_fails() {
    skip_without_git!();
    let t = Test::init(ALICE);
    let output = t.run(&["recipients", "add", ALICE]);
    assert_failure(&output);
    assert_stderr_contains(&output, "already a recipient");
}

#[test]
fn test_remove_last_recipient_fails() {
    skip_without_git!();
    let t = Test::init(ALICE);
    let output = t.run(&["recipients", "rm", ALICE]);
    assert_failure(&output);
    assert_stderr_contains(&output, "cannot be empty");
}

#[test]
fn test_reinit_nested_directory() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("top", "1"), ("team/db", "2")]);
    assert_success(&t.generate("bob", BOB));
    let bob = t.fingerprint(BOB);

    let output = t.run(&["reinit", "team", BOB]);
    assert_success(&output);
    assert!(t.store_dir().join("team/.age-id").exists());

    let output = t.run(&["recipients", "list", "team", "--json"]);
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list["domain"], "team");
    assert_eq!(list["recipients"][0]["fingerprint"], bob);

    let output = t.run(&["recipients", "list", "elsewhere", "--json"]);
    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(list["domain"], ".");

    let report = scan(&t);
    assert_eq!(report["per_key"][&bob], 1);
    assert_eq!(report["mismatched"], serde_json::json!([]));
}
