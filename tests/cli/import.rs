//! Tests for importing browser password exports.

use crate::skip_without_git;
use crate::support::*;

const ALICE: &str = "alice@example.com";

const EXPORT: &str = "\
name,url,username,password
example.com,https://example.com/,alice,hunter2
mail.test,https://mail.test/,bob,s3cret
";

fn write_csv(t: &Test, contents: &str) -> String {
    let path = t.dir.path().join("passwords.csv");
    std::fs::write(&path, contents).unwrap();
    path.display().to_string()
}

#[test]
fn test_import_chrome_export() {
    skip_without_git!();
    let t = Test::init(ALICE);
    let csv = write_csv(&t, EXPORT);

    let output = t.run(&["import", "--chrome", &csv]);
    assert_success(&output);
    assert_stdout_contains(&output, "imported 2 secret(s)");

    assert_eq!(stdout(&t.show("example.com/alice")), "hunter2\n");
    let output = t.run(&["show", "mail.test/bob", "--field", "url"]);
    assert_eq!(stdout(&output), "https://mail.test/\n");

    let output = t.run(&["log", "-n", "1"]);
    assert_stdout_contains(&output, "created mail.test/bob");
}

#[test]
fn test_import_existing_needs_overwrite() {
    skip_without_git!();
    let t = Test::with_secrets(ALICE, &[("example.com/alice", "old")]);
    let csv = write_csv(&t, EXPORT);

    let output = t.run(&["import", "--chrome", &csv]);
    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");
    assert_eq!(stdout(&t.show("example.com/alice")), "old\n");

    assert_success(&t.run(&["import", "--chrome", &csv, "--overwrite"]));
    assert_eq!(stdout(&t.show("example.com/alice")), "hunter2\n");
    assert_eq!(stdout(&t.show("mail.test/bob")), "s3cret\n");
}

#[test]
fn test_import_ignore_failures_reports_rows() {
    skip_without_git!();
    let t = Test::init(ALICE);
    let csv = write_csv(
        &t,
        "name,username,password\nfirst,a,pw\nempty,b,\nthird,c,pw\n",
    );

    let output = t.run(&["import", "--chrome", &csv, "--ignore-failures", "--json"]);
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["imported"], serde_json::json!(["first/a", "third/c"]));
    assert_eq!(json["failed"][0]["path"], "empty/b");
}

#[test]
fn test_import_rejects_missing_columns() {
    skip_without_git!();
    let t = Test::init(ALICE);
    let csv = write_csv(&t, "site,password\nx,y\n");

    let output = t.run(&["import", "--chrome", &csv]);
    assert_failure(&output);
    assert_stderr_contains(&output, "no name column");
    assert_stdout_excludes(&output, "imported");
}
