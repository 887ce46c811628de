//! Tests for `cellar serve`.

use std::io::Cursor;

use cellar::protocol::{read_frame, write_frame};
use serde_json::json;

use crate::skip_without_git;
use crate::support::*;

#[test]
fn test_serve_over_stdio() {
    skip_without_git!();
    let t = Test::init("alice@example.com");

    let mut input = Vec::new();
    for request in [
        json!({"add_file": {"filename": "site.com/alice", "password": "p@ss", "username": "alice"}}),
        json!({"view_file": {"filename": "site.com/alice"}}),
    ] {
        write_frame(&mut input, &serde_json::to_vec(&request).unwrap()).unwrap();
    }

    let output = t.cmd().arg("serve").write_stdin(input).output().unwrap();
    assert_success(&output);

    let mut reader = Cursor::new(output.stdout);
    let added: serde_json::Value =
        serde_json::from_slice(&read_frame(&mut reader).unwrap().unwrap()).unwrap();
    assert_eq!(added["status"], "");
    let viewed: serde_json::Value =
        serde_json::from_slice(&read_frame(&mut reader).unwrap().unwrap()).unwrap();
    assert_eq!(viewed["view_file"]["password"], "p@ss");
    assert_eq!(viewed["view_file"]["username"], "alice");
    assert!(read_frame(&mut reader).unwrap().is_none());

    assert_eq!(stdout(&t.show("site.com/alice")), "p@ss\n");
}
