//! End-to-end tests for the `irlens` binary.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

const SCHEMA: &str = r#"{"Nodes": [
    {"Name": "TCoInputBase", "Children": [{"Index": 0, "Name": "Input"}]},
    {"Name": "TCoMap", "Base": "TCoInputBase",
     "Match": {"Type": "Callable", "Name": "Map"},
     "Children": [{"Index": 1, "Name": "Lambda"}]}
]}"#;

fn write_fixture(name: &str, contents: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_irlens"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn irlens");
    // The binary may exit (e.g. on a bad schema) before consuming stdin
    if let Err(err) = child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
    {
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe, "write stdin: {err}");
    }
    child.wait_with_output().expect("wait irlens")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "irlens failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf-8 output")
}

#[test]
fn test_stdin_plain_output() {
    let output = run(&[], "(\n(let $1 (Foo))\n(return $1)\n)\n");
    assert_eq!(stdout(&output), "((return (Foo))\n)\n");
}

#[test]
fn test_piped_output_is_uncolored() {
    let output = run(&[], "(lambda '($1) (Foo $1 \"s\"))");
    assert!(!stdout(&output).contains('\x1b'));
}

#[test]
fn test_color_always() {
    let output = run(&["--color", "always"], "(Foo \"s\")");
    assert!(stdout(&output).contains('\x1b'));
}

#[test]
fn test_schema_labels_and_tabstops() {
    let schema = write_fixture("map_schema.json", SCHEMA);
    let output = run(
        &["-n", schema.to_str().unwrap(), "--tabstops"],
        "(Map $1 (lambda '($2) $2))",
    );
    assert_eq!(
        stdout(&output),
        "(Map\n\u{2506}   ⦗⇐⦘$1\n\u{2506}   ⦗λ⦘(lambda '($2) $2)\n)\n"
    );
}

#[test]
fn test_input_file_and_config() {
    let input = write_fixture("plan.ir", "((let $1 (Int32 $0)) (Filter $1 $1))\n");
    let config = write_fixture(
        "heuristics.toml",
        "[inline]\nmax_simple_refs = 0\n\n[print]\nlong_operators = [\"Filter\"]\n",
    );
    let output = run(&["-c", config.to_str().unwrap(), input.to_str().unwrap()], "");
    assert_eq!(stdout(&output), "((let $1 (Int32 $0))\n(Filter\n    $1\n    $1\n))\n");
}

#[test]
fn test_parse_error_fails() {
    let output = run(&[], "(Foo \"unterminated");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unterminated string"));
}

#[test]
fn test_missing_schema_fails() {
    let output = run(&["-n", "/nonexistent/irlens/nodes.json"], "(Foo)");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read schema"));
}

#[test]
fn test_malformed_schema_fails() {
    let schema = write_fixture("broken_schema.json", "{\"Nodes\": [");
    let output = run(&["-n", schema.to_str().unwrap()], "(Foo)");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid schema"));
}
