//! End-to-end tests for the `fernc` binary.
//!
//! These exercise `check` and `emit`, which run the whole pipeline but
//! need no external tools (`build` additionally requires `qbe` and a C
//! compiler on PATH, so it is not covered here).

use std::path::PathBuf;
use std::process::{Command, Output};

/// Find the fernc binary in the target directory.
fn find_fernc() -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("cannot find current exe")
        .parent()
        .expect("cannot find parent dir")
        .to_path_buf();

    // Navigate from `deps/` to the target directory.
    if path.file_name().is_some_and(|n| n == "deps") {
        path = path.parent().unwrap().to_path_buf();
    }

    let fernc = path.join("fernc");
    assert!(
        fernc.exists(),
        "fernc binary not found at {}. Run `cargo build -p fernc` first.",
        fernc.display()
    );
    fernc
}

/// Write `source` to a temp `.fn` file and run `fernc <subcommand>` on it.
fn run_fernc(subcommand: &str, source: &str) -> Output {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let file = dir.path().join("main.fn");
    std::fs::write(&file, source).expect("failed to write source file");

    Command::new(find_fernc())
        .arg(subcommand)
        .arg(&file)
        .output()
        .expect("failed to invoke fernc")
}

#[test]
fn check_accepts_a_valid_program() {
    let output = run_fernc("check", "fn add(a: Int, b: Int) -> Int:\n    a + b\n");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\u{2713}"), "got: {stdout}");
    assert!(stdout.contains("No type errors"), "got: {stdout}");
}

#[test]
fn check_rejects_a_type_error() {
    let output = run_fernc("check", "let x = if true: 1 else: \"x\"\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Type error"), "got: {stderr}");
}

#[test]
fn check_rejects_a_parse_error() {
    let output = run_fernc("check", "let = 5\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Parse error"), "got: {stderr}");
}

#[test]
fn emit_prints_ir_to_stdout() {
    let output = run_fernc("emit", "fn answer() -> Int:\n    42\n");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("export function"), "got: {stdout}");
    assert!(stdout.contains("$answer"), "got: {stdout}");
    assert!(stdout.contains("ret"), "got: {stdout}");
}

#[test]
fn emit_includes_string_data() {
    let output = run_fernc("emit", "fn main():\n    println(\"hello\")\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("data $str.0"), "got: {stdout}");
    assert!(stdout.contains("call $fern_println_str"), "got: {stdout}");
}

#[test]
fn emit_refuses_ill_typed_programs() {
    let output = run_fernc("emit", "fn f(): g()\n");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        !stdout.contains("export function"),
        "no IR for bad programs: {stdout}"
    );
}

#[test]
fn missing_file_is_an_error() {
    let output = Command::new(find_fernc())
        .args(["check", "/nonexistent/path/to/program.fn"])
        .output()
        .expect("failed to invoke fernc");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot read file"), "got: {stderr}");
}
