//! End-to-end tests that invoke the compiled `vds-lint` binary as a subprocess
//! against the checked-in `config/`/`data/` fixtures.

use std::path::PathBuf;
use std::process::{Command, Output};

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vds-lint"))
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn run(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(["--config-dir", manifest_dir().join("config").to_str().unwrap()])
        .args(["--data-dir", manifest_dir().join("data").to_str().unwrap()])
        .args(args)
        .output()
        .expect("failed to execute vds-lint binary")
}

#[test]
fn generate_prints_structured_json_and_exits_zero() {
    let output = run(&["generate", "BSFA1R"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"vdsNo\""));
    assert!(stdout.contains("BSFA1R"));
}

#[test]
fn generate_flat_projects_field_to_value() {
    let output = run(&["generate", "--flat", "BSFA1R"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"fields\""));
}

#[test]
fn generate_unknown_prefix_exits_with_code_2() {
    let output = run(&["generate", "XYZA1R"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_reports_status_and_is_clean_for_well_formed_code() {
    let output = run(&["validate", "BSFA1R"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Valid"));
}

#[test]
fn explain_field_describes_a_known_field() {
    let output = run(&["explain-field", "bolts"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PMS_AND_STANDARD"));
}

#[test]
fn explain_field_unknown_field_exits_with_code_2() {
    let output = run(&["explain-field", "notAField"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn batch_reads_codes_from_stdin_and_reports_mixed_results() {
    use std::io::Write;
    let mut child = Command::new(binary_path())
        .args(["--config-dir", manifest_dir().join("config").to_str().unwrap()])
        .args(["--data-dir", manifest_dir().join("data").to_str().unwrap()])
        .arg("batch")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
        .expect("spawn batch");
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b"BSFA1R\nBOGUS\nBSFB1NR\n")
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for batch");
    assert_eq!(output.status.code(), Some(2), "mixed batch exits with code 2");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"success\""));
    assert!(stdout.contains("\"error\""));
}
