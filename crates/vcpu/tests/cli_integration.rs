//! Integration tests for the vcpu CLI.

use serde as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;
use vcpu as _;
use vcpu_core as _;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vcpu"))
}

fn create_temp_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run_with_input(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(binary_path())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run vcpu");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    child.wait_with_output().expect("vcpu should exit")
}

const HELLO: &str = "\
; write HI to the top-left of the screen
        MOV R0, #72
        MOV M0, R0
        MOV M1, #73
done:
";

#[test]
fn run_prints_screen_and_registers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "hello.asm", HELLO);

    let output = run_with_input(&["run", program.to_str().unwrap()], "");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("|HI "));
    assert!(stdout.contains("R0=72"));
    assert!(stdout.contains("state: halted after 3 instructions"));
}

#[test]
fn run_reads_keyboard_input_from_stdin() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(
        temp_dir.path(),
        "echo.asm",
        "MOV R1, M4095\nMOV R2, M4095\nADD R1, R2\nMOV M0, R1\n",
    );

    let output = run_with_input(&["run", program.to_str().unwrap(), "--json"], "30\n35\n");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");

    let report: serde_json::Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["state"], "halted");
    assert_eq!(report["registers"][1], 65);
    assert!(report["screen"][0]
        .as_str()
        .is_some_and(|row| row.starts_with('A')));
}

#[test]
fn closed_stdin_while_awaiting_input_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "wait.asm", "MOV R0, M4095\n");

    let output = run_with_input(&["run", program.to_str().unwrap()], "");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input closed"));
}

#[test]
fn runtime_fault_exits_with_two_and_reports_context() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(
        temp_dir.path(),
        "div.asm",
        "MOV R1, #5\nMOV R2, #0\nDIV R1, R2\n",
    );

    let output = run_with_input(&["run", program.to_str().unwrap()], "");

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("fault: division by zero at pc 2 (DIV)"));
    assert!(stderr.contains("division by zero"));
}

#[test]
fn step_limit_stops_infinite_loops() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "spin.asm", "spin: JMP spin\n");

    let output = run_with_input(
        &["run", program.to_str().unwrap(), "--max-steps", "50"],
        "",
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("step limit of 50"));
}

#[test]
fn parse_errors_exit_with_one() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "bad.asm", "MOV R0, #1\nMOV R9, #1\n");

    let output = run_with_input(&["run", program.to_str().unwrap()], "");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"));
}

#[test]
fn config_file_changes_the_screen() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "hello.asm", HELLO);
    let config = create_temp_file(
        temp_dir.path(),
        "small.cfg",
        "# narrow screen\nscreen_width: 8\nscreen_height: 2\n",
    );

    let output = run_with_input(
        &[
            "run",
            program.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ],
        "",
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.starts_with("+--------+\n|HI      |\n|        |\n+--------+\n"));
}

#[test]
fn bad_config_is_rejected() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "hello.asm", HELLO);
    let config = create_temp_file(temp_dir.path(), "bad.cfg", "colour: blue\n");

    let output = run_with_input(
        &[
            "check",
            program.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
        ],
        "",
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown key `colour`"));
}

#[test]
fn check_reports_program_size() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = create_temp_file(temp_dir.path(), "hello.asm", HELLO);

    let output = run_with_input(&["check", program.to_str().unwrap()], "");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("3 instructions, 1 labels"));
}

#[test]
fn help_shows_usage() {
    let output = run_with_input(&["--help"], "");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Commands:"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("check"));
}

#[test]
fn unknown_command_fails() {
    let output = run_with_input(&["assemble"], "");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown command"));
}
