// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::builder::{ProcessBuilder, ProcessFlags};
use crate::error::{PqError, ProcessError};

#[test]
fn test_process_echo() {
    let output = ProcessBuilder::new("echo")
        .arg("hello")
        .capture_output()
        .run()
        .expect("echo should succeed");

    assert!(output.success());
    insta::assert_snapshot!(output.stdout().trim(), @"hello");
}

#[test]
fn test_process_exit_code() {
    let output = ProcessBuilder::raw("exit 42")
        .flag(ProcessFlags::ALLOW_FAILURE)
        .run()
        .expect("process should complete");

    assert_eq!(output.exit_code(), 42);
    assert!(!output.success());
}

#[test]
fn test_process_failure_is_error() {
    let err = ProcessBuilder::raw("exit 3").quiet().run().unwrap_err();
    assert!(matches!(
        err,
        PqError::Process(ref e) if matches!(**e, ProcessError::NonZeroExit { code: 3, .. })
    ));
}

#[test]
fn test_process_success_codes() {
    let output = ProcessBuilder::raw("exit 1")
        .success_codes([0, 1])
        .run()
        .expect("exit 1 is accepted");
    assert_eq!(output.exit_code(), 1);
}

#[test]
fn test_process_env() {
    let output = ProcessBuilder::raw("echo $RPMPQ_TEST_VAR")
        .env("RPMPQ_TEST_VAR", "test_value")
        .capture_stdout()
        .run()
        .expect("process should succeed");

    insta::assert_snapshot!(output.stdout().trim(), @"test_value");
}

#[test]
fn test_process_stdin_binary() {
    let input: Vec<u8> = (0..=255).collect();
    let output = ProcessBuilder::new("cat")
        .stdin(input.clone())
        .capture_stdout()
        .run()
        .expect("cat should succeed");

    assert_eq!(output.stdout_bytes(), input.as_slice());
}

#[test]
fn test_process_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let output = ProcessBuilder::new("pwd")
        .cwd(dir.path())
        .capture_stdout()
        .run()
        .unwrap();
    let reported = std::path::PathBuf::from(output.stdout().trim());
    assert_eq!(
        reported.canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_executable_lookup_found() {
    let builder = ProcessBuilder::which("sh").expect("sh should be found in PATH");
    assert!(builder.program().exists());
    assert!(ProcessBuilder::exists("sh"));
    assert!(ProcessBuilder::find("sh").is_some_and(|p| p.exists()));
}

#[test]
fn test_executable_lookup_not_found() {
    let program = "nonexistent_program_12345";

    let err = ProcessBuilder::which(program).unwrap_err();
    assert!(err.to_string().contains(program));
    assert!(!ProcessBuilder::exists(program));
    assert!(ProcessBuilder::find(program).is_none());
}
