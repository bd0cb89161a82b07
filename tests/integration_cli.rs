// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the command line.
//!
//! Parses realistic argument lists and runs the `rpmpq` binary.

use clap::Parser;
use rpmpq::cli::pq::PqCommand;
use rpmpq::cli::{Cli, Command};
use std::path::Path;
use std::process::{Command as Process, Output};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn rpmpq(dir: &Path, args: &[&str]) -> Output {
    Process::new(env!("CARGO_BIN_EXE_rpmpq"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run rpmpq")
}

fn git(path: &Path, args: &[&str]) {
    let status = Process::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {args:?} failed");
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn cli_import_force() {
    let cli = Cli::try_parse_from(["rpmpq", "import", "--force"]).unwrap();
    let Some(Command::Pq(PqCommand::Import(args))) = cli.command else {
        panic!("expected import, got {:?}", cli.command);
    };
    assert!(args.force);
}

#[test]
fn cli_simple_actions() {
    for (arg, expected) in [("rebase", "Rebase"), ("drop", "Drop"), ("switch", "Switch")] {
        let cli = Cli::try_parse_from(["rpmpq", arg]).unwrap();
        let Some(Command::Pq(command)) = cli.command else {
            panic!("expected a pq command for {arg}");
        };
        assert_eq!(format!("{command:?}"), expected);
    }
}

#[test]
fn cli_convert_flags() {
    let cli = Cli::try_parse_from(["rpmpq", "convert", "-f", "--retain-history"]).unwrap();
    let Some(Command::Pq(PqCommand::Convert(args))) = cli.command else {
        panic!("expected convert, got {:?}", cli.command);
    };
    assert!(args.force);
    assert!(args.retain_history);
    assert!(args.new_packaging_dir.is_none());
}

#[test]
fn cli_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["rpmpq", "frobnicate"]).is_err());
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn binary_prints_version() {
    let temp = temp_dir();
    let output = rpmpq(temp.path(), &["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        env!("CARGO_PKG_VERSION")
    );
}

#[test]
fn binary_options_reflect_overrides() {
    let temp = temp_dir();
    let output = rpmpq(
        temp.path(),
        &["--vendor", "acme", "-s", "pq.packaging_branch=release", "options"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout
            .lines()
            .any(|l| l.starts_with("pq.vendor") && l.ends_with("= acme"))
    );
    assert!(
        stdout
            .lines()
            .any(|l| l.starts_with("pq.packaging_branch") && l.ends_with("= release"))
    );
}

#[test]
fn binary_reads_repository_config_file() {
    let temp = temp_dir();
    git(temp.path(), &["init", "--quiet"]);
    std::fs::write(temp.path().join("rpmpq.toml"), "[pq]\nvendor = \"fromfile\"\n").unwrap();

    let sub = temp.path().join("sub");
    std::fs::create_dir_all(&sub).unwrap();
    let output = rpmpq(&sub, &["options"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("= fromfile"));

    let output = rpmpq(&sub, &["inis"]);
    assert!(String::from_utf8_lossy(&output.stdout).contains("rpmpq.toml"));
}

#[test]
fn binary_reports_errors_on_stderr() {
    let temp = temp_dir();
    let tmp = temp_dir();
    let tmp_dir = tmp.path().to_string_lossy().into_owned();
    let output = rpmpq(temp.path(), &["--tmp-dir", &tmp_dir, "switch"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: "), "{stderr}");
    assert!(stderr.contains("is not a git repository"), "{stderr}");
}

#[test]
fn binary_rejects_bad_config() {
    let temp = temp_dir();
    let output = rpmpq(temp.path(), &["-s", "pq.patch_num_format=none", "options"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: "));
}
