// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

use crate::cli::pq::PqCommand;
use crate::cli::{Cli, Command};
use clap::Parser;

#[test]
fn test_parse_version() {
    let cli = Cli::try_parse_from(["rpmpq", "version"]).unwrap();
    assert!(matches!(cli.command, Some(Command::Version)));
}

#[test]
fn test_parse_global_options() {
    let cli = Cli::try_parse_from([
        "rpmpq",
        "-l",
        "5",
        "-C",
        "/src/pkg",
        "-c",
        "a.toml",
        "-c",
        "b.toml",
        "switch",
    ])
    .unwrap();
    assert_eq!(cli.global.log_level, Some(5));
    assert_eq!(cli.global.directory, Some(PathBuf::from("/src/pkg")));
    assert_eq!(
        cli.global.configs,
        vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]
    );
    assert!(matches!(cli.command, Some(Command::Pq(PqCommand::Switch))));
    insta::assert_debug_snapshot!(cli.to_config_overrides(), @r#"
    [
        "global/output_log_level=5",
        "global/file_log_level=5",
    ]
    "#);
}

#[test]
fn test_parse_rejects_out_of_range_log_level() {
    assert!(Cli::try_parse_from(["rpmpq", "-l", "7", "switch"]).is_err());
}

#[test]
fn test_parse_export() {
    let cli = Cli::try_parse_from(["rpmpq", "export", "--drop", "--export-rev", "HEAD~1"]).unwrap();
    let Some(Command::Pq(PqCommand::Export(args))) = cli.command else {
        panic!("expected export, got {:?}", cli.command);
    };
    assert!(args.drop);
    assert_eq!(args.export_rev.as_deref(), Some("HEAD~1"));
}

#[test]
fn test_parse_apply_requires_patch() {
    assert!(Cli::try_parse_from(["rpmpq", "apply"]).is_err());
    let cli = Cli::try_parse_from(["rpmpq", "apply", "fix.patch"]).unwrap();
    let Some(Command::Pq(PqCommand::Apply(args))) = cli.command else {
        panic!("expected apply, got {:?}", cli.command);
    };
    assert_eq!(args.patch, PathBuf::from("fix.patch"));
}

#[test]
fn test_pq_flags_become_overrides() {
    let cli = Cli::try_parse_from([
        "rpmpq",
        "--pq-branch",
        "patch-queue/%(branch)s",
        "--no-patch-numbers",
        "--patch-export-compress",
        "1M",
        "--no-oracle",
        "-s",
        "pq.vendor=acme",
        "convert",
        "--retain-history",
        "--new-packaging-dir",
        "rpm",
    ])
    .unwrap();
    insta::assert_debug_snapshot!(cli.to_config_overrides(), @r#"
    [
        "pq.vendor=acme",
        "pq/pq_branch=patch-queue/%(branch)s",
        "pq/patch_export_compress=1M",
        "pq/patch_numbers=false",
        "pq/use_oracle=false",
        "pq/new_packaging_dir=rpm",
    ]
    "#);
}
