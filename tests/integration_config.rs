// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for configuration loading.
//!
//! Tests the Config module with realistic TOML configurations.

use rpmpq::config::Config;
use rpmpq::config::loader::ConfigLoader;
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

// =============================================================================
// Loading from TOML strings
// =============================================================================

#[test]
fn config_parse_full_pq_section() {
    let toml = r#"
[global]
log_format = "json"
log_file = "/var/log/rpmpq.log"

[pq]
pq_branch = "patch-queue/%(branch)s"
packaging_branch = "packaging"
packaging_dir = "rpm"
new_packaging_dir = "packaging"
spec_file = "rpm/foo.spec"
upstream_tag = "%(vendor)s/v%(version)s"
vendor = "acme"
import_files = []
patch_num_format = "%d-"
patch_export_compress = "2m"
patch_export_squash_until = "v1.0:base"
patch_export_ignore_path = "^(debian|\\.github)/"
use_oracle = false
"#;
    let config = Config::parse(toml).unwrap();
    insta::assert_debug_snapshot!(config.pq, @r#"
    PqConfig {
        pq_branch: "patch-queue/%(branch)s",
        packaging_branch: "packaging",
        packaging_dir: "rpm",
        new_packaging_dir: Some(
            "packaging",
        ),
        spec_file: Some(
            "rpm/foo.spec",
        ),
        upstream_tag: "%(vendor)s/v%(version)s",
        vendor: "acme",
        import_files: [],
        patch_numbers: true,
        patch_num_format: "%d-",
        patch_export_compress: ByteSize(
            2097152,
        ),
        patch_export_squash_until: Some(
            "v1.0:base",
        ),
        patch_export_ignore_path: Some(
            "^(debian|\\.github)/",
        ),
        use_oracle: false,
    }
    "#);
    assert_eq!(
        config.global.log_file,
        Some(PathBuf::from("/var/log/rpmpq.log"))
    );
}

#[test]
fn config_global_defaults() {
    let config = Config::parse("[global]\noutput_log_level = 2\n").unwrap();
    insta::assert_yaml_snapshot!(config.global, { ".tmp_dir" => "[tmp]" }, @r#"
    output_log_level: 2
    file_log_level: 5
    log_file: ~
    log_format: text
    tmp_dir: "[tmp]"
    "#);
}

#[test]
fn config_empty_squash_and_ignore_are_unset() {
    let toml = r#"
[pq]
patch_export_squash_until = ""
patch_export_ignore_path = ""
"#;
    let config = Config::parse(toml).unwrap();
    assert_eq!(config.pq.patch_export_squash_until, None);
    assert_eq!(config.pq.patch_export_ignore_path, None);
}

#[test]
fn config_rejects_bad_values() {
    for toml in [
        "[pq]\npatch_num_format = \"no-number\"\n",
        "[pq]\npatch_export_compress = \"12x\"\n",
        "[pq]\npq_branch = \"\"\n",
        "[global]\noutput_log_level = 9\n",
        "[unknown]\nkey = 1\n",
    ] {
        assert!(Config::parse(toml).is_err(), "accepted {toml:?}");
    }
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn later_files_override_earlier_ones() {
    let temp = temp_dir();
    let repo_config = temp.path().join("rpmpq.toml");
    let user_config = temp.path().join("user.toml");
    std::fs::write(
        &repo_config,
        "[pq]\nvendor = \"repo\"\npatch_numbers = false\n",
    )
    .unwrap();
    std::fs::write(&user_config, "[pq]\nvendor = \"user\"\n").unwrap();

    let loader = ConfigLoader::new()
        .add_toml_file_optional(&repo_config)
        .add_toml_file(&user_config);
    assert_eq!(loader.loaded_files().len(), 2);
    let config = loader
        .apply_overrides(["pq/packaging_branch=release"])
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.pq.vendor, "user");
    assert!(!config.pq.patch_numbers);
    assert_eq!(config.pq.packaging_branch, "release");
}

#[test]
fn missing_required_file_fails_but_optional_is_skipped() {
    let temp = temp_dir();
    let missing = temp.path().join("missing.toml");

    let optional = ConfigLoader::new().add_toml_file_optional(&missing);
    assert!(optional.loaded_files().is_empty());
    assert!(optional.build().is_ok());

    assert!(ConfigLoader::new().add_toml_file(&missing).build().is_err());
}
