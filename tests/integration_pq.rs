// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the patch-queue actions.
//!
//! Each test builds a real packaging repository with the git CLI.

use rpmpq::config::Config;
use rpmpq::config::types::ByteSize;
use rpmpq::git::Repository;
use rpmpq::pq::PqContext;
use rpmpq::pq::actions::{self, ConvertOptions};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const SPEC: &str = "\
Name:           foo
Version:        2.3
Release:        1
Summary:        Test package
License:        MIT
Source0:        foo-2.3.tar.gz

%description
Test.

%prep
%setup -q

%build
make
";

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit(path: &Path, file: &str, content: &str, message: &str) {
    let target = path.join(file);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(target, content).unwrap();
    git(path, &["add", file]);
    git(path, &["commit", "--quiet", "-m", message]);
}

/// Upstream tag `upstream/2.3` and a `master` branch carrying `spec_path`.
fn packaging_repo(spec_path: &str) -> TempDir {
    let temp = temp_dir();
    let path = temp.path();
    git(path, &["init", "--quiet"]);
    git(path, &["checkout", "-q", "-b", "master"]);
    git(path, &["config", "user.name", "Test"]);
    git(path, &["config", "user.email", "test@example.com"]);
    commit(path, "src/main.c", "int main() { return 0; }\n", "Upstream 2.3");
    git(path, &["tag", "upstream/2.3"]);
    commit(path, spec_path, SPEC, "Add packaging");
    temp
}

fn context(repo_dir: &Path, tmp_dir: &Path, configure: impl FnOnce(&mut Config)) -> PqContext {
    let mut config = Config::default();
    config.global.tmp_dir = tmp_dir.to_path_buf();
    config.pq.use_oracle = false;
    configure(&mut config);
    PqContext::new(Repository::open(repo_dir).unwrap(), config).unwrap()
}

#[test]
fn compressed_patches_survive_export_and_import() {
    let repo_dir = packaging_repo("packaging/foo.spec");
    let tmp_dir = temp_dir();
    let path = repo_dir.path();
    git(path, &["checkout", "-q", "-b", "development/master", "upstream/2.3"]);
    commit(path, "src/main.c", "int main() { return 1; }\n", "Return an error");
    commit(path, "README", "Read me.\n", "Add a readme");
    let pq_tree = git(path, &["rev-parse", "development/master^{tree}"]);

    let ctx = context(path, tmp_dir.path(), |config| {
        config.pq.packaging_dir = PathBuf::from("packaging");
        config.pq.patch_export_compress = ByteSize::new(1);
    });

    // Export from the pq branch itself
    let summary = actions::export(&ctx, None, true).unwrap();
    insta::assert_debug_snapshot!(summary.patches, @r#"
    [
        "0001-Return-an-error.patch.gz",
        "0002-Add-a-readme.patch.gz",
    ]
    "#);
    assert!(summary.status.contains("packaging"));
    assert!(path.join("packaging/0001-Return-an-error.patch.gz").exists());
    let spec = std::fs::read_to_string(path.join("packaging/foo.spec")).unwrap();
    assert!(spec.contains("0002-Add-a-readme.patch.gz"));

    git(path, &["add", "-A"]);
    git(path, &["commit", "--quiet", "-m", "Update patches"]);
    actions::import(&ctx, false).unwrap();
    assert_eq!(
        git(path, &["rev-parse", "development/master^{tree}"]),
        pq_tree
    );

    // Re-import from the pq branch reads the packaging files of master
    let outcomes = actions::import(&ctx, true).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        git(path, &["rev-parse", "development/master^{tree}"]),
        pq_tree
    );
}

#[test]
fn export_rev_overrides_end_of_range() {
    let repo_dir = packaging_repo("foo.spec");
    let tmp_dir = temp_dir();
    let path = repo_dir.path();
    git(path, &["checkout", "-q", "-b", "development/master", "upstream/2.3"]);
    commit(path, "one.txt", "1\n", "First change");
    commit(path, "two.txt", "2\n", "Second change");
    git(path, &["checkout", "-q", "master"]);

    let ctx = context(path, tmp_dir.path(), |_| {});
    let summary = actions::export(&ctx, Some("development/master~1"), false).unwrap();
    assert_eq!(summary.patches, vec!["0001-First-change.patch".to_string()]);

    let err = actions::export(&ctx, Some("no-such-rev"), false).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: invalid treeish object no-such-rev");
}

#[test]
fn missing_upstream_tag_is_reported() {
    let repo_dir = packaging_repo("foo.spec");
    let tmp_dir = temp_dir();
    git(repo_dir.path(), &["tag", "-d", "upstream/2.3"]);
    let ctx = context(repo_dir.path(), tmp_dir.path(), |_| {});

    let err = actions::import(&ctx, false).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: couldn't find upstream version 2.3 (tried 'upstream/2.3')");
}

#[test]
fn upstream_tag_vendor_ignores_packaging_vendor() {
    let repo_dir = packaging_repo("foo.spec");
    let tmp_dir = temp_dir();
    let path = repo_dir.path();
    git(path, &["tag", "Upstream/2.3", "upstream/2.3"]);
    let ctx = context(path, tmp_dir.path(), |config| {
        config.pq.upstream_tag = "%(vendor)s/%(upstreamversion)s".to_string();
        config.pq.vendor = "acme".to_string();
    });

    actions::import(&ctx, false).unwrap();
    assert_eq!(
        git(path, &["merge-base", "development/master", "Upstream/2.3"]),
        git(path, &["rev-parse", "Upstream/2.3"])
    );
}

#[test]
fn import_brings_extra_files_along() {
    let repo_dir = packaging_repo("foo.spec");
    let tmp_dir = temp_dir();
    let path = repo_dir.path();
    commit(path, ".gbp.conf", "[DEFAULT]\n", "Add gbp config");
    let ctx = context(path, tmp_dir.path(), |_| {});

    actions::import(&ctx, false).unwrap();
    assert!(path.join(".gbp.conf").exists());
    let message = git(path, &["log", "-1", "--format=%B"]);
    assert!(message.starts_with("Auto-import file(s) from branch 'master':"));
    assert!(message.contains("Gbp: Ignore"));

    // The import commit is not exported back
    actions::export(&ctx, None, false).unwrap();
    let spec = std::fs::read_to_string(path.join("foo.spec")).unwrap();
    assert!(!spec.contains("Auto-import"));
}

#[test]
fn convert_retains_packaging_history() {
    let repo_dir = packaging_repo("foo.spec");
    let tmp_dir = temp_dir();
    let path = repo_dir.path();
    commit(
        path,
        "foo.spec",
        &SPEC.replace("Release:        1", "Release:        2"),
        "Bump release",
    );
    commit(path, "src/main.c", "int main() { return 2; }\n", "Fix crash");

    let ctx = context(path, tmp_dir.path(), |config| {
        config.pq.patch_export_ignore_path = Some(r"\.spec$".to_string());
    });
    let options = ConvertOptions {
        retain_history: true,
        ..ConvertOptions::default()
    };
    assert_eq!(actions::convert(&ctx, options).unwrap(), "master-orphan");

    insta::assert_snapshot!(git(path, &["log", "--format=%s", "master-orphan"]), @r"
    Fix crash
    Bump release
    Auto-import packaging files
    ");
    let files = git(path, &["ls-tree", "--name-only", "master-orphan"]);
    assert!(files.lines().any(|f| f == "0001-Fix-crash.patch"));
    let bump = git(path, &["log", "-1", "--format=%B", "master-orphan~1"]);
    assert!(bump.contains("Auto-imported by rpmpq from '"));
    let spec = git(path, &["show", "master-orphan:foo.spec"]);
    assert!(spec.contains("Release:        2"));
    assert!(spec.contains("0001-Fix-crash.patch"));
}

#[test]
fn convert_requires_upstream_ancestry() {
    let repo_dir = packaging_repo("foo.spec");
    let tmp_dir = temp_dir();
    let path = repo_dir.path();
    git(path, &["checkout", "-q", "--orphan", "detached-packaging"]);
    git(path, &["rm", "-q", "-r", "--cached", "src"]);
    std::fs::remove_dir_all(path.join("src")).unwrap();
    git(path, &["commit", "--quiet", "-m", "Packaging only"]);

    let ctx = context(path, tmp_dir.path(), |_| {});
    let err = actions::convert(&ctx, ConvertOptions::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: start commit 'upstream/2.3' not an ancestor of end commit 'detached-packaging'");
}
