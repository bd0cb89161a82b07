// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use super::actions::{self, ConvertOptions};
use super::compress::{compress_if_large, stage_patch};
use super::generate::{GenerateOptions, SquashPoint, generate};
use super::patch::{PatchFile, parse_trailers, patch_file_name};
use super::replay::{ApplyOutcome, apply_and_commit};
use super::{
    PqContext, format_fields, is_pq_branch, pq_branch_base, pq_branch_name, upstream_tag_name,
};
use crate::config::Config;
use crate::config::types::{ByteSize, PqConfig};
use crate::error::{GitError, PatchError};
use crate::git::Repository;
use crate::spec::SpecFile;
use crate::spec::reconcile::PatchCondition;

const SPEC: &str = "\
Name:           foo
Version:        1.0
Release:        1
Summary:        Test package
License:        MIT
Packager:       Jane Packager <jane@example.com>
Source0:        foo-1.0.tar.gz

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

fn run_git(path: &Path, args: &[&str]) -> String {
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

fn commit_file(path: &Path, file: &str, content: &str, message: &str) -> String {
    let target = path.join(file);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(target, content).unwrap();
    run_git(path, &["add", file]);
    run_git(path, &["commit", "--quiet", "-m", message]);
    run_git(path, &["rev-parse", "HEAD"])
}

/// Packaging repository with a patch-queue branch.
///
/// ```text
/// upstream/1.0 ── Add packaging                        (master)
///             \── Add feature one ── two ── three      (development/master)
/// ```
struct Fixture {
    repo_dir: TempDir,
    tmp_dir: TempDir,
    upstream: String,
}

impl Fixture {
    fn new() -> Self {
        let repo_dir = temp_dir();
        let path = repo_dir.path();
        run_git(path, &["init", "--quiet"]);
        run_git(path, &["checkout", "-q", "-b", "master"]);
        run_git(path, &["config", "user.name", "Test"]);
        run_git(path, &["config", "user.email", "test@example.com"]);
        let upstream = commit_file(path, "src/main.c", "int main() {}\n", "Upstream 1.0");
        run_git(path, &["tag", "upstream/1.0"]);
        commit_file(path, "foo.spec", SPEC, "Add packaging");

        run_git(path, &["checkout", "-q", "-b", "development/master", "upstream/1.0"]);
        commit_file(path, "src/one.c", "one\n", "Add feature one");
        commit_file(path, "src/two.c", "two\n", "Add feature two");
        commit_file(path, "src/three.c", "three\n", "Add feature three");
        run_git(path, &["checkout", "-q", "master"]);

        Self {
            repo_dir,
            tmp_dir: temp_dir(),
            upstream,
        }
    }

    fn path(&self) -> &Path {
        self.repo_dir.path()
    }

    fn repo(&self) -> Repository {
        Repository::open(self.path()).unwrap()
    }

    fn context(&self) -> PqContext {
        let mut config = Config::default();
        config.global.tmp_dir = self.tmp_dir.path().to_path_buf();
        config.pq.use_oracle = false;
        PqContext::new(self.repo(), config).unwrap()
    }

    fn git(&self, args: &[&str]) -> String {
        run_git(self.path(), args)
    }

    fn branch_tip(&self, branch: &str) -> String {
        self.git(&["rev-parse", branch])
    }
}

// --- naming ---

#[test]
fn test_format_fields() {
    let out = format_fields("patch-queue/%(branch)s", &[("branch", "master")]).unwrap();
    assert_eq!(out, "patch-queue/master");

    let err = format_fields("pq/%(tag)s", &[("branch", "master")]).unwrap_err();
    assert!(err.to_string().contains("tag"));
}

#[test]
fn test_pq_branch_naming() {
    let config = PqConfig::default();
    assert_eq!(
        pq_branch_name("master", &config, "1.0").unwrap(),
        "development/master"
    );
    assert!(is_pq_branch("development/master", &config));
    assert!(!is_pq_branch("master", &config));
    assert_eq!(
        pq_branch_base("development/topic", &config).as_deref(),
        Some("topic")
    );
    assert_eq!(pq_branch_base("master", &config), None);
}

#[test]
fn test_pq_branch_without_branch_field_uses_packaging_branch() {
    let config = PqConfig {
        pq_branch: "patch-queue/%(version)s".to_string(),
        packaging_branch: "packaging".to_string(),
        ..PqConfig::default()
    };
    assert_eq!(
        pq_branch_name("packaging", &config, "2.1").unwrap(),
        "patch-queue/2.1"
    );
    assert!(is_pq_branch("patch-queue/2.1", &config));
    assert_eq!(
        pq_branch_base("patch-queue/2.1", &config).as_deref(),
        Some("packaging")
    );
}

#[test]
fn test_upstream_tag_name_sanitizes_version() {
    let spec = SpecFile::parse(
        &SPEC.replace("Version:        1.0", "Version:        1.0~rc1"),
        "/pkg/foo.spec",
        None,
    )
    .unwrap();
    let config = PqConfig {
        upstream_tag: "v%(upstreamversion)s".to_string(),
        ..PqConfig::default()
    };
    assert_eq!(upstream_tag_name(&config, &spec).unwrap(), "v1.0_rc1");
}

#[test]
fn test_upstream_tag_vendor_is_upstream() {
    let spec = SpecFile::parse(SPEC, "/pkg/foo.spec", None).unwrap();
    let config = PqConfig {
        upstream_tag: "%(vendor)s/%(upstreamversion)s".to_string(),
        vendor: "acme".to_string(),
        ..PqConfig::default()
    };
    assert_eq!(upstream_tag_name(&config, &spec).unwrap(), "Upstream/1.0");
}

// --- trailers and patch files ---

#[test]
fn test_parse_trailers() {
    let trailers = parse_trailers(
        "abc",
        "Some explanation.\n\nGbp-Rpm: IfArch x86_64\ngbp: if 0%{?fedora}\nGbp: Ignore\n",
    );
    assert!(trailers.ignore);
    assert_eq!(
        trailers.condition,
        Some(PatchCondition::If("0%{?fedora}".to_string()))
    );
    assert_eq!(trailers.body, "Some explanation.");
}

#[test]
fn test_parse_trailers_drops_unknown_and_incomplete_commands() {
    let trailers = parse_trailers("abc", "Gbp: Frobnicate now\nGbp-Rpm: IfArch\nkept line");
    assert!(!trailers.ignore);
    assert_eq!(trailers.condition, None);
    assert_eq!(trailers.body, "kept line");
}

#[test]
fn test_patch_file_name() {
    assert_eq!(
        patch_file_name("Fix: the [build]!", "0001-", ".patch"),
        "0001-Fix-the-build.patch"
    );
    assert_eq!(patch_file_name("???", "", ".patch"), "patch.patch");

    let long = patch_file_name(&"word ".repeat(40), "0001-", ".patch");
    assert!(long.len() <= 63, "{long}");
    assert!(long.starts_with("0001-word-word"));
    assert!(long.ends_with(".patch"));
    assert!(!long.contains("-.patch"));
}

#[test]
fn test_patch_file_parse_mail_headers() {
    let content = "\
From 1234567890abcdef Mon Sep 17 00:00:00 2001
From: \"Doe, Jane\" <jane@example.com>
Date: Mon, 5 Jan 2026 10:00:00 +0000
Subject: [PATCH 1/2] Fix the build
 on big endian

Longer description
over two lines.
---
 src/main.c | 2 +-
diff --git a/src/main.c b/src/main.c
";
    let patch = PatchFile::parse(PathBuf::from("/p/0001-fix.patch"), 1, content);
    assert_eq!(patch.author.name.as_deref(), Some("Doe, Jane"));
    assert_eq!(patch.author.email.as_deref(), Some("jane@example.com"));
    assert_eq!(
        patch.author.date.as_deref(),
        Some("Mon, 5 Jan 2026 10:00:00 +0000")
    );
    assert_eq!(patch.subject, "Fix the build on big endian");
    assert_eq!(patch.description, "Longer description\nover two lines.");
    assert!(patch.has_author());
    assert_eq!(
        patch.commit_message(),
        "Fix the build on big endian\n\nLonger description\nover two lines.\n"
    );
}

#[test]
fn test_patch_file_without_headers_uses_file_name() {
    let content = "diff --git a/x b/x\n--- a/x\n+++ b/x\n";
    let patch = PatchFile::parse(PathBuf::from("/p/0003-fix-build.patch"), 0, content);
    assert_eq!(patch.subject, "fix-build");
    assert!(patch.description.is_empty());
    assert!(!patch.has_author());
    assert_eq!(patch.file_name(), "0003-fix-build.patch");
}

// --- compression ---

#[test]
fn test_compress_and_stage_round_trip() {
    let temp = temp_dir();
    let out = temp.path().join("out");
    let staged = temp.path().join("staged");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::create_dir_all(&staged).unwrap();

    let content = "+line\n".repeat(400);
    let small = out.join("0001-small.patch");
    std::fs::write(&small, "+x\n").unwrap();
    assert_eq!(
        compress_if_large(&small, ByteSize::new(100)).unwrap(),
        "0001-small.patch"
    );

    let large = out.join("0002-large.patch");
    std::fs::write(&large, &content).unwrap();
    let name = compress_if_large(&large, ByteSize::new(100)).unwrap();
    assert_eq!(name, "0002-large.patch.gz");
    assert!(!large.exists());

    let path = stage_patch(&out.join(&name), &staged).unwrap();
    assert_eq!(path, staged.join("0002-large.patch"));
    assert_eq!(std::fs::read_to_string(path).unwrap(), content);
}

#[test]
fn test_stage_rejects_unsupported_compression() {
    let temp = temp_dir();
    let source = temp.path().join("fix.patch.xz");
    std::fs::write(&source, b"\xfd7zXZ").unwrap();
    let err = stage_patch(&source, temp.path()).unwrap_err();
    assert!(matches!(
        err.as_patch(),
        Some(PatchError::UnsupportedCompression { .. })
    ));
}

// --- generate ---

#[test]
fn test_generate_numbers_patches_in_commit_order() {
    let fixture = Fixture::new();
    let out = temp_dir();
    let series = generate(
        &fixture.repo(),
        "upstream/1.0",
        None,
        "development/master",
        out.path(),
        &GenerateOptions::default(),
    )
    .unwrap();
    insta::assert_snapshot!(series.files.join("\n"), @r"
    0001-Add-feature-one.patch
    0002-Add-feature-two.patch
    0003-Add-feature-three.patch
    ");

    let first = std::fs::read_to_string(out.path().join("0001-Add-feature-one.patch")).unwrap();
    assert!(first.starts_with("From: Test <test@example.com>\n"));
    assert!(first.contains("Subject: Add feature one\n"));
    assert!(first.contains("+++ b/src/one.c"));
}

#[test]
fn test_generate_skips_ignored_commits_and_keeps_conditions() {
    let fixture = Fixture::new();
    fixture.git(&["checkout", "-q", "development/master"]);
    commit_file(
        fixture.path(),
        "local.txt",
        "local\n",
        "Local tweak\n\nGbp: Ignore",
    );
    commit_file(
        fixture.path(),
        "src/arch.c",
        "arch\n",
        "Arch fix\n\nOnly for x86.\n\nGbp-Rpm: IfArch x86_64",
    );

    let out = temp_dir();
    let options = GenerateOptions::builder()
        .with_compress_threshold(ByteSize::new(1))
        .build();
    let series = generate(
        &fixture.repo(),
        "upstream/1.0",
        None,
        "development/master",
        out.path(),
        &options,
    )
    .unwrap();

    assert_eq!(series.files.len(), 4);
    assert_eq!(series.files[3], "0004-Arch-fix.patch.gz");
    assert!(series.files.iter().all(|f| !f.contains("Local")));
    assert_eq!(
        series.conditions.get("0004-Arch-fix.patch.gz"),
        Some(&PatchCondition::IfArch("x86_64".to_string()))
    );
    assert!(out.path().join("0004-Arch-fix.patch.gz").exists());
    assert!(!out.path().join("0004-Arch-fix.patch").exists());
}

#[test]
fn test_generate_squash_and_ignore_path() {
    let fixture = Fixture::new();
    let two = fixture.branch_tip("development/master~1");
    let out = temp_dir();
    let options = GenerateOptions::builder()
        .with_ignore_path(regex::Regex::new(r"^src/three\.c$").unwrap())
        .build();
    let squash = SquashPoint::parse(&format!("{two}:base"));
    let series = generate(
        &fixture.repo(),
        "upstream/1.0",
        Some(&squash),
        "development/master",
        out.path(),
        &options,
    )
    .unwrap();

    // Commit three only touches an ignored path
    assert_eq!(series.files, vec!["base.diff".to_string()]);
    let diff = std::fs::read_to_string(out.path().join("base.diff")).unwrap();
    assert!(diff.contains("+++ b/src/one.c"));
    assert!(diff.contains("+++ b/src/two.c"));
}

#[test]
fn test_generate_collapses_first_merge_into_diff() {
    let fixture = Fixture::new();
    let path = fixture.path();
    fixture.git(&["checkout", "-q", "-b", "side", "upstream/1.0"]);
    commit_file(path, "src/side.c", "side\n", "Add side feature");
    fixture.git(&["checkout", "-q", "development/master"]);
    fixture.git(&["merge", "--quiet", "--no-ff", "-m", "Merge side", "side"]);
    let merge = fixture.git(&["rev-parse", "--short=7", "HEAD"]);
    commit_file(path, "src/after.c", "after\n", "After merge");

    let out = temp_dir();
    let series = generate(
        &fixture.repo(),
        "upstream/1.0",
        None,
        "development/master",
        out.path(),
        &GenerateOptions::default(),
    )
    .unwrap();

    let upstream = fixture.git(&["rev-parse", "--short=7", "upstream/1.0"]);
    assert_eq!(
        series.files,
        vec![
            format!("{upstream}-to-{merge}.diff"),
            "0002-After-merge.patch".to_string(),
        ]
    );
    let diff =
        std::fs::read_to_string(out.path().join(format!("{upstream}-to-{merge}.diff"))).unwrap();
    for file in ["one", "two", "three", "side"] {
        assert!(diff.contains(&format!("+++ b/src/{file}.c")), "{file} missing");
    }
    assert!(!diff.contains("src/after.c"));
}

#[test]
fn test_generate_tree_end_adds_trailing_diff() {
    let fixture = Fixture::new();
    let path = fixture.path();
    fixture.git(&["checkout", "-q", "development/master"]);
    std::fs::write(path.join("src/extra.c"), "extra\n").unwrap();
    fixture.git(&["add", "src/extra.c"]);
    let tree = fixture.git(&["write-tree"]);

    let out = temp_dir();
    let series = generate(
        &fixture.repo(),
        "upstream/1.0",
        None,
        &tree,
        out.path(),
        &GenerateOptions::default(),
    )
    .unwrap();

    let head = fixture.git(&["rev-parse", "--short=7", "HEAD"]);
    let tree_short = fixture.git(&["rev-parse", "--short=7", &tree]);
    let trailing = format!("{head}-to-{tree_short}.diff");
    assert_eq!(
        series.files,
        vec![
            "0001-Add-feature-one.patch".to_string(),
            "0002-Add-feature-two.patch".to_string(),
            "0003-Add-feature-three.patch".to_string(),
            trailing.clone(),
        ]
    );
    let diff = std::fs::read_to_string(out.path().join(&trailing)).unwrap();
    assert!(diff.contains("+++ b/src/extra.c"));
    assert!(!diff.contains("src/three.c"));
}

#[test]
fn test_generate_rejects_unrelated_range() {
    let fixture = Fixture::new();
    let out = temp_dir();
    let err = generate(
        &fixture.repo(),
        "master",
        None,
        "development/master",
        out.path(),
        &GenerateOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err.as_git(), Some(GitError::NotAncestor { .. })));

    let err = generate(
        &fixture.repo(),
        "no-such-tag",
        None,
        "master",
        out.path(),
        &GenerateOptions::default(),
    )
    .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: invalid treeish object no-such-tag");
}

#[test]
fn test_generate_rejects_squash_outside_range() {
    let fixture = Fixture::new();
    let out = temp_dir();
    let squash = SquashPoint::parse("master");
    let err = generate(
        &fixture.repo(),
        "upstream/1.0",
        Some(&squash),
        "development/master",
        out.path(),
        &GenerateOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err.as_patch(),
        Some(PatchError::InvalidSquash { .. })
    ));
}

// --- apply ---

#[test]
fn test_apply_and_commit_skips_empty_patch() {
    let fixture = Fixture::new();
    let temp = temp_dir();
    let path = temp.path().join("empty.patch");
    std::fs::write(&path, "From: A <a@example.com>\nSubject: Nothing\n\n---\n").unwrap();
    let head = fixture.branch_tip("HEAD");

    let patch = PatchFile::read(&path, 1).unwrap();
    let outcome = apply_and_commit(&fixture.repo(), &patch, None);
    assert!(matches!(outcome, ApplyOutcome::SkippedNoOp));
    assert_eq!(fixture.branch_tip("HEAD"), head);
}

#[test]
fn test_apply_action_commits_on_pq_branch() {
    let fixture = Fixture::new();
    let temp = temp_dir();
    let path = temp.path().join("notes.patch");
    std::fs::write(
        &path,
        "\
From: Jane Doe <jane@example.com>
Subject: Add notes

---
diff --git a/NOTES b/NOTES
new file mode 100644
--- /dev/null
+++ b/NOTES
@@ -0,0 +1 @@
+note
",
    )
    .unwrap();

    let ctx = fixture.context();
    let outcome = actions::apply(&ctx, &path).unwrap();
    assert!(matches!(outcome, ApplyOutcome::Applied));
    assert_eq!(fixture.git(&["branch", "--show-current"]), "development/master");
    assert_eq!(fixture.git(&["log", "-1", "--format=%an|%s"]), "Jane Doe|Add notes");
}

// --- actions ---

#[test]
fn test_export_then_import_round_trip() {
    let fixture = Fixture::new();
    let pq_tree = fixture.branch_tip("development/master^{tree}");
    let ctx = fixture.context();

    let summary = actions::export(&ctx, None, false).unwrap();
    assert_eq!(summary.patches.len(), 3);
    assert_eq!(fixture.git(&["branch", "--show-current"]), "master");
    let spec = std::fs::read_to_string(fixture.path().join("foo.spec")).unwrap();
    assert!(spec.contains("0001-Add-feature-one.patch"));
    assert!(spec.contains("0003-Add-feature-three.patch"));
    assert!(spec.contains("%patch"));
    assert!(fixture.path().join("0002-Add-feature-two.patch").exists());

    fixture.git(&["add", "-A"]);
    fixture.git(&["commit", "--quiet", "-m", "Update patches"]);
    assert!(actions::drop(&ctx).unwrap());
    assert!(!ctx.repo().has_branch("development/master").unwrap());

    let outcomes = actions::import(&ctx, false).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(
        outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, ApplyOutcome::Applied))
    );
    assert_eq!(fixture.git(&["branch", "--show-current"]), "development/master");
    assert_eq!(fixture.branch_tip("development/master^{tree}"), pq_tree);
    assert_eq!(
        fixture.git(&["log", "--format=%s", "upstream/1.0..development/master"]),
        "Add feature three\nAdd feature two\nAdd feature one"
    );
}

#[test]
fn test_export_from_pq_branch_with_drop() {
    let fixture = Fixture::new();
    fixture.git(&["checkout", "-q", "development/master"]);
    let ctx = fixture.context();

    actions::export(&ctx, None, true).unwrap();
    assert_eq!(fixture.git(&["branch", "--show-current"]), "master");
    assert!(!ctx.repo().has_branch("development/master").unwrap());
}

#[test]
fn test_import_refuses_existing_branch() {
    let fixture = Fixture::new();
    let tip = fixture.branch_tip("development/master");
    let ctx = fixture.context();

    let err = actions::import(&ctx, false).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: Patch-queue branch 'development/master' already exists. Try 'switch' instead.");
    assert_eq!(fixture.branch_tip("development/master"), tip);
    assert_eq!(fixture.git(&["branch", "--show-current"]), "master");
}

#[test]
fn test_import_on_pq_branch_needs_force() {
    let fixture = Fixture::new();
    fixture.git(&["checkout", "-q", "development/master"]);
    let ctx = fixture.context();

    let err = actions::import(&ctx, false).unwrap_err();
    assert!(matches!(
        err.as_git(),
        Some(GitError::OnPatchQueueBranch { .. })
    ));

    // The spec on master lists no patches; a forced import resets to upstream
    let outcomes = actions::import(&ctx, true).unwrap();
    assert!(outcomes.is_empty());
    assert_eq!(fixture.branch_tip("development/master"), fixture.upstream);
}

#[test]
fn test_failed_import_removes_branch() {
    let fixture = Fixture::new();
    fixture.git(&["branch", "-D", "development/master"]);
    std::fs::write(
        fixture.path().join("broken.patch"),
        "Subject: Broken\n\n---\n--- a/missing.c\n+++ b/missing.c\n@@ -1 +1 @@\n-old\n+new\n",
    )
    .unwrap();
    let spec = SPEC.replace(
        "Source0:        foo-1.0.tar.gz\n",
        "Source0:        foo-1.0.tar.gz\nPatch0:         broken.patch\n",
    );
    let spec = spec.replace("%setup -q\n", "%setup -q\n%patch0 -p1\n");
    std::fs::write(fixture.path().join("foo.spec"), spec).unwrap();
    fixture.git(&["add", "-A"]);
    fixture.git(&["commit", "--quiet", "-m", "Add broken patch"]);
    let ctx = fixture.context();

    let err = actions::import(&ctx, false).unwrap_err();
    assert!(matches!(err.as_patch(), Some(PatchError::ApplyFailed { .. })));
    assert_eq!(fixture.git(&["branch", "--show-current"]), "master");
    assert!(!ctx.repo().has_branch("development/master").unwrap());
}

#[test]
fn test_switch_toggles_branches() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    assert_eq!(actions::switch(&ctx).unwrap(), "development/master");
    assert_eq!(actions::switch(&ctx).unwrap(), "master");
}

#[test]
fn test_drop_refuses_on_pq_branch() {
    let fixture = Fixture::new();
    fixture.git(&["checkout", "-q", "development/master"]);
    let ctx = fixture.context();
    let err = actions::drop(&ctx).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: On a patch-queue branch, can't drop it.");

    fixture.git(&["checkout", "-q", "master"]);
    assert!(actions::drop(&ctx).unwrap());
    assert!(!actions::drop(&ctx).unwrap());
}

#[test]
fn test_rebase_moves_pq_branch_onto_upstream() {
    let fixture = Fixture::new();
    fixture.git(&["checkout", "-q", "upstream/1.0"]);
    let new_upstream = commit_file(fixture.path(), "CHANGES", "1.0 final\n", "Upstream fixup");
    fixture.git(&["tag", "-f", "upstream/1.0"]);
    fixture.git(&["checkout", "-q", "master"]);
    let ctx = fixture.context();

    actions::rebase(&ctx).unwrap();
    assert_eq!(fixture.git(&["branch", "--show-current"]), "development/master");
    assert!(
        ctx.repo()
            .is_ancestor(&new_upstream, "development/master")
            .unwrap()
    );
}

#[test]
fn test_convert_creates_orphan_branch() {
    let fixture = Fixture::new();
    fixture.git(&["branch", "-D", "development/master"]);
    let ctx = fixture.context();

    let branch = actions::convert(&ctx, ConvertOptions::default()).unwrap();
    assert_eq!(branch, "master-orphan");
    assert_eq!(fixture.git(&["branch", "--show-current"]), "master-orphan");

    let files = fixture.git(&["ls-tree", "--name-only", "master-orphan"]);
    assert!(files.lines().any(|f| f == "foo.spec"));
    assert!(!files.lines().any(|f| f == "src"));
    let subjects = fixture.git(&["log", "--format=%s", "master-orphan"]);
    assert_eq!(
        subjects,
        "Auto-generate patches\nAuto-import packaging files"
    );

    fixture.git(&["checkout", "-q", "master"]);
    let err = actions::convert(&ctx, ConvertOptions::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: Branch 'master-orphan' already exists!");

    let forced = ConvertOptions {
        force: true,
        ..ConvertOptions::default()
    };
    assert_eq!(actions::convert(&ctx, forced).unwrap(), "master-orphan");
}

#[test]
fn test_convert_refuses_with_pq_branch() {
    let fixture = Fixture::new();
    let ctx = fixture.context();
    let err = actions::convert(&ctx, ConvertOptions::default()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"git error: Seems you're already using orphan-packaging model - pq branch development/master already exists");
}
