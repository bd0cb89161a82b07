// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for Git operations.
//!
//! Tests the git module with real temporary repositories.

use rpmpq::error::GitError;
use rpmpq::git::Repository;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

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

fn init_repo() -> (TempDir, Repository) {
    let temp = temp_dir();
    run_git(temp.path(), &["init", "--quiet"]);
    run_git(temp.path(), &["checkout", "-q", "-b", "master"]);
    run_git(temp.path(), &["config", "user.name", "Test"]);
    run_git(temp.path(), &["config", "user.email", "test@example.com"]);
    commit_file(temp.path(), "README", "hello\n", "Initial commit");
    let repo = Repository::open(temp.path()).expect("open repo");
    (temp, repo)
}

// =============================================================================
// Branch state
// =============================================================================

#[test]
fn detached_head_has_no_current_branch() {
    let (temp, repo) = init_repo();
    let head = run_git(temp.path(), &["rev-parse", "HEAD"]);
    run_git(temp.path(), &["checkout", "-q", "--detach", &head]);

    let err = repo.current_branch().unwrap_err();
    assert!(matches!(err.as_git(), Some(GitError::DetachedHead { .. })));
}

#[test]
fn create_branch_refuses_existing_without_force() {
    let (temp, repo) = init_repo();
    let first = run_git(temp.path(), &["rev-parse", "HEAD"]);
    repo.create_branch("topic", None, false).unwrap();
    let second = commit_file(temp.path(), "a.txt", "a\n", "Second");

    assert!(repo.create_branch("topic", Some(&second), false).is_err());
    assert_eq!(repo.rev_parse("topic").unwrap(), first);

    repo.create_branch("topic", Some(&second), true).unwrap();
    assert_eq!(repo.rev_parse("topic").unwrap(), second);
}

#[test]
fn force_head_resets_work_tree() {
    let (temp, repo) = init_repo();
    let first = run_git(temp.path(), &["rev-parse", "HEAD"]);
    commit_file(temp.path(), "a.txt", "a\n", "Second");
    std::fs::write(temp.path().join("README"), "dirty\n").unwrap();

    repo.force_head(&first, true).unwrap();
    assert_eq!(repo.rev_parse("master").unwrap(), first);
    assert!(!temp.path().join("a.txt").exists());
    assert_eq!(
        std::fs::read_to_string(temp.path().join("README")).unwrap(),
        "hello\n"
    );
}

// =============================================================================
// History
// =============================================================================

#[test]
fn rebase_moves_branch_onto_new_base() {
    let (temp, repo) = init_repo();
    let base = run_git(temp.path(), &["rev-parse", "HEAD"]);
    repo.create_branch("topic", None, false).unwrap();
    repo.set_branch("topic").unwrap();
    commit_file(temp.path(), "topic.txt", "topic\n", "Topic work");

    repo.set_branch("master").unwrap();
    let moved = commit_file(temp.path(), "base.txt", "base\n", "Base work");
    repo.set_branch("topic").unwrap();

    assert_eq!(repo.merge_base("topic", "master").unwrap(), Some(base));
    repo.rebase("master").unwrap();
    assert!(repo.is_ancestor(&moved, "topic").unwrap());
    assert!(temp.path().join("base.txt").exists());
}

#[test]
fn commits_can_be_limited_to_paths_and_merges() {
    let (temp, repo) = init_repo();
    let start = run_git(temp.path(), &["rev-parse", "HEAD"]);
    let spec = commit_file(temp.path(), "pkg/foo.spec", "Name: foo\n", "Add spec");
    commit_file(temp.path(), "src.c", "x\n", "Code");

    let touching = repo
        .commits(Some(&start), "HEAD", &[Path::new("pkg/foo.spec")], false)
        .unwrap();
    assert_eq!(touching, vec![spec]);

    run_git(temp.path(), &["checkout", "-q", "-b", "side", &start]);
    commit_file(temp.path(), "side.txt", "side\n", "Side");
    run_git(temp.path(), &["checkout", "-q", "master"]);
    run_git(temp.path(), &["merge", "--quiet", "--no-ff", "-m", "Merge side", "side"]);

    let merges = repo.commits(Some(&start), "HEAD", &[], true).unwrap();
    assert_eq!(merges.len(), 1);
    assert_eq!(repo.commit_info(&merges[0]).unwrap().subject, "Merge side");
}

// =============================================================================
// Work tree
// =============================================================================

#[test]
fn status_reports_changes_below_path() {
    let (temp, repo) = init_repo();
    commit_file(temp.path(), "pkg/foo.spec", "Name: foo\n", "Add spec");
    std::fs::write(temp.path().join("pkg/foo.spec"), "Name: bar\n").unwrap();
    std::fs::write(temp.path().join("other.txt"), "other\n").unwrap();

    let status = repo.status(&[Path::new("pkg")]).unwrap();
    assert!(status.contains("pkg/foo.spec"));
    assert!(!status.contains("other.txt"));
}

#[test]
fn add_and_commit_selected_files() {
    let (temp, repo) = init_repo();
    std::fs::write(temp.path().join("keep.txt"), "keep\n").unwrap();
    std::fs::write(temp.path().join("skip.txt"), "skip\n").unwrap();

    repo.add_files(&["keep.txt"], false).unwrap();
    repo.commit_files(&["keep.txt"], "Add keep\n\nWith body").unwrap();

    let info = repo.commit_info("HEAD").unwrap();
    assert_eq!(info.subject, "Add keep");
    assert_eq!(info.body, "With body");
    assert_eq!(
        repo.changed_paths("HEAD~1", "HEAD").unwrap(),
        vec!["keep.txt".to_string()]
    );
}
