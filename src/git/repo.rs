// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Repository handle used by the patch-queue engine.
//!
//! ```text
//! Repository { workdir }
//!   refs      rev_parse  has_treeish  is_ancestor  commits  commit_info
//!   diffs     diff (binary, stat=80, summary, path exclusion)
//!   branches  create/delete/set_branch  force_head  current/has_branch
//!   trees     show  ls_tree  dump_tree  create_tree  commit_tree
//!   commits   add_files  commit_files  commit_staged  apply_patch  rebase
//! ```
//!
//! Queries go through [`GixBackend`], everything else through [`ShellBackend`].

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::backend::{GitInvocation, GitMutation, GitQuery, GixBackend, ShellBackend};
use crate::error::{FsError, GitError, PqResult};

/// Name, email and optional date of a commit author.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<String>,
}

impl Author {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            date: None,
        }
    }

    /// `GIT_AUTHOR_*` variables for the fields that are set.
    #[must_use]
    pub fn env(&self) -> Vec<(&'static str, &str)> {
        [
            ("GIT_AUTHOR_NAME", self.name.as_deref()),
            ("GIT_AUTHOR_EMAIL", self.email.as_deref()),
            ("GIT_AUTHOR_DATE", self.date.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Metadata of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub author: Author,
    pub committer: Author,
    pub subject: String,
    /// Message body after the subject line; may carry trailers.
    pub body: String,
}

/// One entry of `git ls-tree`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub kind: String,
    pub object: String,
    pub name: String,
}

/// A git work tree.
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
}

impl Repository {
    /// Opens the work tree containing `path`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepoNotFound` if `path` is not inside a work tree.
    pub fn open(path: impl AsRef<Path>) -> PqResult<Self> {
        let path = path.as_ref();
        if !GixBackend::is_git_repo(path) {
            return Err(GitError::RepoNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Ok(Self {
            path: GixBackend::workdir(path)?,
        })
    }

    /// Top-level directory of the work tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self, args: &[&str]) -> PqResult<String> {
        ShellBackend::git_command(args, &self.path)
    }

    fn git_bytes(&self, args: &[&str], invocation: &GitInvocation<'_>) -> PqResult<Vec<u8>> {
        ShellBackend::git_command_bytes(args, &self.path, invocation)
    }

    // --- refs and history ---

    /// Resolves `rev` to a full object id.
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidTreeish` if `rev` does not resolve.
    pub fn rev_parse(&self, rev: &str) -> PqResult<String> {
        self.git(&["rev-parse", "--quiet", "--verify", rev])
            .map_err(|_| {
                GitError::InvalidTreeish {
                    treeish: rev.to_string(),
                }
                .into()
            })
    }

    /// Resolves `rev` to an abbreviated object id of at least `len` digits.
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidTreeish` if `rev` does not resolve.
    pub fn rev_parse_short(&self, rev: &str, len: usize) -> PqResult<String> {
        let short = format!("--short={len}");
        self.git(&["rev-parse", "--quiet", "--verify", &short, rev])
            .map_err(|_| {
                GitError::InvalidTreeish {
                    treeish: rev.to_string(),
                }
                .into()
            })
    }

    /// Whether `treeish` names a tree or something peeling to one.
    #[must_use]
    pub fn has_treeish(&self, treeish: &str) -> bool {
        self.git(&["rev-parse", "--quiet", "--verify", &format!("{treeish}^{{tree}}")])
            .is_ok()
    }

    /// Best common ancestor of two commits, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if either commit does not resolve.
    pub fn merge_base(&self, a: &str, b: &str) -> PqResult<Option<String>> {
        let a = self.rev_parse(&format!("{a}^0"))?;
        let b = self.rev_parse(&format!("{b}^0"))?;
        Ok(self.git(&["merge-base", &a, &b]).ok())
    }

    /// Whether `parent` is an ancestor of (or equal to) `child`.
    ///
    /// # Errors
    ///
    /// Returns an error if either commit does not resolve.
    pub fn is_ancestor(&self, parent: &str, child: &str) -> PqResult<bool> {
        let parent_id = self.rev_parse(&format!("{parent}^0"))?;
        Ok(self.merge_base(&parent_id, child)?.as_deref() == Some(parent_id.as_str()))
    }

    /// Commits reachable from `until` but not from `since`, newest first.
    ///
    /// With `paths`, only commits touching them are listed.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git rev-list` fails.
    pub fn commits(
        &self,
        since: Option<&str>,
        until: &str,
        paths: &[&Path],
        merges_only: bool,
    ) -> PqResult<Vec<String>> {
        let range = since.map_or_else(|| until.to_string(), |s| format!("{s}..{until}"));
        let mut args = vec!["rev-list"];
        if merges_only {
            args.push("--merges");
        }
        args.push(&range);
        let path_strs: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        if !path_strs.is_empty() {
            args.push("--");
            args.extend(path_strs.iter().map(String::as_str));
        }
        Ok(self
            .git(&args)?
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Reads author, committer and message of `commit`.
    ///
    /// # Errors
    ///
    /// Returns an error if `commit` does not resolve.
    pub fn commit_info(&self, commit: &str) -> PqResult<CommitInfo> {
        let raw = self.git_bytes(
            &[
                "show",
                "-s",
                "--no-show-signature",
                "--format=%H%x00%an%x00%ae%x00%aD%x00%cn%x00%ce%x00%cD%x00%s%x00%b",
                commit,
            ],
            &GitInvocation::default(),
        )?;
        let raw = String::from_utf8_lossy(&raw);
        let fields: Vec<&str> = raw.splitn(9, '\0').collect();
        let &[id, an, ae, ad, cn, ce, cd, subject, body] = fields.as_slice() else {
            return Err(GitError::CommandFailed {
                command: format!("git show {commit}"),
                message: "unexpected output format".to_string(),
            }
            .into());
        };
        let person = |name: &str, email: &str, date: &str| Author {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            date: Some(date.to_string()),
        };
        Ok(CommitInfo {
            id: id.trim().to_string(),
            author: person(an, ae, ad),
            committer: person(cn, ce, cd),
            subject: subject.to_string(),
            body: body.trim_end().to_string(),
        })
    }

    // --- diffs ---

    /// Paths changed between two treeishes.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git diff` fails.
    pub fn changed_paths(&self, from: &str, to: &str) -> PqResult<Vec<String>> {
        let raw = self.git_bytes(
            &["diff", "--name-only", "--no-renames", "-z", from, to],
            &GitInvocation::default(),
        )?;
        Ok(raw
            .split(|b| *b == 0)
            .filter(|p| !p.is_empty())
            .map(|p| String::from_utf8_lossy(p).into_owned())
            .collect())
    }

    /// Patch text (with stat and summary) between two treeishes.
    ///
    /// Paths matching `exclude` are left out; the rest are passed as literal
    /// pathspecs. Returns an empty buffer when nothing remains to diff.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git diff` fails.
    pub fn diff(&self, from: &str, to: &str, exclude: Option<&Regex>) -> PqResult<Vec<u8>> {
        let paths: Vec<String> = self
            .changed_paths(from, to)?
            .into_iter()
            .filter(|p| exclude.is_none_or(|re| !re.is_match(p)))
            .collect();
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = vec![
            "--literal-pathspecs",
            "diff",
            "--binary",
            "--text",
            "--stat=80",
            "--summary",
            "--no-ext-diff",
            "--no-color",
            from,
            to,
            "--",
        ];
        args.extend(paths.iter().map(String::as_str));
        self.git_bytes(&args, &GitInvocation::default())
    }

    // --- branches ---

    /// Current branch name.
    ///
    /// # Errors
    ///
    /// Returns `GitError::DetachedHead` if HEAD is not on a branch.
    pub fn current_branch(&self) -> PqResult<String> {
        GixBackend::current_branch(&self.path)?.ok_or_else(|| {
            GitError::DetachedHead {
                path: self.path.display().to_string(),
            }
            .into()
        })
    }

    /// Whether a local branch exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference store cannot be read.
    pub fn has_branch(&self, branch: &str) -> PqResult<bool> {
        GixBackend::has_branch(&self.path, branch)
    }

    /// Creates `name` at `rev` (HEAD when `None`).
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the branch exists and `force` is
    /// not set, or `rev` does not resolve.
    pub fn create_branch(&self, name: &str, rev: Option<&str>, force: bool) -> PqResult<()> {
        debug!(branch = name, rev = ?rev, force, "creating branch");
        ShellBackend::create_branch(&self.path, name, rev, force)
    }

    /// Deletes a local branch.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the branch is checked out or missing.
    pub fn delete_branch(&self, name: &str) -> PqResult<()> {
        debug!(branch = name, "deleting branch");
        ShellBackend::delete_branch(&self.path, name)
    }

    /// Moves the current branch to `rev`, resetting index and work tree when `hard`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the reset fails.
    pub fn force_head(&self, rev: &str, hard: bool) -> PqResult<()> {
        if hard {
            ShellBackend::reset_hard(&self.path, rev)
        } else {
            self.git(&["reset", "--quiet", rev]).map(drop)
        }
    }

    /// Checks out `branch` unless it is already current.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the checkout fails.
    pub fn set_branch(&self, branch: &str) -> PqResult<()> {
        if GixBackend::current_branch(&self.path)?.as_deref() == Some(branch) {
            return Ok(());
        }
        ShellBackend::checkout(&self.path, branch)
    }

    /// Checks out any branch, tag or commit.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the checkout fails.
    pub fn checkout(&self, what: &str) -> PqResult<()> {
        ShellBackend::checkout(&self.path, what)
    }

    // --- files and trees ---

    /// Contents of an object, e.g. `branch:path/file`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the object does not exist.
    pub fn show(&self, object: &str) -> PqResult<Vec<u8>> {
        self.git_bytes(&["show", object], &GitInvocation::default())
    }

    /// Entries of a tree, e.g. `branch:packaging`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the tree does not exist.
    pub fn ls_tree(&self, treeish: &str) -> PqResult<Vec<TreeEntry>> {
        let raw = self.git_bytes(&["ls-tree", "-z", treeish], &GitInvocation::default())?;
        Ok(raw
            .split(|b| *b == 0)
            .filter(|e| !e.is_empty())
            .filter_map(|entry| {
                let entry = String::from_utf8_lossy(entry);
                let (meta, name) = entry.split_once('\t')?;
                let mut meta = meta.split(' ');
                Some(TreeEntry {
                    mode: meta.next()?.to_string(),
                    kind: meta.next()?.to_string(),
                    object: meta.next()?.to_string(),
                    name: name.to_string(),
                })
            })
            .collect())
    }

    /// Writes the blobs of `treeish` into `dir`, descending into subtrees when `recursive`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read or a file cannot be written.
    pub fn dump_tree(&self, treeish: &str, dir: &Path, recursive: bool) -> PqResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| FsError::io(dir, e))?;
        for entry in self.ls_tree(treeish)? {
            let target = dir.join(&entry.name);
            match entry.kind.as_str() {
                "blob" => {
                    let content = self.show(&entry.object)?;
                    if entry.mode == "120000" {
                        let link = String::from_utf8_lossy(&content).into_owned();
                        std::os::unix::fs::symlink(link, &target)
                            .map_err(|e| FsError::io(&target, e))?;
                        continue;
                    }
                    std::fs::write(&target, content).map_err(|e| FsError::io(&target, e))?;
                    if entry.mode == "100755" {
                        use std::os::unix::fs::PermissionsExt as _;
                        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755))
                            .map_err(|e| FsError::io(&target, e))?;
                    }
                }
                "tree" if recursive => {
                    self.dump_tree(&entry.object, &target, true)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Writes the contents of `dir` as a tree object and returns its id.
    ///
    /// Uses a throwaway index so the repository index is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be staged or the tree written.
    pub fn create_tree(&self, dir: &Path) -> PqResult<String> {
        let git_dir = self.git(&["rev-parse", "--absolute-git-dir"])?;
        let index_dir = tempfile::Builder::new()
            .prefix("rpmpq_index_")
            .tempdir()
            .map_err(|e| FsError::io(std::env::temp_dir(), e))?;
        let index = index_dir.path().join("index");
        let index = index.display().to_string();
        let work_tree = dir.display().to_string();
        let env = [
            ("GIT_DIR", git_dir.as_str()),
            ("GIT_WORK_TREE", work_tree.as_str()),
            ("GIT_INDEX_FILE", index.as_str()),
        ];
        let invocation = GitInvocation {
            env: &env,
            stdin: None,
        };
        ShellBackend::git_command_bytes(&["add", "-A", "-f", "."], dir, &invocation)?;
        let tree = ShellBackend::git_command_bytes(&["write-tree"], dir, &invocation)?;
        Ok(String::from_utf8_lossy(&tree).trim().to_string())
    }

    /// Creates a commit object for `tree` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git commit-tree` fails.
    pub fn commit_tree(&self, tree: &str, message: &str, parents: &[&str]) -> PqResult<String> {
        let mut args = vec!["commit-tree", tree];
        for parent in parents {
            args.extend(["-p", *parent]);
        }
        args.extend(["-F", "-"]);
        let id = self.git_bytes(
            &args,
            &GitInvocation {
                env: &[],
                stdin: Some(message.as_bytes()),
            },
        )?;
        Ok(String::from_utf8_lossy(&id).trim().to_string())
    }

    /// Stages files, including ignored ones when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git add` fails.
    pub fn add_files(&self, files: &[&str], force: bool) -> PqResult<()> {
        let mut args = vec!["add"];
        if force {
            args.push("-f");
        }
        args.push("--");
        args.extend(files);
        self.git(&args).map(drop)
    }

    /// Commits exactly `files` with `message`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git commit` fails.
    pub fn commit_files(&self, files: &[&str], message: &str) -> PqResult<()> {
        let mut args = vec!["commit", "--quiet", "--no-verify", "-F", "-", "--"];
        args.extend(files);
        self.git_bytes(
            &args,
            &GitInvocation {
                env: &[],
                stdin: Some(message.as_bytes()),
            },
        )
        .map(drop)
    }

    /// Commits the index with `message`, attributed to `author` where given.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git commit` fails.
    pub fn commit_staged(&self, message: &str, author: &Author) -> PqResult<()> {
        let env = author.env();
        self.git_bytes(
            &["commit", "--quiet", "--no-verify", "-F", "-"],
            &GitInvocation {
                env: &env,
                stdin: Some(message.as_bytes()),
            },
        )
        .map(drop)
    }

    /// Whether the index differs from HEAD.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git diff` fails.
    pub fn has_staged_changes(&self) -> PqResult<bool> {
        Ok(!self.git(&["diff", "--cached", "--name-only"])?.is_empty())
    }

    // --- patches and rebasing ---

    /// Applies `patch` to index and work tree with the given strip level.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the patch does not apply.
    pub fn apply_patch(&self, patch: &Path, strip: u32) -> PqResult<()> {
        let strip = format!("-p{strip}");
        let patch = patch.display().to_string();
        self.git(&["apply", "--index", &strip, &patch]).map(drop)
    }

    /// Rebases the current branch onto `upstream`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if the rebase stops.
    pub fn rebase(&self, upstream: &str) -> PqResult<()> {
        self.git(&["rebase", upstream]).map(drop)
    }

    /// Output of `git status` limited to `paths`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::CommandFailed` if `git status` fails.
    pub fn status(&self, paths: &[&Path]) -> PqResult<String> {
        let path_strs: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let mut args = vec!["status", "--"];
        args.extend(path_strs.iter().map(String::as_str));
        self.git(&args)
    }
}

