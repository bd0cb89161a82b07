// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! GitQuery (read)     --> GixBackend (pure Rust gix)
//! GitMutation (write) --> ShellBackend (git CLI)
//! ```

use crate::error::{GitError, GixError, PqResult};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// --- Query Trait (Read-only operations) ---

/// Read-only git query operations.
///
/// Implementors provide methods to inspect repository state without modification.
pub trait GitQuery {
    /// Check if path is inside a git work tree.
    fn is_git_repo(path: &Path) -> bool;

    /// Top-level directory of the work tree containing `path`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if no repository is found or it is bare.
    fn workdir(path: &Path) -> PqResult<PathBuf>;

    /// Get current branch name (None if HEAD is detached).
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or head resolution fails.
    fn current_branch(path: &Path) -> PqResult<Option<String>>;

    /// Check whether a local branch exists.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository discovery or reference lookup fails.
    fn has_branch(path: &Path, branch: &str) -> PqResult<bool>;
}

// --- Mutation Trait (Write operations) ---

/// Git mutation operations that modify repository state.
pub trait GitMutation {
    /// Initialize a new repository.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if repository initialization fails.
    fn init_repo(path: &Path) -> PqResult<()>;

    /// Checkout a branch, tag, or commit.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the checkout operation fails.
    fn checkout(repo_path: &Path, what: &str) -> PqResult<()>;

    /// Create a branch at `rev` (HEAD when `None`), replacing it when `force` is set.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the branch cannot be created.
    fn create_branch(repo_path: &Path, name: &str, rev: Option<&str>, force: bool) -> PqResult<()>;

    /// Delete a local branch, even if unmerged.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the branch cannot be deleted.
    fn delete_branch(repo_path: &Path, name: &str) -> PqResult<()>;

    /// Hard-reset HEAD (index and work tree) to `rev`.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if the reset fails.
    fn reset_hard(repo_path: &Path, rev: &str) -> PqResult<()>;
}

fn discover(path: &Path) -> PqResult<gix::Repository> {
    gix::discover(path)
        .map_err(|e| GitError::Gix(GixError::Discover(Box::new(e))))
        .map_err(|e| Box::new(e).into())
}

// --- GixBackend Implementation (Pure Rust) ---

/// Pure Rust git backend using gix.
///
/// Provides read-only operations without spawning subprocesses.
pub struct GixBackend;

impl GitQuery for GixBackend {
    fn is_git_repo(path: &Path) -> bool {
        gix::discover(path).is_ok_and(|repo| repo.workdir().is_some())
    }

    fn workdir(path: &Path) -> PqResult<PathBuf> {
        let repo = discover(path)?;
        repo.workdir().map(Path::to_path_buf).ok_or_else(|| {
            Box::new(GitError::RepoNotFound {
                path: path.display().to_string(),
            })
            .into()
        })
    }

    fn current_branch(path: &Path) -> PqResult<Option<String>> {
        let repo = discover(path)?;
        let head = repo
            .head_name()
            .map_err(|e| Box::new(GitError::Gix(GixError::Head(e))))?;
        Ok(head.map(|name| name.shorten().to_string()))
    }

    fn has_branch(path: &Path, branch: &str) -> PqResult<bool> {
        let repo = discover(path)?;
        let reference = repo
            .try_find_reference(format!("refs/heads/{branch}").as_str())
            .map_err(|e| Box::new(GitError::Gix(GixError::Reference(e))))?;
        Ok(reference.is_some())
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// Shell-based git backend using git CLI.
///
/// Used for every write operation and for plumbing gix does not cover
/// (diff formatting, `apply`, `rebase`, alternate index files).
pub struct ShellBackend;

/// Input for one git invocation beyond its arguments.
#[derive(Debug, Default)]
pub struct GitInvocation<'a> {
    /// Extra environment variables.
    pub env: &'a [(&'a str, &'a str)],
    /// Data fed to stdin.
    pub stdin: Option<&'a [u8]>,
}

impl ShellBackend {
    /// Execute a git command, returning trimmed stdout.
    ///
    /// Sets `GCM_INTERACTIVE=never` and `GIT_TERMINAL_PROMPT=0`.
    pub(crate) fn git_command(args: &[&str], cwd: &Path) -> PqResult<String> {
        let stdout = Self::git_command_bytes(args, cwd, &GitInvocation::default())?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    /// Execute a git command, returning raw stdout.
    pub(crate) fn git_command_bytes(
        args: &[&str],
        cwd: &Path,
        invocation: &GitInvocation<'_>,
    ) -> PqResult<Vec<u8>> {
        let command_line = format!("git {}", args.join(" "));
        tracing::debug!(cmd = %command_line, cwd = %cwd.display(), "exec");

        let mut child = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(invocation.env.iter().copied())
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| std::io::Error::new(e.kind(), format!("failed to execute git: {e}")))?;

        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = match (stdin, invocation.stdin) {
                (Some(mut pipe), Some(input)) => Some(scope.spawn(move || pipe.write_all(input))),
                _ => None,
            };
            let output = child.wait_with_output();
            let written = writer.map_or(Ok(()), |handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")))
            });
            output.and_then(|output| written.map(|()| output))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Box::new(GitError::CommandFailed {
                command: command_line,
                message,
            })
            .into());
        }
        tracing::trace!(stderr = %String::from_utf8_lossy(&output.stderr).trim_end(), "git stderr");
        Ok(output.stdout)
    }
}

impl GitMutation for ShellBackend {
    fn init_repo(path: &Path) -> PqResult<()> {
        Self::git_command(&["init", "--quiet"], path)?;
        Ok(())
    }

    fn checkout(repo_path: &Path, what: &str) -> PqResult<()> {
        Self::git_command(
            &["-c", "advice.detachedHead=false", "checkout", "-q", what],
            repo_path,
        )?;
        Ok(())
    }

    fn create_branch(repo_path: &Path, name: &str, rev: Option<&str>, force: bool) -> PqResult<()> {
        let mut args = vec!["branch"];
        if force {
            args.push("-f");
        }
        args.push(name);
        if let Some(rev) = rev {
            args.push(rev);
        }
        Self::git_command(&args, repo_path)?;
        Ok(())
    }

    fn delete_branch(repo_path: &Path, name: &str) -> PqResult<()> {
        Self::git_command(&["branch", "-D", name], repo_path)?;
        Ok(())
    }

    fn reset_hard(repo_path: &Path, rev: &str) -> PqResult<()> {
        Self::git_command(&["reset", "--quiet", "--hard", rev], repo_path)?;
        Ok(())
    }
}

impl GitQuery for ShellBackend {
    fn is_git_repo(path: &Path) -> bool {
        Self::git_command(&["rev-parse", "--is-inside-work-tree"], path).is_ok()
    }

    fn workdir(path: &Path) -> PqResult<PathBuf> {
        Self::git_command(&["rev-parse", "--show-toplevel"], path).map(PathBuf::from)
    }

    fn current_branch(path: &Path) -> PqResult<Option<String>> {
        Self::git_command(&["symbolic-ref", "--short", "HEAD"], path)
            .map_or_else(|_| Ok(None), |branch| Ok(Some(branch)))
    }

    fn has_branch(path: &Path, branch: &str) -> PqResult<bool> {
        let reference = format!("refs/heads/{branch}");
        Ok(Self::git_command(&["show-ref", "--verify", "--quiet", &reference], path).is_ok())
    }
}
