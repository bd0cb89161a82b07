// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Replaying a spec file's patch series as commits.
//!
//! ```text
//! replay()
//!   |
//!   v
//! create/reset pq branch at upstream
//!   |
//!   v
//! stage patches (gunzip / bzip2 -dc) ── scratch dir
//!   |
//!   v
//! checkout pq branch, import extra files (Gbp: Ignore)
//!   |
//!   v
//! for each patch: apply_and_commit ──Failed──> checkout base,
//!   Applied | SkippedNoOp                      delete pq branch,
//!                                              return error
//! ```

use tracing::{debug, info, warn};

use super::PqContext;
use super::compress::stage_patch;
use super::patch::PatchFile;
use crate::error::{FsError, GitError, PatchError, PqError, PqResult};
use crate::git::{Author, Repository};
use crate::spec::SpecFile;

/// Result of applying one patch.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Applied and committed.
    Applied,
    /// Applied cleanly but changed nothing; no commit was made.
    SkippedNoOp,
    /// Could not be applied or committed.
    Failed(PqError),
}

impl ApplyOutcome {
    /// Turns `Failed` into an error.
    ///
    /// # Errors
    ///
    /// Returns the error carried by `Failed`.
    pub fn into_result(self) -> PqResult<Self> {
        match self {
            Self::Failed(e) => Err(e),
            other => Ok(other),
        }
    }
}

/// Applies `patch` to index and work tree and commits it.
///
/// Authorship comes from the patch headers, then `fallback_author`, then the
/// repository's default identity.
pub fn apply_and_commit(
    repo: &Repository,
    patch: &PatchFile,
    fallback_author: Option<&Author>,
) -> ApplyOutcome {
    let name = patch.file_name();
    let author = if patch.has_author() {
        patch.author.clone()
    } else if let Some(fallback) = fallback_author.filter(|a| a.name.is_some()) {
        warn!(
            "Patch '{name}' has no authorship information, using '{} <{}>'",
            fallback.name.as_deref().unwrap_or_default(),
            fallback.email.as_deref().unwrap_or_default()
        );
        Author {
            date: patch.author.date.clone(),
            ..fallback.clone()
        }
    } else {
        warn!("Patch '{name}' has no authorship information");
        Author {
            date: patch.author.date.clone(),
            ..Author::default()
        }
    };

    debug!(patch = %patch.path.display(), strip = patch.strip, "applying");
    if let Err(e) = repo.apply_patch(&patch.path, patch.strip) {
        let message = e
            .as_git()
            .and_then(|g| match g {
                GitError::CommandFailed { message, .. } => Some(message.clone()),
                _ => None,
            })
            .unwrap_or_else(|| e.to_string());
        if message.contains("No valid patches in input") {
            info!("Patch '{name}' contains no changes, skipping");
            return ApplyOutcome::SkippedNoOp;
        }
        return ApplyOutcome::Failed(
            PatchError::ApplyFailed {
                patch: name,
                message,
            }
            .into(),
        );
    }

    match repo.has_staged_changes() {
        Ok(false) => {
            info!("Patch '{name}' changes nothing, skipping");
            ApplyOutcome::SkippedNoOp
        }
        Ok(true) => match repo.commit_staged(&patch.commit_message(), &author) {
            Ok(()) => ApplyOutcome::Applied,
            Err(e) => ApplyOutcome::Failed(e),
        },
        Err(e) => ApplyOutcome::Failed(e),
    }
}

/// Copies `files` from `commitish` into the work tree and commits them.
///
/// Files missing in `commitish` are skipped. With `patch_ignore` the commit
/// carries the ignore trailers so that export skips it. Returns the imported files.
///
/// # Errors
///
/// Returns an error if a file cannot be written, staged or committed.
pub fn import_extra_files(
    repo: &Repository,
    commitish: &str,
    files: &[String],
    patch_ignore: bool,
) -> PqResult<Vec<String>> {
    let found: Vec<(&str, Vec<u8>)> = files
        .iter()
        .filter(|f| !f.is_empty())
        .filter_map(|f| {
            repo.show(&format!("{commitish}:{f}"))
                .ok()
                .map(|content| (f.as_str(), content))
        })
        .collect();
    if found.is_empty() {
        return Ok(Vec::new());
    }

    let current = repo.current_branch().unwrap_or_else(|_| "HEAD".to_string());
    info!("Importing additional file(s) from branch '{commitish}' into '{current}'");
    for (file, content) in &found {
        let target = repo.path().join(file);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError::io(parent, e))?;
        }
        std::fs::write(&target, content).map_err(|e| FsError::io(&target, e))?;
    }

    let names: Vec<&str> = found.iter().map(|(f, _)| *f).collect();
    debug!(files = ?names, "adding and committing");
    repo.add_files(&names, true)?;
    let mut message = format!(
        "Auto-import file(s) from branch '{commitish}':\n    {}\n",
        names.join("    ")
    );
    if patch_ignore {
        message.push_str("\nGbp: Ignore\nGbp-Rpm: Ignore");
    }
    repo.commit_files(&names, &message)?;
    Ok(names.into_iter().map(str::to_string).collect())
}

/// Where and how to replay.
#[derive(Debug, Clone, Copy)]
pub struct ReplayTarget<'a> {
    /// Branch the spec file was read from; restored on failure.
    pub base: &'a str,
    /// Patch-queue branch to (re)create.
    pub branch: &'a str,
    /// Commit the branch starts at.
    pub upstream: &'a str,
    /// Replace an existing patch-queue branch.
    pub force: bool,
}

/// Recreates the patch-queue branch and commits `spec`'s patch series onto it.
///
/// Returns the outcome for every patch, by file name.
///
/// # Errors
///
/// Returns `GitError::BranchExists` (with nothing changed) if the branch
/// exists and `force` is not set. Any later failure checks out the base
/// branch, deletes the patch-queue branch and returns the underlying error.
pub fn replay(
    ctx: &PqContext,
    spec: &SpecFile,
    target: ReplayTarget<'_>,
) -> PqResult<Vec<(String, ApplyOutcome)>> {
    let repo = ctx.repo();
    let branch = target.branch;

    if repo.has_branch(branch)? && !target.force {
        return Err(GitError::BranchExists {
            branch: branch.to_string(),
            message: format!("Patch-queue branch '{branch}' already exists. Try 'switch' instead."),
        }
        .into());
    }

    if repo.current_branch().ok().as_deref() == Some(branch) {
        repo.force_head(target.upstream, true)?;
    } else {
        repo.create_branch(branch, Some(target.upstream), true)?;
    }

    let packager = spec
        .packager_identity()
        .map(|(name, email)| Author::new(name, email));

    match apply_series(ctx, spec, target, packager.as_ref()) {
        Ok(outcomes) => {
            info!(
                "Patches listed in '{}' imported on '{branch}'",
                spec.file_name()
            );
            Ok(outcomes)
        }
        Err(e) => {
            rollback(repo, target.base, branch);
            Err(e)
        }
    }
}

fn apply_series(
    ctx: &PqContext,
    spec: &SpecFile,
    target: ReplayTarget<'_>,
    packager: Option<&Author>,
) -> PqResult<Vec<(String, ApplyOutcome)>> {
    let repo = ctx.repo();
    let staging = ctx.scratch_subdir("patchimport_")?;
    let series = spec.patch_series(false);
    if let Some(first) = series.first() {
        debug!(
            from = %first.path.parent().unwrap_or(spec.spec_dir()).display(),
            to = %staging.path().display(),
            "staging patches"
        );
    }
    let queue = series
        .iter()
        .map(|p| {
            let staged = stage_patch(&p.path, staging.path())?;
            PatchFile::read(staged, p.strip)
        })
        .collect::<PqResult<Vec<_>>>()?;

    info!("Switching to branch '{}'", target.branch);
    repo.set_branch(target.branch)?;
    import_extra_files(repo, target.base, &ctx.pq().import_files, true)?;

    if queue.is_empty() {
        return Ok(Vec::new());
    }
    info!(
        "Trying to apply patches from branch '{}' onto '{}'",
        target.base, target.upstream
    );
    let mut outcomes = Vec::with_capacity(queue.len());
    for patch in &queue {
        let outcome = apply_and_commit(repo, patch, packager).into_result()?;
        outcomes.push((patch.file_name(), outcome));
    }
    Ok(outcomes)
}

fn rollback(repo: &Repository, base: &str, branch: &str) {
    warn!("Import failed, removing branch '{branch}'");
    let on_branch = repo.current_branch().ok().as_deref() == Some(branch);
    let restored = if on_branch {
        repo.force_head("HEAD", true).and_then(|()| repo.set_branch(base))
    } else {
        repo.set_branch(base)
    };
    if let Err(e) = restored {
        warn!("Failed to switch back to '{base}': {e}");
        return;
    }
    if let Err(e) = repo.delete_branch(branch) {
        warn!("Failed to delete branch '{branch}': {e}");
    }
}
