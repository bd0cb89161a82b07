// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The patch-queue actions.
//!
//! ```text
//! export   pq branch  ──generate──▶ patches + spec (base branch)
//! import   spec + patches ──replay──▶ pq branch
//! rebase   pq branch ──git rebase──▶ upstream tag
//! drop     delete pq branch
//! switch   base ◀──▶ pq branch
//! apply    one patch ──▶ commit on pq branch
//! convert  branch ──▶ <branch>-orphan (packaging only, patches generated)
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::generate::{GenerateOptions, GeneratedSeries, SquashPoint, generate};
use super::patch::PatchFile;
use super::replay::{ApplyOutcome, ReplayTarget, apply_and_commit, import_extra_files, replay};
use super::{
    PqContext, find_upstream_commit, is_pq_branch, pq_branch_base, pq_branch_name,
    upstream_tag_name,
};
use crate::error::{FsError, GitError, PatchError, PqResult, SpecError};
use crate::spec::SpecFile;

/// What `export` produced.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Patch file names now listed in the spec file.
    pub patches: Vec<String>,
    /// The rewritten spec file.
    pub spec_path: PathBuf,
    /// `git status` of the packaging directory.
    pub status: String,
}

/// Base branch of the current branch and whether HEAD is on a pq branch.
fn current_base(ctx: &PqContext) -> PqResult<(String, String, bool)> {
    let current = ctx.repo().current_branch()?;
    if is_pq_branch(&current, ctx.pq()) {
        let base = pq_branch_base(&current, ctx.pq()).unwrap_or_else(|| current.clone());
        Ok((current, base, true))
    } else {
        Ok((current.clone(), current, false))
    }
}

/// Deletes the patch files of the spec's auto-managed series.
fn remove_patch_files(spec: &SpecFile) -> PqResult<()> {
    for patch in spec.patch_series(true) {
        debug!(path = %patch.path.display(), "removing patch");
        match std::fs::remove_file(&patch.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %patch.path.display(), "patch does not exist");
            }
            Err(source) => {
                return Err(PatchError::Io {
                    path: patch.path.display().to_string(),
                    source,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Regenerates the patches of `start..end` next to `spec` and rewrites it.
fn update_patch_series(
    ctx: &PqContext,
    spec: &mut SpecFile,
    start: &str,
    end: &str,
) -> PqResult<GeneratedSeries> {
    let squash = ctx
        .pq()
        .patch_export_squash_until
        .as_deref()
        .map(SquashPoint::parse);
    let options = GenerateOptions::from_config(ctx.pq())?;

    remove_patch_files(spec)?;
    let series = generate(
        ctx.repo(),
        start,
        squash.as_ref(),
        end,
        spec.spec_dir(),
        &options,
    )?;
    spec.update_patches(&series.files, &series.conditions)?;
    spec.write()?;
    Ok(series)
}

/// Exports the patch-queue branch (or `export_rev`) into the spec file.
///
/// Run from the pq branch, switches to its base first. With `drop`, the pq
/// branch is deleted afterwards.
///
/// # Errors
///
/// Returns an error if the spec file, upstream tag or export treeish cannot
/// be found, or patch generation or the spec update fails.
pub fn export(ctx: &PqContext, export_rev: Option<&str>, drop: bool) -> PqResult<ExportSummary> {
    let repo = ctx.repo();
    let (current, base, on_pq) = current_base(ctx)?;
    let (mut spec, pq_branch) = if on_pq {
        info!("On branch '{current}', switching to '{base}'");
        repo.set_branch(&base)?;
        (ctx.parse_spec(None)?, current)
    } else {
        let spec = ctx.parse_spec(None)?;
        let pq_branch = pq_branch_name(&current, ctx.pq(), spec.version())?;
        (spec, pq_branch)
    };
    let upstream = find_upstream_commit(repo, ctx.pq(), &spec)?;

    let export_treeish = export_rev.unwrap_or(&pq_branch);
    if !repo.has_treeish(export_treeish) {
        return Err(GitError::InvalidTreeish {
            treeish: export_treeish.to_string(),
        }
        .into());
    }

    let series = update_patch_series(ctx, &mut spec, &upstream, export_treeish)?;

    let spec_dir = spec.spec_dir().to_path_buf();
    let status = repo.status(&[spec_dir.as_path()])?;

    if drop {
        drop_branch(ctx, &base, &pq_branch)?;
    }

    Ok(ExportSummary {
        patches: series.files,
        spec_path: spec.path().to_path_buf(),
        status,
    })
}

/// Creates the patch-queue branch from the spec file's patches.
///
/// On the pq branch this requires `force` and reads spec file and patches
/// from the base branch.
///
/// # Errors
///
/// Returns `GitError::OnPatchQueueBranch` on a pq branch without `force`,
/// `GitError::BranchExists` if the pq branch exists without `force`, or the
/// error that made the replay fail.
pub fn import(ctx: &PqContext, force: bool) -> PqResult<Vec<(String, ApplyOutcome)>> {
    let repo = ctx.repo();
    let (current, base, on_pq) = current_base(ctx)?;
    let (mut spec, spec_treeish) = if on_pq {
        if !force {
            return Err(GitError::OnPatchQueueBranch {
                message: format!("Already on a patch-queue branch '{current}' - doing nothing."),
                branch: current,
            }
            .into());
        }
        (ctx.parse_spec(Some(&base))?, Some(base.as_str()))
    } else {
        (ctx.parse_spec(None)?, None)
    };
    let upstream = find_upstream_commit(repo, ctx.pq(), &spec)?;
    let pq_branch = pq_branch_name(&base, ctx.pq(), spec.version())?;

    // Keeps the dumped packaging files alive until the replay is done
    let _dump = match spec_treeish {
        Some(treeish) => {
            let dump = ctx.scratch_subdir("dump_")?;
            let tree = format!("{treeish}:{}", spec.spec_dir().display());
            repo.dump_tree(&tree, dump.path(), false)?;
            spec.set_spec_dir(dump.path());
            Some(dump)
        }
        None => None,
    };

    replay(
        ctx,
        &spec,
        ReplayTarget {
            base: &base,
            branch: &pq_branch,
            upstream: &upstream,
            force,
        },
    )
}

/// Rebases the patch-queue branch onto the upstream version of the spec file.
///
/// # Errors
///
/// Returns an error if the pq branch does not exist or the rebase stops.
pub fn rebase(ctx: &PqContext) -> PqResult<()> {
    let (_, base, on_pq) = current_base(ctx)?;
    let spec = if on_pq {
        ctx.parse_spec(Some(&base))?
    } else {
        ctx.parse_spec(None)?
    };
    let upstream = find_upstream_commit(ctx.repo(), ctx.pq(), &spec)?;
    ctx.switch_to_pq_branch(&base)?;
    info!("Rebasing onto '{upstream}'");
    ctx.repo().rebase(&upstream)
}

/// Deletes the patch-queue branch of the current branch.
///
/// Returns whether a branch was deleted.
///
/// # Errors
///
/// Returns `GitError::OnPatchQueueBranch` when run on the pq branch itself.
pub fn drop(ctx: &PqContext) -> PqResult<bool> {
    let (current, _, on_pq) = current_base(ctx)?;
    if on_pq {
        return Err(GitError::OnPatchQueueBranch {
            message: "On a patch-queue branch, can't drop it.".to_string(),
            branch: current,
        }
        .into());
    }
    let spec = ctx.parse_spec(None)?;
    let pq_branch = pq_branch_name(&current, ctx.pq(), spec.version())?;
    drop_branch(ctx, &current, &pq_branch)
}

fn drop_branch(ctx: &PqContext, base: &str, pq_branch: &str) -> PqResult<bool> {
    let repo = ctx.repo();
    if !repo.has_branch(pq_branch)? {
        info!("No patch queue branch found - doing nothing.");
        return Ok(false);
    }
    if repo.current_branch().ok().as_deref() == Some(pq_branch) {
        repo.set_branch(base)?;
    }
    repo.delete_branch(pq_branch)?;
    info!("Dropped branch '{pq_branch}'.");
    Ok(true)
}

/// Switches between the base branch and its patch-queue branch.
///
/// Returns the branch now checked out.
///
/// # Errors
///
/// Returns `GitError::BranchNotFound` if the pq branch does not exist.
pub fn switch(ctx: &PqContext) -> PqResult<String> {
    let repo = ctx.repo();
    let (current, base, on_pq) = current_base(ctx)?;
    if on_pq {
        info!("Switching to branch '{base}'");
        repo.checkout(&base)?;
    } else {
        ctx.switch_to_pq_branch(&current)?;
    }
    repo.current_branch()
}

/// Applies a single patch file on the patch-queue branch.
///
/// # Errors
///
/// Returns an error if the pq branch does not exist, the file cannot be read
/// or the patch does not apply.
pub fn apply(ctx: &PqContext, patch: &Path) -> PqResult<ApplyOutcome> {
    let (current, _, on_pq) = current_base(ctx)?;
    if !on_pq {
        ctx.switch_to_pq_branch(&current)?;
    }
    let patch = PatchFile::read(patch, 1)?;
    apply_and_commit(ctx.repo(), &patch, None).into_result()
}

/// Options of `convert`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Replace an existing `<branch>-orphan`.
    pub force: bool,
    /// Create one commit per packaging commit instead of a single import.
    pub retain_history: bool,
}

/// Converts the current branch to orphan packaging on `<branch>-orphan`.
///
/// Returns the name of the new branch, which is checked out.
///
/// # Errors
///
/// Returns an error if:
/// - HEAD is on a pq branch or the pq branch exists.
/// - The branch is not based on the upstream version.
/// - `<branch>-orphan` exists and `force` is not set.
/// - Importing the packaging files fails.
pub fn convert(ctx: &PqContext, options: ConvertOptions) -> PqResult<String> {
    let repo = ctx.repo();
    let old = repo.current_branch()?;
    let refusal = "Seems you're already using orphan-packaging model - ";
    if is_pq_branch(&old, ctx.pq()) {
        return Err(GitError::OnPatchQueueBranch {
            message: format!("{refusal}you're on patch-queue branch"),
            branch: old,
        }
        .into());
    }

    let spec = ctx.parse_spec(Some(&old))?;
    let pq_branch = pq_branch_name(&old, ctx.pq(), spec.version())?;
    if repo.has_branch(&pq_branch)? {
        return Err(GitError::BranchExists {
            message: format!("{refusal}pq branch {pq_branch} already exists"),
            branch: pq_branch,
        }
        .into());
    }

    let upstream = find_upstream_commit(repo, ctx.pq(), &spec)?;
    if !repo.is_ancestor(&upstream, &old)? {
        return Err(GitError::NotAncestor {
            start: upstream_tag_name(ctx.pq(), &spec)?,
            end: old,
        }
        .into());
    }

    let new_branch = format!("{old}-orphan");
    if repo.has_branch(&new_branch)? {
        if !options.force {
            return Err(GitError::BranchExists {
                message: format!("Branch '{new_branch}' already exists!"),
                branch: new_branch,
            }
            .into());
        }
        info!("Dropping branch '{new_branch}'");
        repo.delete_branch(&new_branch)?;
    }

    let mut history = if options.retain_history {
        packaging_history(ctx, &spec, &upstream, &old)?
    } else {
        vec![repo.rev_parse(&old)?]
    };
    history.reverse();

    info!("Importing packaging files from branch '{old}' to '{new_branch}'");
    convert_with_history(ctx, &spec, &upstream, &history, &new_branch)?;
    import_extra_files(repo, &old, &ctx.pq().import_files, false)?;

    info!("Package successfully converted to orphan-packaging.");
    info!(
        "You're now on the new '{new_branch}' packaging branch (the old packaging branch '{old}' was left intact)."
    );
    info!("Please check all files and test building the package!");
    Ok(new_branch)
}

/// Commits of `old` worth replaying, newest first.
///
/// Starts at the commit that introduced the spec file unless upstream has it.
fn packaging_history(
    ctx: &PqContext,
    spec: &SpecFile,
    upstream: &str,
    old: &str,
) -> PqResult<Vec<String>> {
    let repo = ctx.repo();
    let spec_path = spec.path();
    if repo
        .show(&format!("{upstream}:{}", spec_path.display()))
        .is_ok()
    {
        return repo.commits(Some(upstream), old, &[], false);
    }
    let touching = repo.commits(Some(upstream), old, &[spec_path], false)?;
    let first = touching.last().ok_or_else(|| {
        SpecError::NoSpec(format!(
            "no commit in {upstream}..{old} adds '{}'",
            spec_path.display()
        ))
    })?;
    repo.commits(Some(format!("{first}^").as_str()), old, &[], false)
}

fn convert_with_history(
    ctx: &PqContext,
    spec: &SpecFile,
    upstream: &str,
    commits: &[String],
    new_branch: &str,
) -> PqResult<()> {
    let repo = ctx.repo();
    let Some((first, rest)) = commits.split_first() else {
        return Ok(());
    };
    let packaging_dir = spec.spec_dir();
    let spec_name = spec.file_name();
    let packaging_tmp = ctx.scratch_subdir("pack_")?;
    let dump_dir = packaging_tmp
        .path()
        .join(ctx.pq().effective_new_packaging_dir());
    let tree_of = |commit: &str| format!("{commit}:{}", packaging_dir.display());

    repo.dump_tree(&tree_of(first), &dump_dir, false)?;
    let message = format!(
        "Auto-import packaging files\n\nImported initial packaging files from commit '{first}'"
    );
    let tree = repo.create_tree(packaging_tmp.path())?;
    let mut tip = repo.commit_tree(&tree, &message, &[])?;

    let mut first_spec = SpecFile::from_file(dump_dir.join(&spec_name), ctx.oracle())?;
    update_patch_series(ctx, &mut first_spec, upstream, first)?;
    let tree = repo.create_tree(packaging_tmp.path())?;
    if tree != repo.rev_parse(&format!("{tip}:"))? {
        let message = format!(
            "Auto-generate patches\n\nGenerated patches from\n'{upstream}..{first}'\n\nupdating spec file and possibly removing old patches."
        );
        tip = repo.commit_tree(&tree, &message, &[&tip])?;
    }

    for commit in rest {
        std::fs::remove_dir_all(&dump_dir).map_err(|e| FsError::io(&dump_dir, e))?;
        repo.dump_tree(&tree_of(commit), &dump_dir, false)?;
        let regenerated = SpecFile::from_file(dump_dir.join(&spec_name), ctx.oracle())
            .and_then(|mut spec| update_patch_series(ctx, &mut spec, upstream, commit));
        if let Err(e) = regenerated {
            warn!("Failed to generate patches from '{commit}': {e}");
        }

        let tree = repo.create_tree(packaging_tmp.path())?;
        if tree == repo.rev_parse(&format!("{tip}:"))? {
            info!("Skipping commit '{commit}' which generated no change");
            continue;
        }
        let commit_info = repo.commit_info(commit)?;
        let mut message = format!("{}\n\n", commit_info.subject);
        if !commit_info.body.is_empty() {
            message.push_str(&commit_info.body);
            message.push_str("\n\n");
        }
        message.push_str(&format!("Auto-imported by rpmpq from '{commit}'"));
        tip = repo.commit_tree(&tree, &message, &[&tip])?;
    }

    repo.create_branch(new_branch, Some(&tip), false)?;
    repo.set_branch(new_branch)
}
