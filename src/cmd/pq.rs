// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Patch-queue command implementation for rpmpq.

use anyhow::Context as _;
use std::path::Path;
use tracing::{info, warn};

use crate::cli::pq::PqCommand;
use crate::config::Config;
use crate::error::Result;
use crate::git::Repository;
use crate::pq::PqContext;
use crate::pq::actions::{self, ConvertOptions};
use crate::pq::replay::ApplyOutcome;

/// Main handler for the patch-queue commands.
///
/// Runs from the top of the repository containing `workdir`.
///
/// # Errors
///
/// Returns an error if `workdir` is not inside a git repository or the action fails.
pub fn run_pq_command(command: &PqCommand, config: Config, workdir: &Path) -> Result<()> {
    let workdir = std::path::absolute(workdir)
        .with_context(|| format!("invalid directory {}", workdir.display()))?;
    let repo = Repository::open(&workdir)
        .with_context(|| format!("{} is not a git repository", workdir.display()))?;
    enter_topdir(repo.path())?;
    let ctx = PqContext::new(repo, config)?;

    match command {
        PqCommand::Export(args) => {
            let summary = actions::export(&ctx, args.export_rev.as_deref(), args.drop)?;
            info!(
                "Exported {} patch(es) into '{}'",
                summary.patches.len(),
                summary.spec_path.display()
            );
            if !summary.status.is_empty() {
                println!("{}", summary.status);
            }
        }
        PqCommand::Import(args) => {
            let outcomes = actions::import(&ctx, args.force)?;
            let skipped = outcomes
                .iter()
                .filter(|(_, outcome)| matches!(outcome, ApplyOutcome::SkippedNoOp))
                .count();
            info!(
                "Imported {} patch(es), {skipped} without changes",
                outcomes.len() - skipped
            );
        }
        PqCommand::Rebase => actions::rebase(&ctx)?,
        PqCommand::Drop => {
            actions::drop(&ctx)?;
        }
        PqCommand::Switch => {
            actions::switch(&ctx)?;
        }
        PqCommand::Apply(args) => {
            let patch = workdir.join(&args.patch);
            if let ApplyOutcome::SkippedNoOp = actions::apply(&ctx, &patch)? {
                info!("Nothing to commit for '{}'", args.patch.display());
            }
        }
        PqCommand::Convert(args) => {
            let options = ConvertOptions {
                force: args.force,
                retain_history: args.retain_history,
            };
            actions::convert(&ctx, options)?;
        }
    }
    Ok(())
}

/// Changes the working directory to the repository top.
fn enter_topdir(top: &Path) -> Result<()> {
    let current = std::env::current_dir().context("cannot determine working directory")?;
    let same = match (current.canonicalize(), top.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same {
        warn!("Switching to topdir before running commands");
        std::env::set_current_dir(top)
            .with_context(|| format!("cannot change directory to {}", top.display()))?;
    }
    Ok(())
}
