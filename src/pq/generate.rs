// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Turning a commit range into a patch series.
//!
//! ```text
//! start ──●──●──●──M──●──●── end commit ── end tree
//!          \_____/ \_/ \____/ \_________/
//!           squash merge  one   trailing
//!           diff   diff   patch diff
//!                         per commit
//! ```
//!
//! Every diff leaves out paths matching the ignore regex; an empty diff
//! produces no file. Files above the compression threshold are gzipped.

use bon::Builder;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info};

use super::compress::compress_if_large;
use super::patch::{parse_trailers, patch_file_name, write_commit_patch, write_raw_diff};
use crate::config::types::{ByteSize, PqConfig, format_number};
use crate::error::{ConfigError, GitError, PatchError, PqResult};
use crate::git::Repository;
use crate::spec::reconcile::PatchConditions;

/// Squash point: commits up to it are exported as one diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SquashPoint {
    /// Commit-ish; `HEAD` stands for the end commit.
    pub commit: String,
    /// File name of the diff, `.diff` included.
    pub name: Option<String>,
}

impl SquashPoint {
    /// Parses `commit[:name]`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.split_once(':') {
            Some((commit, name)) => Self {
                commit: commit.to_string(),
                name: Some(format!("{name}.diff")),
            },
            None => Self {
                commit: value.to_string(),
                name: None,
            },
        }
    }
}

/// Naming and post-processing of generated patches.
#[derive(Debug, Clone, Builder)]
pub struct GenerateOptions {
    #[builder(setters(name = with_patch_numbers), default = true)]
    patch_numbers: bool,
    #[builder(setters(name = with_patch_num_format), default = "%04d-".to_string())]
    patch_num_format: String,
    #[builder(setters(name = with_compress_threshold), default)]
    compress_threshold: ByteSize,
    #[builder(setters(name = with_ignore_path))]
    ignore_path: Option<Regex>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GenerateOptions {
    /// Options taken from the `[pq]` configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the ignore-path regex does not compile.
    pub fn from_config(config: &PqConfig) -> PqResult<Self> {
        let ignore_path = config
            .patch_export_ignore_path
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                section: "pq".to_string(),
                key: "patch_export_ignore_path".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::builder()
            .with_patch_numbers(config.patch_numbers)
            .with_patch_num_format(config.patch_num_format.clone())
            .with_compress_threshold(config.patch_export_compress)
            .maybe_with_ignore_path(ignore_path)
            .build())
    }

    #[must_use]
    pub const fn patch_numbers(&self) -> bool {
        self.patch_numbers
    }

    #[must_use]
    pub const fn compress_threshold(&self) -> ByteSize {
        self.compress_threshold
    }

    #[must_use]
    pub const fn ignore_path(&self) -> Option<&Regex> {
        self.ignore_path.as_ref()
    }
}

/// Files written by [`generate`], in series order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedSeries {
    /// File names inside the output directory.
    pub files: Vec<String>,
    /// Build conditions keyed by file name.
    pub conditions: PatchConditions,
}

/// Writes the patches for `start..end` into `out_dir`.
///
/// `end` may be a tree; the current HEAD then serves as end commit and the
/// remaining difference becomes a trailing diff.
///
/// # Errors
///
/// Returns an error if:
/// - `start` or `end` does not resolve (`GitError::InvalidTreeish`).
/// - `start` is not an ancestor of the end commit (`GitError::NotAncestor`).
/// - The squash point lies outside `start..end` (`PatchError::InvalidSquash`).
/// - A diff cannot be produced or a file cannot be written.
pub fn generate(
    repo: &Repository,
    start: &str,
    squash: Option<&SquashPoint>,
    end: &str,
    out_dir: &Path,
    options: &GenerateOptions,
) -> PqResult<GeneratedSeries> {
    info!("Generating patches from git ({start}..{end})");
    for treeish in [start, end] {
        if !repo.has_treeish(treeish) {
            return Err(GitError::InvalidTreeish {
                treeish: treeish.to_string(),
            }
            .into());
        }
    }

    let start_id = repo.rev_parse(&format!("{start}^0"))?;
    let (end_commit, end_commit_id) = match repo.rev_parse(&format!("{end}^0")) {
        Ok(id) => (end.to_string(), id),
        Err(_) => ("HEAD".to_string(), repo.rev_parse("HEAD^0")?),
    };
    if !repo.is_ancestor(&start_id, &end_commit_id)? {
        return Err(GitError::NotAncestor {
            start: start.to_string(),
            end: end_commit,
        }
        .into());
    }

    let mut series = GeneratedSeries::default();
    let mut start = start_id;

    if let Some(squash) = squash {
        let target = if squash.commit == "HEAD" {
            end_commit.as_str()
        } else {
            squash.commit.as_str()
        };
        let squash_id = repo.rev_parse(&format!("{target}^0"))?;
        if squash_id != start {
            let in_range = repo
                .commits(Some(start.as_str()), &end_commit_id, &[], false)?
                .contains(&squash_id);
            if !in_range {
                return Err(PatchError::InvalidSquash {
                    squash: squash.commit.clone(),
                    end: end_commit,
                }
                .into());
            }
            let from = repo.rev_parse_short(&start, 7)?;
            let to = repo.rev_parse_short(&squash_id, 7)?;
            info!("Squashing commits {from}..{to} into one monolithic diff");
            if let Some(name) =
                write_diff(repo, out_dir, squash.name.as_deref(), &from, &to, options)?
            {
                series.files.push(name);
            }
            start = squash_id;
        }
    }

    let merges = repo.commits(Some(start.as_str()), &end_commit_id, &[], true)?;
    if let Some(merge) = merges.first() {
        let from = repo.rev_parse_short(&start, 7)?;
        let to = repo.rev_parse_short(merge, 7)?;
        if let Some(name) = write_diff(repo, out_dir, None, &from, &to, options)? {
            info!("Merge commits found! Diff between {from}..{to} written into one monolithic diff");
            series.files.push(name);
        }
        start.clone_from(merge);
    }

    let mut commits = repo.commits(Some(start.as_str()), &end_commit_id, &[], false)?;
    commits.reverse();
    for commit in commits {
        let commit_info = repo.commit_info(&commit)?;
        let trailers = parse_trailers(&commit_info.id, &commit_info.body);
        if trailers.ignore {
            info!("Ignoring commit {}", commit_info.id);
            continue;
        }

        let prefix = if options.patch_numbers {
            format_number(&options.patch_num_format, series.files.len() + 1)?
        } else {
            String::new()
        };
        let mut name = patch_file_name(&commit_info.subject, &prefix, ".patch");
        if series.files.contains(&name) {
            let suffix = format!("-{}.patch", series.files.len());
            name = patch_file_name(&commit_info.subject, &prefix, &suffix);
        }

        let diff = repo.diff(&format!("{commit}^"), &commit, options.ignore_path())?;
        if diff.is_empty() {
            debug!(commit = %commit, "commit has nothing to export");
            continue;
        }
        write_commit_patch(&out_dir.join(&name), &commit_info, &trailers.body, &diff)?;
        if let Some(condition) = trailers.condition {
            series.conditions.insert(name.clone(), condition);
        }
        series.files.push(name);
    }

    if end_commit != end {
        let from = repo.rev_parse_short(&end_commit_id, 7)?;
        let to = repo.rev_parse_short(end, 7)?;
        info!("Generating diff file {end_commit}..{end}");
        if let Some(name) = write_diff(repo, out_dir, None, &from, &to, options)? {
            series.files.push(name);
        }
    }

    compress_series(&mut series, out_dir, options.compress_threshold)?;
    Ok(series)
}

fn write_diff(
    repo: &Repository,
    out_dir: &Path,
    name: Option<&str>,
    from: &str,
    to: &str,
    options: &GenerateOptions,
) -> PqResult<Option<String>> {
    let diff = repo.diff(from, to, options.ignore_path())?;
    if diff.is_empty() {
        debug!(from, to, "empty diff, no file written");
        return Ok(None);
    }
    let name = name.map_or_else(|| format!("{from}-to-{to}.diff"), str::to_string);
    write_raw_diff(&out_dir.join(&name), from, to, &diff)?;
    Ok(Some(name))
}

/// Compresses large files and re-keys their conditions to the new names.
fn compress_series(
    series: &mut GeneratedSeries,
    out_dir: &Path,
    threshold: ByteSize,
) -> PqResult<()> {
    if threshold.is_zero() {
        return Ok(());
    }
    for name in &mut series.files {
        let compressed = compress_if_large(&out_dir.join(&*name), threshold)?;
        if compressed != *name {
            if let Some(condition) = series.conditions.remove(name.as_str()) {
                series.conditions.insert(compressed.clone(), condition);
            }
            *name = compressed;
        }
    }
    Ok(())
}
