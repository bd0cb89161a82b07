// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Finding the spec file in a directory or a git tree.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::SpecFile;
use super::oracle::MacroOracle;
use crate::error::{PqResult, SpecError};
use crate::git::Repository;
use crate::utility::fs::walk::{WalkOptions, find_files};

/// Picks one spec file out of `candidates` (paths relative to the search root).
///
/// A file named `preferred_name` wins, the shallowest one if several exist.
fn choose_spec(candidates: Vec<PathBuf>, preferred_name: Option<&str>) -> PqResult<PathBuf> {
    if let Some(preferred) = preferred_name
        && let Some(found) = candidates
            .iter()
            .filter(|p| p.file_name().is_some_and(|n| n == preferred))
            .min_by_key(|p| p.components().count())
    {
        debug!(spec = %found.display(), "found preferred spec file");
        return Ok(found.clone());
    }

    let mut specs: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "spec"))
        .collect();
    match specs.len() {
        0 => Err(SpecError::NoSpec("No spec file found.".to_string()).into()),
        1 => Ok(specs.remove(0)),
        _ => Err(SpecError::MultipleSpecs(
            specs
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        )
        .into()),
    }
}

/// Finds the spec file below `topdir`.
///
/// # Errors
///
/// Returns `SpecError::NoSpec` if there is none and
/// `SpecError::MultipleSpecs` if the choice is ambiguous.
pub fn guess_spec(
    topdir: &Path,
    recursive: bool,
    preferred_name: Option<&str>,
) -> PqResult<PathBuf> {
    let options = if recursive {
        WalkOptions::for_packaging()
    } else {
        WalkOptions::builder()
            .with_include_hidden(true)
            .with_respect_gitignore(false)
            .with_max_depth(1)
            .build()
    };
    let candidates = find_files(topdir, "**/*.spec", &options)?
        .into_iter()
        .filter_map(|p| p.strip_prefix(topdir).ok().map(Path::to_path_buf))
        .collect();
    Ok(topdir.join(choose_spec(candidates, preferred_name)?))
}

/// Finds the spec file in `treeish` below `topdir`; returns its repository path.
///
/// # Errors
///
/// Returns `SpecError::NoSpec` if the tree cannot be read or has no spec file,
/// `SpecError::MultipleSpecs` if the choice is ambiguous.
pub fn guess_spec_repo(
    repo: &Repository,
    treeish: &str,
    topdir: &Path,
    recursive: bool,
    preferred_name: Option<&str>,
) -> PqResult<PathBuf> {
    let root = format!("{treeish}:{}", topdir.display());
    let mut blobs = Vec::new();
    collect_blobs(repo, &root, Path::new(""), recursive, &mut blobs).map_err(|e| {
        SpecError::NoSpec(format!(
            "Cannot find spec file from treeish {treeish}, Git error: {e}"
        ))
    })?;
    Ok(topdir.join(choose_spec(blobs, preferred_name)?))
}

fn collect_blobs(
    repo: &Repository,
    tree: &str,
    prefix: &Path,
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> PqResult<()> {
    for entry in repo.ls_tree(tree)? {
        let path = prefix.join(&entry.name);
        match entry.kind.as_str() {
            "blob" => out.push(path),
            "tree" if recursive => collect_blobs(repo, &entry.object, &path, true, out)?,
            _ => {}
        }
    }
    Ok(())
}

/// Parses the spec file stored at `path` in `treeish`.
///
/// The returned spec's path is the repository-relative `path`.
///
/// # Errors
///
/// Returns `SpecError::NoSpec` if the blob cannot be read, or any parse error.
pub fn spec_from_repo(
    repo: &Repository,
    treeish: &str,
    path: &Path,
    oracle: Option<&dyn MacroOracle>,
) -> PqResult<SpecFile> {
    let object = format!("{treeish}:{}", path.display());
    let content = repo
        .show(&object)
        .map_err(|e| SpecError::NoSpec(format!("Git error: {e}")))?;
    SpecFile::parse(&String::from_utf8_lossy(&content), path, oracle)
}
