// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use bon::Builder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{FsError, PqError, PqResult};

/// Options for directory traversal.
#[derive(Debug, Clone, Builder)]
pub struct WalkOptions {
    /// Maximum depth to traverse (None = unlimited)
    #[builder(setters(name = with_max_depth))]
    max_depth: Option<usize>,
    /// Follow symbolic links
    #[builder(setters(name = with_follow_links), default = false)]
    follow_links: bool,
    /// Include hidden files/directories
    #[builder(setters(name = with_include_hidden), default = false)]
    include_hidden: bool,
    /// Respect .gitignore files
    #[builder(setters(name = with_respect_gitignore), default = true)]
    respect_gitignore: bool,
    /// Skip directories matching these names (exact match)
    #[builder(setters(name = with_skip_dirs), default)]
    skip_dirs: Vec<String>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WalkOptions {
    #[must_use]
    pub const fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    #[must_use]
    pub const fn follow_links(&self) -> bool {
        self.follow_links
    }

    #[must_use]
    pub const fn include_hidden(&self) -> bool {
        self.include_hidden
    }

    #[must_use]
    pub const fn respect_gitignore(&self) -> bool {
        self.respect_gitignore
    }

    #[must_use]
    pub fn skip_dirs(&self) -> &[String] {
        &self.skip_dirs
    }

    /// Options for scanning a packaging directory.
    ///
    /// - Sees hidden and git-ignored files
    /// - Skips VCS metadata directories
    #[must_use]
    pub fn for_packaging() -> Self {
        Self::builder()
            .with_include_hidden(true)
            .with_respect_gitignore(false)
            .with_skip_dirs(vec![".git".to_string(), ".hg".to_string(), ".svn".to_string()])
            .build()
    }
}

/// Builds a `WalkBuilder` with the given options, using `filter_entry` for directory skipping.
fn build_walker(root: &Path, options: &WalkOptions) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    if let Some(depth) = options.max_depth() {
        builder.max_depth(Some(depth));
    }

    builder.follow_links(options.follow_links());
    builder.hidden(!options.include_hidden());

    builder.git_ignore(options.respect_gitignore());
    builder.git_global(options.respect_gitignore());
    builder.git_exclude(options.respect_gitignore());
    builder.ignore(options.respect_gitignore());
    builder.parents(options.respect_gitignore());

    // Evaluated before descending
    if !options.skip_dirs().is_empty() {
        let skip_dirs = options.skip_dirs().to_vec();
        builder.filter_entry(move |entry| {
            !(entry.file_type().is_some_and(|ft| ft.is_dir())
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| skip_dirs.iter().any(|skip| skip == name)))
        });
    }

    builder
}

/// Collects every regular file below `root`, sorted by path.
///
/// # Errors
///
/// Returns `FsError::NotFound` if the root directory does not exist.
pub fn walk_files<P: AsRef<Path>>(root: P, options: &WalkOptions) -> PqResult<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(FsError::NotFound(root.display().to_string()).into());
    }

    let mut files: Vec<PathBuf> = build_walker(root, options)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "walk error");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .collect();
    files.sort();
    Ok(files)
}

/// Finds files whose path relative to `root` matches a glob pattern.
///
/// # Errors
///
/// Returns an error if:
/// - The root directory does not exist.
/// - The glob pattern is invalid.
///
/// # Example
/// ```no_run
/// use rpmpq::utility::fs::walk::{find_files, WalkOptions};
///
/// let specs = find_files("packaging", "**/*.spec", &WalkOptions::for_packaging())?;
/// for spec in specs {
///     println!("{}", spec.display());
/// }
/// # Ok::<(), rpmpq::error::PqError>(())
/// ```
pub fn find_files<P: AsRef<Path>>(
    root: P,
    pattern: &str,
    options: &WalkOptions,
) -> PqResult<Vec<PathBuf>> {
    use wax::{Glob, Program};

    let root = root.as_ref();
    let glob = Glob::new(pattern).map_err(|e| {
        PqError::Other(format!("invalid glob pattern '{pattern}': {e}").into_boxed_str())
    })?;

    Ok(walk_files(root, options)?
        .into_iter()
        .filter(|path| {
            path.strip_prefix(root)
                .is_ok_and(|rel_path| glob.is_match(rel_path))
        })
        .collect())
}
