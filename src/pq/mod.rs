// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Patch-queue engine.
//!
//! ```text
//!                       PqContext
//!          repo + config + oracle + scratch dir
//!                           |
//!        +---------+--------+--------+---------+
//!        |         |        |        |         |
//!        v         v        v        v         v
//!     export    import   rebase   switch    convert
//!        |         |                           |
//!        v         v                           v
//!    generate   replay                 generate + commit_tree
//!   (commits    (patches                (orphan packaging
//!    -> files)   -> commits)             branch)
//! ```
//!
//! # Branch Naming
//!
//! ```text
//! pq_branch = "development/%(branch)s"
//!   master           <->  development/master
//! pq_branch = "patch-queue/%(version)s"   (no %(branch)s)
//!   packaging_branch <->  patch-queue/1.0
//! ```

pub mod actions;
pub mod compress;
pub mod generate;
pub mod patch;
pub mod replay;

#[cfg(test)]
mod tests;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::Config;
use crate::config::types::PqConfig;
use crate::error::{ConfigError, FsError, GitError, PqResult};
use crate::git::Repository;
use crate::spec::oracle::{MacroOracle, RpmSpecOracle};
use crate::spec::{SpecFile, guess_spec, guess_spec_repo, spec_from_repo};

static FORMAT_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%\((?P<key>[A-Za-z_-]+)\)s").expect("valid format field regex"));

/// Expands `%(key)s` placeholders from `fields`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownFormatField` if a placeholder has no value.
pub fn format_fields(format: &str, fields: &[(&str, &str)]) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(format.len());
    let mut last = 0;
    for caps in FORMAT_FIELD_RE.captures_iter(format) {
        let Some(whole) = caps.get(0) else { continue };
        let key = &caps["key"];
        let value = fields
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(*v))
            .ok_or_else(|| ConfigError::UnknownFormatField {
                format: format.to_string(),
                field: key.to_string(),
            })?;
        out.push_str(&format[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&format[last..]);
    Ok(out)
}

/// Regex matching every expansion of `format`, one named group per field.
fn format_matcher(format: &str) -> Option<Regex> {
    let mut pattern = String::from("^");
    let mut last = 0;
    let mut seen = Vec::new();
    for caps in FORMAT_FIELD_RE.captures_iter(format) {
        let whole = caps.get(0)?;
        let key = caps["key"].replace('-', "_");
        pattern.push_str(&regex::escape(&format[last..whole.start()]));
        if seen.contains(&key) {
            pattern.push_str(r"\S+");
        } else {
            pattern.push_str(&format!(r"(?P<{key}>\S+)"));
            seen.push(key);
        }
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&format[last..]));
    pattern.push('$');
    Regex::new(&pattern).ok()
}

/// Whether `branch` is a patch-queue branch under `config.pq_branch`.
#[must_use]
pub fn is_pq_branch(branch: &str, config: &PqConfig) -> bool {
    format_matcher(&config.pq_branch).is_some_and(|re| re.is_match(branch))
}

/// Name of the patch-queue branch belonging to `branch`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownFormatField` if `pq_branch` uses a field
/// other than `%(branch)s` and `%(version)s`.
pub fn pq_branch_name(branch: &str, config: &PqConfig, version: &str) -> PqResult<String> {
    Ok(format_fields(
        &config.pq_branch,
        &[("branch", branch), ("version", version)],
    )?)
}

/// Base branch of the patch-queue branch `branch`, if it is one.
///
/// Without a `%(branch)s` field the base is `packaging_branch`.
#[must_use]
pub fn pq_branch_base(branch: &str, config: &PqConfig) -> Option<String> {
    let caps = format_matcher(&config.pq_branch)?.captures(branch)?;
    Some(caps.name("branch").map_or_else(
        || config.packaging_branch.clone(),
        |m| m.as_str().to_string(),
    ))
}

/// Version string as it appears in tag names.
fn sanitize_tag_version(version: &str) -> String {
    version.replace('~', "_").replace(':', "%")
}

/// Vendor name filled into upstream tag formats; `pq.vendor` names packaging tags only.
const UPSTREAM_VENDOR: &str = "Upstream";

/// Tag name of the upstream release of `spec`.
///
/// # Errors
///
/// Returns `ConfigError::UnknownFormatField` for an unsupported field.
pub fn upstream_tag_name(config: &PqConfig, spec: &SpecFile) -> PqResult<String> {
    let version = sanitize_tag_version(spec.version());
    Ok(format_fields(
        &config.upstream_tag,
        &[
            ("upstreamversion", version.as_str()),
            ("version", version.as_str()),
            ("vendor", UPSTREAM_VENDOR),
        ],
    )?)
}

/// Commit of the upstream release `spec` is based on.
///
/// # Errors
///
/// Returns `GitError::UpstreamNotFound` if the tag does not resolve to a commit.
pub fn find_upstream_commit(
    repo: &Repository,
    config: &PqConfig,
    spec: &SpecFile,
) -> PqResult<String> {
    let tag = upstream_tag_name(config, spec)?;
    repo.rev_parse(&format!("{tag}^0")).map_err(|_| {
        GitError::UpstreamNotFound {
            version: spec.version().to_string(),
            tag,
        }
        .into()
    })
}

/// Everything one patch-queue action works with.
///
/// Owns a scratch directory below `global.tmp_dir` that is removed on drop.
pub struct PqContext {
    repo: Repository,
    config: Config,
    oracle: Option<Box<dyn MacroOracle>>,
    scratch: TempDir,
}

impl std::fmt::Debug for PqContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PqContext")
            .field("repo", &self.repo)
            .field("oracle", &self.oracle.is_some())
            .field("scratch", &self.scratch.path())
            .finish_non_exhaustive()
    }
}

impl PqContext {
    /// Creates the context and its scratch directory.
    ///
    /// With `pq.use_oracle`, `rpmspec` is looked up; its absence only disables
    /// the oracle.
    ///
    /// # Errors
    ///
    /// Returns `FsError::IoError` if the scratch directory cannot be created.
    pub fn new(repo: Repository, config: Config) -> PqResult<Self> {
        let base = &config.global.tmp_dir;
        std::fs::create_dir_all(base).map_err(|e| FsError::io(base, e))?;
        let scratch = tempfile::Builder::new()
            .prefix("rpmpq_")
            .tempdir_in(base)
            .map_err(|e| FsError::io(base, e))?;
        debug!(scratch = %scratch.path().display(), "created scratch directory");

        let oracle: Option<Box<dyn MacroOracle>> = if config.pq.use_oracle {
            match RpmSpecOracle::locate() {
                Ok(oracle) => Some(Box::new(oracle.with_tmp_dir(scratch.path()))),
                Err(e) => {
                    debug!(error = %e, "macro oracle unavailable, using built-in expansion");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            repo,
            config,
            oracle,
            scratch,
        })
    }

    /// Replaces the macro oracle.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Option<Box<dyn MacroOracle>>) -> Self {
        self.oracle = oracle;
        self
    }

    #[must_use]
    pub const fn repo(&self) -> &Repository {
        &self.repo
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn pq(&self) -> &PqConfig {
        &self.config.pq
    }

    #[must_use]
    pub fn oracle(&self) -> Option<&dyn MacroOracle> {
        self.oracle.as_deref()
    }

    /// Per-run scratch directory.
    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Creates a fresh directory inside the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns `FsError::IoError` if the directory cannot be created.
    pub fn scratch_subdir(&self, prefix: &str) -> PqResult<TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(self.scratch.path())
            .map_err(|e| FsError::io(self.scratch.path(), e).into())
    }

    /// Packaging directory relative to the repository root.
    ///
    /// An explicit `spec_file` decides the directory.
    #[must_use]
    pub fn packaging_dir(&self) -> PathBuf {
        match &self.config.pq.spec_file {
            Some(spec_file) => spec_file.parent().map(Path::to_path_buf).unwrap_or_default(),
            None => self.config.pq.packaging_dir.clone(),
        }
    }

    /// Finds and parses the spec file, from the work tree or from `treeish`.
    ///
    /// A spec read from a tree has a repository-relative path.
    ///
    /// # Errors
    ///
    /// Returns a `SpecError` if no single spec file is found or it does not parse.
    pub fn parse_spec(&self, treeish: Option<&str>) -> PqResult<SpecFile> {
        let oracle = self.oracle();
        let spec = match (&self.config.pq.spec_file, treeish) {
            (Some(spec_file), None) => SpecFile::from_file(self.repo.path().join(spec_file), oracle)?,
            (Some(spec_file), Some(treeish)) => {
                spec_from_repo(&self.repo, treeish, spec_file, oracle)?
            }
            (None, None) => {
                let path = guess_spec(
                    &self.repo.path().join(self.packaging_dir()),
                    true,
                    Some(&self.preferred_spec_name()),
                )?;
                SpecFile::from_file(path, oracle)?
            }
            (None, Some(treeish)) => {
                let path = guess_spec_repo(
                    &self.repo,
                    treeish,
                    &self.packaging_dir(),
                    true,
                    Some(&self.preferred_spec_name()),
                )?;
                spec_from_repo(&self.repo, treeish, &path, oracle)?
            }
        };
        debug!(
            spec = %spec.path().display(),
            from = treeish.unwrap_or("working copy"),
            "using spec file"
        );
        Ok(spec)
    }

    /// `<repository directory name>.spec`.
    fn preferred_spec_name(&self) -> String {
        let dir = self
            .repo
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{dir}.spec")
    }

    /// Switches to the patch-queue branch of `branch` unless already on one.
    ///
    /// # Errors
    ///
    /// Returns `GitError::BranchNotFound` if the patch-queue branch does not exist.
    pub fn switch_to_pq_branch(&self, branch: &str) -> PqResult<()> {
        if is_pq_branch(branch, self.pq()) {
            return Ok(());
        }
        let spec = self.parse_spec(Some(branch))?;
        let pq_branch = pq_branch_name(branch, self.pq(), spec.version())?;
        if !self.repo.has_branch(&pq_branch)? {
            return Err(GitError::BranchNotFound { branch: pq_branch }.into());
        }
        info!("Switching to branch '{pq_branch}'");
        self.repo.set_branch(&pq_branch)
    }
}
