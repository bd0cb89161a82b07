// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Patch-queue commands and the `[pq]` option flags.
//!
//! Every flag maps onto a `pq.*` configuration key:
//!
//! ```text
//! --pq-branch FMT              → pq.pq_branch
//! --upstream-tag FMT           → pq.upstream_tag
//! --spec-file FILE             → pq.spec_file
//! --patch-export-compress SIZE → pq.patch_export_compress
//! --no-patch-numbers           → pq.patch_numbers = false
//! --no-oracle                  → pq.use_oracle = false
//! ```

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Flags overriding the `[pq]` configuration section.
#[derive(Debug, Clone, Default, Args)]
pub struct PqOptions {
    /// Format of the patch-queue branch name, e.g. 'development/%(branch)s'.
    #[arg(long = "pq-branch", value_name = "FORMAT")]
    pub pq_branch: Option<String>,

    /// Packaging branch used when the pq branch format has no '%(branch)s'.
    #[arg(long = "packaging-branch", value_name = "BRANCH")]
    pub packaging_branch: Option<String>,

    /// Directory containing the spec file, relative to the repository root.
    #[arg(long = "packaging-dir", value_name = "DIR")]
    pub packaging_dir: Option<PathBuf>,

    /// Spec file to use instead of searching the packaging directory.
    #[arg(long = "spec-file", value_name = "FILE")]
    pub spec_file: Option<PathBuf>,

    /// Format of upstream tag names, e.g. 'upstream/%(upstreamversion)s'.
    #[arg(long = "upstream-tag", value_name = "FORMAT")]
    pub upstream_tag: Option<String>,

    /// Value of '%(vendor)s' in packaging tag formats.
    #[arg(long, value_name = "VENDOR")]
    pub vendor: Option<String>,

    /// Comma-separated files to import from the packaging branch.
    #[arg(long = "import-files", value_name = "FILES")]
    pub import_files: Option<String>,

    /// Don't prefix exported patch names with a number.
    #[arg(long = "no-patch-numbers")]
    pub no_patch_numbers: bool,

    /// printf-style format of the patch number prefix, e.g. '%04d-'.
    #[arg(long = "patch-num-format", value_name = "FORMAT")]
    pub patch_num_format: Option<String>,

    /// Compress exported patches larger than SIZE (k/m/g/t units, 0 disables).
    #[arg(long = "patch-export-compress", value_name = "SIZE")]
    pub patch_export_compress: Option<String>,

    /// Squash commits up to COMMIT[:NAME] into one diff on export.
    #[arg(long = "patch-export-squash-until", value_name = "COMMITISH")]
    pub patch_export_squash_until: Option<String>,

    /// Leave paths matching REGEX out of exported patches.
    #[arg(long = "patch-export-ignore-path", value_name = "REGEX")]
    pub patch_export_ignore_path: Option<String>,

    /// Don't use rpmspec to evaluate the spec file.
    #[arg(long = "no-oracle")]
    pub no_oracle: bool,
}

impl PqOptions {
    /// Converts the flags to `pq/key=value` overrides.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = Vec::new();
        let strings = [
            ("pq_branch", self.pq_branch.as_deref()),
            ("packaging_branch", self.packaging_branch.as_deref()),
            ("upstream_tag", self.upstream_tag.as_deref()),
            ("vendor", self.vendor.as_deref()),
            ("import_files", self.import_files.as_deref()),
            ("patch_num_format", self.patch_num_format.as_deref()),
            ("patch_export_compress", self.patch_export_compress.as_deref()),
            (
                "patch_export_squash_until",
                self.patch_export_squash_until.as_deref(),
            ),
            (
                "patch_export_ignore_path",
                self.patch_export_ignore_path.as_deref(),
            ),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                overrides.push(format!("pq/{key}={value}"));
            }
        }

        if let Some(ref dir) = self.packaging_dir {
            overrides.push(format!("pq/packaging_dir={}", dir.display()));
        }
        if let Some(ref file) = self.spec_file {
            overrides.push(format!("pq/spec_file={}", file.display()));
        }
        if self.no_patch_numbers {
            overrides.push("pq/patch_numbers=false".to_string());
        }
        if self.no_oracle {
            overrides.push("pq/use_oracle=false".to_string());
        }

        overrides
    }
}

/// Patch-queue actions.
#[derive(Debug, Clone, Subcommand)]
pub enum PqCommand {
    /// Exports the patch-queue branch into patches and updates the spec file.
    Export(ExportArgs),

    /// Creates the patch-queue branch from the patches in the spec file.
    Import(ImportArgs),

    /// Rebases the patch-queue branch onto the upstream version.
    Rebase,

    /// Deletes the patch-queue branch.
    Drop,

    /// Switches between the packaging branch and its patch-queue branch.
    Switch,

    /// Applies a single patch on the patch-queue branch.
    Apply(ApplyArgs),

    /// Converts the package to an orphan packaging branch.
    Convert(ConvertArgs),
}

impl PqCommand {
    /// Configuration overrides carried by command flags.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        match self {
            Self::Convert(ConvertArgs {
                new_packaging_dir: Some(dir),
                ..
            }) => vec![format!("pq/new_packaging_dir={}", dir.display())],
            _ => Vec::new(),
        }
    }
}

/// Arguments for the `export` command.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Deletes the patch-queue branch after exporting.
    #[arg(long)]
    pub drop: bool,

    /// Exports this treeish instead of the patch-queue branch.
    #[arg(long = "export-rev", value_name = "TREEISH")]
    pub export_rev: Option<String>,
}

/// Arguments for the `import` command.
#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Replaces an existing patch-queue branch.
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `apply` command.
#[derive(Debug, Clone, Args)]
pub struct ApplyArgs {
    /// Patch file to apply.
    #[arg(value_name = "PATCH")]
    pub patch: PathBuf,
}

/// Arguments for the `convert` command.
#[derive(Debug, Clone, Args)]
pub struct ConvertArgs {
    /// Replaces an existing orphan branch.
    #[arg(short, long)]
    pub force: bool,

    /// Creates one commit per packaging commit instead of a single import.
    #[arg(long = "retain-history")]
    pub retain_history: bool,

    /// Packaging directory on the new branch.
    #[arg(long = "new-packaging-dir", value_name = "DIR")]
    pub new_packaging_dir: Option<PathBuf>,
}
