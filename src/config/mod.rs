// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for rpmpq.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. rpmpq.toml (repository root)
//! 3. --config FILE (repeatable)
//! 4. RPMPQ_* env vars
//! 5. --set / dedicated CLI flags
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! RPMPQ_GLOBAL__TMP_DIR=/tmp         → global.tmp_dir = "/tmp"
//! RPMPQ_PQ__PATCH_NUMBERS=false      → pq.patch_numbers = false
//! RPMPQ_PQ__PATCH_EXPORT_COMPRESS=1M → pq.patch_export_compress = 1048576
//! ```
//!
//! # Format Strings
//!
//! ```toml
//! [pq]
//! pq_branch = "development/%(branch)s"
//! upstream_tag = "upstream/%(upstreamversion)s"
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{GlobalConfig, PqConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Patch-queue options.
    pub pq: PqConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rpmpq::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file("packaging/rpmpq.toml")
    ///     .add_toml_file_optional("rpmpq.toml")
    ///     .with_env_prefix("RPMPQ")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file (simple API).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Validate values that serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the ignore-path regex does not compile, the patch
    /// number format has no integer conversion, or a format string is empty.
    pub fn resolve_and_validate(&mut self) -> Result<()> {
        if let Some(pattern) = &self.pq.patch_export_ignore_path {
            if pattern.is_empty() {
                self.pq.patch_export_ignore_path = None;
            } else if let Err(e) = regex::Regex::new(pattern) {
                return Err(ConfigError::InvalidValue {
                    section: "pq".to_string(),
                    key: "patch_export_ignore_path".to_string(),
                    message: e.to_string(),
                }
                .into());
            }
        }

        if self
            .pq
            .patch_export_squash_until
            .as_deref()
            .is_some_and(str::is_empty)
        {
            self.pq.patch_export_squash_until = None;
        }

        self.pq.format_patch_number(1)?;

        for (key, value) in [
            ("pq_branch", &self.pq.pq_branch),
            ("upstream_tag", &self.pq.upstream_tag),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    section: "pq".to_string(),
                    key: key.to_string(),
                    message: "must not be empty".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_pq_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        if let Some(log_file) = &self.global.log_file {
            options.insert("global.log_file".into(), log_file.display().to_string());
        }
        options.insert(
            "global.tmp_dir".into(),
            self.global.tmp_dir.display().to_string(),
        );
    }

    fn format_pq_options(&self, options: &mut BTreeMap<String, String>) {
        let pq = &self.pq;
        options.insert("pq.pq_branch".into(), pq.pq_branch.clone());
        options.insert("pq.packaging_branch".into(), pq.packaging_branch.clone());
        options.insert(
            "pq.packaging_dir".into(),
            pq.packaging_dir.display().to_string(),
        );
        options.insert(
            "pq.new_packaging_dir".into(),
            pq.effective_new_packaging_dir().display().to_string(),
        );
        if let Some(spec_file) = &pq.spec_file {
            options.insert("pq.spec_file".into(), spec_file.display().to_string());
        }
        options.insert("pq.upstream_tag".into(), pq.upstream_tag.clone());
        options.insert("pq.vendor".into(), pq.vendor.clone());
        options.insert("pq.import_files".into(), pq.import_files.join(","));
        options.insert("pq.patch_numbers".into(), pq.patch_numbers.to_string());
        options.insert("pq.patch_num_format".into(), pq.patch_num_format.clone());
        options.insert(
            "pq.patch_export_compress".into(),
            pq.patch_export_compress.to_string(),
        );
        if let Some(squash) = &pq.patch_export_squash_until {
            options.insert("pq.patch_export_squash_until".into(), squash.clone());
        }
        if let Some(ignore) = &pq.patch_export_ignore_path {
            options.insert("pq.patch_export_ignore_path".into(), ignore.clone());
        }
        options.insert("pq.use_oracle".into(), pq.use_oracle.to_string());
    }
}
