// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for rpmpq.
//!
//! # Config Structure
//!
//! ```text
//! Config: GlobalConfig, PqConfig
//! ByteSize: "0" | "512" | "100k" | "2M" (1024-based units)
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::logging::{LogFormat, LogLevel};

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file (no file logging when unset).
    pub log_file: Option<PathBuf>,
    /// Format of the log file.
    pub log_format: LogFormat,
    /// Base directory under which scratch directories are created.
    pub tmp_dir: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
            log_format: LogFormat::Text,
            tmp_dir: PathBuf::from("/var/tmp/rpmpq"),
        }
    }
}

/// Patch-queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PqConfig {
    /// Format of the patch-queue branch name (`%(branch)s`, `%(version)s`).
    pub pq_branch: String,
    /// Base branch used when `pq_branch` has no `%(branch)s` field.
    pub packaging_branch: String,
    /// Directory holding the spec file and patches, relative to the repo root.
    pub packaging_dir: PathBuf,
    /// Packaging directory on the branch created by `convert`.
    pub new_packaging_dir: Option<PathBuf>,
    /// Explicit spec file, relative to the repo root (overrides `packaging_dir`).
    pub spec_file: Option<PathBuf>,
    /// Format of upstream tags (`%(upstreamversion)s`, `%(version)s`, `%(vendor)s` = `Upstream`).
    pub upstream_tag: String,
    /// Distribution vendor name for packaging tags.
    pub vendor: String,
    /// Files copied from the base branch into a freshly imported pq branch.
    pub import_files: Vec<String>,
    /// Prefix exported patch files with a sequence number.
    pub patch_numbers: bool,
    /// printf-style format of the sequence number prefix.
    pub patch_num_format: String,
    /// Compress exported patches larger than this (0 disables).
    pub patch_export_compress: ByteSize,
    /// Squash commits until this point into one diff (`commit[:name]`).
    pub patch_export_squash_until: Option<String>,
    /// Exclude paths matching this regex from exported patches.
    pub patch_export_ignore_path: Option<String>,
    /// Consult `rpmspec` for macro-expanded tag values.
    pub use_oracle: bool,
}

impl Default for PqConfig {
    fn default() -> Self {
        Self {
            pq_branch: "development/%(branch)s".to_string(),
            packaging_branch: "master".to_string(),
            packaging_dir: PathBuf::new(),
            new_packaging_dir: None,
            spec_file: None,
            upstream_tag: "upstream/%(upstreamversion)s".to_string(),
            vendor: "Downstream".to_string(),
            import_files: vec![".gbp.conf".to_string()],
            patch_numbers: true,
            patch_num_format: "%04d-".to_string(),
            patch_export_compress: ByteSize::default(),
            patch_export_squash_until: None,
            patch_export_ignore_path: None,
            use_oracle: true,
        }
    }
}

impl PqConfig {
    /// Packaging directory for `convert`, falling back to `packaging_dir`.
    #[must_use]
    pub fn effective_new_packaging_dir(&self) -> PathBuf {
        self.new_packaging_dir
            .clone()
            .unwrap_or_else(|| self.packaging_dir.clone())
    }

    /// Formats `number` according to `patch_num_format`.
    ///
    /// Supports `%d` and zero-padded `%0Nd` conversions surrounded by literal text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the format has no integer conversion.
    pub fn format_patch_number(&self, number: usize) -> Result<String, ConfigError> {
        format_number(&self.patch_num_format, number)
    }
}

/// Formats `number` with a printf-style `%d`/`%0Nd` conversion.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if `format` has no integer conversion.
pub fn format_number(format: &str, number: usize) -> Result<String, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        section: "pq".to_string(),
        key: "patch_num_format".to_string(),
        message: format!("expected a '%d' or '%0Nd' conversion, got '{format}'"),
    };

    let start = format.find('%').ok_or_else(invalid)?;
    let rest = &format[start + 1..];
    let end = rest.find('d').ok_or_else(invalid)?;
    let spec = &rest[..end];
    if !spec.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let formatted = if spec.is_empty() {
        number.to_string()
    } else {
        let width: usize = spec.parse().map_err(|_| invalid())?;
        if spec.starts_with('0') {
            format!("{number:0width$}")
        } else {
            format!("{number:width$}")
        }
    };

    Ok(format!(
        "{}{}{}",
        &format[..start],
        formatted,
        &rest[end + 1..]
    ))
}

/// A byte count that accepts `k`/`m`/`g`/`t` unit suffixes (powers of 1024).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteSize(u64);

impl ByteSize {
    #[must_use]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Number of bytes.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Whether the threshold is disabled.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::str::FromStr for ByteSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ConfigError::InvalidValue {
            section: "pq".to_string(),
            key: "patch_export_compress".to_string(),
            message,
        };

        let s = s.trim();
        let (digits, multiplier) = match s.chars().last().map(|c| c.to_ascii_lowercase()) {
            Some('k') => (&s[..s.len() - 1], 1024_u64),
            Some('m') => (&s[..s.len() - 1], 1024_u64.pow(2)),
            Some('g') => (&s[..s.len() - 1], 1024_u64.pow(3)),
            Some('t') => (&s[..s.len() - 1], 1024_u64.pow(4)),
            Some(_) => (s, 1),
            None => return Err(invalid("empty size".to_string())),
        };
        let value: u64 = digits
            .parse()
            .map_err(|e| invalid(format!("'{s}' is not a size: {e}")))?;
        value
            .checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| invalid(format!("'{s}' is too large")))
    }
}

impl std::fmt::Display for ByteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ByteSize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
