// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Macro-aware evaluation of spec files by an external tool.
//!
//! ```text
//! spec text ──filter arch tags──▶ temp .spec ──rpmspec -P──▶ expanded text
//!                                                              │
//!                            OracleReport { tags, sources } ◀──┘
//! ```
//!
//! The report is advisory: callers compare it against the line index and
//! prefer its expanded values, but fall back to the built-in expander
//! when no oracle is available.

use regex::Regex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use crate::core::process::builder::ProcessBuilder;
use crate::error::{FsError, ProcessError, PqResult};

/// Tags removed before evaluation; they can make the evaluator bail out
/// on a foreign architecture.
const SKIP_TAGS: &[&str] = &[
    "ExcludeArch",
    "ExcludeOS",
    "ExclusiveArch",
    "ExclusiveOS",
    "BuildArch",
];

static EXPANDED_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<name>[a-z][a-z]*?)(?P<num>\d+)?\s*:\s*(?P<value>\S(.*\S)?)\s*$")
        .expect("valid expanded tag regex")
});

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^%(package|description|prep|build|install|check|clean|files|changelog|pre|post|preun|postun|pretrans|posttrans|verifyscript|trigger\w*)(\s|$)",
    )
    .expect("valid section regex")
});

/// Kind of an entry in [`OracleReport::list_sources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Archive,
    Patch,
}

/// A source or patch as seen by the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleSource {
    /// Expanded value of the tag.
    pub name: String,
    pub number: u32,
    pub kind: SourceKind,
}

/// Evaluation result of a spec file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleReport {
    tags: BTreeMap<String, String>,
    sources: Vec<OracleSource>,
}

impl OracleReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resolved tag value (first value per tag wins).
    #[must_use]
    pub fn with_tag(mut self, name: &str, value: impl Into<String>) -> Self {
        self.tags
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, number: u32, kind: SourceKind) -> Self {
        self.sources.push(OracleSource {
            name: name.into(),
            number,
            kind,
        });
        self
    }

    /// Macro-expanded value of a preamble tag, looked up case-insensitively.
    #[must_use]
    pub fn resolve_tag(&self, name: &str) -> Option<&str> {
        self.tags.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Sources and patches in declaration order.
    #[must_use]
    pub fn list_sources(&self) -> &[OracleSource] {
        &self.sources
    }

    /// Builds a report from macro-expanded spec text.
    ///
    /// Plain tags come from the main package preamble only. Sources and
    /// patches are also collected from `%package` preambles.
    #[must_use]
    pub fn from_expanded(text: &str) -> Self {
        let mut report = Self::new();
        let mut preamble = Preamble::Main;
        for line in text.lines() {
            if let Some(caps) = SECTION_RE.captures(line) {
                preamble = if &caps[1] == "package" {
                    Preamble::Package
                } else {
                    Preamble::Body
                };
                continue;
            }
            if preamble == Preamble::Body {
                continue;
            }
            let Some(caps) = EXPANDED_TAG_RE.captures(line) else {
                continue;
            };
            let name = caps["name"].to_ascii_lowercase();
            let number = caps.name("num").and_then(|m| m.as_str().parse().ok());
            let kind = match name.as_str() {
                "source" => Some(SourceKind::Archive),
                "patch" => Some(SourceKind::Patch),
                _ => None,
            };
            match kind {
                Some(kind) => {
                    report = report.with_source(&caps["value"], number.unwrap_or(0), kind);
                }
                None if number.is_none() && preamble == Preamble::Main => {
                    report = report.with_tag(&name, &caps["value"]);
                }
                None => {}
            }
        }
        report
    }
}

/// Part of the expanded text being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preamble {
    Main,
    Package,
    Body,
}

/// Evaluates spec file content with full macro semantics.
pub trait MacroOracle {
    /// # Errors
    ///
    /// Returns an error if the evaluator cannot run or rejects the content.
    fn evaluate(&self, content: &str) -> PqResult<OracleReport>;
}

/// Oracle backed by `rpmspec -P`.
#[derive(Debug, Clone)]
pub struct RpmSpecOracle {
    program: PathBuf,
    tmp_dir: Option<PathBuf>,
}

impl RpmSpecOracle {
    /// Locates `rpmspec` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::ExecutableNotFound` if it is not installed.
    pub fn locate() -> PqResult<Self> {
        let program = ProcessBuilder::find("rpmspec").ok_or_else(|| {
            ProcessError::ExecutableNotFound {
                name: "rpmspec".to_string(),
            }
        })?;
        Ok(Self {
            program,
            tmp_dir: None,
        })
    }

    /// Directory for the temporary spec copy (system temp dir by default).
    #[must_use]
    pub fn with_tmp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.tmp_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Drops lines whose tag name is in [`SKIP_TAGS`].
#[must_use]
pub fn filter_skipped_tags(content: &str) -> String {
    content
        .split_inclusive('\n')
        .filter(|line| {
            let tag = line.split(':').next().unwrap_or_default().trim();
            !SKIP_TAGS.contains(&tag)
        })
        .collect()
}

impl MacroOracle for RpmSpecOracle {
    fn evaluate(&self, content: &str) -> PqResult<OracleReport> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("rpmpq").suffix(".spec");
        let mut temp = match &self.tmp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| FsError::io(self.tmp_dir.as_deref().unwrap_or(Path::new("")), e))?;

        temp.write_all(filter_skipped_tags(content).as_bytes())
            .and_then(|()| temp.flush())
            .map_err(|e| FsError::io(temp.path(), e))?;

        debug!(program = %self.program.display(), spec = %temp.path().display(), "evaluating spec");
        let output = ProcessBuilder::new(&self.program)
            .arg("-P")
            .arg(temp.path())
            .capture_output()
            .run()?;

        Ok(OracleReport::from_expanded(&output.stdout()))
    }
}
