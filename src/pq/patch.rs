// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mail-style patch files and commit-message trailers.
//!
//! ```text
//! From: Jane Doe <jane@example.com>     ─┐
//! Date: Mon, 5 Jan 2026 10:00:00 +0000   │ headers -> Author
//! Subject: Fix the build                ─┘ subject
//!
//! Longer description.                    -> description
//! ---
//!  src/main.c | 2 +-                     -> (git apply input)
//! diff --git a/src/main.c b/src/main.c
//! ```

use regex::Regex;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

use crate::error::{PatchError, PqResult};
use crate::git::{Author, CommitInfo};
use crate::spec::reconcile::PatchCondition;

static TRAILER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^gbp(?:-rpm)?:\s*(?P<cmd>[a-z-]+)(?:\s+(?P<args>\S.*?))?\s*$")
        .expect("valid trailer regex")
});

static SUBJECT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[[^\]]*PATCH[^\]]*\]\s*").expect("valid subject regex"));

static FROM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*"?(?P<name>[^"<]*?)"?\s*<(?P<email>[^>]*)>\s*$"#).expect("valid from regex")
});

static NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-").expect("valid number prefix regex"));

static NAME_QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[,.@()\[\]\\:;]"#).expect("valid quote regex"));

/// `Gbp:`/`Gbp-Rpm:` commands found in a commit message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trailers {
    /// The commit is not exported.
    pub ignore: bool,
    /// Build condition for the exported patch; `If` beats `IfArch`.
    pub condition: Option<PatchCondition>,
    /// The message body without trailer lines.
    pub body: String,
}

/// Extracts the trailer commands from a commit body.
///
/// Unknown commands and commands missing their argument are dropped with a warning.
#[must_use]
pub fn parse_trailers(commit: &str, body: &str) -> Trailers {
    let mut trailers = Trailers::default();
    let mut if_expr = None;
    let mut ifarch_expr = None;
    let mut kept = Vec::new();

    for line in body.lines() {
        let Some(caps) = TRAILER_RE.captures(line) else {
            kept.push(line);
            continue;
        };
        let cmd = caps["cmd"].to_ascii_lowercase();
        let args = caps.name("args").map(|m| m.as_str().to_string());
        match (cmd.as_str(), args) {
            ("ignore", _) => trailers.ignore = true,
            ("if", Some(expr)) => if_expr = Some(expr),
            ("ifarch", Some(expr)) => ifarch_expr = Some(expr),
            ("if" | "ifarch", None) => {
                warn!("Command '{cmd}' requires an argument in commit {commit}, ignoring");
            }
            _ => warn!("Ignoring unknown gbp-command '{cmd}' in commit {commit}"),
        }
    }

    trailers.condition = if_expr
        .map(PatchCondition::If)
        .or_else(|| ifarch_expr.map(PatchCondition::IfArch));
    trailers.body = kept.join("\n").trim_end().to_string();
    trailers
}

/// File name for a commit patch: `<prefix><subject slug><suffix>`, at most 63 bytes.
#[must_use]
pub fn patch_file_name(subject: &str, prefix: &str, suffix: &str) -> String {
    let mut slug = String::with_capacity(subject.len());
    for c in subject.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches(|c| c == '-' || c == '.');
    let max = 63_usize.saturating_sub(prefix.len() + suffix.len());
    let slug = slug[..slug.len().min(max)].trim_end_matches(['-', '.']);
    let slug = if slug.is_empty() { "patch" } else { slug };
    format!("{prefix}{slug}{suffix}")
}

/// Writes `diff` as a mail-style patch for `info`, trailers stripped.
///
/// # Errors
///
/// Returns `PatchError::Io` if the file cannot be written.
pub fn write_commit_patch(path: &Path, info: &CommitInfo, body: &str, diff: &[u8]) -> PqResult<()> {
    let mut header = String::new();
    let name = info.author.name.as_deref().unwrap_or_default();
    let email = info.author.email.as_deref().unwrap_or_default();
    if NAME_QUOTE_RE.is_match(name) {
        let _ = writeln!(header, "From: \"{name}\" <{email}>");
    } else {
        let _ = writeln!(header, "From: {name} <{email}>");
    }
    if let Some(date) = &info.author.date {
        let _ = writeln!(header, "Date: {date}");
    }
    let _ = writeln!(header, "Subject: {}", info.subject);
    header.push('\n');
    if !body.is_empty() {
        let _ = writeln!(header, "{body}");
    }
    header.push_str("---\n");
    write_with_header(path, &header, diff)
}

/// Writes a raw diff between two revisions.
///
/// # Errors
///
/// Returns `PatchError::Io` if the file cannot be written.
pub fn write_raw_diff(path: &Path, from: &str, to: &str, diff: &[u8]) -> PqResult<()> {
    let header = format!("Subject: Raw diff {from}..{to}\n\n---\n");
    write_with_header(path, &header, diff)
}

fn write_with_header(path: &Path, header: &str, diff: &[u8]) -> PqResult<()> {
    let mut content = Vec::with_capacity(header.len() + diff.len());
    content.extend_from_slice(header.as_bytes());
    content.extend_from_slice(diff);
    std::fs::write(path, content).map_err(|source| {
        PatchError::Io {
            path: path.display().to_string(),
            source,
        }
        .into()
    })
}

/// A patch file with the metadata of its mail headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    pub path: PathBuf,
    pub strip: u32,
    pub author: Author,
    pub subject: String,
    pub description: String,
}

impl PatchFile {
    /// Reads `path` and parses its headers.
    ///
    /// Without a `Subject:` header the subject is derived from the file name.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::Io` if the file cannot be read.
    pub fn read(path: impl Into<PathBuf>, strip: u32) -> PqResult<Self> {
        let path = path.into();
        let raw = std::fs::read(&path).map_err(|source| PatchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(path, strip, &String::from_utf8_lossy(&raw)))
    }

    /// Parses patch `content` that belongs to `path`.
    #[must_use]
    pub fn parse(path: PathBuf, strip: u32, content: &str) -> Self {
        let mut author = Author::default();
        let mut subject = None;
        let mut lines = content.lines().peekable();

        if lines.peek().is_some_and(|l| l.starts_with("From ")) {
            lines.next();
        }

        let mut headers: Vec<(String, String)> = Vec::new();
        while let Some(&line) = lines.peek() {
            if line.is_empty() {
                lines.next();
                break;
            }
            if line.starts_with([' ', '\t'])
                && let Some((_, value)) = headers.last_mut()
            {
                value.push(' ');
                value.push_str(line.trim());
            } else if let Some((key, value)) = line.split_once(':')
                && !key.is_empty()
                && !key.contains(char::is_whitespace)
            {
                headers.push((key.to_ascii_lowercase(), value.trim().to_string()));
            } else {
                // Not a mail header block
                headers.clear();
                break;
            }
            lines.next();
        }

        for (key, value) in &headers {
            match key.as_str() {
                "from" => {
                    if let Some(caps) = FROM_RE.captures(value) {
                        author.name = Some(caps["name"].trim().to_string()).filter(|n| !n.is_empty());
                        author.email = Some(caps["email"].to_string()).filter(|e| !e.is_empty());
                    }
                }
                "date" => author.date = Some(value.clone()),
                "subject" => subject = Some(SUBJECT_TAG_RE.replace(value, "").into_owned()),
                _ => {}
            }
        }

        let description = if headers.is_empty() {
            String::new()
        } else {
            lines
                .take_while(|l| {
                    *l != "---" && !l.starts_with("diff ") && !l.starts_with("Index: ")
                })
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        };

        let subject = subject
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| subject_from_file_name(&path));

        Self {
            path,
            strip,
            author,
            subject,
            description,
        }
    }

    /// Whether the headers carry a complete author.
    #[must_use]
    pub const fn has_author(&self) -> bool {
        self.author.name.is_some() && self.author.email.is_some()
    }

    /// Commit message: subject, blank line, description.
    #[must_use]
    pub fn commit_message(&self) -> String {
        if self.description.is_empty() {
            format!("{}\n", self.subject)
        } else {
            format!("{}\n\n{}\n", self.subject, self.description)
        }
    }

    /// File name of the patch.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn subject_from_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = [".patch", ".diff"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(&name);
    NUMBER_PREFIX_RE.replace(stem, "").into_owned()
}
