// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Rewriting of the auto-managed patch series.
//!
//! ```text
//! before                           after reconcile(["a.patch", "b.patch"])
//! Source0: foo.tar.gz              Source0: foo.tar.gz
//! # Patches auto-generated by ...  # Patches auto-generated by ...
//! Patch0:     old.patch       ─┐   Patch0:     a.patch
//!                              └─▶ Patch1:     b.patch
//! %setup -q                        %setup -q
//! # old.patch                 ─┐   # a.patch
//! %patch0 -p1                  │   %patch0 -p1
//!                              └─▶ # b.patch
//!                                  %patch1 -p1
//! ```
//!
//! Manually maintained patches (`# gbp-ignore-patches: N`) are left in
//! place; new numbering starts above the highest of them.


use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::document::{Document, LineHandle};
use super::index::{DirectiveKind, ManifestIndex, PatchEntry};
use crate::error::{PqResult, SpecError};

/// Comment placed above the first inserted `Patch` tag.
pub const AUTOGEN_HEADER: &str = "# Patches auto-generated by git-buildpackage:";

static TAG_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#.*patch.*auto-generated").expect("valid tag comment regex")
});

static MACRO_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#.+(patch|diff)(\.(gz|bz2|xz|lzma))?\s*$")
        .expect("valid macro comment regex")
});

static CONDITION_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*%if(arch)?\s").expect("valid condition regex"));

static CONDITION_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*%endif\b").expect("valid endif regex"));

/// Decides which comments belong to an auto-managed patch.
pub trait CommentHeuristic {
    /// Whether `line`, directly above a `Patch` tag, was generated with it.
    fn is_tag_comment(&self, line: &str) -> bool;
    /// Whether `line`, directly above a `%patch` macro, names the patch.
    fn is_macro_comment(&self, line: &str) -> bool;
}

/// Matches the comments written by this tool and by git-buildpackage.
#[derive(Debug, Clone, Copy, Default)]
pub struct GbpCommentHeuristic;

impl CommentHeuristic for GbpCommentHeuristic {
    fn is_tag_comment(&self, line: &str) -> bool {
        TAG_COMMENT_RE.is_match(line)
    }

    fn is_macro_comment(&self, line: &str) -> bool {
        MACRO_COMMENT_RE.is_match(line)
    }
}

/// Build-time condition attached to a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchCondition {
    /// `%if <expr>`
    If(String),
    /// `%ifarch <expr>`
    IfArch(String),
}

impl fmt::Display for PatchCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::If(expr) => write!(f, "%if {expr}"),
            Self::IfArch(expr) => write!(f, "%ifarch {expr}"),
        }
    }
}

/// Conditions keyed by patch file name.
pub type PatchConditions = BTreeMap<String, PatchCondition>;

/// Tag line text for a patch.
#[must_use]
pub fn patch_tag_line(number: u32, name: &str) -> String {
    format!("{:<12}{}", format!("Patch{number}:"), name)
}

/// Removes every auto-managed patch from `doc` and inserts `filenames` as a
/// freshly numbered series.
///
/// `index` must describe `doc`. Returns the `(number, filename)` pairs
/// assigned to the new patches.
///
/// # Errors
///
/// Returns an error if:
/// - No `Patch`, `Source` or `Name` tag can anchor the new tags.
/// - No marker, `%patch`, `%setup` or `%prep` can anchor the new macros.
pub fn reconcile(
    doc: &mut Document,
    index: &ManifestIndex,
    filenames: &[String],
    conditions: &PatchConditions,
    heuristic: &dyn CommentHeuristic,
) -> PqResult<Vec<(u32, String)>> {
    let positions = doc.positions();
    let pos = |handle: LineHandle| positions.get(&handle).copied().unwrap_or(0);

    let (autoupdate, manual): (Vec<&PatchEntry>, Vec<&PatchEntry>) =
        index.patches().values().partition(|p| p.autoupdate);

    let start = manual.iter().map(|p| p.number + 1).max().unwrap_or(0);
    debug!(start, "starting autoupdate patch numbering");

    let mut removals = Removals::default();
    for patch in &autoupdate {
        if let Some(line) = patch.macro_line {
            removals.macro_line(doc, line, heuristic);
        }
        if let Some(line) = patch.tag_line {
            removals.tag_line(doc, line, heuristic);
        }
    }

    let last_removed = |lines: &[LineHandle]| lines.iter().copied().max_by_key(|h| pos(*h));
    let mut tag_anchor = last_removed(&removals.tags).map(Some);
    let mut macro_anchor = last_removed(&removals.macros).map(Some);

    // Highest positions first so predecessors stay meaningful
    let mut ordered: Vec<LineHandle> = removals.all.iter().copied().collect();
    ordered.sort_by_key(|h| std::cmp::Reverse(pos(*h)));
    for line in ordered {
        debug!(line = doc.text(line), "removing line");
        let prev = doc.delete(line);
        for anchor in [&mut tag_anchor, &mut macro_anchor] {
            if *anchor == Some(Some(line)) {
                *anchor = Some(prev);
            }
        }
    }

    if filenames.is_empty() {
        return Ok(Vec::new());
    }

    let assigned: Vec<(u32, String)> = (start..).zip(filenames.iter().cloned()).collect();

    let tag_anchor = match tag_anchor {
        Some(anchor) => anchor,
        None => Some(fallback_tag_anchor(index, &manual, &pos)?),
    };
    for (number, name) in assigned.iter().rev() {
        insert_at(doc, tag_anchor, patch_tag_line(*number, name));
    }
    insert_at(doc, tag_anchor, AUTOGEN_HEADER);

    let macro_anchor = match index.annotations().patch_macro_marker() {
        Some(marker) => Some(marker),
        None => match macro_anchor {
            Some(anchor) => anchor,
            None => Some(fallback_macro_anchor(index, &manual, &pos)?),
        },
    };
    for (number, name) in assigned.iter().rev() {
        let condition = conditions.get(name);
        let mut block = Vec::with_capacity(4);
        if let Some(condition) = condition {
            block.push(condition.to_string());
        }
        block.push(format!("# {name}"));
        block.push(format!("%patch{number} -p1"));
        if condition.is_some() {
            block.push("%endif".to_string());
        }

        let mut cursor = macro_anchor;
        for line in block {
            cursor = Some(insert_at(doc, cursor, line));
        }
    }

    Ok(assigned)
}

/// Lines scheduled for deletion.
#[derive(Default)]
struct Removals {
    tags: Vec<LineHandle>,
    macros: Vec<LineHandle>,
    all: HashSet<LineHandle>,
}

impl Removals {
    fn tag_line(&mut self, doc: &Document, line: LineHandle, heuristic: &dyn CommentHeuristic) {
        self.tags.push(line);
        self.all.insert(line);
        if let Some(prev) = doc.prev(line)
            && heuristic.is_tag_comment(doc.text(prev))
        {
            self.all.insert(prev);
        }
    }

    fn macro_line(&mut self, doc: &Document, line: LineHandle, heuristic: &dyn CommentHeuristic) {
        self.macros.push(line);
        self.all.insert(line);

        let mut above = doc.prev(line);
        if let Some(prev) = above
            && heuristic.is_macro_comment(doc.text(prev))
        {
            self.all.insert(prev);
            above = doc.prev(prev);
        }

        // A wrapper written by an earlier run: %if/%ifarch above, %endif below
        if let (Some(open), Some(close)) = (above, doc.next(line))
            && CONDITION_OPEN_RE.is_match(doc.text(open))
            && CONDITION_CLOSE_RE.is_match(doc.text(close))
        {
            self.all.insert(open);
            self.all.insert(close);
        }
    }
}

/// Inserts after `anchor`, or at the very top when there is none.
fn insert_at(doc: &mut Document, anchor: Option<LineHandle>, text: impl Into<String>) -> LineHandle {
    match anchor {
        Some(anchor) => doc.insert_after(anchor, text),
        None => doc.prepend(text),
    }
}

fn fallback_tag_anchor(
    index: &ManifestIndex,
    manual: &[&PatchEntry],
    pos: &dyn Fn(LineHandle) -> usize,
) -> PqResult<LineHandle> {
    if let Some(line) = manual.iter().filter_map(|p| p.tag_line).max_by_key(|h| pos(*h)) {
        return Ok(line);
    }
    if let Some(line) = index
        .sources()
        .values()
        .map(|s| s.tag_line)
        .max_by_key(|h| pos(*h))
    {
        return Ok(line);
    }
    if let Some(line) = index.tag("name").and_then(|tag| tag.lines.last().copied()) {
        return Ok(line);
    }
    Err(SpecError::MissingAnchor {
        what: "'Patch', 'Source' or 'Name' tag".to_string(),
    }
    .into())
}

fn fallback_macro_anchor(
    index: &ManifestIndex,
    manual: &[&PatchEntry],
    pos: &dyn Fn(LineHandle) -> usize,
) -> PqResult<LineHandle> {
    if let Some(line) = manual.iter().filter_map(|p| p.macro_line).max_by_key(|h| pos(*h)) {
        return Ok(line);
    }
    if let Some(line) = index.last_directive(DirectiveKind::Setup) {
        info!("didn't find any old '%patch' macros, adding new patches after the last '%setup' macro");
        return Ok(line);
    }
    if let Some(line) = index.last_directive(DirectiveKind::Prep) {
        info!("didn't find any old '%patch' or '%setup' macros, adding new patches directly after '%prep' macro");
        return Ok(line);
    }
    Err(SpecError::LocationUndetermined.into())
}
