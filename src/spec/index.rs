// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Classification of spec file lines.
//!
//! ```text
//! line                              → record
//! # gbp-ignore-patches: 5           → Annotations.ignore_patches
//! # >> gbp-patch-macros             → Annotations.markers
//! Source0: foo-1.0.tar.gz           → SourceEntry 0 + TagRecord (source, 0)
//! Patch5: manual.patch              → PatchEntry 5   + TagRecord (patch, 5)
//! %patch5 -p1                       → DirectiveRecord Patch(5), PatchEntry 5 applied
//! %setup -q -n foo-1.0              → DirectiveRecord Setup, SourceEntry 0 setup options
//! Name: foo                         → TagRecord (name, -)
//! %prep                             → DirectiveRecord Prep
//! ```
//!
//! The index never owns text; records keep [`LineHandle`]s into the
//! [`Document`] they were built from.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::archive::{ArchiveName, parse_archive_filename};
use super::document::{Document, LineHandle};
use crate::error::{PqResult, SpecError};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<name>[a-z][a-z0-9]*)\s*:\s*(?P<value>\S(.*\S)?)\s*$")
        .expect("valid tag regex")
});

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Source(?P<num>\d+)?\s*:\s*(?P<name>[^\s].*[^\s])\s*$")
        .expect("valid source tag regex")
});

static PATCH_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Patch(?P<num>\d+)?\s*:\s*(?P<name>\S.*)$").expect("valid patch tag regex")
});

static PATCH_MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%patch(?P<num>\d+)?(\s+(?P<args>.*))?$").expect("valid patch macro regex")
});

static SETUP_MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%setup(\s+(?P<args>.*))?$").expect("valid setup macro regex")
});

static PREP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%prep(\s.*)?$").expect("valid prep regex"));

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s+(?P<dir>>>|<<)\s+(?P<what>gbp-[^\s]+)\s*(?P<comment>.*)$")
        .expect("valid marker regex")
});

static GBP_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*#\s*gbp-?(?P<name>[a-z-]+)\s*:\s*(?P<data>\S.*?)\s*$")
        .expect("valid gbp annotation regex")
});

/// Name of the marker after which `%patch` macros are placed.
pub const PATCH_MACROS_MARKER: &str = "gbp-patch-macros";

/// Key of a [`TagRecord`]: lowercase tag name and optional number.
pub type TagKey = (String, Option<u32>);

/// All occurrences of one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Tag name as first written (e.g. `Name`, `Source`).
    pub name: String,
    pub number: Option<u32>,
    /// Value of the last occurrence.
    pub value: String,
    pub lines: Vec<LineHandle>,
}

/// Kind of a recognized `%` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Prep,
    Setup,
    Patch,
}

/// One occurrence of `%prep`, `%setup` or `%patch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveRecord {
    pub kind: DirectiveKind,
    /// Patch number for `%patch`, source number for `%setup`.
    pub number: Option<u32>,
    pub args: String,
    pub line: LineHandle,
}

/// Parsed `%setup` options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupOptions {
    /// `-n NAME`
    pub name: Option<String>,
    /// `-c`
    pub create_dir: bool,
    /// `-D`
    pub no_delete_dir: bool,
    /// `-T`
    pub no_default_source: bool,
    /// `-b N`
    pub unpack_before: Option<u32>,
    /// `-a N`
    pub unpack_after: Option<u32>,
    /// `-q`
    pub quiet: bool,
}

impl SetupOptions {
    /// Source unpacked by the directive, if any.
    #[must_use]
    pub const fn source_number(&self) -> Option<u32> {
        if !self.no_default_source {
            return Some(0);
        }
        match (self.unpack_before, self.unpack_after) {
            (Some(n), _) | (None, Some(n)) => Some(n),
            (None, None) => None,
        }
    }
}

/// A `Patch` tag and, if applied, its `%patch` macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    pub number: u32,
    /// File name relative to the spec directory.
    pub filename: String,
    /// Value as written in the tag.
    pub name: String,
    pub strip: u32,
    /// `false` for manually maintained patches.
    pub autoupdate: bool,
    pub tag_line: Option<LineHandle>,
    pub macro_line: Option<LineHandle>,
    /// Whether a `%patch` macro applies it.
    pub applied: bool,
}

/// A `Source` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub number: u32,
    /// Full value (may be a URL).
    pub full_path: String,
    /// Basename of `full_path`.
    pub filename: String,
    pub archive: ArchiveName,
    /// Guessed leading directory inside the archive.
    pub prefix: Option<String>,
    pub setup: Option<SetupOptions>,
    pub tag_line: LineHandle,
}

impl SourceEntry {
    fn new(number: u32, full_path: &str, tag_line: LineHandle) -> Self {
        let mut entry = Self {
            number,
            full_path: String::new(),
            filename: String::new(),
            archive: parse_archive_filename(""),
            prefix: None,
            setup: None,
            tag_line,
        };
        entry.set_full_path(full_path);
        entry
    }

    /// Replaces the path, refreshing the derived file name and archive info.
    pub fn set_full_path(&mut self, full_path: &str) {
        self.full_path = full_path.to_string();
        self.filename = basename(full_path).to_string();
        self.archive = parse_archive_filename(&self.filename);
    }

    #[must_use]
    pub const fn is_archive(&self) -> bool {
        self.archive.format.is_some()
    }
}

/// Direction of a `# >> gbp-...` / `# << gbp-...` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerDirection {
    Start,
    End,
}

/// A marker comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub direction: MarkerDirection,
    pub what: String,
    pub comment: String,
    pub line: LineHandle,
}

/// Tool annotations found in comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Patch numbers declared manually maintained.
    pub ignore_patches: BTreeSet<u32>,
    pub markers: Vec<Marker>,
    /// Unrecognized `# gbp-<name>: <data>` annotations.
    pub unknown: Vec<(String, String)>,
}

impl Annotations {
    /// The last `# >> gbp-patch-macros` marker.
    #[must_use]
    pub fn patch_macro_marker(&self) -> Option<LineHandle> {
        self.markers
            .iter()
            .rev()
            .find(|m| m.direction == MarkerDirection::Start && m.what == PATCH_MACROS_MARKER)
            .map(|m| m.line)
    }
}

/// Lookup tables over a [`Document`].
#[derive(Debug, Clone, Default)]
pub struct ManifestIndex {
    tags: BTreeMap<TagKey, TagRecord>,
    directives: Vec<DirectiveRecord>,
    patches: BTreeMap<u32, PatchEntry>,
    sources: BTreeMap<u32, SourceEntry>,
    annotations: Annotations,
}

impl ManifestIndex {
    /// Classifies every line of `doc`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A patch number outside the ignore set is tagged twice.
    /// - A `%patch` / `%setup` directive or an ignore annotation has
    ///   malformed arguments.
    pub fn parse(doc: &Document) -> PqResult<Self> {
        let mut index = Self::default();

        // Ignore annotations apply regardless of where they appear
        for (_, line) in doc {
            if let Some((name, data)) = match_gbp_annotation(line)
                && is_ignore_annotation(&name)
            {
                index.annotations.ignore_patches = parse_ignore_list(&data)?;
            }
        }

        for (handle, line) in doc {
            index.classify(handle, line)?;
        }
        Ok(index)
    }

    fn classify(&mut self, handle: LineHandle, line: &str) -> PqResult<()> {
        if let Some((name, data)) = match_gbp_annotation(line) {
            if !is_ignore_annotation(&name) {
                info!(annotation = %name, "found unrecognized gbp annotation: '{line}'");
                self.annotations.unknown.push((name, data));
            }
            return Ok(());
        }

        if let Some(caps) = MARKER_RE.captures(line) {
            self.annotations.markers.push(Marker {
                direction: if &caps["dir"] == ">>" {
                    MarkerDirection::Start
                } else {
                    MarkerDirection::End
                },
                what: caps["what"].to_string(),
                comment: caps["comment"].to_string(),
                line: handle,
            });
            return Ok(());
        }

        if let Some(caps) = SOURCE_RE.captures(line) {
            let number = parse_tag_number(caps.name("num").map(|m| m.as_str()))?;
            self.record_tag("Source", Some(number), &caps["name"], handle);
            match self.sources.get_mut(&number) {
                Some(source) => source.tag_line = handle,
                None => {
                    self.sources
                        .insert(number, SourceEntry::new(number, &caps["name"], handle));
                }
            }
            return Ok(());
        }

        if let Some(caps) = PATCH_TAG_RE.captures(line) {
            let number = parse_tag_number(caps.name("num").map(|m| m.as_str()))?;
            let value = caps["name"].trim();
            self.record_tag("Patch", Some(number), value, handle);
            let autoupdate = !self.annotations.ignore_patches.contains(&number);
            match self.patches.get_mut(&number) {
                Some(patch) if !autoupdate => patch.tag_line = Some(handle),
                Some(_) => return Err(SpecError::DuplicatePatch { number }.into()),
                None => {
                    self.patches.insert(
                        number,
                        PatchEntry {
                            number,
                            filename: basename(value).to_string(),
                            name: value.to_string(),
                            strip: 0,
                            autoupdate,
                            tag_line: Some(handle),
                            macro_line: None,
                            applied: false,
                        },
                    );
                }
            }
            return Ok(());
        }

        if let Some(caps) = PATCH_MACRO_RE.captures(line) {
            let args = caps.name("args").map_or("", |m| m.as_str());
            let options = parse_patch_options(args)?;
            let number = match caps.name("num") {
                Some(num) => parse_tag_number(Some(num.as_str()))?,
                None => options.number.unwrap_or(0),
            };
            self.directives.push(DirectiveRecord {
                kind: DirectiveKind::Patch,
                number: Some(number),
                args: args.to_string(),
                line: handle,
            });
            match self.patches.get_mut(&number) {
                Some(patch) => {
                    if let Some(strip) = options.strip {
                        patch.strip = strip;
                    }
                    patch.macro_line = Some(handle);
                    patch.applied = true;
                }
                None => warn!(patch = number, "%patch macro refers to an undeclared patch"),
            }
            return Ok(());
        }

        if let Some(caps) = SETUP_MACRO_RE.captures(line) {
            let args = caps.name("args").map_or("", |m| m.as_str());
            let options = parse_setup_options(args)?;
            let number = options.source_number();
            self.directives.push(DirectiveRecord {
                kind: DirectiveKind::Setup,
                number,
                args: args.to_string(),
                line: handle,
            });
            if let Some(source) = number.and_then(|n| self.sources.get_mut(&n)) {
                source.setup = Some(options);
            }
            return Ok(());
        }

        if let Some(caps) = TAG_RE.captures(line) {
            self.record_tag(&caps["name"], None, &caps["value"], handle);
            return Ok(());
        }

        if PREP_RE.is_match(line) {
            self.directives.push(DirectiveRecord {
                kind: DirectiveKind::Prep,
                number: None,
                args: line.trim_start_matches("%prep").trim().to_string(),
                line: handle,
            });
        }
        Ok(())
    }

    fn record_tag(&mut self, name: &str, number: Option<u32>, value: &str, line: LineHandle) {
        self.tags
            .entry((name.to_ascii_lowercase(), number))
            .and_modify(|tag| {
                tag.value = value.to_string();
                tag.lines.push(line);
            })
            .or_insert_with(|| TagRecord {
                name: name.to_string(),
                number,
                value: value.to_string(),
                lines: vec![line],
            });
    }

    /// Every tag record, ordered by key.
    pub fn tags(&self) -> impl Iterator<Item = &TagRecord> {
        self.tags.values()
    }

    /// An unnumbered tag, looked up case-insensitively.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&TagRecord> {
        self.tags.get(&(name.to_ascii_lowercase(), None))
    }

    /// A numbered tag (`Source`, `Patch`), looked up case-insensitively.
    #[must_use]
    pub fn numbered_tag(&self, name: &str, number: u32) -> Option<&TagRecord> {
        self.tags.get(&(name.to_ascii_lowercase(), Some(number)))
    }

    /// Value of the last occurrence of an unnumbered tag.
    #[must_use]
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tag(name).map(|tag| tag.value.as_str())
    }

    #[must_use]
    pub fn directives(&self) -> &[DirectiveRecord] {
        &self.directives
    }

    /// Line of the last directive of `kind`.
    #[must_use]
    pub fn last_directive(&self, kind: DirectiveKind) -> Option<LineHandle> {
        self.directives
            .iter()
            .rev()
            .find(|d| d.kind == kind)
            .map(|d| d.line)
    }

    #[must_use]
    pub const fn patches(&self) -> &BTreeMap<u32, PatchEntry> {
        &self.patches
    }

    #[must_use]
    pub const fn sources(&self) -> &BTreeMap<u32, SourceEntry> {
        &self.sources
    }

    pub(crate) const fn patches_mut(&mut self) -> &mut BTreeMap<u32, PatchEntry> {
        &mut self.patches
    }

    pub(crate) const fn sources_mut(&mut self) -> &mut BTreeMap<u32, SourceEntry> {
        &mut self.sources
    }

    #[must_use]
    pub const fn annotations(&self) -> &Annotations {
        &self.annotations
    }
}

fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

fn match_gbp_annotation(line: &str) -> Option<(String, String)> {
    GBP_TAG_RE
        .captures(line)
        .map(|caps| (caps["name"].to_ascii_lowercase(), caps["data"].to_string()))
}

fn is_ignore_annotation(name: &str) -> bool {
    matches!(name.replace('-', "").as_str(), "ignorepatch" | "ignorepatches")
}

fn parse_ignore_list(data: &str) -> PqResult<BTreeSet<u32>> {
    data.split_whitespace()
        .map(|item| {
            item.parse().map_err(|_| {
                SpecError::InvalidDirective {
                    directive: "gbp-ignore-patches".to_string(),
                    message: format!("'{item}' is not a patch number"),
                }
                .into()
            })
        })
        .collect()
}

fn parse_tag_number(digits: Option<&str>) -> PqResult<u32> {
    digits.map_or(Ok(0), |digits| {
        digits.parse().map_err(|_| {
            SpecError::InvalidDirective {
                directive: "tag".to_string(),
                message: format!("number '{digits}' out of range"),
            }
            .into()
        })
    })
}

/// Short options of a directive: `(flag, takes_value)`.
type OptionTable = &'static [(char, bool)];

const PATCH_OPTIONS: OptionTable = &[
    ('p', true),
    ('P', true),
    ('b', true),
    ('F', true),
    ('d', true),
    ('o', true),
    ('z', true),
    ('s', false),
    ('E', false),
    ('R', false),
    ('Z', false),
];

const SETUP_OPTIONS: OptionTable = &[
    ('n', true),
    ('a', true),
    ('b', true),
    ('c', false),
    ('D', false),
    ('T', false),
    ('q', false),
];

/// Parses getopt-style short options, allowing grouped flags (`-qn foo`)
/// and attached values (`-p1`). Positional arguments are returned separately.
fn parse_short_options(
    directive: &str,
    args: &str,
    table: OptionTable,
) -> PqResult<(Vec<(char, Option<String>)>, Vec<String>)> {
    let invalid = |message: String| SpecError::InvalidDirective {
        directive: directive.to_string(),
        message,
    };

    let mut options = Vec::new();
    let mut positional = Vec::new();
    let mut tokens = args.split_whitespace();
    while let Some(token) = tokens.next() {
        let Some(flags) = token.strip_prefix('-').filter(|f| !f.is_empty()) else {
            positional.push(token.to_string());
            continue;
        };
        for (i, flag) in flags.char_indices() {
            let takes_value = table
                .iter()
                .find(|(f, _)| *f == flag)
                .map(|(_, v)| *v)
                .ok_or_else(|| invalid(format!("unknown option '-{flag}'")))?;
            if !takes_value {
                options.push((flag, None));
                continue;
            }
            let attached = &flags[i + flag.len_utf8()..];
            let value = if attached.is_empty() {
                tokens
                    .next()
                    .ok_or_else(|| invalid(format!("option '-{flag}' requires a value")))?
            } else {
                attached
            };
            options.push((flag, Some(value.to_string())));
            break;
        }
    }
    Ok((options, positional))
}

fn parse_number_option(directive: &str, flag: char, value: &str) -> PqResult<u32> {
    value.parse().map_err(|_| {
        SpecError::InvalidDirective {
            directive: directive.to_string(),
            message: format!("option '-{flag}' expects a number, got '{value}'"),
        }
        .into()
    })
}

#[derive(Debug, Default)]
struct PatchOptions {
    number: Option<u32>,
    strip: Option<u32>,
}

fn parse_patch_options(args: &str) -> PqResult<PatchOptions> {
    const DIRECTIVE: &str = "%patch";
    let (options, positional) = parse_short_options(DIRECTIVE, args, PATCH_OPTIONS)?;
    let mut parsed = PatchOptions::default();
    for (flag, value) in options {
        match (flag, value) {
            ('p', Some(value)) => parsed.strip = Some(parse_number_option(DIRECTIVE, 'p', &value)?),
            ('P', Some(value)) => {
                parsed.number = Some(parse_number_option(DIRECTIVE, 'P', &value)?);
            }
            _ => {}
        }
    }
    if parsed.number.is_none()
        && let Some(first) = positional.first()
    {
        parsed.number = Some(parse_number_option(DIRECTIVE, 'P', first)?);
    }
    debug!(?parsed, args, "parsed %patch options");
    Ok(parsed)
}

fn parse_setup_options(args: &str) -> PqResult<SetupOptions> {
    const DIRECTIVE: &str = "%setup";
    let (options, _) = parse_short_options(DIRECTIVE, args, SETUP_OPTIONS)?;
    let mut parsed = SetupOptions::default();
    for (flag, value) in options {
        match (flag, value) {
            ('n', Some(value)) => parsed.name = Some(value),
            ('a', Some(value)) => {
                parsed.unpack_after = Some(parse_number_option(DIRECTIVE, 'a', &value)?);
            }
            ('b', Some(value)) => {
                parsed.unpack_before = Some(parse_number_option(DIRECTIVE, 'b', &value)?);
            }
            ('c', _) => parsed.create_dir = true,
            ('D', _) => parsed.no_delete_dir = true,
            ('T', _) => parsed.no_default_source = true,
            ('q', _) => parsed.quiet = true,
            _ => {}
        }
    }
    Ok(parsed)
}
