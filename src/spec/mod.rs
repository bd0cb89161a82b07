// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! RPM spec file model.
//!
//! ```text
//!              SpecFile
//!                 |
//!   +--------+----+----+---------+----------+
//!   |        |         |         |          |
//!   v        v         v         v          v
//! document  index   macros    oracle    reconcile
//!   |        |         |         |          |
//! Lines   Tags      %define   rpmspec -P  remove old series
//! Handles Patches   %{name}   (optional)  insert new series
//!         Sources                         on a cloned document
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rpmpq::spec::SpecFile;
//! use rpmpq::spec::reconcile::PatchConditions;
//!
//! let mut spec = SpecFile::from_file("packaging/foo.spec", None)?;
//! spec.update_patches(&["0001-fix.patch".to_string()], &PatchConditions::new())?;
//! spec.write()?;
//! # Ok::<(), rpmpq::error::PqError>(())
//! ```

pub mod archive;
pub mod document;
pub mod index;
pub mod locate;
pub mod macros;
pub mod oracle;
pub mod reconcile;


use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::error::{FsError, PqResult, SpecError};
use archive::guess_upstream_version;
use document::Document;
use index::{ManifestIndex, SourceEntry};
use macros::MacroTable;
use oracle::{MacroOracle, OracleReport, SourceKind};
use reconcile::{CommentHeuristic, GbpCommentHeuristic, PatchConditions, reconcile};

pub use locate::{guess_spec, guess_spec_repo, spec_from_repo};

static PACKAGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<name>.*[^ ])\s*<(?P<email>\S*)>").expect("valid packager regex")
});

/// A patch of the series, resolved against the spec directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPatch {
    pub number: u32,
    pub path: PathBuf,
    pub strip: u32,
}

/// A parsed spec file and its editable text.
#[derive(Debug, Clone)]
pub struct SpecFile {
    path: PathBuf,
    spec_dir: PathBuf,
    document: Document,
    index: ManifestIndex,
    macros: MacroTable,
    name: String,
    upstream_version: String,
    release: Option<String>,
    epoch: Option<String>,
    packager: Option<String>,
    orig_src_num: Option<u32>,
}

impl SpecFile {
    /// Reads and parses a spec file from disk.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::NoSpec` if the file cannot be read, or any error
    /// of [`SpecFile::parse`].
    pub fn from_file(path: impl AsRef<Path>, oracle: Option<&dyn MacroOracle>) -> PqResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SpecError::NoSpec(format!("Unable to read spec file '{}': {e}", path.display()))
        })?;
        let path = std::path::absolute(path).map_err(|e| FsError::io(path, e))?;
        Self::parse(&content, path, oracle)
    }

    /// Parses spec content; `path` is where it would be written back.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A non-ignored patch number is tagged twice.
    /// - A directive has malformed options.
    /// - The `Name` or `Version` tag is missing.
    pub fn parse(
        content: &str,
        path: impl Into<PathBuf>,
        oracle: Option<&dyn MacroOracle>,
    ) -> PqResult<Self> {
        let path = path.into();
        let spec_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let document = Document::parse(content);
        let mut index = ManifestIndex::parse(&document)?;

        let mut macros = MacroTable::new();
        for (_, line) in &document {
            macros.define_from_line(line);
        }

        let report = oracle.and_then(|oracle| match oracle.evaluate(content) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "spec evaluation failed, using built-in macro expansion");
                None
            }
        });

        let resolve = |macros: &MacroTable, tag: &str| -> Option<String> {
            if let Some(value) = report.as_ref().and_then(|r| r.resolve_tag(tag)) {
                return Some(value.to_string());
            }
            let raw = index.tag_value(tag)?;
            Some(macros.expand(raw).unwrap_or_else(|e| {
                debug!(tag, error = %e, "keeping unexpanded tag value");
                raw.to_string()
            }))
        };

        let name = resolve(&macros, "name").ok_or_else(|| SpecError::MissingAnchor {
            what: "'Name' tag".to_string(),
        })?;
        macros.define("name", name.as_str());
        let upstream_version =
            resolve(&macros, "version").ok_or_else(|| SpecError::MissingAnchor {
                what: "'Version' tag".to_string(),
            })?;
        macros.define("version", upstream_version.as_str());
        let release = resolve(&macros, "release");
        if let Some(release) = &release {
            macros.define("release", release.as_str());
        }
        let epoch = resolve(&macros, "epoch");
        let packager = index
            .tag("packager")
            .and_then(|_| resolve(&macros, "packager"));

        match &report {
            Some(report) => cross_check(&mut index, report),
            None => expand_filenames(&mut index, &macros),
        }

        let mut spec = Self {
            path,
            spec_dir,
            document,
            index,
            macros,
            name,
            upstream_version,
            release,
            epoch,
            packager,
            orig_src_num: None,
        };
        spec.guess_source_prefixes();
        spec.orig_src_num = spec.guess_orig_file();
        Ok(spec)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upstream version (the `Version` tag).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.upstream_version
    }

    #[must_use]
    pub fn release(&self) -> Option<&str> {
        self.release.as_deref()
    }

    #[must_use]
    pub fn epoch(&self) -> Option<&str> {
        self.epoch.as_deref()
    }

    #[must_use]
    pub fn packager(&self) -> Option<&str> {
        self.packager.as_deref()
    }

    /// `[epoch:]version[-release]`
    #[must_use]
    pub fn full_version(&self) -> String {
        let mut version = String::new();
        if let Some(epoch) = &self.epoch {
            version.push_str(epoch);
            version.push(':');
        }
        version.push_str(&self.upstream_version);
        if let Some(release) = &self.release {
            version.push('-');
            version.push_str(release);
        }
        version
    }

    /// Name and email from the `Packager` tag (`Name <email>`).
    #[must_use]
    pub fn packager_identity(&self) -> Option<(String, String)> {
        let caps = PACKAGER_RE.captures(self.packager.as_deref()?)?;
        Some((caps["name"].to_string(), caps["email"].to_string()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the spec file.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory where patches and sources live.
    #[must_use]
    pub fn spec_dir(&self) -> &Path {
        &self.spec_dir
    }

    /// Points patch lookups at another directory.
    pub fn set_spec_dir(&mut self, dir: impl Into<PathBuf>) {
        self.spec_dir = dir.into();
    }

    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    #[must_use]
    pub const fn index(&self) -> &ManifestIndex {
        &self.index
    }

    /// Current text of the spec file.
    #[must_use]
    pub fn content(&self) -> String {
        self.document.render()
    }

    /// Expands the macros known to the built-in expander.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::MacroExpand` for an unknown macro.
    pub fn macro_expand(&self, text: &str) -> PqResult<String> {
        self.macros.expand(text)
    }

    /// The primary upstream archive.
    #[must_use]
    pub fn orig_src(&self) -> Option<&SourceEntry> {
        self.orig_src_num
            .and_then(|num| self.index.sources().get(&num))
    }

    /// Auto-managed patches in number order.
    ///
    /// With `include_unapplied`, patches without a `%patch` macro are listed too.
    #[must_use]
    pub fn patch_series(&self, include_unapplied: bool) -> Vec<SeriesPatch> {
        self.index
            .patches()
            .values()
            .filter(|p| p.autoupdate && (include_unapplied || p.applied))
            .map(|p| SeriesPatch {
                number: p.number,
                path: self.spec_dir.join(&p.filename),
                strip: p.strip,
            })
            .collect()
    }

    /// Replaces the auto-managed patch series with `filenames`.
    ///
    /// The document is only replaced when the whole update succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if no anchor for tags or macros can be found.
    pub fn update_patches(
        &mut self,
        filenames: &[String],
        conditions: &PatchConditions,
    ) -> PqResult<Vec<(u32, String)>> {
        self.update_patches_with(filenames, conditions, &GbpCommentHeuristic)
    }

    /// [`SpecFile::update_patches`] with a custom comment heuristic.
    ///
    /// # Errors
    ///
    /// Same as [`SpecFile::update_patches`].
    pub fn update_patches_with(
        &mut self,
        filenames: &[String],
        conditions: &PatchConditions,
        heuristic: &dyn CommentHeuristic,
    ) -> PqResult<Vec<(u32, String)>> {
        let mut document = self.document.clone();
        let assigned = reconcile(&mut document, &self.index, filenames, conditions, heuristic)?;
        let mut index = ManifestIndex::parse(&document)?;

        // Line handles survive the clone; keep what was resolved before
        for (num, source) in index.sources_mut() {
            if let Some(old) = self.index.sources().get(num) {
                *source = old.clone();
            }
        }
        for (num, patch) in index.patches_mut() {
            match self.index.patches().get(num) {
                Some(old) if !old.autoupdate && !patch.autoupdate => {
                    patch.filename.clone_from(&old.filename);
                }
                _ => {
                    if let Ok(expanded) = self.macros.expand(&patch.name) {
                        patch.filename = file_name_of(&expanded);
                    }
                }
            }
        }

        self.document = document;
        self.index = index;
        Ok(assigned)
    }

    /// Writes the document back to [`SpecFile::path`] atomically.
    ///
    /// # Errors
    ///
    /// Returns `FsError::IoError` if the temporary file cannot be written or renamed.
    pub fn write(&self) -> PqResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".rpmpq")
            .suffix(".spec")
            .tempfile_in(&dir)
            .map_err(|e| FsError::io(&dir, e))?;
        temp.write_all(self.content().as_bytes())
            .map_err(|e| FsError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| FsError::io(&self.path, e.error))?;
        debug!(path = %self.path.display(), "wrote spec file");
        Ok(())
    }

    fn guess_source_prefixes(&mut self) {
        for source in self.index.sources_mut().values_mut() {
            if !source.is_archive() {
                continue;
            }
            source.prefix = Some(match guess_upstream_version(&source.archive.base) {
                Some((name, version)) => format!("{name}-{version}/"),
                None => format!("{}/", source.archive.base),
            });
        }
    }

    /// Picks the primary archive and refines its prefix from `%setup`.
    fn guess_orig_file(&mut self) -> Option<u32> {
        let sources = self.index.sources();
        let mut orig = None;
        for (num, source) in sources {
            if !source.is_archive() {
                continue;
            }
            if source.filename.starts_with(&self.name) {
                orig = Some(*num);
                break;
            }
            if orig.is_none() {
                orig = Some(*num);
            }
        }

        let num = orig?;
        let prefix = {
            let source = &sources[&num];
            source.setup.as_ref().map(|setup| {
                if setup.create_dir {
                    String::new()
                } else if let Some(name) = &setup.name {
                    match self.macros.expand(name) {
                        Ok(expanded) => format!("{expanded}/"),
                        Err(e) => {
                            warn!(error = %e, "couldn't determine source prefix from %setup -n");
                            format!("{}/", source.archive.base)
                        }
                    }
                } else {
                    format!("{}-{}/", self.name, self.upstream_version)
                }
            })
        };
        if let (Some(prefix), Some(source)) = (prefix, self.index.sources_mut().get_mut(&num)) {
            source.prefix = Some(prefix);
        }
        Some(num)
    }
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned())
}

/// Takes expanded file names from the oracle and reports disagreements.
fn cross_check(index: &mut ManifestIndex, report: &OracleReport) {
    for source in report.list_sources() {
        match source.kind {
            SourceKind::Archive => match index.sources_mut().get_mut(&source.number) {
                Some(entry) => entry.set_full_path(&source.name),
                None => warn!(
                    source = source.number,
                    "source reported by the evaluator has no matching Source tag"
                ),
            },
            SourceKind::Patch => match index.patches_mut().get_mut(&source.number) {
                Some(entry) => entry.filename = file_name_of(&source.name),
                None => warn!(
                    patch = source.number,
                    "patch reported by the evaluator has no matching Patch tag"
                ),
            },
        }
    }

    let reported = |kind: SourceKind, number: u32| {
        report
            .list_sources()
            .iter()
            .any(|s| s.kind == kind && s.number == number)
    };
    for number in index.sources().keys() {
        if !reported(SourceKind::Archive, *number) {
            warn!(source = number, "Source tag not seen by the evaluator");
        }
    }
    for number in index.patches().keys() {
        if !reported(SourceKind::Patch, *number) {
            warn!(patch = number, "Patch tag not seen by the evaluator");
        }
    }
}

/// Expands macros in source and patch file names with the built-in expander.
fn expand_filenames(index: &mut ManifestIndex, macros: &MacroTable) {
    for source in index.sources_mut().values_mut() {
        match macros.expand(&source.full_path) {
            Ok(expanded) => source.set_full_path(&expanded),
            Err(e) => debug!(source = source.number, error = %e, "keeping unexpanded source"),
        }
    }
    for patch in index.patches_mut().values_mut() {
        match macros.expand(&patch.name) {
            Ok(expanded) => patch.filename = file_name_of(&expanded),
            Err(e) => debug!(patch = patch.number, error = %e, "keeping unexpanded patch name"),
        }
    }
}
