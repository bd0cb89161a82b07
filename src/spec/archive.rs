// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Archive and compression detection from file names.
//!
//! ```text
//! foo-1.0.tar.gz  → base "foo-1.0", Tar, Gzip
//! foo-1.0.tgz     → base "foo-1.0", Tar, Gzip
//! fix.patch.bz2   → base "fix.patch", -, Bzip2
//! notes.txt       → base "notes.txt", -, -
//! ```

use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// Container format of an upstream source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Tar,
    Zip,
}

/// Stream compression applied to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
    Xz,
    Lzma,
}

impl Compression {
    /// Maps a file extension to a compression.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "gz" | "gzip" => Some(Self::Gzip),
            "bz2" | "bzip2" => Some(Self::Bzip2),
            "xz" => Some(Self::Xz),
            "lzma" => Some(Self::Lzma),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Lzma => "lzma",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ArchiveFormat {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "tar" => Some(Self::Tar),
            "zip" => Some(Self::Zip),
            _ => None,
        }
    }

    fn from_alias(ext: &str) -> Option<(Self, Compression)> {
        match ext {
            "tgz" => Some((Self::Tar, Compression::Gzip)),
            "tbz2" | "tbz" => Some((Self::Tar, Compression::Bzip2)),
            "tlz" => Some((Self::Tar, Compression::Lzma)),
            "txz" => Some((Self::Tar, Compression::Xz)),
            _ => None,
        }
    }
}

/// Result of [`parse_archive_filename`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    /// File name with archive and compression extensions removed.
    pub base: String,
    pub format: Option<ArchiveFormat>,
    pub compression: Option<Compression>,
}

/// Splits a file name into its base name, archive format and compression.
///
/// Only the final path component is considered.
#[must_use]
pub fn parse_archive_filename(filename: &str) -> ArchiveName {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename);

    let mut parts: Vec<&str> = basename.split('.').collect();
    let mut format = None;
    let mut compression = None;

    if parts.len() > 1 {
        let last = parts[parts.len() - 1];
        if let Some((fmt, comp)) = ArchiveFormat::from_alias(last) {
            parts.pop();
            format = Some(fmt);
            compression = Some(comp);
        } else {
            if let Some(comp) = Compression::from_extension(last) {
                parts.pop();
                compression = Some(comp);
            }
            if parts.len() > 1
                && let Some(fmt) = ArchiveFormat::from_extension(parts[parts.len() - 1])
            {
                parts.pop();
                format = Some(fmt);
            }
        }
    }

    ArchiveName {
        base: parts.join("."),
        format,
        compression,
    }
}

static ORIG_TARBALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[a-z\d.+-]+)_(?P<version>\d[\w.+~:-]*)\.orig$")
        .expect("valid orig tarball regex")
});

static UPSTREAM_TARBALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z\d.+_-]+?)-(?P<version>\d[\w.+~]*)$")
        .expect("valid upstream tarball regex")
});

/// Guesses `(name, version)` of an upstream archive from its base name.
///
/// Understands `name-1.2` and Debian style `name_1.2.orig`.
#[must_use]
pub fn guess_upstream_version(base: &str) -> Option<(String, String)> {
    [&*ORIG_TARBALL_RE, &*UPSTREAM_TARBALL_RE]
        .into_iter()
        .find_map(|re| re.captures(base))
        .map(|caps| (caps["name"].to_string(), caps["version"].to_string()))
}
