// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!                PqError (~24 bytes)
//!                       |
//!   +------+------+-----+-----+------+------+--------+
//!   |      |      |     |     |      |      |        |
//!   v      v      v     v     v      v      v        v
//! Bail    Git   Spec  Patch  Cfg   Proc    Fs   Io/Other
//!         Box   Box   Box    Box   Box     Box   Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Git     CommandFailed, NotAncestor, BranchExists,
//!           BranchNotFound, OnPatchQueueBranch, InvalidTreeish
//!   Spec    NoSpec, MissingAnchor, DuplicatePatch,
//!           LocationUndetermined, MacroExpand
//!   Patch   ApplyFailed, UnsupportedCompression, InvalidSquash
//!   Config  ParseError, InvalidValue
//!   Process ExecutableNotFound, SpawnFailed, NonZeroExit
//!   Fs      NotFound, IoError
//!
//! All variants boxed => PqError fits in 24 bytes.
//! ```

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`PqError`].
pub type PqResult<T> = std::result::Result<T, PqError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum PqError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// Git operation failed.
    #[error("git error: {0}")]
    Git(#[from] Box<GitError>),

    /// Spec file parsing or rewriting failed.
    #[error("spec error: {0}")]
    Spec(#[from] Box<SpecError>),

    /// Patch generation, staging or application failed.
    #[error("patch error: {0}")]
    Patch(#[from] Box<PatchError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Process execution error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Filesystem error.
    #[error("filesystem error: {0}")]
    Fs(#[from] Box<FsError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a fatal [`PqError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> PqError {
    PqError::Bailed(message.into().into_boxed_str())
}

impl PqError {
    /// Returns the git sub-error, if this is one.
    #[must_use]
    pub fn as_git(&self) -> Option<&GitError> {
        match self {
            Self::Git(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the spec sub-error, if this is one.
    #[must_use]
    pub fn as_spec(&self) -> Option<&SpecError> {
        match self {
            Self::Spec(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the patch sub-error, if this is one.
    #[must_use]
    pub fn as_patch(&self) -> Option<&PatchError> {
        match self {
            Self::Patch(e) => Some(e),
            _ => None,
        }
    }
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for PqError {
                fn from(err: $error) -> Self {
                    PqError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    GitError => Git,
    SpecError => Spec,
    PatchError => Patch,
    ConfigError => Config,
    ProcessError => Process,
    FsError => Fs,
    std::io::Error => Io,
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
///
/// Large error types are boxed to keep enum size manageable.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to get HEAD reference.
    #[error("failed to get head reference: {0}")]
    Head(#[from] gix::reference::find::existing::Error),

    /// Failed to look up a reference.
    #[error("failed to find reference: {0}")]
    Reference(#[from] gix::reference::find::Error),
}

// --- Git Errors ---

/// Git operation errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Repository not found at the specified path.
    #[error("repository not found: {path}")]
    RepoNotFound { path: String },

    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),

    /// A reference did not resolve to any object.
    #[error("invalid treeish object {treeish}")]
    InvalidTreeish { treeish: String },

    /// Start commit is not an ancestor of the end commit.
    #[error("start commit '{start}' not an ancestor of end commit '{end}'")]
    NotAncestor { start: String, end: String },

    /// No tag/commit matches the upstream version.
    #[error("couldn't find upstream version {version} (tried '{tag}')")]
    UpstreamNotFound { version: String, tag: String },

    /// Branch that must not exist does.
    #[error("{message}")]
    BranchExists { branch: String, message: String },

    /// Branch not found.
    #[error("branch '{branch}' does not exist")]
    BranchNotFound { branch: String },

    /// Action refused because HEAD is on a patch-queue branch.
    #[error("{message}")]
    OnPatchQueueBranch { branch: String, message: String },

    /// HEAD is detached where a branch is required.
    #[error("HEAD is detached in {path}")]
    DetachedHead { path: String },
}

// --- Spec Errors ---

/// Spec file parsing and rewriting errors.
#[derive(Debug, Error)]
pub enum SpecError {
    /// No spec file could be found or read.
    #[error("no spec file: {0}")]
    NoSpec(String),

    /// More than one candidate spec file.
    #[error("multiple spec files found ({0}), don't know which to use")]
    MultipleSpecs(String),

    /// Manifest lacks a tag or directive needed as an anchor.
    #[error("structural error: no {what} found in spec file")]
    MissingAnchor { what: String },

    /// A non-ignored patch number occurs twice.
    #[error("Patch{number} found multiple times, duplicate patch would break autoupdate")]
    DuplicatePatch { number: u32 },

    /// No place to insert `%patch` macros.
    #[error("location of %patch macros could not be determined")]
    LocationUndetermined,

    /// Macro expansion failed.
    #[error("unknown macro '{0}'")]
    MacroExpand(String),

    /// A directive had malformed arguments.
    #[error("invalid arguments for {directive}: {message}")]
    InvalidDirective { directive: String, message: String },
}

// --- Patch Errors ---

/// Patch generation, staging and application errors.
#[derive(Debug, Error)]
pub enum PatchError {
    /// Applying a patch to the worktree/index failed.
    #[error("failed to apply '{patch}': {message}")]
    ApplyFailed { patch: String, message: String },

    /// Patch uses a compression the importer cannot unpack.
    #[error("unsupported patch compression '{compression}' for '{patch}', giving up")]
    UnsupportedCompression { patch: String, compression: String },

    /// Squash point is not part of the exported history.
    #[error("given squash point '{squash}' not in the history of end commit '{end}'")]
    InvalidSquash { squash: String, end: String },

    /// Patch file could not be read or written.
    #[error("patch I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Format string references an unknown field.
    #[error("unknown field '%({field})s' in format string '{format}'")]
    UnknownFormatField { format: String, field: String },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with a code outside the success set.
    #[error("process '{command}' exited with code {code}")]
    NonZeroExit { command: String, code: i32 },

    /// Failed to feed or read process streams.
    #[error("failed to read output from process '{command}': {message}")]
    OutputError { command: String, message: String },
}

// --- Filesystem Errors ---

/// Filesystem operation errors.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// General I/O error.
    #[error("I/O error on '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests;
