// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for rpmpq using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! rpmpq [global options] [pq options] <command>
//! export [--drop] [--export-rev TREEISH]
//! import [--force]
//! rebase
//! drop
//! switch
//! apply PATCH
//! convert [--force] [--retain-history] [--new-packaging-dir DIR]
//! options | inis | version
//! ```

pub mod global;
pub mod pq;

#[cfg(test)]
mod tests;

use crate::cli::global::GlobalOptions;
use crate::cli::pq::{PqCommand, PqOptions};
use clap::{Parser, Subcommand};

/// RPM spec patch-queue tool
///
/// Keeps a patch-queue branch and the patches of an RPM spec file in sync.
#[derive(Debug, Parser)]
#[command(
    name = "rpmpq",
    author,
    version,
    about = "Maintain patches of an RPM package on a git patch-queue branch",
    long_about = "rpmpq Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Maintain the patches of an RPM package as commits on a\n\
                  patch-queue branch. `rpmpq import` turns the patches listed in\n\
                  the spec file into commits, `rpmpq export` turns the commits back\n\
                  into patches and updates the spec file.",
    after_help = "CONFIGURATION FILES:\n\n\
                  rpmpq reads `rpmpq.toml` from the repository root if present.\n\
                  Additional files can be given with --config and are loaded in\n\
                  order after it. RPMPQ_<SECTION>__<KEY> environment variables\n\
                  override files; --set and dedicated flags override everything."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Patch-queue options
    #[command(flatten)]
    pub pq: PqOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the configuration files used.
    Inis,

    #[command(flatten)]
    Pq(PqCommand),
}

impl Cli {
    /// Configuration overrides from all flags, lowest priority first.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = self.global.to_config_overrides();
        overrides.extend(self.pq.to_config_overrides());
        if let Some(Command::Pq(command)) = &self.command {
            overrides.extend(command.to_config_overrides());
        }
        overrides
    }
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
