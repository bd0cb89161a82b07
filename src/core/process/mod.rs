// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Synchronous process spawning.
//!
//! ```text
//! ProcessBuilder::new("rpmspec")
//!   .args() .cwd() .env() .stdin() .capture_stdout()
//!   .run()
//!       --> std::process::Command
//!           stdin fed from a scoped thread
//!       --> ProcessOutput { exit_code, stdout, stderr }
//! ```

pub mod builder;
mod runner;
#[cfg(test)]
mod tests;
