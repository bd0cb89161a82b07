// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git operations module.
//!
//! ```text
//!           Repository (repo.rs)
//!   rev_parse / commits / diff / branches / trees
//!                  |
//!      ,-----------------------,
//!      |   backend (traits)    |
//!      '--+-----------------+--'
//!         |                 |
//!         v                 v
//!    GitQuery          GitMutation
//!   (gix, read)        (CLI, write)
//!         |                 |
//!         v                 v
//!    GixBackend        ShellBackend
//!    .is_repo          .checkout
//!    .workdir          .create_branch
//!    .branch           .delete_branch
//!    .has_branch       .reset_hard
//! ```
//!
//! **`GixBackend`**: pure Rust, no subprocess, read-only.
//! **`ShellBackend`**: git CLI for writes and diff/apply plumbing.

pub mod backend;
pub mod repo;


pub use repo::{Author, CommitInfo, Repository, TreeEntry};
