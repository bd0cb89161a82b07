// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |              options / pq actions
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |            pq             |
//!              | export import rebase ...  |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!             generate     replay    config
//!             commits->   patches->  TOML, env,
//!             patches     commits    overrides
//!                 |           |
//!          +------+-----+-----+
//!          v            v
//!        spec          git
//!   document/index   git CLI
//!   reconcile        (+ gix)
//!
//!   +-----------------------------------------+
//!   |  core   process execution               |
//!   +-----------------------------------------+
//!   |  foundation   error, logging, utility   |
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod core;
pub mod error;
pub mod git;
pub mod logging;
pub mod pq;
pub mod spec;
pub mod utility;
