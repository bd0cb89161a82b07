// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Filesystem utilities.
//!
//! ```text
//! walk:  walk_files()   ignore::Walk, sorted
//!        find_files()   wax glob over relative paths
//!        WalkOptions    max_depth, hidden, gitignore, skip_dirs
//! ```

pub mod walk;
