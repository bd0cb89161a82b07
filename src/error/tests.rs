// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{GitError, PatchError, PqError, PqResult, SpecError};

#[test]
fn test_spec_error_display() {
    let err = SpecError::DuplicatePatch { number: 3 };
    insta::assert_snapshot!(
        err.to_string(),
        @"Patch3 found multiple times, duplicate patch would break autoupdate"
    );
}

#[test]
fn test_ancestry_error_display() {
    let err: PqError = GitError::NotAncestor {
        start: "upstream/1.0".to_string(),
        end: "HEAD".to_string(),
    }
    .into();
    insta::assert_snapshot!(
        err.to_string(),
        @"git error: start commit 'upstream/1.0' not an ancestor of end commit 'HEAD'"
    );
}

#[test]
fn test_sub_error_accessors() {
    let err: PqError = PatchError::UnsupportedCompression {
        patch: "a.patch.xz".to_string(),
        compression: "xz".to_string(),
    }
    .into();
    assert!(err.as_patch().is_some());
    assert!(err.as_git().is_none());
    assert!(err.as_spec().is_none());
}

#[test]
fn test_pq_error_size() {
    // Box<str> variants (Bailed, Other) are 16 bytes (fat pointer: ptr + len)
    // With discriminant + alignment = 24 bytes
    let size = std::mem::size_of::<PqError>();
    assert!(size <= 24, "PqError is {size} bytes, expected <= 24");
}

#[test]
fn test_pq_result_size() {
    let size = std::mem::size_of::<PqResult<()>>();
    assert!(size <= 24, "PqResult<()> is {size} bytes, expected <= 24");
}
