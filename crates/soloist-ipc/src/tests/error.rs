// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::time::Duration;

use crate::IpcError;

#[test]
fn test_predicates_match_variants() {
    assert!(IpcError::AlreadyExists.is_already_exists());
    assert!(IpcError::NotFound.is_not_found());
    assert!(IpcError::LockTimeout(Duration::from_millis(5)).is_timeout());

    assert!(!IpcError::NotFound.is_already_exists());
    assert!(!IpcError::AlreadyAttached.is_not_found());
}

#[test]
fn test_os_error_names_the_call() {
    let error = IpcError::Os {
        op: "shmget",
        source: std::io::Error::from_raw_os_error(13),
    };

    assert!(error.to_string().starts_with("shmget failed: "));
    assert!(std::error::Error::source(&error).is_some());
}
