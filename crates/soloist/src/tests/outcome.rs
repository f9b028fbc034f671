// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use crate::{ClaimOutcome, IpcError};

#[test]
fn test_only_claimed_is_claimed() {
    assert!(ClaimOutcome::Claimed.is_claimed());
    assert!(!ClaimOutcome::AlreadyRunning.is_claimed());
    assert!(!ClaimOutcome::RaceLost.is_claimed());
    assert!(!ClaimOutcome::Unavailable(IpcError::NotFound).is_claimed());
}

#[test]
fn test_display() {
    assert_eq!(ClaimOutcome::Claimed.to_string(), "claimed");
    assert_eq!(
        ClaimOutcome::AlreadyRunning.to_string(),
        "another instance is running"
    );
    assert!(
        ClaimOutcome::Unavailable(IpcError::AlreadyAttached)
            .to_string()
            .starts_with("instance marker unavailable: ")
    );
}
