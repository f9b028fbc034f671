// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::fmt;

use soloist_ipc::IpcError;

/// Result of [`InstanceGuard::claim`](crate::InstanceGuard::claim).
#[derive(Debug)]
pub enum ClaimOutcome {
    /// This process is now the running instance.
    Claimed,
    /// Detection found another running instance; nothing was attempted.
    AlreadyRunning,
    /// Detection found nothing but another process created the segment
    /// first.
    RaceLost,
    /// The OS refused to create the segment.
    Unavailable(IpcError),
}

impl ClaimOutcome {
    /// True only for [`ClaimOutcome::Claimed`].
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed)
    }
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claimed => f.write_str("claimed"),
            Self::AlreadyRunning => f.write_str("another instance is running"),
            Self::RaceLost => f.write_str("another instance started concurrently"),
            Self::Unavailable(e) => write!(f, "instance marker unavailable: {e}"),
        }
    }
}
