// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Error types for soloist-ipc.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors from shared segment and lock semaphore operations.
#[derive(Debug, Error)]
pub enum IpcError {
    /// Exclusive creation failed because the segment already exists.
    #[error("shared segment already exists")]
    AlreadyExists,

    /// No segment with the requested identifier exists.
    #[error("shared segment does not exist")]
    NotFound,

    /// The handle is already attached to a segment.
    #[error("shared segment handle is already attached")]
    AlreadyAttached,

    /// A bounded wait on the lock semaphore expired.
    #[error("lock semaphore not acquired within {0:?}")]
    LockTimeout(Duration),

    /// Any other OS failure.
    #[error("{op} failed: {source}")]
    Os {
        /// The failing OS call.
        op: &'static str,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },
}

impl IpcError {
    /// Captures `errno` / `GetLastError` for the failing call `op`.
    pub(crate) fn last_os(op: &'static str) -> Self {
        Self::Os {
            op,
            source: io::Error::last_os_error(),
        }
    }

    /// True for [`IpcError::AlreadyExists`], the race-lost condition.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists)
    }

    /// True for [`IpcError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// True for [`IpcError::LockTimeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::LockTimeout(_))
    }
}
