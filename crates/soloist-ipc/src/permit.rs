// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! LockPermit - scoped ownership of the lock semaphore's single count.

use crate::LockSemaphore;

/// Proof that the lock semaphore is held. Releases it on drop.
#[must_use = "the lock is released as soon as the permit is dropped"]
pub struct LockPermit<'a> {
    semaphore: &'a LockSemaphore,
}

impl<'a> LockPermit<'a> {
    pub(crate) fn new(semaphore: &'a LockSemaphore) -> Self {
        Self { semaphore }
    }
}

impl core::fmt::Debug for LockPermit<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockPermit")
            .field("semaphore", self.semaphore)
            .finish()
    }
}

impl Drop for LockPermit<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.semaphore.release() {
            tracing::warn!(error = %e, "failed to release lock semaphore");
        }
    }
}
