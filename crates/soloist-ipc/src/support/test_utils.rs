// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Cleanup helpers for tests that create IPC objects.
//!
//! System V objects outlive the process that created them, so every test
//! key should be purged once the test is done.

use soloist_key::KeyPair;

use crate::{LockSemaphore, SharedSegment};

/// Removes the segment and semaphore derived from `key`, if present.
pub fn purge(key: &str) {
    let pair = KeyPair::derive(key);
    SharedSegment::purge(pair.segment());
    LockSemaphore::purge(pair.lock());
}

/// Calls [`purge`] on drop.
#[derive(Debug)]
pub struct PurgeOnDrop(pub String);

impl Drop for PurgeOnDrop {
    fn drop(&mut self) {
        purge(&self.0);
    }
}
