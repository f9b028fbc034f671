// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! InstanceGuard - detection and claim protocol.
//!
//! # Protocol
//!
//! The segment's existence is the "an instance is running" bit. Every
//! create/attach/detach that must be atomic with respect to other
//! processes runs while holding the lock semaphore, and the semaphore is
//! never held across more than one such sequence.
//!
//! - **claim**: detect first (no create if another instance is seen),
//!   then exclusively create the segment under the lock.
//! - **detect**: attach under the lock and detach right away; a successful
//!   attach means a segment exists.
//! - **release**: detach under the lock.
//!
//! # Degraded Modes
//!
//! If the semaphore cannot be opened, or a bounded wait expires, the
//! guard keeps going without it: detection reports "not running" and the
//! claim relies on the exclusive create, which the OS arbitrates on its
//! own. The reset cycle is skipped in that case.

use std::time::Duration;

use soloist_ipc::{IpcError, LockPermit, LockSemaphore, SharedSegment};
use soloist_key::{DerivedIdentifier, KeyPair};

use crate::config::{GuardBuilder, GuardConfig};
use crate::outcome::ClaimOutcome;

/// Cross-process single-instance guard for one application key.
///
/// The claim is released when the guard is dropped.
pub struct InstanceGuard {
    key: String,
    ids: KeyPair,
    config: GuardConfig,
    segment: SharedSegment,
    lock: Option<LockSemaphore>,
}

/// Enters the critical section.
///
/// `Ok(None)` means the guard has no semaphore and runs unguarded.
fn enter(
    lock: Option<&LockSemaphore>,
    timeout: Option<Duration>,
) -> Result<Option<LockPermit<'_>>, IpcError> {
    let Some(lock) = lock else {
        return Ok(None);
    };

    match timeout {
        Some(timeout) => lock.acquire_timeout(timeout).map(Some),
        None => lock.acquire().map(Some),
    }
}

impl InstanceGuard {
    /// Creates a guard for `key` with default settings.
    ///
    /// Never fails: OS errors only degrade the guard (see module docs).
    pub fn new(key: impl Into<String>) -> Self {
        Self::builder(key).build()
    }

    /// Starts a [`GuardBuilder`] for `key`.
    pub fn builder(key: impl Into<String>) -> GuardBuilder {
        GuardBuilder::new(key.into())
    }

    pub(crate) fn open(key: String, config: GuardConfig) -> Self {
        let ids = KeyPair::derive(&key);
        let lock = LockSemaphore::open(ids.lock(), config.mode);

        Self::with_lock(key, ids, config, lock)
    }

    /// Assembles a guard around the outcome of opening its semaphore.
    ///
    /// A failed open leaves the guard unguarded.
    pub(crate) fn with_lock(
        key: String,
        ids: KeyPair,
        config: GuardConfig,
        lock: Result<LockSemaphore, IpcError>,
    ) -> Self {
        let segment = SharedSegment::new(ids.segment(), config.mode);

        let lock = match lock {
            Ok(lock) => Some(lock),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "lock semaphore unavailable, running unguarded");
                None
            }
        };

        let mut guard = Self {
            key,
            ids,
            config,
            segment,
            lock,
        };

        if guard.config.reset_on_open {
            guard.reset_stale_segment();
        }

        guard
    }

    /// Attach-then-detach cycle that clears a stale segment.
    ///
    /// A System V segment whose holder died keeps existing with nobody
    /// attached. Detaching as the last process marks it for removal, so
    /// attaching and detaching once is enough to clear it, while a live
    /// holder keeps its segment. Best-effort and silent: a missing segment
    /// is the common case and any failure is only logged.
    pub(crate) fn reset_stale_segment(&mut self) {
        if self.segment.is_attached() {
            return;
        }

        let _permit = match enter(self.lock.as_ref(), self.config.lock_timeout) {
            Ok(Some(permit)) => permit,
            Ok(None) => {
                tracing::debug!(key = %self.key, "no lock semaphore, skipping segment reset");
                return;
            }
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "skipping segment reset");
                return;
            }
        };

        match self.segment.attach() {
            Ok(()) => tracing::trace!(key = %self.key, "segment present during reset"),
            Err(e) if e.is_not_found() => {}
            Err(e) => tracing::debug!(key = %self.key, error = %e, "reset attach failed"),
        }

        if let Err(e) = self.segment.detach() {
            tracing::debug!(key = %self.key, error = %e, "reset detach failed");
        }
    }

    /// Tries to become the running instance for this key.
    ///
    /// `true` iff this process now holds the claim. `false` covers another
    /// running instance, a lost race and OS failures alike; see
    /// [`claim`](Self::claim) to tell them apart.
    pub fn try_to_run(&mut self) -> bool {
        self.claim().is_claimed()
    }

    /// Like [`try_to_run`](Self::try_to_run), with the reason on failure.
    ///
    /// Calling it again after a successful claim returns
    /// [`ClaimOutcome::Claimed`] without touching the OS.
    pub fn claim(&mut self) -> ClaimOutcome {
        if self.segment.is_owned() {
            return ClaimOutcome::Claimed;
        }

        if self.is_another_running() {
            tracing::debug!(key = %self.key, "another instance is running");
            return ClaimOutcome::AlreadyRunning;
        }

        let created = {
            let _permit = match enter(self.lock.as_ref(), self.config.lock_timeout) {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "claiming without the lock semaphore");
                    None
                }
            };

            self.segment.create(self.config.segment_size)
        };

        match created {
            Ok(()) => {
                tracing::info!(key = %self.key, segment = %self.ids.segment(), "claimed single instance");
                ClaimOutcome::Claimed
            }
            Err(e) => {
                self.release();

                if e.is_already_exists() {
                    tracing::debug!(key = %self.key, "lost the race to another instance");
                    ClaimOutcome::RaceLost
                } else {
                    tracing::warn!(key = %self.key, error = %e, "failed to create instance marker");
                    ClaimOutcome::Unavailable(e)
                }
            }
        }
    }

    /// True iff some other holder currently has the claim for this key.
    ///
    /// Never creates the segment. Returns `false` for the holder itself and
    /// whenever the probe cannot tell (attach error, lock unavailable).
    pub fn is_another_running(&mut self) -> bool {
        if self.segment.is_owned() {
            return false;
        }

        let _permit = match enter(self.lock.as_ref(), self.config.lock_timeout) {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "cannot probe, assuming no other instance");
                return false;
            }
        };

        let running = match self.segment.attach() {
            Ok(()) => true,
            Err(e) if e.is_not_found() => false,
            Err(e) => {
                tracing::debug!(key = %self.key, error = %e, "probe attach failed");
                false
            }
        };

        if running {
            if let Err(e) = self.segment.detach() {
                tracing::warn!(key = %self.key, error = %e, "failed to detach probe");
            }
        }

        running
    }

    /// Drops any attachment this guard holds. Idempotent and silent.
    ///
    /// Runs automatically on drop.
    pub fn release(&mut self) {
        if !self.segment.is_attached() {
            return;
        }

        let _permit = match enter(self.lock.as_ref(), self.config.lock_timeout) {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "releasing without the lock semaphore");
                None
            }
        };

        let owned = self.segment.is_owned();

        match self.segment.detach() {
            Ok(()) if owned => tracing::debug!(key = %self.key, "released single instance"),
            Ok(()) => {}
            Err(e) => tracing::warn!(key = %self.key, error = %e, "failed to detach segment"),
        }
    }

    /// True iff this guard holds the claim.
    pub fn is_running(&self) -> bool {
        self.segment.is_owned()
    }

    /// The application key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Identifier addressing the lock semaphore.
    pub fn lock_id(&self) -> &DerivedIdentifier {
        self.ids.lock()
    }

    /// Identifier addressing the shared segment.
    pub fn segment_id(&self) -> &DerivedIdentifier {
        self.ids.segment()
    }

    /// Settings this guard was built with.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// True iff the guard has a lock semaphore to gate on.
    pub fn is_guarded(&self) -> bool {
        self.lock.is_some()
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for InstanceGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InstanceGuard")
            .field("key", &self.key)
            .field("segment", &self.segment)
            .field("lock", &self.lock)
            .finish_non_exhaustive()
    }
}
