// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::time::Duration;

use crate::InstanceGuard;

/// Size of the marker segment. Its content is never read.
pub const DEFAULT_SEGMENT_SIZE: usize = core::mem::size_of::<u64>();

/// Tunables for an [`InstanceGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Bound on every wait for the lock semaphore. `None` waits forever.
    ///
    /// When a bounded wait expires, detection reports "not running" and a
    /// claim goes ahead with the exclusive create alone.
    pub lock_timeout: Option<Duration>,

    /// Run the attach-then-detach reset cycle on construction.
    pub reset_on_open: bool,

    /// Size in bytes of the created segment.
    pub segment_size: usize,

    /// Unix permission bits for created IPC objects.
    pub mode: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lock_timeout: None,
            reset_on_open: true,
            segment_size: DEFAULT_SEGMENT_SIZE,
            mode: soloist_ipc::DEFAULT_MODE,
        }
    }
}

/// Builder for an [`InstanceGuard`] with non-default settings.
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use soloist::InstanceGuard;
///
/// let mut guard = InstanceGuard::builder("com.example.editor")
///     .lock_timeout(Duration::from_secs(2))
///     .build();
///
/// let first = guard.try_to_run();
/// ```
#[derive(Debug, Clone)]
pub struct GuardBuilder {
    key: String,
    config: GuardConfig,
}

impl GuardBuilder {
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            config: GuardConfig::default(),
        }
    }

    /// Bounds lock semaphore waits.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.lock_timeout = Some(timeout);
        self
    }

    /// Enables or disables the reset cycle on construction.
    pub fn reset_on_open(mut self, enabled: bool) -> Self {
        self.config.reset_on_open = enabled;
        self
    }

    /// Sets the created segment size. Clamped to at least one byte.
    pub fn segment_size(mut self, size: usize) -> Self {
        self.config.segment_size = size.max(1);
        self
    }

    /// Sets Unix permission bits for created IPC objects.
    pub fn mode(mut self, mode: u32) -> Self {
        self.config.mode = mode;
        self
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: GuardConfig) -> Self {
        self.config = GuardConfig {
            segment_size: config.segment_size.max(1),
            ..config
        };
        self
    }

    /// Settings accumulated so far.
    pub fn current(&self) -> &GuardConfig {
        &self.config
    }

    /// Opens the guard's resources and runs the reset cycle if enabled.
    pub fn build(self) -> InstanceGuard {
        InstanceGuard::open(self.key, self.config)
    }
}
