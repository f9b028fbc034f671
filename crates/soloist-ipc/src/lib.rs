// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # soloist_ipc
//!
//! The two OS resources behind a single-instance guard:
//!
//! - [`SharedSegment`]: a named shared-memory block used only as an
//!   existence marker. Creation is exclusive, attaching is a probe.
//! - [`LockSemaphore`]: a named semaphore with a count of one, used as a
//!   short mutual-exclusion gate around create/attach/detach. Acquiring it
//!   yields a [`LockPermit`] that gives the count back on drop.
//!
//! Both handles are bound to a [`DerivedIdentifier`](soloist_key::DerivedIdentifier)
//! and perform no OS call until they are used.
//!
//! ## Platform Support
//!
//! - Unix: System V IPC (`shmget`/`shmat`/`shmdt`, `semget`/`semop`).
//!   The semaphore is taken with `SEM_UNDO`, so the kernel gives the count
//!   back when a holder dies. A segment is marked for removal by whichever
//!   process detaches last.
//! - Windows: `CreateFileMappingW` / `MapViewOfFile` and `CreateSemaphoreW`
//!   in the session-local namespace. Mappings vanish with their last handle.
//!
//! ## Example
//!
//! ```rust,no_run
//! use soloist_ipc::{LockSemaphore, SharedSegment, DEFAULT_MODE};
//! use soloist_key::KeyPair;
//!
//! fn example() -> Result<(), soloist_ipc::IpcError> {
//!     let pair = KeyPair::derive("com.example.editor");
//!     let lock = LockSemaphore::open(pair.lock(), DEFAULT_MODE)?;
//!     let mut segment = SharedSegment::new(pair.segment(), DEFAULT_MODE);
//!
//!     {
//!         let _permit = lock.acquire()?;
//!         segment.create(8)?;
//!     }
//!
//!     assert!(segment.is_owned());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

#[cfg(test)]
mod tests;

mod error;
mod permit;
mod state;
mod support;

#[cfg(unix)]
mod sysv;

#[cfg(windows)]
mod win32;

#[cfg(unix)]
pub use sysv::{LockSemaphore, SharedSegment};

#[cfg(windows)]
pub use win32::{LockSemaphore, SharedSegment};

pub use error::IpcError;
pub use permit::LockPermit;
pub use state::SegmentState;

#[cfg(any(test, feature = "test-utils"))]
pub use support::test_utils;

use std::time::Duration;

/// Default permission bits for created IPC objects (owner read/write).
pub const DEFAULT_MODE: u32 = 0o600;

/// Poll interval used by bounded lock waits that have no native timeout.
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);
