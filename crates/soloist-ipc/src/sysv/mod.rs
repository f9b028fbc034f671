// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! System V IPC backend.
//!
//! Resources are addressed by the 32-bit `key_t` of their identifier
//! (see [`DerivedIdentifier::ipc_key`](soloist_key::DerivedIdentifier::ipc_key)).
//! Unlike POSIX `shm_open`, a System V segment tracks how many processes
//! are attached (`shm_nattch`), which is what lets a detaching process tell
//! whether it was the last one and a stale segment be told apart from a
//! live one.

mod segment;
mod semaphore;

pub use segment::SharedSegment;
pub use semaphore::LockSemaphore;

fn errno() -> libc::c_int {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
