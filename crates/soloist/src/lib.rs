// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # soloist
//!
//! Detects whether another copy of an application is already running on
//! the same machine, so a second copy can refuse to start.
//!
//! All processes constructing an [`InstanceGuard`] with the same key
//! coordinate through a shared-memory segment, whose existence marks the
//! running instance, and a named semaphore that makes the
//! check-then-create sequence atomic across processes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use soloist::InstanceGuard;
//!
//! let mut guard = InstanceGuard::new("com.example.editor");
//!
//! if !guard.try_to_run() {
//!     eprintln!("another instance is already running");
//!     std::process::exit(1);
//! }
//!
//! // ... run the application; the claim is released when `guard` drops.
//! ```
//!
//! ## Diagnostics
//!
//! [`InstanceGuard::try_to_run`] collapses every failure into `false`.
//! [`InstanceGuard::claim`] returns the same decision as a
//! [`ClaimOutcome`] that tells a lost race or an OS failure apart from a
//! live instance.
//!
//! ## Stale state
//!
//! A holder that dies without releasing leaves a System V segment with no
//! attached process. Construction runs an attach-then-detach cycle that
//! removes such a segment before the first check (see
//! [`GuardBuilder::reset_on_open`]).

#![warn(missing_docs)]

#[cfg(test)]
mod tests;

mod config;
mod guard;
mod outcome;

pub use config::{DEFAULT_SEGMENT_SIZE, GuardBuilder, GuardConfig};
pub use guard::InstanceGuard;
pub use outcome::ClaimOutcome;

pub use soloist_ipc::IpcError;
pub use soloist_key::{DerivedIdentifier, KeyPair};
