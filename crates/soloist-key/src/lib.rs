// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! # soloist_key
//!
//! Derives the fixed-length identifiers that address the OS resources of a
//! single-instance guard.
//!
//! The application key is never used as a resource name. Instead it is
//! hashed together with a purpose-specific salt, so that:
//! - the lock semaphore and the shared segment never share a name,
//! - arbitrary key content (separators, length, unicode) never reaches the
//!   OS naming rules,
//! - independent processes converge on the same resources without any
//!   out-of-band coordination.
//!
//! ## Example
//!
//! ```rust
//! use soloist_key::KeyPair;
//!
//! let pair = KeyPair::derive("com.example.editor");
//!
//! assert_eq!(pair.lock().as_str().len(), 64);
//! assert_ne!(pair.lock(), pair.segment());
//! assert_eq!(pair, KeyPair::derive("com.example.editor"));
//! ```

#![warn(missing_docs)]

#[cfg(test)]
mod tests;

mod identifier;

pub use identifier::{DerivedIdentifier, KeyPair, LOCK_SALT, OS_NAME_HEX_LEN, SEGMENT_SALT};
