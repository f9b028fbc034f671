// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Test utilities for soloist crates.
//!
//! Cross-process behavior is tested by having the test binary re-run one
//! of its own `#[ignore]`d tests as a child process. The child receives
//! the application key through [`KEY_ENV`].
//!
//! ## License
//!
//! GPL-3.0-only

mod subprocess;

pub use subprocess::{
    Holder, KEY_ENV, READY_LINE, key_from_env, run_test_as_subprocess, signal_ready,
    spawn_holder, spawn_holders, wait_for_parent,
};

/// Returns a key no other test (or test run) uses.
pub fn unique_key(label: &str) -> String {
    format!(
        "soloist-test-{label}-{}-{:016x}",
        std::process::id(),
        rand::random::<u64>()
    )
}
