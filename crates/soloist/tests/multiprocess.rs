// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Guards in separate processes.
//!
//! The `subprocess_*` tests are ignored and only run as children of the
//! other tests, which pass the key through `SOLOIST_TEST_KEY`.

use serial_test::serial;
use soloist::InstanceGuard;
use soloist_ipc::test_utils::PurgeOnDrop;
use soloist_test_utils::{
    key_from_env, run_test_as_subprocess, signal_ready, spawn_holder, spawn_holders, unique_key,
    wait_for_parent,
};

/// Exit code of a child that was refused.
const REFUSED: i32 = 3;

// =============================================================================
// Children
// =============================================================================

#[test]
#[ignore]
fn subprocess_hold_claim() {
    let mut guard = InstanceGuard::new(key_from_env());
    assert!(guard.try_to_run(), "holder should claim");

    signal_ready();
    wait_for_parent();

    drop(guard);
    std::process::exit(0);
}

#[test]
#[ignore]
fn subprocess_try_once() {
    let mut guard = InstanceGuard::new(key_from_env());
    let claimed = guard.try_to_run();

    signal_ready();
    wait_for_parent();

    drop(guard);
    std::process::exit(if claimed { 0 } else { REFUSED });
}

#[test]
#[ignore]
fn subprocess_claim_and_vanish() {
    let mut guard = InstanceGuard::new(key_from_env());
    assert!(guard.try_to_run(), "child should claim");

    // Exit without running destructors, like a crash.
    std::process::exit(0);
}

// =============================================================================
// Parents
// =============================================================================

#[test]
#[serial(multiprocess)]
fn test_second_process_is_refused() {
    let key = unique_key("mp-refused");
    let _purge = PurgeOnDrop(key.clone());

    let holder = spawn_holder("subprocess_hold_claim", &key);

    let mut guard = InstanceGuard::new(key.clone());
    assert!(guard.is_another_running());
    assert!(!guard.try_to_run());

    assert_eq!(holder.finish(), Some(0));
}

#[test]
#[serial(multiprocess)]
fn test_child_is_refused_while_parent_holds() {
    let key = unique_key("mp-parent-holds");
    let _purge = PurgeOnDrop(key.clone());

    let mut guard = InstanceGuard::new(key.clone());
    assert!(guard.try_to_run());

    let child = spawn_holder("subprocess_try_once", &key);
    assert_eq!(child.finish(), Some(REFUSED));

    assert!(guard.is_running());
}

#[test]
#[serial(multiprocess)]
fn test_slot_reclaimable_after_holder_exits() {
    let key = unique_key("mp-reclaim");
    let _purge = PurgeOnDrop(key.clone());

    let holder = spawn_holder("subprocess_hold_claim", &key);
    assert_eq!(holder.finish(), Some(0));

    let mut guard = InstanceGuard::new(key.clone());
    assert!(guard.try_to_run());
}

#[cfg(unix)]
#[test]
#[serial(multiprocess)]
fn test_crashed_holder_is_reclaimed() {
    let key = unique_key("mp-crash");
    let _purge = PurgeOnDrop(key.clone());

    let exit_code = run_test_as_subprocess("subprocess_claim_and_vanish", &key);
    assert_eq!(exit_code, Some(0), "Subprocess should exit with 0");

    let mut guard = InstanceGuard::new(key.clone());
    assert!(guard.try_to_run());
}

#[test]
#[serial(multiprocess)]
fn test_concurrent_processes_elect_one() {
    const CONTENDERS: usize = 4;

    let key = unique_key("mp-race");
    let _purge = PurgeOnDrop(key.clone());

    let holders = spawn_holders("subprocess_try_once", &key, CONTENDERS);
    let codes: Vec<Option<i32>> = holders.into_iter().map(|h| h.finish()).collect();

    let winners = codes.iter().filter(|c| **c == Some(0)).count();
    let refused = codes.iter().filter(|c| **c == Some(REFUSED)).count();

    assert_eq!(winners, 1, "exit codes: {codes:?}");
    assert_eq!(refused, CONTENDERS - 1, "exit codes: {codes:?}");
}

#[test]
#[serial(multiprocess)]
fn test_different_keys_across_processes() {
    let a = unique_key("mp-key-a");
    let b = unique_key("mp-key-b");
    let _purge_a = PurgeOnDrop(a.clone());
    let _purge_b = PurgeOnDrop(b.clone());

    let holder = spawn_holder("subprocess_hold_claim", &a);

    let mut guard = InstanceGuard::new(b);
    assert!(!guard.is_another_running());
    assert!(guard.try_to_run());

    assert_eq!(holder.finish(), Some(0));
}
