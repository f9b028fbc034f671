// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Tests for the System V LockSemaphore.

use std::time::{Duration, Instant};

use serial_test::serial;
use soloist_key::KeyPair;
use soloist_test_utils::{key_from_env, run_test_as_subprocess, unique_key};

use crate::test_utils::PurgeOnDrop;
use crate::{DEFAULT_MODE, IpcError, LockSemaphore};

fn semaphore_for(key: &str) -> LockSemaphore {
    LockSemaphore::open(KeyPair::derive(key).lock(), DEFAULT_MODE).expect("Failed to open()")
}

// =============================================================================
// open()
// =============================================================================

#[test]
#[serial(semaphore)]
fn test_open_creates_with_count_one() {
    let key = unique_key("sem-open");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);

    assert_eq!(semaphore.value().expect("Failed to value()"), 1);
}

#[test]
#[serial(semaphore)]
fn test_open_existing_shares_count() {
    let key = unique_key("sem-shared");
    let _purge = PurgeOnDrop(key.clone());
    let first = semaphore_for(&key);
    let second = semaphore_for(&key);

    let _permit = first.acquire().expect("Failed to acquire()");

    assert_eq!(second.value().expect("Failed to value()"), 0);
    assert!(second.try_acquire().expect("Failed to try_acquire()").is_none());
}

#[test]
#[serial(semaphore)]
fn test_distinct_keys_are_independent() {
    let a = unique_key("sem-a");
    let b = unique_key("sem-b");
    let _purge_a = PurgeOnDrop(a.clone());
    let _purge_b = PurgeOnDrop(b.clone());
    let first = semaphore_for(&a);
    let second = semaphore_for(&b);

    let _held = first.acquire().expect("Failed to acquire()");

    assert!(second.try_acquire().expect("Failed to try_acquire()").is_some());
}

/// Creates the set the way a creator that died before initializing it would.
fn create_uninitialized(key: &str) -> libc::c_int {
    let ipc_key = KeyPair::derive(key).lock().ipc_key();
    let semid = unsafe { libc::semget(ipc_key, 1, libc::IPC_CREAT | libc::IPC_EXCL | 0o600) };
    assert_ne!(semid, -1, "Failed to semget()");
    semid
}

#[test]
#[serial(semaphore)]
fn test_open_replaces_uninitialized_set() {
    let key = unique_key("sem-uninit");
    let _purge = PurgeOnDrop(key.clone());
    let stale = create_uninitialized(&key);

    let semaphore = semaphore_for(&key);

    assert_eq!(semaphore.value().expect("Failed to value()"), 1);
    assert!(semaphore.try_acquire().expect("Failed to try_acquire()").is_some());
    assert_eq!(unsafe { libc::semctl(stale, 0, libc::GETVAL) }, -1, "stale set should be removed");
}

#[test]
#[serial(semaphore)]
fn test_open_waits_for_slow_creator() {
    let key = unique_key("sem-slow");
    let _purge = PurgeOnDrop(key.clone());
    let semid = create_uninitialized(&key);

    let creator = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        let mut op = libc::sembuf {
            sem_num: 0,
            sem_op: 1,
            sem_flg: 0,
        };
        assert_ne!(unsafe { libc::semop(semid, &mut op, 1) }, -1, "Failed to semop()");
    });

    let semaphore = semaphore_for(&key);
    creator.join().expect("Failed to join()");

    let _permit = semaphore.acquire().expect("Failed to acquire()");

    // Same set as the creator's, now held.
    assert_eq!(unsafe { libc::semctl(semid, 0, libc::GETVAL) }, 0);
}

// =============================================================================
// acquire() / LockPermit
// =============================================================================

#[test]
#[serial(semaphore)]
fn test_permit_releases_on_drop() {
    let key = unique_key("sem-permit");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);

    {
        let _permit = semaphore.acquire().expect("Failed to acquire()");
        assert_eq!(semaphore.value().expect("Failed to value()"), 0);
    }

    assert_eq!(semaphore.value().expect("Failed to value()"), 1);
}

#[test]
#[serial(semaphore)]
fn test_acquire_is_reusable() {
    let key = unique_key("sem-reuse");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);

    for _ in 0..16 {
        let _permit = semaphore.acquire().expect("Failed to acquire()");
    }

    assert_eq!(semaphore.value().expect("Failed to value()"), 1);
}

// =============================================================================
// acquire_timeout() / try_acquire()
// =============================================================================

#[test]
#[serial(semaphore)]
fn test_acquire_timeout_expires_while_held() {
    let key = unique_key("sem-timeout");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);
    let timeout = Duration::from_millis(50);

    let _held = semaphore.acquire().expect("Failed to acquire()");
    let start = Instant::now();
    let result = semaphore.acquire_timeout(timeout);

    assert!(matches!(result, Err(IpcError::LockTimeout(t)) if t == timeout));
    assert!(start.elapsed() >= timeout);
}

#[test]
#[serial(semaphore)]
fn test_acquire_timeout_succeeds_when_free() {
    let key = unique_key("sem-timeout-free");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);

    let permit = semaphore.acquire_timeout(Duration::from_millis(50));

    assert!(permit.is_ok());
}

#[test]
#[serial(semaphore)]
fn test_try_acquire_when_free() {
    let key = unique_key("sem-try");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);

    let permit = semaphore.try_acquire().expect("Failed to try_acquire()");

    assert!(permit.is_some());
}

// =============================================================================
// Holder death
// =============================================================================

#[test]
#[ignore]
fn subprocess_test_exit_while_holding() {
    let key = key_from_env();
    let semaphore = semaphore_for(&key);

    let permit = semaphore.acquire().expect("Failed to acquire()");
    core::mem::forget(permit);

    std::process::exit(0);
}

#[test]
#[serial(semaphore)]
fn test_kernel_undoes_exited_holder() {
    let key = unique_key("sem-undo");
    let _purge = PurgeOnDrop(key.clone());
    let semaphore = semaphore_for(&key);

    let exit_code =
        run_test_as_subprocess("tests::semaphore::subprocess_test_exit_while_holding", &key);

    assert_eq!(exit_code, Some(0), "Subprocess should exit with 0");
    assert_eq!(semaphore.value().expect("Failed to value()"), 1);
}
