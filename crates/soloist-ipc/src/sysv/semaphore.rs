// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::thread;
use std::time::{Duration, Instant};

use libc::{c_int, c_short, key_t};
use soloist_key::DerivedIdentifier;

use super::errno;
use crate::LOCK_POLL_INTERVAL;
use crate::error::IpcError;
use crate::permit::LockPermit;

/// Attempts at opening a set that disappears between create and open.
const OPEN_ATTEMPTS: usize = 8;

/// How long an opener waits for the creator to initialize a new set.
///
/// A set still uninitialized after this long belongs to a creator that
/// died between `semget` and its first `semop`.
const INIT_WAIT: Duration = Duration::from_millis(100);

/// Handle to a System V semaphore set holding one semaphore (count 1).
pub struct LockSemaphore {
    key: key_t,
    semid: c_int,
}

impl LockSemaphore {
    /// Opens the semaphore for `id`, creating it with a count of one if it
    /// does not exist yet.
    ///
    /// The set is created with `IPC_EXCL` so exactly one process
    /// initializes it, with a `semop` that both raises the count to one and
    /// sets `sem_otime`. Openers of an existing set wait for `sem_otime` to
    /// become non-zero. A set that stays uninitialized for [`INIT_WAIT`] is
    /// removed and created again.
    pub fn open(id: &DerivedIdentifier, mode: u32) -> Result<Self, IpcError> {
        let key = id.ipc_key();
        let perms = (mode & 0o777) as c_int;

        for _ in 0..OPEN_ATTEMPTS {
            let semid = unsafe { libc::semget(key, 1, libc::IPC_CREAT | libc::IPC_EXCL | perms) };

            if semid != -1 {
                let semaphore = Self { key, semid };

                match semaphore.semop(1, 0) {
                    Ok(()) => {
                        tracing::trace!(key, semid, "created lock semaphore");
                        return Ok(semaphore);
                    }
                    // Removed as stale by another opener before we got here.
                    Err(libc::EIDRM | libc::EINVAL) => continue,
                    Err(_) => {
                        let error = IpcError::last_os("semop(init)");
                        unsafe { libc::semctl(semid, 0, libc::IPC_RMID) };
                        return Err(error);
                    }
                }
            }

            if errno() != libc::EEXIST {
                return Err(IpcError::last_os("semget(IPC_CREAT | IPC_EXCL)"));
            }

            let semid = unsafe { libc::semget(key, 1, 0) };

            if semid == -1 {
                if errno() != libc::ENOENT {
                    return Err(IpcError::last_os("semget"));
                }
                continue;
            }

            match wait_initialized(semid) {
                Ok(true) => return Ok(Self { key, semid }),
                Ok(false) => {
                    tracing::warn!(key, semid, "removing lock semaphore left uninitialized");
                    // Removal is by id, so a set recreated meanwhile is untouched.
                    unsafe { libc::semctl(semid, 0, libc::IPC_RMID) };
                }
                Err(libc::EIDRM | libc::EINVAL) => {}
                Err(_) => return Err(IpcError::last_os("semctl(IPC_STAT)")),
            }
        }

        Err(IpcError::last_os("semget"))
    }

    /// Blocks until the semaphore is acquired.
    pub fn acquire(&self) -> Result<LockPermit<'_>, IpcError> {
        loop {
            match self.semop(-1, libc::SEM_UNDO) {
                Ok(()) => return Ok(LockPermit::new(self)),
                Err(libc::EINTR) => continue,
                Err(_) => return Err(IpcError::last_os("semop")),
            }
        }
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    ///
    /// `semtimedop` is not portable across Unix flavours, so this polls with
    /// `IPC_NOWAIT` every [`LOCK_POLL_INTERVAL`].
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<LockPermit<'_>, IpcError> {
        let start = Instant::now();

        loop {
            match self.semop(-1, libc::SEM_UNDO | libc::IPC_NOWAIT) {
                Ok(()) => return Ok(LockPermit::new(self)),
                Err(libc::EINTR) => continue,
                Err(libc::EAGAIN) => {
                    let elapsed = start.elapsed();
                    if elapsed >= timeout {
                        return Err(IpcError::LockTimeout(timeout));
                    }
                    thread::sleep(LOCK_POLL_INTERVAL.min(timeout - elapsed));
                }
                Err(_) => return Err(IpcError::last_os("semop(IPC_NOWAIT)")),
            }
        }
    }

    /// Tries once without blocking. `Ok(None)` if another holder has it.
    pub fn try_acquire(&self) -> Result<Option<LockPermit<'_>>, IpcError> {
        loop {
            match self.semop(-1, libc::SEM_UNDO | libc::IPC_NOWAIT) {
                Ok(()) => return Ok(Some(LockPermit::new(self))),
                Err(libc::EINTR) => continue,
                Err(libc::EAGAIN) => return Ok(None),
                Err(_) => return Err(IpcError::last_os("semop(IPC_NOWAIT)")),
            }
        }
    }

    pub(crate) fn release(&self) -> Result<(), IpcError> {
        loop {
            match self.semop(1, libc::SEM_UNDO) {
                Ok(()) => return Ok(()),
                Err(libc::EINTR) => continue,
                Err(_) => return Err(IpcError::last_os("semop")),
            }
        }
    }

    /// Current count. `1` when free, `0` while held.
    pub fn value(&self) -> Result<i32, IpcError> {
        let value = unsafe { libc::semctl(self.semid, 0, libc::GETVAL) };

        if value == -1 {
            return Err(IpcError::last_os("semctl(GETVAL)"));
        }

        Ok(value)
    }

    fn semop(&self, op: c_short, flags: c_int) -> Result<(), c_int> {
        let mut buf = libc::sembuf {
            sem_num: 0,
            sem_op: op,
            sem_flg: flags as c_short,
        };

        if unsafe { libc::semop(self.semid, &mut buf, 1) } == -1 {
            return Err(errno());
        }

        Ok(())
    }

    /// Removes the semaphore set. Blocked waiters fail with `EIDRM`.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn purge(id: &DerivedIdentifier) {
        let semid = unsafe { libc::semget(id.ipc_key(), 1, 0) };

        if semid != -1 {
            unsafe { libc::semctl(semid, 0, libc::IPC_RMID) };
        }
    }
}

/// `sem_otime` of the set, zero until the first successful `semop`.
fn otime(semid: c_int) -> Result<libc::time_t, c_int> {
    let mut ds: libc::semid_ds = unsafe { core::mem::zeroed() };

    if unsafe { libc::semctl(semid, 0, libc::IPC_STAT, &mut ds as *mut libc::semid_ds) } == -1 {
        return Err(errno());
    }

    Ok(ds.sem_otime)
}

/// Polls until the creator of `semid` has initialized it.
///
/// `Ok(false)` once [`INIT_WAIT`] has passed without initialization.
fn wait_initialized(semid: c_int) -> Result<bool, c_int> {
    let start = Instant::now();

    loop {
        if otime(semid)? != 0 {
            return Ok(true);
        }

        let elapsed = start.elapsed();
        if elapsed >= INIT_WAIT {
            return Ok(false);
        }

        thread::sleep(LOCK_POLL_INTERVAL.min(INIT_WAIT - elapsed));
    }
}

impl core::fmt::Debug for LockSemaphore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockSemaphore")
            .field("key", &self.key)
            .field("semid", &self.semid)
            .finish()
    }
}
