// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::ptr;

use libc::{c_int, c_void, key_t};
use soloist_key::DerivedIdentifier;

use super::errno;
use crate::error::IpcError;
use crate::state::SegmentState;

struct Attachment {
    shmid: c_int,
    addr: *mut c_void,
    owned: bool,
}

/// Handle to a System V shared memory segment.
pub struct SharedSegment {
    key: key_t,
    mode: u32,
    attachment: Option<Attachment>,
}

impl SharedSegment {
    /// Binds a handle to `id`. No OS call is made.
    pub fn new(id: &DerivedIdentifier, mode: u32) -> Self {
        Self {
            key: id.ipc_key(),
            mode,
            attachment: None,
        }
    }

    /// Exclusively creates the segment with `size` bytes and attaches to it.
    ///
    /// Fails with [`IpcError::AlreadyExists`] when a segment with the same
    /// key exists, regardless of which process created it.
    pub fn create(&mut self, size: usize) -> Result<(), IpcError> {
        if self.attachment.is_some() {
            return Err(IpcError::AlreadyAttached);
        }

        let flags = libc::IPC_CREAT | libc::IPC_EXCL | (self.mode & 0o777) as c_int;
        let shmid = unsafe { libc::shmget(self.key, size.max(1), flags) };

        if shmid == -1 {
            return match errno() {
                libc::EEXIST => Err(IpcError::AlreadyExists),
                _ => Err(IpcError::last_os("shmget(IPC_CREAT | IPC_EXCL)")),
            };
        }

        let addr = unsafe { libc::shmat(shmid, ptr::null(), 0) };

        if is_shmat_failure(addr) {
            let error = IpcError::last_os("shmat");
            // Nobody else can know about a segment we failed to map.
            unsafe { libc::shmctl(shmid, libc::IPC_RMID, ptr::null_mut()) };
            return Err(error);
        }

        tracing::trace!(key = self.key, shmid, "created shared segment");

        self.attachment = Some(Attachment {
            shmid,
            addr,
            owned: true,
        });

        Ok(())
    }

    /// Attaches read-only to an existing segment.
    ///
    /// Succeeds without an OS call if this handle is already attached.
    /// Fails with [`IpcError::NotFound`] when no segment exists.
    pub fn attach(&mut self) -> Result<(), IpcError> {
        if self.attachment.is_some() {
            return Ok(());
        }

        let shmid = unsafe { libc::shmget(self.key, 0, 0) };

        if shmid == -1 {
            return match errno() {
                libc::ENOENT => Err(IpcError::NotFound),
                _ => Err(IpcError::last_os("shmget")),
            };
        }

        let addr = unsafe { libc::shmat(shmid, ptr::null(), libc::SHM_RDONLY) };

        if is_shmat_failure(addr) {
            return match errno() {
                // Marked for removal between shmget and shmat.
                libc::EIDRM | libc::EINVAL => Err(IpcError::NotFound),
                _ => Err(IpcError::last_os("shmat")),
            };
        }

        self.attachment = Some(Attachment {
            shmid,
            addr,
            owned: false,
        });

        Ok(())
    }

    /// Detaches from the segment, if attached.
    ///
    /// When no process remains attached afterwards the segment is marked
    /// for removal, so a holder that went away leaves nothing behind.
    /// Detaching an unattached handle is a no-op.
    pub fn detach(&mut self) -> Result<(), IpcError> {
        let Some(attachment) = self.attachment.take() else {
            return Ok(());
        };

        if unsafe { libc::shmdt(attachment.addr) } == -1 {
            return Err(IpcError::last_os("shmdt"));
        }

        let mut ds: libc::shmid_ds = unsafe { core::mem::zeroed() };

        if unsafe { libc::shmctl(attachment.shmid, libc::IPC_STAT, &mut ds) } == -1 {
            // Already removed by someone else.
            return Ok(());
        }

        if ds.shm_nattch == 0 {
            if unsafe { libc::shmctl(attachment.shmid, libc::IPC_RMID, ptr::null_mut()) } == -1 {
                return Err(IpcError::last_os("shmctl(IPC_RMID)"));
            }

            tracing::trace!(key = self.key, shmid = attachment.shmid, "removed unreferenced segment");
        }

        Ok(())
    }

    /// Current attachment state.
    pub fn state(&self) -> SegmentState {
        match &self.attachment {
            None => SegmentState::Unattached,
            Some(a) if a.owned => SegmentState::AttachedOwned,
            Some(_) => SegmentState::AttachedExisting,
        }
    }

    /// True if mapped into this process.
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// True if this handle created the segment it is mapped onto.
    pub fn is_owned(&self) -> bool {
        self.state() == SegmentState::AttachedOwned
    }

    /// Removes the segment without attaching, whoever holds it.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn purge(id: &DerivedIdentifier) {
        let shmid = unsafe { libc::shmget(id.ipc_key(), 0, 0) };

        if shmid != -1 {
            unsafe { libc::shmctl(shmid, libc::IPC_RMID, ptr::null_mut()) };
        }
    }
}

fn is_shmat_failure(addr: *mut c_void) -> bool {
    addr as isize == -1
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        if let Err(e) = self.detach() {
            tracing::warn!(error = %e, "failed to detach shared segment on drop");
        }
    }
}

// Safety: the mapping is never dereferenced; the handle only carries its
// address so it can be passed back to shmdt.
unsafe impl Send for SharedSegment {}

impl core::fmt::Debug for SharedSegment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSegment")
            .field("key", &self.key)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
