// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use std::time::Duration;

use soloist_key::DerivedIdentifier;
use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::System::Threading::{
    CreateSemaphoreW, INFINITE, ReleaseSemaphore, WaitForSingleObject,
};

use super::{LOCK_PREFIX, WideName};
use crate::error::IpcError;
use crate::permit::LockPermit;

/// Handle to a named Win32 semaphore (count 1, maximum 1).
pub struct LockSemaphore {
    name: String,
    handle: HANDLE,
}

impl LockSemaphore {
    /// Opens the semaphore for `id`, creating it if needed. `mode` is ignored.
    pub fn open(id: &DerivedIdentifier, _mode: u32) -> Result<Self, IpcError> {
        let name = id.os_name(LOCK_PREFIX);
        let wide = WideName::new(&name);

        let handle = unsafe { CreateSemaphoreW(None, 1, 1, wide.as_pcwstr()) }
            .map_err(|_| IpcError::last_os("CreateSemaphoreW"))?;

        Ok(Self { name, handle })
    }

    /// Blocks until the semaphore is acquired.
    pub fn acquire(&self) -> Result<LockPermit<'_>, IpcError> {
        self.wait(INFINITE, Duration::MAX)
    }

    /// Like [`acquire`](Self::acquire) but gives up after `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<LockPermit<'_>, IpcError> {
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(INFINITE - 1);
        self.wait(millis, timeout)
    }

    /// Tries once without blocking. `Ok(None)` if another holder has it.
    pub fn try_acquire(&self) -> Result<Option<LockPermit<'_>>, IpcError> {
        match self.wait(0, Duration::ZERO) {
            Ok(permit) => Ok(Some(permit)),
            Err(IpcError::LockTimeout(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn release(&self) -> Result<(), IpcError> {
        unsafe { ReleaseSemaphore(self.handle, 1, None) }
            .map_err(|_| IpcError::last_os("ReleaseSemaphore"))
    }

    fn wait(&self, millis: u32, timeout: Duration) -> Result<LockPermit<'_>, IpcError> {
        let event = unsafe { WaitForSingleObject(self.handle, millis) };

        if event == WAIT_OBJECT_0 {
            Ok(LockPermit::new(self))
        } else if event == WAIT_TIMEOUT {
            Err(IpcError::LockTimeout(timeout))
        } else {
            Err(IpcError::last_os("WaitForSingleObject"))
        }
    }

    /// No-op: named semaphores disappear with their last handle.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn purge(_id: &DerivedIdentifier) {}
}

impl Drop for LockSemaphore {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

// Safety: a kernel handle, usable from any thread.
unsafe impl Send for LockSemaphore {}
unsafe impl Sync for LockSemaphore {}

impl core::fmt::Debug for LockSemaphore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LockSemaphore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
