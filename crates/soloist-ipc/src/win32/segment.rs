// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use soloist_key::DerivedIdentifier;
use windows::Win32::Foundation::{
    CloseHandle, ERROR_ALREADY_EXISTS, ERROR_FILE_NOT_FOUND, GetLastError, HANDLE,
    INVALID_HANDLE_VALUE,
};
use windows::Win32::System::Memory::{
    CreateFileMappingW, FILE_MAP_ALL_ACCESS, FILE_MAP_READ, MEMORY_MAPPED_VIEW_ADDRESS,
    MapViewOfFile, OpenFileMappingW, PAGE_READWRITE, UnmapViewOfFile,
};

use super::{SEGMENT_PREFIX, WideName};
use crate::error::IpcError;
use crate::state::SegmentState;

struct Attachment {
    mapping: HANDLE,
    view: MEMORY_MAPPED_VIEW_ADDRESS,
    owned: bool,
}

/// Handle to a named file mapping backed by the paging file.
pub struct SharedSegment {
    name: String,
    attachment: Option<Attachment>,
}

impl SharedSegment {
    /// Binds a handle to `id`. No OS call is made. `mode` is ignored.
    pub fn new(id: &DerivedIdentifier, _mode: u32) -> Self {
        Self {
            name: id.os_name(SEGMENT_PREFIX),
            attachment: None,
        }
    }

    /// Exclusively creates the mapping with `size` bytes and maps it.
    pub fn create(&mut self, size: usize) -> Result<(), IpcError> {
        if self.attachment.is_some() {
            return Err(IpcError::AlreadyAttached);
        }

        let name = WideName::new(&self.name);
        let size = u32::try_from(size.max(1)).unwrap_or(u32::MAX);

        let mapping = unsafe {
            CreateFileMappingW(
                INVALID_HANDLE_VALUE,
                None,
                PAGE_READWRITE,
                0,
                size,
                name.as_pcwstr(),
            )
        }
        .map_err(|_| IpcError::last_os("CreateFileMappingW"))?;

        // CreateFileMappingW opens an existing mapping and reports it only
        // through the last error.
        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(IpcError::AlreadyExists);
        }

        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_ALL_ACCESS, 0, 0, 0) };

        if view.Value.is_null() {
            let error = IpcError::last_os("MapViewOfFile");
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(error);
        }

        self.attachment = Some(Attachment {
            mapping,
            view,
            owned: true,
        });

        Ok(())
    }

    /// Maps an existing mapping read-only.
    pub fn attach(&mut self) -> Result<(), IpcError> {
        if self.attachment.is_some() {
            return Ok(());
        }

        let name = WideName::new(&self.name);

        let mapping = match unsafe { OpenFileMappingW(FILE_MAP_READ.0, false, name.as_pcwstr()) } {
            Ok(mapping) => mapping,
            Err(_) => {
                let source = std::io::Error::last_os_error();
                if source.raw_os_error() == Some(ERROR_FILE_NOT_FOUND.0 as i32) {
                    return Err(IpcError::NotFound);
                }
                return Err(IpcError::Os {
                    op: "OpenFileMappingW",
                    source,
                });
            }
        };

        let view = unsafe { MapViewOfFile(mapping, FILE_MAP_READ, 0, 0, 0) };

        if view.Value.is_null() {
            let error = IpcError::last_os("MapViewOfFile");
            unsafe {
                let _ = CloseHandle(mapping);
            }
            return Err(error);
        }

        self.attachment = Some(Attachment {
            mapping,
            view,
            owned: false,
        });

        Ok(())
    }

    /// Unmaps and closes the mapping, if attached.
    pub fn detach(&mut self) -> Result<(), IpcError> {
        let Some(attachment) = self.attachment.take() else {
            return Ok(());
        };

        let unmapped = unsafe { UnmapViewOfFile(attachment.view) }
            .map_err(|_| IpcError::last_os("UnmapViewOfFile"));
        let closed = unsafe { CloseHandle(attachment.mapping) }
            .map_err(|_| IpcError::last_os("CloseHandle"));

        unmapped.and(closed)
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

    /// True if this handle created the mapping it holds.
    pub fn is_owned(&self) -> bool {
        self.state() == SegmentState::AttachedOwned
    }

    /// No-op: mappings disappear with their last handle.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn purge(_id: &DerivedIdentifier) {}
}

impl Drop for SharedSegment {
    fn drop(&mut self) {
        if let Err(e) = self.detach() {
            tracing::warn!(error = %e, "failed to detach shared segment on drop");
        }
    }
}

// Safety: kernel handles and a view address that is never dereferenced.
unsafe impl Send for SharedSegment {}

impl core::fmt::Debug for SharedSegment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedSegment")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
