// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Win32 backend.
//!
//! Objects live in the session-local namespace (`Local\`). A file mapping
//! is destroyed by the kernel when its last handle closes, including the
//! handles of a crashed process, so stale segments cannot occur here.

mod segment;
mod semaphore;

pub use segment::SharedSegment;
pub use semaphore::LockSemaphore;

use windows::core::PCWSTR;

/// Name prefix of the file mapping; followed by the identifier's hex.
const SEGMENT_PREFIX: &str = "Local\\soloist-seg-";

/// Name prefix of the semaphore.
const LOCK_PREFIX: &str = "Local\\soloist-lock-";

/// NUL-terminated UTF-16 name kept alive for the duration of a call.
struct WideName(Vec<u16>);

impl WideName {
    fn new(name: &str) -> Self {
        Self(name.encode_utf16().chain(std::iter::once(0)).collect())
    }

    fn as_pcwstr(&self) -> PCWSTR {
        PCWSTR(self.0.as_ptr())
    }
}
