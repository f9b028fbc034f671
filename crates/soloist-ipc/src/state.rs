// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

/// Attachment state of a [`SharedSegment`](crate::SharedSegment) handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    /// Not mapped into this process.
    Unattached,
    /// Mapped onto a segment another handle created.
    AttachedExisting,
    /// Mapped onto a segment this handle created.
    AttachedOwned,
}

impl SegmentState {
    /// True unless [`SegmentState::Unattached`].
    pub fn is_attached(self) -> bool {
        !matches!(self, Self::Unattached)
    }
}
