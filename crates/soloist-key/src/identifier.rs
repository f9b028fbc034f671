// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

use core::fmt;

use sha2::{Digest, Sha256};

/// Salt appended to the key to derive the lock semaphore identifier.
pub const LOCK_SALT: &str = "_memLockKey";

/// Salt appended to the key to derive the shared segment identifier.
pub const SEGMENT_SALT: &str = "_sharedmemKey";

/// Number of hex characters kept by [`DerivedIdentifier::os_name`].
///
/// 112 bits of the digest, short enough that a prefixed name stays within
/// 31 bytes, the tightest limit on kernel object names among Unix flavours.
pub const OS_NAME_HEX_LEN: usize = 28;

/// A resource identifier derived from `(key, salt)` with SHA-256.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DerivedIdentifier {
    digest: [u8; 32],
    hex: String,
}

impl DerivedIdentifier {
    /// Derives the identifier for `key` and `salt`.
    pub fn derive(key: &str, salt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(salt.as_bytes());

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        let hex = hex::encode(digest);

        Self { digest, hex }
    }

    /// Full lowercase hex rendering (64 characters).
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.digest
    }

    /// Bounded-length name for named kernel objects, such as the Win32
    /// file mapping and semaphore.
    ///
    /// The result is `prefix` followed by the first [`OS_NAME_HEX_LEN`]
    /// hex characters of the digest.
    pub fn os_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", &self.hex[..OS_NAME_HEX_LEN])
    }

    /// 32-bit key for System V IPC (`key_t`).
    ///
    /// Taken from the first four digest bytes. Never returns `0`, which is
    /// `IPC_PRIVATE` and would create a fresh private object on every call.
    pub fn ipc_key(&self) -> i32 {
        let key = i32::from_be_bytes([
            self.digest[0],
            self.digest[1],
            self.digest[2],
            self.digest[3],
        ]);

        if key == 0 { 1 } else { key }
    }
}

impl fmt::Debug for DerivedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DerivedIdentifier").field(&self.hex).finish()
    }
}

impl fmt::Display for DerivedIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// The two identifiers a guard needs for one application key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPair {
    lock: DerivedIdentifier,
    segment: DerivedIdentifier,
}

impl KeyPair {
    /// Derives the lock and segment identifiers for `key`.
    pub fn derive(key: &str) -> Self {
        Self {
            lock: DerivedIdentifier::derive(key, LOCK_SALT),
            segment: DerivedIdentifier::derive(key, SEGMENT_SALT),
        }
    }

    /// Identifier of the lock semaphore.
    pub fn lock(&self) -> &DerivedIdentifier {
        &self.lock
    }

    /// Identifier of the shared segment.
    pub fn segment(&self) -> &DerivedIdentifier {
        &self.segment
    }
}
