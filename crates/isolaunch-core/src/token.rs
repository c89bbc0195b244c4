//! File tokens and their resolution map.
//!
//! The isolated process never receives direct file references. Instead
//! the host issues an opaque 128-bit token (two 64-bit halves) when a
//! file is first brokered, and the process later exchanges the token for
//! an open handle through the coordinator. Tokens resolve exactly once:
//! a token is removed from the map when it is taken, so a replayed token
//! fails like an unknown one.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Opaque 128-bit file token, split into two halves for transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileToken {
    /// Low 64 bits.
    pub lo: u64,
    /// High 64 bits.
    pub hi: u64,
}

impl FileToken {
    /// Builds a token from its halves.
    #[must_use]
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    /// A token is only valid when at least one half is non-zero.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.lo != 0 || self.hi != 0
    }
}

/// Session-scoped map from issued tokens to the paths they stand for.
///
/// Shared between whatever host component issues tokens and the
/// coordinators that resolve them.
#[derive(Default)]
pub struct FileTokenMap {
    entries: Mutex<HashMap<FileToken, PathBuf>>,
}

impl FileTokenMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for later resolution. Returns `false` (and
    /// leaves the existing entry in place) when the token was already
    /// issued, which indicates a token-generation bug in the host.
    pub fn issue(&self, token: FileToken, path: PathBuf) -> bool {
        if !token.is_valid() {
            return false;
        }
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if entries.contains_key(&token) {
            return false;
        }
        entries.insert(token, path);
        true
    }

    /// Consumes a token, yielding the path it was issued for.
    ///
    /// Returns `None` for unknown, invalid, or already-consumed tokens.
    pub fn take(&self, token: FileToken) -> Option<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&token)
    }

    /// Number of outstanding tokens.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}
