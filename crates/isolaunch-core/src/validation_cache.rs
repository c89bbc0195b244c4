//! Validation cache: signature → known-trusted.
//!
//! Untrusted modules are validated before execution; validation is
//! expensive, so the host remembers which code signatures have already
//! passed. The cache is shared across all in-flight launches, append-only
//! within a session, and never deleted from mid-session.
//!
//! Concurrent `record` calls for the same signature from different
//! coordinator instances are safe no-ops: recording is idempotent and
//! lookups observe a linearizable view.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

/// An opaque code signature.
///
/// The coordinator never inspects the bytes; equality is the only
/// operation it needs. Debug output is truncated hex so signatures can be
/// logged without flooding the output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wraps raw signature bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(")?;
        for byte in self.0.iter().take(8) {
            write!(f, "{byte:02x}")?;
        }
        if self.0.len() > 8 {
            write!(f, "..")?;
        }
        write!(f, ")")
    }
}

impl From<&str> for Signature {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Shared trust store consulted and extended by every coordinator.
///
/// Implementations must be linearizable: once any `record` for a
/// signature returns, every subsequent `lookup` of that signature from
/// any instance observes `true`.
pub trait ValidationCache: Send + Sync {
    /// Whether this signature is already known to validate.
    fn lookup(&self, signature: &Signature) -> bool;

    /// Records a signature as known to validate. Idempotent.
    fn record(&self, signature: Signature);
}

/// In-memory validation cache backed by a mutexed set.
///
/// Suitable as the session-lifetime store; hosts that persist trust
/// across sessions supply their own implementation.
#[derive(Default)]
pub struct MemoryValidationCache {
    entries: Mutex<HashSet<Signature>>,
}

impl MemoryValidationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded signatures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    /// Whether the cache holds no signatures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ValidationCache for MemoryValidationCache {
    fn lookup(&self, signature: &Signature) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(signature)
    }

    fn record(&self, signature: Signature) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(signature);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_lookup_on_empty_cache() {
        let cache = MemoryValidationCache::new();
        assert!(!cache.lookup(&Signature::from("abc")));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_record_then_lookup() {
        let cache = MemoryValidationCache::new();
        cache.record(Signature::from("abc"));
        assert!(cache.lookup(&Signature::from("abc")));
        assert!(!cache.lookup(&Signature::from("abd")));
    }

    #[test]
    fn test_record_is_idempotent() {
        let cache = MemoryValidationCache::new();
        for _ in 0..5 {
            cache.record(Signature::from("abc"));
        }
        assert!(cache.lookup(&Signature::from("abc")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_identical_records() {
        let cache = Arc::new(MemoryValidationCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.record(Signature::from("shared"));
                    assert!(cache.lookup(&Signature::from("shared")));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_debug_truncates() {
        let sig = Signature::new(vec![0xab; 32]);
        let debug = format!("{sig:?}");
        assert!(debug.starts_with("Signature(abab"));
        assert!(debug.contains(".."));
    }
}
