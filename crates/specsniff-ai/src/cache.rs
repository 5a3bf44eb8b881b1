//! Classification cache for avoiding redundant oracle calls

use dashmap::DashMap;
use specsniff_core::{ClassificationResult, Fingerprint};
use std::time::{Duration, Instant};

/// Cache entry with insertion time
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: ClassificationResult,
    pub inserted_at: Instant,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

/// Fingerprint-keyed store of verdicts with a fixed time-to-live.
///
/// Expiry is checked lazily on `get`; `cleanup_expired` sweeps the rest.
pub struct ResultCache {
    entries: DashMap<Fingerprint, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a cached verdict if present and not expired
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<ClassificationResult> {
        self.get_at(fingerprint, Instant::now())
    }

    pub(crate) fn get_at(
        &self,
        fingerprint: &Fingerprint,
        now: Instant,
    ) -> Option<ClassificationResult> {
        // The shard guard must be released before `remove_if` touches the same shard
        let (expired, result) = {
            let entry = self.entries.get(fingerprint)?;
            (entry.is_expired_at(now, self.ttl), entry.result.clone())
        };

        if expired {
            self.entries
                .remove_if(fingerprint, |_, entry| entry.is_expired_at(now, self.ttl));
            tracing::debug!("Cache entry {} expired", fingerprint.short());
            return None;
        }
        Some(result)
    }

    /// Store a verdict. Replaces any earlier entry for the same key.
    pub fn put(&self, fingerprint: Fingerprint, result: ClassificationResult) {
        self.put_at(fingerprint, result, Instant::now());
    }

    pub(crate) fn put_at(
        &self,
        fingerprint: Fingerprint,
        result: ClassificationResult,
        inserted_at: Instant,
    ) {
        self.entries.insert(fingerprint, CacheEntry { result, inserted_at });
    }

    /// Clear expired entries, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        CacheStats {
            total_entries: self.entries.len(),
            expired_entries: self
                .entries
                .iter()
                .filter(|entry| entry.is_expired_at(now, self.ttl))
                .count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}
