use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::error::DocentError;
use crate::models::{CacheStats, ConfidenceTier};

use super::{fingerprint, normalize_query};

/// An answer as it was first served.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub response: String,
    pub tier: ConfidenceTier,
    pub sources_used: usize,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    query: String,
    value: CachedResponse,
    created_at: DateTime<Utc>,
}

/// Thread-safe LRU cache of answers keyed by query fingerprint, with a fixed TTL.
///
/// Entries are whole values swapped under one lock, so a reader sees either
/// the previous entry or the new one.
///
/// Every `clear` bumps a generation counter under the same lock. A writer that
/// computed its answer before a clear can use [`ResponseCache::put_if_current`]
/// so the answer is dropped instead of outliving the clear.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Arc<Mutex<LruCache<String, CacheEntry>>>,
    generation: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            generation: Arc::new(AtomicU64::new(0)),
            clock,
            ttl: Duration::seconds(
                i64::try_from(config.ttl_secs)
                    .unwrap_or(i64::MAX)
                    .min(i64::MAX / 1000),
            ),
        }
    }

    /// Cached answer for `query`, or `None` when absent or older than the TTL.
    pub fn get(&self, query: &str) -> Option<CachedResponse> {
        let normalized = normalize_query(query);
        let key = fingerprint(&normalized);
        let now = self.clock.now();
        let mut entries = self.lock();

        let (expired, mismatched) = {
            let entry = entries.get(&key)?;
            (self.is_expired(entry, now), entry.query != normalized)
        };
        if expired {
            entries.pop(&key);
            tracing::debug!(fingerprint = %short(&key), "Cache entry expired");
            return None;
        }
        if mismatched {
            let err = DocentError::CacheCorruption {
                fingerprint: key.clone(),
            };
            tracing::warn!(error = %err, "Treating cache entry as a miss");
            entries.pop(&key);
            return None;
        }

        entries.peek(&key).map(|entry| entry.value.clone())
    }

    pub fn put(&self, query: &str, value: CachedResponse) {
        let entry = self.entry_for(query, value);
        let mut entries = self.lock();
        Self::insert(&mut entries, entry);
    }

    /// Current clear generation. Read it before computing an answer and hand it
    /// to [`ResponseCache::put_if_current`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores the answer only if no `clear` ran since `generation` was read.
    /// Returns whether the entry was stored.
    pub fn put_if_current(&self, query: &str, value: CachedResponse, generation: u64) -> bool {
        let entry = self.entry_for(query, value);
        let mut entries = self.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!(fingerprint = %short(&entry.0), "Cache cleared since answer was computed, not storing");
            return false;
        }
        Self::insert(&mut entries, entry);
        true
    }

    fn entry_for(&self, query: &str, value: CachedResponse) -> (String, CacheEntry) {
        let normalized = normalize_query(query);
        let key = fingerprint(&normalized);
        let entry = CacheEntry {
            query: normalized,
            value,
            created_at: self.clock.now(),
        };
        (key, entry)
    }

    fn insert(entries: &mut LruCache<String, CacheEntry>, (key, entry): (String, CacheEntry)) {
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                tracing::debug!(fingerprint = %short(&evicted), "Evicted least recently used cache entry");
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.lock();
        let total = entries.len();
        let expired = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .count();
        CacheStats {
            total,
            valid: total - expired,
            expired,
        }
    }

    /// Removes every entry. Returns how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        count
    }

    /// Removes expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    pub fn shutdown(&self) {
        let count = self.clear();
        tracing::info!(entries = count, "Response cache shut down");
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at > self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn short(key: &str) -> &str {
    &key[..key.len().min(12)]
}
