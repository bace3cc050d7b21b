//! TTL Cache
//!
//! In-memory key/value store with per-entry expiry and capacity-based eviction.
//!
//! ## Semantics
//! - An entry is stale once `now - timestamp >= ttl`; stale entries are never
//!   returned and are removed when observed.
//! - Reads never refresh an entry's TTL.
//! - When the store is full, `set` first drops stale entries, then the oldest
//!   30% by insertion time.
//!
//! The cache itself is not synchronized; owners wrap it in a lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;

use crate::clock::{Clock, duration_ms};

/// Percentage of entries dropped by an overflow eviction pass
const EVICTION_PERCENT: usize = 30;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_size: usize,
    /// TTL used by [`TtlCache::set`]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            default_ttl: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheConfig {
    pub fn new(max_size: usize, default_ttl_secs: u64) -> Self {
        Self {
            max_size,
            default_ttl: Duration::from_secs(default_ttl_secs),
        }
    }

    pub fn default_ttl_ms(&self) -> i64 {
        duration_ms(self.default_ttl)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    timestamp_ms: i64,
    ttl_ms: i64,
    /// Insertion order, breaks timestamp ties during eviction
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp_ms >= self.ttl_ms
    }
}

/// Snapshot of the cache for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub default_ttl_ms: i64,
    pub keys: Vec<String>,
}

/// Key/value store with per-entry expiry
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    next_seq: u64,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            clock,
            next_seq: 0,
        }
    }

    /// Store `value` under `key` with the default TTL
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.config.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Store `value` under `key` with an explicit TTL
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        if self.entries.len() >= self.config.max_size {
            self.evict();
        }

        let entry = CacheEntry {
            data: value,
            timestamp_ms: self.clock.now_ms(),
            ttl_ms: duration_ms(ttl),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key.into(), entry);
    }

    /// Fetch a fresh value, removing the entry if it has expired
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.has(key) {
            return None;
        }
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Same staleness rule as [`TtlCache::get`], without cloning the value
    pub fn has(&mut self, key: &str) -> bool {
        let now_ms = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now_ms),
            None => return false,
        };
        if expired {
            self.entries.remove(key);
        }
        !expired
    }

    /// Remove a single key. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every key matching `pattern`. Returns the number removed.
    pub fn invalidate_pattern(&mut self, pattern: &Regex) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.is_match(key));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        CacheStats {
            size: self.entries.len(),
            max_size: self.config.max_size,
            default_ttl_ms: self.config.default_ttl_ms(),
            keys,
        }
    }

    fn evict(&mut self) {
        let now_ms = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now_ms));
        let expired = before - self.entries.len();

        let mut evicted = 0;
        if self.entries.len() >= self.config.max_size {
            let mut by_age: Vec<(i64, u64, String)> = self
                .entries
                .iter()
                .map(|(key, entry)| (entry.timestamp_ms, entry.seq, key.clone()))
                .collect();
            by_age.sort_unstable();

            let count = (by_age.len() * EVICTION_PERCENT).div_ceil(100);
            for (_, _, key) in by_age.into_iter().take(count.max(1)) {
                self.entries.remove(&key);
                evicted += 1;
            }
        }

        tracing::debug!(expired, evicted, remaining = self.entries.len(), "Cache eviction");
    }
}
