//! Routing result cache
//!
//! This module provides caching of routing results:
//! - Fingerprints over the evaluation inputs and the registry version
//! - Lazy TTL expiry, checked on read
//! - Optional size bound with oldest-first eviction
//! - Hit/miss statistics

use crate::evaluator::EvaluationScope;
use crate::result::RoutingResult;
use handoff_core::{TimeOfDay, Value};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Cache configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Upper bound on stored results; 0 disables the bound
    pub max_entries: usize,
}

impl CacheConfig {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Default::default()
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 10_000,
        }
    }
}

/// Cache entry with value and expiration time
#[derive(Debug, Clone)]
struct CacheEntry {
    result: RoutingResult,
    inserted_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(result: RoutingResult, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            result,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache hit/miss statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that found an entry past its TTL
    pub expired: u64,
    pub evictions: u64,
    pub inserts: u64,
}

impl CacheStats {
    /// Hit rate in percent
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default)]
struct StatCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    evictions: AtomicU64,
    inserts: AtomicU64,
}

/// Fingerprint-keyed routing result cache
#[derive(Debug)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    stats: StatCounters,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            stats: StatCounters::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a result. Expired entries are dropped and count as a miss.
    pub fn get(&self, fingerprint: &str) -> Option<RoutingResult> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(fingerprint) {
            Some(entry) if !entry.is_expired(now) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.result.clone())
            }
            Some(_) => {
                entries.remove(fingerprint);
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a result, evicting if the size bound is reached
    pub fn put(&self, fingerprint: String, result: RoutingResult) {
        let mut entries = self.entries.lock();

        let max = self.config.max_entries;
        if max > 0 && entries.len() >= max && !entries.contains_key(&fingerprint) {
            let now = Instant::now();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            let purged = before - entries.len();

            let mut evicted = purged;
            while entries.len() >= max {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => {
                        entries.remove(&key);
                        evicted += 1;
                    }
                    None => break,
                }
            }
            self.stats
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, "Result cache full, evicted entries");
        }

        entries.insert(fingerprint, CacheEntry::new(result, self.config.ttl));
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of stored entries, including not-yet-collected expired ones
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!("Result cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            expired: self.stats.expired.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
            inserts: self.stats.inserts.load(Ordering::Relaxed),
        }
    }
}

/// Deterministic SHA-256 fingerprint of the evaluation inputs.
///
/// Map entries are hashed in sorted key order, so the fingerprint does not
/// depend on `HashMap` iteration order. `time_bucket` is only passed when
/// the rule set contains time-based conditions, and message timestamps are
/// only hashed when some rule reads them.
pub fn fingerprint(
    scope: &EvaluationScope<'_>,
    registry_version: u64,
    time_bucket: Option<TimeOfDay>,
    message_timestamps: bool,
) -> String {
    let mut hasher = Sha256::new();
    let context = scope.context;
    let decision = scope.decision;

    hasher.update(b"v");
    hasher.update(registry_version.to_be_bytes());

    hasher.update(b"messages");
    hasher.update([message_timestamps as u8]);
    hasher.update((context.messages.len() as u64).to_be_bytes());
    for message in &context.messages {
        hash_str(&mut hasher, &message.speaker);
        hash_str(&mut hasher, &message.content);
        if message_timestamps {
            hash_str(&mut hasher, &message.timestamp.to_rfc3339());
        }
    }

    hasher.update(b"user");
    hash_map(&mut hasher, &context.user_attributes);
    hasher.update(b"context");
    hash_map(&mut hasher, &context.metadata);
    hasher.update(b"entities");
    hash_map(&mut hasher, &context.entities);
    hasher.update(b"metadata");
    hash_map(&mut hasher, scope.metadata);

    hasher.update(b"decision");
    hasher.update([decision.should_handoff as u8]);
    hasher.update(decision.confidence.to_bits().to_be_bytes());
    hash_opt(&mut hasher, decision.priority.map(|p| p.as_str()));
    hash_opt(&mut hasher, decision.reason.as_deref());
    hash_opt(&mut hasher, decision.trigger_type.as_deref());
    hash_map(&mut hasher, &decision.trigger_results);

    match time_bucket {
        Some(bucket) => {
            hasher.update(b"t");
            hasher.update(bucket.minutes().to_be_bytes());
        }
        None => hasher.update(b"-"),
    }

    hex::encode(hasher.finalize())
}

fn hash_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_be_bytes());
    hasher.update(s.as_bytes());
}

fn hash_opt(hasher: &mut Sha256, s: Option<&str>) {
    match s {
        Some(s) => {
            hasher.update([1u8]);
            hash_str(hasher, s);
        }
        None => hasher.update([0u8]),
    }
}

fn hash_map(hasher: &mut Sha256, map: &HashMap<String, Value>) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    hasher.update((keys.len() as u64).to_be_bytes());
    for key in keys {
        hash_str(hasher, key);
        if let Some(value) = map.get(key) {
            hash_value(hasher, value);
        }
    }
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update([0u8]),
        Value::Bool(b) => hasher.update([1u8, *b as u8]),
        Value::Number(n) => {
            hasher.update([2u8]);
            hasher.update(n.to_bits().to_be_bytes());
        }
        Value::String(s) => {
            hasher.update([3u8]);
            hash_str(hasher, s);
        }
        Value::Array(items) => {
            hasher.update([4u8]);
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                hash_value(hasher, item);
            }
        }
        Value::Object(map) => {
            hasher.update([5u8]);
            hash_map(hasher, map);
        }
    }
}
