// Copyright 2025 Noctua Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A bounded in-memory store for decoded asset payloads.
//!
//! The cache enforces two invariants continuously: the entry count never
//! exceeds `max_entries` and the summed payload sizes never exceed
//! `max_size_bytes`. Both are enforced by least-recently-used eviction
//! *before* a new entry is inserted. Recency is tracked with a monotonic
//! access sequence rather than wall-clock time, so eviction order is total
//! and deterministic: among entries never touched since insertion, insertion
//! order wins.
//!
//! The cache is the disposal owner of its payloads: removal, clearing, and
//! eviction all invoke the payload's [`Disposable`] capability when present.
//! Collaborators keep cheap `Arc` clones for reading only.
//!
//! [`Disposable`]: noctua_core::asset::Disposable

use noctua_core::asset::LoadedAsset;
use noctua_core::utils::clock::now_millis;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Bounds applied to an [`AssetCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of live entries.
    pub max_entries: usize,
    /// Maximum summed payload size, bytes.
    pub max_size_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            max_size_bytes: 256 * 1024 * 1024,
        }
    }
}

struct CacheEntry {
    asset: Arc<dyn LoadedAsset>,
    size: u64,
    last_accessed: u64,
    access_count: u64,
    /// Monotonic recency stamp; the entry with the smallest stamp is the
    /// LRU eviction victim.
    sequence: u64,
}

/// A snapshot of cache counters for telemetry and tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries removed by the LRU policy (not by `remove`/`clear`).
    pub evictions: u64,
    /// Current summed payload size, bytes.
    pub total_size: u64,
    /// Current number of live entries.
    pub entries: usize,
    /// Configured size bound, bytes.
    pub max_size: u64,
    /// Configured entry bound.
    pub max_entries: usize,
    /// `hits / (hits + misses)`, `0.0` before any lookup.
    pub hit_rate: f64,
}

/// The bounded LRU store of decoded payloads, keyed by an opaque string
/// (typically the resource URL).
pub struct AssetCache {
    config: CacheConfig,
    entries: HashMap<String, CacheEntry>,
    total_size: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    next_sequence: u64,
}

impl AssetCache {
    /// Creates an empty cache with the given bounds.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
            total_size: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            next_sequence: 0,
        }
    }

    /// Looks up `key`, refreshing its recency on a hit.
    pub fn get(&mut self, key: &str) -> Option<Arc<dyn LoadedAsset>> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.next_sequence += 1;
                entry.sequence = self.next_sequence;
                entry.last_accessed = now_millis();
                entry.access_count += 1;
                self.hits += 1;
                Some(entry.asset.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts or replaces the entry under `key`, evicting as needed first.
    ///
    /// `size` is the caller's estimate of the decoded payload's memory cost.
    /// A payload larger than the whole cache is refused (returns `false`)
    /// rather than evicting everything to no effect.
    pub fn insert(&mut self, key: impl Into<String>, asset: Arc<dyn LoadedAsset>, size: u64) -> bool {
        let key = key.into();
        if size > self.config.max_size_bytes {
            log::warn!(
                "cache: refusing '{key}' ({size} bytes exceeds the {} byte bound)",
                self.config.max_size_bytes
            );
            return false;
        }

        // Replacing a key releases the old payload before accounting.
        if let Some(old) = self.entries.remove(&key) {
            self.total_size -= old.size;
            dispose(&old);
        }

        while self.entries.len() >= self.config.max_entries
            || self.total_size + size > self.config.max_size_bytes
        {
            if !self.evict_lru() {
                break;
            }
        }

        self.next_sequence += 1;
        self.entries.insert(
            key,
            CacheEntry {
                asset,
                size,
                last_accessed: now_millis(),
                access_count: 1,
                sequence: self.next_sequence,
            },
        );
        self.total_size += size;
        true
    }

    /// Removes and disposes the entry under `key`.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.total_size -= entry.size;
                dispose(&entry);
                true
            }
            None => false,
        }
    }

    /// Disposes and removes every entry.
    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            dispose(&entry);
        }
        self.total_size = 0;
    }

    /// True when `key` has a live entry. Does not touch recency or counters.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            total_size: self.total_size,
            entries: self.entries.len(),
            max_size: self.config.max_size_bytes,
            max_entries: self.config.max_entries,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    /// Evicts the least-recently-used entry. Returns `false` on an empty cache.
    fn evict_lru(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.sequence)
            .map(|(key, _)| key.clone());
        let Some(key) = victim else {
            return false;
        };

        // The key came out of the map above.
        if let Some(entry) = self.entries.remove(&key) {
            self.total_size -= entry.size;
            self.evictions += 1;
            log::debug!("cache: evicted '{key}' ({} bytes)", entry.size);
            dispose(&entry);
        }
        true
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn dispose(entry: &CacheEntry) {
    if let Some(disposable) = entry.asset.as_disposable() {
        disposable.dispose();
    }
}
