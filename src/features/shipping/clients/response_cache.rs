use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::features::shipping::models::{Locality, Region};

/// Cache key: the singleton province list, or one city list per province
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Regions,
    Localities(String),
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Regions(Arc<Vec<Region>>),
    Localities(Arc<Vec<Locality>>),
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: CachedValue,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub regions_cached: bool,
    pub locality_lists: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Process-local memo of provider reference data.
///
/// Entries live until `clear()` unless a TTL is configured. `clear()` empties
/// the whole map under one write lock, so readers never see it half cleared.
///
/// Every `clear()` also bumps a generation counter. Writers pass the generation
/// they observed before fetching, and a write from an older generation is
/// dropped so a fetch that straddles a clear cannot repopulate the cache.
pub struct ResponseCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Option<Duration>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            generation: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|entry| !self.is_expired(entry))
                .cloned()
        };

        match entry {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };

        entry
    }

    /// Generation to hand back to `put` once a fetch started now completes
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores `value` unless the cache was cleared after `generation` was read.
    /// Returns whether the entry was written.
    pub async fn put(&self, generation: u64, key: CacheKey, value: CachedValue) -> bool {
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::debug!("Dropping {:?} fetched before the last cache clear", key);
            return false;
        }

        let entry = CacheEntry {
            key: key.clone(),
            value,
            fetched_at: Utc::now(),
        };
        entries.insert(key, entry);
        true
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        self.generation.fetch_add(1, Ordering::AcqRel);
        tracing::debug!("Response cache cleared ({} entries removed)", removed);
    }

    pub async fn get_regions(&self) -> Option<Arc<Vec<Region>>> {
        match self.get(&CacheKey::Regions).await?.value {
            CachedValue::Regions(regions) => Some(regions),
            CachedValue::Localities(_) => None,
        }
    }

    pub async fn put_regions(&self, generation: u64, regions: Arc<Vec<Region>>) -> bool {
        self.put(generation, CacheKey::Regions, CachedValue::Regions(regions))
            .await
    }

    pub async fn get_localities(&self, region_id: &str) -> Option<Arc<Vec<Locality>>> {
        let key = CacheKey::Localities(region_id.to_string());
        match self.get(&key).await?.value {
            CachedValue::Localities(localities) => Some(localities),
            CachedValue::Regions(_) => None,
        }
    }

    pub async fn put_localities(
        &self,
        generation: u64,
        region_id: &str,
        localities: Arc<Vec<Locality>>,
    ) -> bool {
        self.put(
            generation,
            CacheKey::Localities(region_id.to_string()),
            CachedValue::Localities(localities),
        )
        .await
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let live = entries.values().filter(|entry| !self.is_expired(entry));

        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for entry in live {
            match entry.key {
                CacheKey::Regions => stats.regions_cached = true,
                CacheKey::Localities(_) => stats.locality_lists += 1,
            }
        }

        stats
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };

        Utc::now()
            .signed_duration_since(entry.fetched_at)
            .to_std()
            .map(|age| age >= ttl)
            .unwrap_or(false)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
