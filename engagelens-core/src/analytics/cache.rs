//! Bounded, short-lived cache of loaded snapshots.
//!
//! Entries are keyed by what the loader was asked for and expire after a fixed
//! TTL measured against the caller's "as of" instant. A hit may therefore lag
//! the rolling window by up to the TTL. When full, the entry loaded longest
//! ago is evicted.

use super::loader::LoadedData;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Longest TTL honoured (ten years); larger values are clamped.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub username: Option<String>,
    pub days: u32,
    pub include_previous: bool,
}

struct CacheEntry {
    loaded_at: DateTime<Utc>,
    data: Arc<LoadedData>,
}

pub struct LoadCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl LoadCache {
    pub fn new(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return a snapshot loaded less than `ttl` before `now`.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<Arc<LoadedData>> {
        let mut entries = self.entries.lock().ok()?;
        let fresh = entries
            .get(key)
            .map(|entry| now >= entry.loaded_at && now - entry.loaded_at < self.ttl);

        match fresh {
            Some(true) => entries.get(key).map(|entry| Arc::clone(&entry.data)),
            Some(false) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, data: Arc<LoadedData>, now: DateTime<Utc>) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.loaded_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                loaded_at: now,
                data,
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
