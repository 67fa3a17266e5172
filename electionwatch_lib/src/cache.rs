//! In-memory TTL cache backed by `DashMap` for concurrent access.
//!
//! Election metadata barely changes while results churn every poll tick,
//! so the cached client parks election records and contest listings here
//! between refreshes instead of re-fetching them on every cycle.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ElectionwatchError;

/// A single cached value with its expiration time.
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe in-memory cache with time-to-live expiration.
///
/// Values are stored as serialized JSON strings. Expired entries are
/// lazily evicted on the next `get` call for their key.
pub struct MemoryCache {
    store: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl MemoryCache {
    /// Creates a new cache with the given time-to-live for entries.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Returns the cached JSON for `key`, or `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.store.get(key)?;
        if entry.expired() {
            drop(entry);
            self.store.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Returns the cached value for `key`, deserialized.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ElectionwatchError> {
        match self.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Inserts or overwrites an entry. It expires after the configured TTL.
    pub fn set(&self, key: String, value: String) {
        self.store.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Serializes `value` and stores it under `key`.
    pub fn set_as<T: Serialize>(&self, key: String, value: &T) -> Result<(), ElectionwatchError> {
        let json = serde_json::to_string(value)?;
        self.set(key, json);
        Ok(())
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use electionwatch_api::types::Election;

    #[test]
    fn set_then_get_round_trips() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("election".to_string(), "id-20221108".to_string());
        assert_eq!(cache.get("election"), Some("id-20221108".to_string()));
    }

    #[test]
    fn missing_keys_return_none() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn entries_expire_after_the_ttl() {
        let cache = MemoryCache::new(Duration::from_millis(1));
        cache.set("election".to_string(), "id-20221108".to_string());
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("election"), None);
    }

    #[test]
    fn writes_overwrite_previous_entries() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("election".to_string(), "id-20220809".to_string());
        cache.set("election".to_string(), "id-20221108".to_string());
        assert_eq!(cache.get("election"), Some("id-20221108".to_string()));
    }

    #[test]
    fn clear_empties_the_store() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("a".to_string(), "1".to_string());
        cache.set("b".to_string(), "2".to_string());
        cache.clear();
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn typed_values_round_trip() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        let election = Election {
            election_id: Some("id-20221108".to_string()),
            election_date: Some("2022-11-08".to_string()),
            primary: Some(false),
            updated: Some(1_668_006_000),
        };
        cache.set_as("election:current".to_string(), &election).unwrap();
        let cached: Option<Election> = cache.get_as("election:current").unwrap();
        assert_eq!(
            cached.and_then(|e| e.election_id),
            Some("id-20221108".to_string())
        );
    }

    #[test]
    fn garbage_json_surfaces_as_an_error() {
        let cache = MemoryCache::new(Duration::from_secs(60));
        cache.set("election:current".to_string(), "not json".to_string());
        let cached: Result<Option<Election>, _> = cache.get_as("election:current");
        assert!(cached.is_err());
    }
}
