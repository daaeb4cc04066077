use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::utils::home_path;
use super::Storable;
use crate::config::CACHE_STORE_PATH;
use crate::impl_store;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub data: Value,
}

/// Read-through caches keyed like `teamsCache`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Caches {
    #[serde(flatten)]
    pub entries: BTreeMap<String, CacheEntry>,
}

impl Caches {
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, data: Value) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                fetched_at: Utc::now(),
                data,
            },
        );
    }

    /// Returns true if something was evicted.
    pub fn evict(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Storable for Caches {
    fn path() -> Result<PathBuf> {
        home_path(CACHE_STORE_PATH)
    }
}

impl_store!(Caches);

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_evict() {
        let mut caches = Caches::default();

        caches.insert("teamsCache", json!([{ "id": 1 }]));
        caches.insert("sellersCache", json!([]));

        assert!(caches.evict("teamsCache"));
        assert!(!caches.evict("teamsCache"));
        assert!(caches.get("sellersCache").is_some());
    }

    #[test]
    fn test_flat_keys() {
        let mut caches = Caches::default();
        caches.insert("dealsCache", json!([]));

        let json = serde_json::to_value(&caches).unwrap();

        assert!(json.get("dealsCache").is_some());
        assert!(json.get("entries").is_none());
    }
}
