use crate::domain::CacheEntry;
use crate::domain::response::{DeleteResponse, PutResponse};
use crate::ports::CacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};
use shared::{Error, Result};
use std::collections::HashMap;
use std::fmt::Debug;

/// Moka-based entry storage
/// Unbounded and without a cache-wide TTL; entry lifetimes are checked by the manager
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<String, CacheEntry>,
}

impl MokaStore {
    pub fn new(name: &str) -> Self {
        Self {
            cache: Cache::builder().name(name).build(),
        }
    }
}

impl Default for MokaStore {
    fn default() -> Self {
        Self::new("simplecache")
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn put(&self, key: String, entry: CacheEntry) -> Result<PutResponse> {
        let created = !self.cache.contains_key(&key);
        self.cache.insert(key, entry).await;

        let message = if created {
            "Successfully inserted"
        } else {
            "Successfully replaced"
        };
        Ok(PutResponse::new(created, message))
    }

    async fn get(&self, key: &str) -> Result<CacheEntry> {
        self.cache.get(key).await.ok_or(Error::NotFound)
    }

    async fn delete(&self, key: &str) -> Result<DeleteResponse> {
        let existed = self.cache.remove(key).await.is_some();
        Ok(DeleteResponse::new(existed))
    }

    async fn delete_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<DeleteResponse> {
        // Decided under moka's per-key lock, so a concurrent put is never removed
        let result = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().is_expired_at(now) => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;

        Ok(DeleteResponse::new(matches!(result, CompResult::Removed(_))))
    }

    async fn clear(&self) -> Result<()> {
        // invalidate_all is lazy, remove keys one by one so iteration sees an empty map
        let keys: Vec<String> = self.cache.iter().map(|(k, _)| k.as_ref().clone()).collect();
        for key in keys {
            self.cache.remove(&key).await;
        }
        Ok(())
    }

    async fn entries(&self) -> Result<HashMap<String, CacheEntry>> {
        Ok(self
            .cache
            .iter()
            .map(|(k, v)| (k.as_ref().clone(), v))
            .collect())
    }

    fn len(&self) -> usize {
        // entry_count is eventually consistent
        self.cache.iter().count()
    }
}

impl Debug for MokaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("name", &self.cache.name())
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
