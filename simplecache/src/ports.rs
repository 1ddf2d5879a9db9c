#![deny(clippy::all)]

use crate::domain::CacheEntry;
use crate::domain::response::{DeleteResponse, PutResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::Result;
use std::collections::HashMap;
use std::path::Path;

// Ports are the pluggable extension points around the cache manager

/// Opaque handle to the environment hosting a cache manager
pub trait HostEnvironment: Send + Sync + 'static {
    /// Human readable name of the host, used in logs
    fn name(&self) -> &str;

    /// Root directory the host allots for cache files
    fn cache_dir(&self) -> &Path;
}

/// Port for the in-memory entry storage
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn put(&self, key: String, entry: CacheEntry) -> Result<PutResponse>;
    async fn get(&self, key: &str) -> Result<CacheEntry>;
    async fn delete(&self, key: &str) -> Result<DeleteResponse>;
    /// Remove `key` only if the entry stored at the time of removal is expired at `now`
    async fn delete_if_expired(&self, key: &str, now: DateTime<Utc>) -> Result<DeleteResponse>;
    async fn clear(&self) -> Result<()>;
    async fn entries(&self) -> Result<HashMap<String, CacheEntry>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Port for whole-map snapshots that outlive the process
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    async fn load(&self) -> Result<HashMap<String, CacheEntry>>;
    async fn save(&self, entries: HashMap<String, CacheEntry>) -> Result<()>;
    fn location(&self) -> &Path;
}
