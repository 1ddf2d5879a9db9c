use crate::domain::response::{DeleteResponse, Lookup, PutResponse};
use crate::domain::{CacheEntry, CacheOptions, CacheValue};
use crate::persistence::JsonFileStore;
use crate::ports::{CacheStore, HostEnvironment, SnapshotStore};
use crate::storage::MokaStore;
use chrono::Utc;
use shared::{Error, Result, TtlMs};
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// State fixed by `init`
struct Binding {
    host: Arc<dyn HostEnvironment>,
    options: CacheOptions,
    snapshots: Arc<dyn SnapshotStore>,
}

/// Heterogeneous key-value cache bound to a host environment.
///
/// A manager is unusable until [`CacheManager::init`] has run. With
/// `auto_save` enabled every mutation schedules a background snapshot write;
/// writes are serialized so the file always reflects the latest mutation once
/// [`CacheManager::flush`] returns.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    binding: OnceCell<Binding>,
    init_lock: Mutex<()>,
    pending_save: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("initialized", &self.binding.initialized())
            .field("host", &self.binding.get().map(|b| b.host.name()))
            .field("entries", &self.store.len())
            .finish()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    /// Create an unbound manager backed by an in-memory Moka store
    pub fn new() -> Self {
        Self::with_store(Arc::new(MokaStore::default()))
    }

    /// Create an unbound manager on top of a custom entry store
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            binding: OnceCell::new(),
            init_lock: Mutex::new(()),
            pending_save: Mutex::new(None),
        }
    }

    /// Construct and initialize in one step
    pub async fn create_instance(
        host: Arc<dyn HostEnvironment>,
        options: Option<CacheOptions>,
    ) -> Result<Self> {
        let manager = Self::new();
        manager.init(host, options).await?;
        Ok(manager)
    }

    /// Bind the manager to `host` and load the snapshot file named by `options`
    pub async fn init(
        &self,
        host: Arc<dyn HostEnvironment>,
        options: Option<CacheOptions>,
    ) -> Result<()> {
        if self.binding.initialized() {
            return Err(Error::AlreadyInitialized);
        }

        let options = options.unwrap_or_default();
        let snapshots = JsonFileStore::open(host.cache_dir(), &options.file_name)?;
        self.init_with_snapshots(host, options, Arc::new(snapshots))
            .await
    }

    /// Same as `init`, with the snapshot backend supplied by the caller
    pub async fn init_with_snapshots(
        &self,
        host: Arc<dyn HostEnvironment>,
        options: CacheOptions,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Result<()> {
        // Only one init runs at a time; the binding is published after the
        // snapshot is in the store, so no mutation can be overwritten by it
        let _init = self.init_lock.lock().await;
        if self.binding.initialized() {
            return Err(Error::AlreadyInitialized);
        }

        let entries = snapshots.load().await?;
        let loaded = entries.len();
        let location = snapshots.location().to_path_buf();
        let host_name = host.name().to_string();

        for (key, entry) in entries {
            self.store.put(key, entry).await?;
        }

        self.binding
            .set(Binding {
                host,
                options,
                snapshots,
            })
            .map_err(|_| Error::AlreadyInitialized)?;

        info!(
            "Cache initialized for host '{}' from {:?} ({} entries loaded)",
            host_name, location, loaded
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.initialized()
    }

    pub fn host(&self) -> Option<Arc<dyn HostEnvironment>> {
        self.binding.get().map(|b| b.host.clone())
    }

    pub fn options(&self) -> Option<&CacheOptions> {
        self.binding.get().map(|b| &b.options)
    }

    /// Insert or overwrite `key` with no lifetime
    pub async fn add_cache(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
    ) -> Result<()> {
        self.set(key, value, None).await.map(|_| ())
    }

    /// Insert or overwrite `key`. A lifetime of `None` or zero never expires
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<CacheValue>,
        life_time: Option<TtlMs>,
    ) -> Result<PutResponse> {
        let binding = self.binding()?;
        let key = key.into();
        let entry = CacheEntry::new(value.into(), life_time);

        debug!(
            "Set '{}' ({:?}, life_time: {:?})",
            key,
            entry.value.kind(),
            life_time
        );
        let response = self.store.put(key, entry).await?;
        self.after_mutation(binding).await?;

        Ok(response)
    }

    /// Read `key`, dropping it if its lifetime has run out
    pub async fn get(&self, key: &str) -> Result<Lookup> {
        let binding = self.binding()?;
        let entry = self.store.get(key).await?;
        let now = Utc::now();

        if !entry.is_expired_at(now) {
            return Ok(Lookup::from(entry));
        }

        if self.store.delete_if_expired(key, now).await?.deleted {
            debug!("Entry '{}' expired and was removed", key);
            self.after_mutation(binding).await?;
            return Err(Error::Expired(key.to_string()));
        }

        // Replaced by a fresh entry since the first read
        let current = self.store.get(key).await?;
        Ok(Lookup::from(current))
    }

    /// Read `key` without looking at its lifetime
    pub async fn get_unchecked(&self, key: &str) -> Result<Lookup> {
        self.binding()?;
        let entry = self.store.get(key).await?;
        Ok(Lookup::from(entry))
    }

    pub async fn remove(&self, key: &str) -> Result<DeleteResponse> {
        let binding = self.binding()?;
        let response = self.store.delete(key).await?;

        if response.deleted {
            self.after_mutation(binding).await?;
        }

        Ok(response)
    }

    pub async fn remove_all_elements(&self) -> Result<()> {
        let binding = self.binding()?;
        self.store.clear().await?;
        self.after_mutation(binding).await
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Write the snapshot now and wait for it
    pub async fn save(&self) -> Result<()> {
        let binding = self.binding()?;
        let mut pending = self.pending_save.lock().await;

        if let Some(handle) = pending.take() {
            log_save_outcome(join_save(handle).await);
        }

        let entries = self.store.entries().await?;
        let count = entries.len();
        binding.snapshots.save(entries).await?;
        debug!(
            "Saved {} entries to {:?}",
            count,
            binding.snapshots.location()
        );

        Ok(())
    }

    /// Wait for the background save started by the last mutation, if any
    pub async fn flush(&self) -> Result<()> {
        let handle = self.pending_save.lock().await.take();
        match handle {
            Some(handle) => join_save(handle).await,
            None => Ok(()),
        }
    }

    fn binding(&self) -> Result<&Binding> {
        self.binding.get().ok_or(Error::NotInitialized)
    }

    async fn after_mutation(&self, binding: &Binding) -> Result<()> {
        if binding.options.auto_save {
            self.schedule_save(binding).await?;
        }
        Ok(())
    }

    async fn schedule_save(&self, binding: &Binding) -> Result<()> {
        let mut pending = self.pending_save.lock().await;

        // Serialize writes: the previous snapshot lands before the next one starts
        if let Some(handle) = pending.take() {
            log_save_outcome(join_save(handle).await);
        }

        let entries = self.store.entries().await?;
        let snapshots = binding.snapshots.clone();
        *pending = Some(tokio::spawn(async move { snapshots.save(entries).await }));

        Ok(())
    }
}

async fn join_save(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle
        .await
        .map_err(|e| Error::Internal(format!("Background save task failed: {}", e)))?
}

fn log_save_outcome(outcome: Result<()>) {
    if let Err(err) = outcome {
        warn!("Background cache save failed: {}", err);
    }
}
