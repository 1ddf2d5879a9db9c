use crate::domain::CacheOptions;
use crate::manager::CacheManager;
use crate::ports::HostEnvironment;
use shared::Result;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::info;

static GLOBAL_INSTANCES: OnceLock<InstanceRegistry> = OnceLock::new();

/// Named cache managers shared across a process
#[derive(Debug, Default)]
pub struct InstanceRegistry {
    // instance name -> initialized manager
    instances: RwLock<HashMap<String, Arc<CacheManager>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create, initialize and register a manager under `name`, replacing any previous one
    pub async fn create(
        &self,
        name: impl Into<String>,
        host: Arc<dyn HostEnvironment>,
        options: Option<CacheOptions>,
    ) -> Result<Arc<CacheManager>> {
        let name = name.into();
        let manager = Arc::new(CacheManager::create_instance(host, options).await?);

        let mut instances = self.instances.write().await;
        if instances.insert(name.clone(), manager.clone()).is_some() {
            info!("Replaced cache instance '{}'", name);
        } else {
            info!("Registered cache instance '{}'", name);
        }

        Ok(manager)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<CacheManager>> {
        let instances = self.instances.read().await;
        instances.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        let instances = self.instances.read().await;
        let mut names: Vec<String> = instances.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn remove(&self, name: &str) -> bool {
        let mut instances = self.instances.write().await;
        let removed = instances.remove(name).is_some();
        if removed {
            info!("Removed cache instance '{}'", name);
        }
        removed
    }

    pub async fn clear(&self) {
        let mut instances = self.instances.write().await;
        instances.clear();
    }
}

/// Process-wide registry
pub fn global() -> &'static InstanceRegistry {
    GLOBAL_INSTANCES.get_or_init(InstanceRegistry::new)
}

pub async fn create_global_instance(
    name: impl Into<String>,
    host: Arc<dyn HostEnvironment>,
    options: Option<CacheOptions>,
) -> Result<Arc<CacheManager>> {
    global().create(name, host, options).await
}

pub async fn get_global_instance(name: &str) -> Option<Arc<CacheManager>> {
    global().get(name).await
}

pub async fn global_instance_names() -> Vec<String> {
    global().names().await
}

pub async fn remove_global_instance(name: &str) -> bool {
    global().remove(name).await
}

pub async fn remove_all_global_instances() {
    global().clear().await
}
