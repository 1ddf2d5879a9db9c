//! In-process key-value cache holding heterogeneous values, bound to a host
//! environment and optionally snapshotted to a JSON file.

pub mod domain;
pub mod host;
pub mod manager;
pub mod persistence;
pub mod ports;
pub mod registry;
pub mod storage;

pub use domain::{CacheEntry, CacheOptions, CacheValue, ValueKind};
pub use host::StaticHost;
pub use manager::CacheManager;
pub use persistence::{DIRECTORY_NAME, list_cache_files};
pub use ports::HostEnvironment;
pub use registry::{
    create_global_instance, get_global_instance, global_instance_names,
    remove_all_global_instances, remove_global_instance,
};
pub use shared::{Error, Result, TtlMs};
