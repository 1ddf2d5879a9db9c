use crate::ports::HostEnvironment;
use shared::config::Config;
use std::path::{Path, PathBuf};

/// Host handle backed by a fixed name and directory
#[derive(Clone, Debug)]
pub struct StaticHost {
    name: String,
    cache_dir: PathBuf,
}

impl StaticHost {
    pub fn new(name: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.host_name.clone(), config.cache_dir.clone())
    }
}

impl HostEnvironment for StaticHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
