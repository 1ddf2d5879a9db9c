use tracing::warn;

pub struct Config {
    pub host_name: String,
    pub cache_dir: String,
    pub file_name: String,
    pub auto_save: bool,
}

impl Config {
    pub const DEFAULT_HOST_NAME: &str = "simplecache";
    pub const DEFAULT_CACHE_DIR: &str = "./cache";
    pub const DEFAULT_FILE_NAME: &str = "CacheBase";

    pub fn from_env() -> Self {
        let auto_save = match std::env::var("SIMPLECACHE_AUTO_SAVE") {
            Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
                warn!("SIMPLECACHE_AUTO_SAVE='{}' is not a boolean, using 'true'", raw);
                true
            }),
            Err(_) => true,
        };

        Self {
            host_name: std::env::var("SIMPLECACHE_HOST_NAME")
                .unwrap_or_else(|_| Self::DEFAULT_HOST_NAME.to_string()),
            cache_dir: std::env::var("SIMPLECACHE_CACHE_DIR")
                .unwrap_or_else(|_| Self::DEFAULT_CACHE_DIR.to_string()),
            file_name: std::env::var("SIMPLECACHE_FILE_NAME")
                .unwrap_or_else(|_| Self::DEFAULT_FILE_NAME.to_string()),
            auto_save,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host_name: Self::DEFAULT_HOST_NAME.to_string(),
            cache_dir: Self::DEFAULT_CACHE_DIR.to_string(),
            file_name: Self::DEFAULT_FILE_NAME.to_string(),
            auto_save: true,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
