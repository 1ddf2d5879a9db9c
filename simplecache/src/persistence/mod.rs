mod json_file_store;

pub use json_file_store::{DIRECTORY_NAME, JsonFileStore, list_cache_files, snapshot_dir};
