use crate::domain::CacheEntry;
use crate::ports::SnapshotStore;
use async_trait::async_trait;
use shared::{Error, Result};
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Directory created under the host cache dir for snapshot files
pub const DIRECTORY_NAME: &str = "SimpleCache";

/// JSON snapshot of a whole cache map stored in a single file
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the snapshot file `<cache_dir>/SimpleCache/<file_name>`
    /// Creates the directory if it doesn't exist; the file itself is created on first save
    pub fn open(cache_dir: impl AsRef<Path>, file_name: &str) -> Result<Self> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(Error::Internal(format!(
                "Invalid snapshot file name '{}'",
                file_name
            )));
        }

        let directory = snapshot_dir(cache_dir);
        std::fs::create_dir_all(&directory)
            .map_err(|e| Error::Io(format!("Failed to create directory: {}", e)))?;

        Ok(Self {
            path: directory.join(file_name),
        })
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> Result<HashMap<String, CacheEntry>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_snapshot(&path))
            .await
            .map_err(|e| Error::Internal(format!("Snapshot read task failed: {}", e)))?
    }

    async fn save(&self, entries: HashMap<String, CacheEntry>) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &entries))
            .await
            .map_err(|e| Error::Internal(format!("Snapshot write task failed: {}", e)))?
    }

    fn location(&self) -> &Path {
        &self.path
    }
}

/// Directory holding every snapshot file for a host cache dir
pub fn snapshot_dir(cache_dir: impl AsRef<Path>) -> PathBuf {
    cache_dir.as_ref().join(DIRECTORY_NAME)
}

/// Names of the snapshot files stored under `<cache_dir>/SimpleCache`, sorted
pub fn list_cache_files(cache_dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let directory = snapshot_dir(cache_dir);
    let read_dir = match std::fs::read_dir(&directory) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        // in-flight temp files
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn read_snapshot(path: &Path) -> Result<HashMap<String, CacheEntry>> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e.into()),
    };

    if json.trim().is_empty() {
        return Ok(HashMap::new());
    }

    Ok(serde_json::from_str(&json)?)
}

fn write_snapshot(path: &Path, entries: &HashMap<String, CacheEntry>) -> Result<()> {
    let directory = path
        .parent()
        .ok_or_else(|| Error::Internal(format!("Snapshot path {:?} has no parent", path)))?;

    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    serde_json::to_writer(&mut file, entries)?;
    file.flush()?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::from(e.error))?;

    Ok(())
}
