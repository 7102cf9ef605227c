//! Durable string storage backing the response cache
//!
//! The cache only needs two things from storage: read a string by key and
//! write one back. `FileStorage` keeps each key in its own JSON file under an
//! XDG-compliant cache directory; `MemoryStorage` keeps everything in process.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors reported by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// The value does not fit in the remaining storage
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Underlying I/O failure
    #[error("Storage I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Key/value string storage that survives restarts
pub trait DurableStorage: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`
    fn read_string(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn write_string(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

fn check_quota(quota: Option<usize>, needed: usize) -> Result<(), StorageError> {
    match quota {
        Some(quota) if needed > quota => Err(StorageError::QuotaExceeded { needed, quota }),
        _ => Ok(()),
    }
}

/// Stores each key as `<key>.json` in a directory
///
/// Uses `~/.cache/weatherpulse/` on Linux, or the equivalent XDG path on
/// other platforms.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory where storage files live
    dir: PathBuf,
    /// Maximum size in bytes of a single stored value
    quota_bytes: Option<usize>,
}

impl FileStorage {
    /// Creates a FileStorage in the XDG cache directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "weatherpulse")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a FileStorage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir, quota_bytes: None }
    }

    /// Caps the size of any single write
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl DurableStorage for FileStorage {
    fn read_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self.quota_bytes, value.len())?;
        fs::create_dir_all(&self.dir)?;

        // Write then rename so a crash never leaves a half-written file behind
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-process storage, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a MemoryStorage that rejects values larger than `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DurableStorage for MemoryStorage {
    fn read_string(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn write_string(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(self.quota_bytes, value.len())?;
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
