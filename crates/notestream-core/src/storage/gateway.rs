//! Key-value storage gateway
//!
//! Mirrors the host browser's flat blob store: named buckets holding JSON
//! values, read and written as partial records. A call returns only after
//! the underlying write has completed.
//!
//! Two implementations:
//! - `FileStorage` keeps every bucket in one JSON object on disk and
//!   rewrites it atomically (write to temp file, then rename).
//! - `MemoryStorage` keeps buckets in process memory.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tracing::debug;

use super::error::{StorageError, StorageResult};

/// A partial view of the store: bucket name to JSON value
pub type Record = Map<String, Value>;

/// Handle shared by every component that talks to the store
pub type SharedStorage = Arc<dyn StorageGateway>;

/// Access to a named-bucket key-value store
pub trait StorageGateway: Send + Sync {
    /// Read the requested buckets; absent buckets are left out of the record
    fn get(&self, keys: &[&str]) -> StorageResult<Record>;

    /// Write every bucket in `items`, replacing previous values
    fn set(&self, items: Record) -> StorageResult<()>;

    /// Delete the given buckets; missing buckets are ignored
    fn remove(&self, keys: &[&str]) -> StorageResult<()>;
}

/// File-backed store
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Create a store backed by the JSON file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the backing file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Size of the backing file in bytes (0 when missing)
    pub fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    fn read_all(&self) -> StorageResult<Record> {
        if !self.path.exists() {
            return Ok(Record::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| StorageError::from_read(e, self.path.clone()))?;

        if content.trim().is_empty() {
            return Ok(Record::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::InvalidFormat {
                path: self.path.clone(),
                details: "top-level value is not an object".to_string(),
            }),
            Err(e) => Err(StorageError::InvalidFormat {
                path: self.path.clone(),
                details: e.to_string(),
            }),
        }
    }

    fn write_all(&self, record: &Record) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(record)?;
        atomic_write(&self.path, &bytes)
    }
}

impl StorageGateway for FileStorage {
    fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        let all = self.read_all()?;
        Ok(select(&all, keys))
    }

    fn set(&self, items: Record) -> StorageResult<()> {
        let mut all = self.read_all()?;
        debug!(buckets = ?items.keys().collect::<Vec<_>>(), "writing buckets");
        all.extend(items);
        self.write_all(&all)
    }

    fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let mut all = self.read_all()?;
        let before = all.len();
        for key in keys {
            all.remove(*key);
        }
        if all.len() == before {
            return Ok(());
        }
        self.write_all(&all)
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryStorage {
    buckets: Mutex<Record>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with buckets
    pub fn with_record(record: Record) -> Self {
        Self {
            buckets: Mutex::new(record),
        }
    }

    fn buckets(&self) -> std::sync::MutexGuard<'_, Record> {
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StorageGateway for MemoryStorage {
    fn get(&self, keys: &[&str]) -> StorageResult<Record> {
        Ok(select(&self.buckets(), keys))
    }

    fn set(&self, items: Record) -> StorageResult<()> {
        self.buckets().extend(items);
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> StorageResult<()> {
        let mut buckets = self.buckets();
        for key in keys {
            buckets.remove(*key);
        }
        Ok(())
    }
}

fn select(all: &Record, keys: &[&str]) -> Record {
    keys.iter()
        .filter_map(|key| all.get(*key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_write(e, parent.into()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
