//! Storage layer
//!
//! ## Architecture
//!
//! - **Gateway**: named-bucket key-value store (file-backed or in memory)
//! - **Buckets**: typed accessors for each persisted bucket
//! - **Migration**: default initialization and legacy bucket renames
//!
//! The per-video notes map in `noteStreamData` is the source of truth; every
//! in-memory note list is a cache over it.

pub mod buckets;
pub mod error;
pub mod gateway;
pub mod migration;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Config;

pub use buckets::NotesMap;
pub use error::{StorageError, StorageResult};
pub use gateway::{FileStorage, MemoryStorage, Record, SharedStorage, StorageGateway};
pub use migration::{migrate, MigrationReport};

/// Open the configured file store, migrating it to the current layout
pub fn open(config: &Config) -> Result<SharedStorage> {
    let storage = FileStorage::new(config.storage_path());
    let report = migrate(&storage)
        .with_context(|| format!("Failed to prepare storage at {:?}", storage.path()))?;

    if !report.is_empty() {
        debug!(?report, "storage migrated");
    }

    Ok(Arc::new(storage))
}
