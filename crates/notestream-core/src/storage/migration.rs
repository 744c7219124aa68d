//! Bucket initialization and legacy migration
//!
//! Runs every time storage is opened:
//! 1. Legacy buckets (`podNoteData`, `podNoteSettings`) are copied to their
//!    new names when the new names are absent. Existing data is never
//!    overwritten.
//! 2. Any bucket still absent is initialized to its empty default.
//!
//! All changes land in one write.

use serde_json::{json, Value};
use tracing::info;

use super::buckets::{
    CHANNEL_PREFERENCES_KEY, GLOBAL_TAGS_KEY, LEGACY_NOTES_KEY, LEGACY_SETTINGS_KEY, NOTES_KEY,
    RECENT_TAGS_KEY, RECENT_VIDEOS_KEY, SETTINGS_KEY,
};
use super::error::StorageResult;
use super::gateway::{Record, StorageGateway};
use crate::models::Settings;

/// What a migration run changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Buckets created with default values
    pub initialized: Vec<String>,
    /// Buckets copied from a legacy name
    pub migrated: Vec<String>,
}

impl MigrationReport {
    /// True when nothing needed to change
    pub fn is_empty(&self) -> bool {
        self.initialized.is_empty() && self.migrated.is_empty()
    }
}

const LEGACY_RENAMES: &[(&str, &str)] = &[
    (LEGACY_NOTES_KEY, NOTES_KEY),
    (LEGACY_SETTINGS_KEY, SETTINGS_KEY),
];

fn defaults() -> StorageResult<Vec<(&'static str, Value)>> {
    Ok(vec![
        (NOTES_KEY, json!({})),
        (RECENT_VIDEOS_KEY, json!([])),
        (GLOBAL_TAGS_KEY, json!([])),
        (RECENT_TAGS_KEY, json!([])),
        (SETTINGS_KEY, serde_json::to_value(Settings::default())?),
        (CHANNEL_PREFERENCES_KEY, json!({})),
    ])
}

fn is_present(record: &Record, key: &str) -> bool {
    matches!(record.get(key), Some(v) if !v.is_null())
}

/// Bring the store up to the current bucket layout
pub fn migrate(storage: &dyn StorageGateway) -> StorageResult<MigrationReport> {
    let defaults = defaults()?;
    let mut keys: Vec<&str> = defaults.iter().map(|(k, _)| *k).collect();
    keys.extend(LEGACY_RENAMES.iter().map(|(legacy, _)| *legacy));

    let existing = storage.get(&keys)?;
    let mut updates = Record::new();
    let mut report = MigrationReport::default();

    for (legacy, current) in LEGACY_RENAMES {
        if is_present(&existing, legacy) && !is_present(&existing, current) {
            updates.insert(current.to_string(), existing[*legacy].clone());
            report.migrated.push(current.to_string());
            info!("migrating {} to {}", legacy, current);
        }
    }

    for (key, value) in defaults {
        if !is_present(&existing, key) && !updates.contains_key(key) {
            updates.insert(key.to_string(), value);
            report.initialized.push(key.to_string());
        }
    }

    if !updates.is_empty() {
        storage.set(updates)?;
        info!(
            initialized = report.initialized.len(),
            migrated = report.migrated.len(),
            "storage layout updated"
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::buckets::{load_notes_map, load_settings, write};
    use crate::storage::MemoryStorage;

    #[test]
    fn test_first_run_initializes_all_buckets() {
        let storage = MemoryStorage::new();
        let report = migrate(&storage).unwrap();

        assert_eq!(report.initialized.len(), 6);
        assert!(report.migrated.is_empty());

        let all = storage
            .get(&[NOTES_KEY, RECENT_VIDEOS_KEY, GLOBAL_TAGS_KEY, RECENT_TAGS_KEY, SETTINGS_KEY, CHANNEL_PREFERENCES_KEY])
            .unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[SETTINGS_KEY]["rememberChannels"], json!(true));
    }

    #[test]
    fn test_second_run_is_noop() {
        let storage = MemoryStorage::new();
        migrate(&storage).unwrap();
        let report = migrate(&storage).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_legacy_buckets_are_copied() {
        let storage = MemoryStorage::new();
        write(
            &storage,
            LEGACY_NOTES_KEY,
            &json!({"v1": [{"id": "1", "videoId": "v1", "text": "old", "timestamp": 4, "createdAt": "2024-01-01T00:00:00Z"}]}),
        )
        .unwrap();
        write(
            &storage,
            LEGACY_SETTINGS_KEY,
            &json!({"autoActivateMinutes": 3, "rememberChannels": false}),
        )
        .unwrap();

        let report = migrate(&storage).unwrap();
        assert_eq!(report.migrated, vec![NOTES_KEY, SETTINGS_KEY]);
        assert!(!report.initialized.contains(&NOTES_KEY.to_string()));

        let map = load_notes_map(&storage).unwrap();
        assert_eq!(map["v1"][0].text, "old");
        assert_eq!(load_settings(&storage).unwrap().auto_activate_minutes, 3);
    }

    #[test]
    fn test_legacy_never_overwrites_new_data() {
        let storage = MemoryStorage::new();
        write(&storage, NOTES_KEY, &json!({"new": []})).unwrap();
        write(&storage, LEGACY_NOTES_KEY, &json!({"old": []})).unwrap();

        let report = migrate(&storage).unwrap();
        assert!(report.migrated.is_empty());

        let map = load_notes_map(&storage).unwrap();
        assert!(map.contains_key("new"));
        assert!(!map.contains_key("old"));
    }
}
