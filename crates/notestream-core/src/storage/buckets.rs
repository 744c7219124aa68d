//! Typed access to the persisted buckets
//!
//! Bucket layout:
//! - `noteStreamData`: video id -> notes sorted by timestamp
//! - `recentVideos`: up to 10 video ids, most recent first
//! - `globalTags` / `recentTags`: tag vocabulary and its MRU subset
//! - `noteStreamSettings`: extension settings
//! - `channelPreferences`: channel name -> activation choice

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::error::{StorageError, StorageResult};
use super::gateway::{Record, StorageGateway};
use crate::models::{ChannelPreference, Note, Settings};

pub const NOTES_KEY: &str = "noteStreamData";
pub const RECENT_VIDEOS_KEY: &str = "recentVideos";
pub const GLOBAL_TAGS_KEY: &str = "globalTags";
pub const RECENT_TAGS_KEY: &str = "recentTags";
pub const SETTINGS_KEY: &str = "noteStreamSettings";
pub const CHANNEL_PREFERENCES_KEY: &str = "channelPreferences";

/// Bucket names used by releases before the rename
pub const LEGACY_NOTES_KEY: &str = "podNoteData";
pub const LEGACY_SETTINGS_KEY: &str = "podNoteSettings";

/// Maximum number of entries kept in `recentVideos`
pub const MAX_RECENT_VIDEOS: usize = 10;

/// Per-video notes map, the canonical note store
pub type NotesMap = BTreeMap<String, Vec<Note>>;

/// Channel name to remembered preference
pub type ChannelPreferences = BTreeMap<String, ChannelPreference>;

/// Read one bucket, treating a missing or null value as the default
pub fn read<T>(storage: &dyn StorageGateway, key: &str) -> StorageResult<T>
where
    T: DeserializeOwned + Default,
{
    let mut record = storage.get(&[key])?;
    match record.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value).map_err(|e| StorageError::InvalidBucket {
            key: key.to_string(),
            details: e.to_string(),
        }),
    }
}

/// Serialize `value` into a single-bucket record entry
pub fn entry<T: Serialize>(key: &str, value: &T) -> StorageResult<(String, Value)> {
    Ok((key.to_string(), serde_json::to_value(value)?))
}

/// Write one bucket
pub fn write<T: Serialize>(storage: &dyn StorageGateway, key: &str, value: &T) -> StorageResult<()> {
    let mut record = Record::new();
    let (key, value) = entry(key, value)?;
    record.insert(key, value);
    storage.set(record)
}

/// Load the full per-video notes map
///
/// Notes stored without a `videoId` get it back-filled from their map key.
pub fn load_notes_map(storage: &dyn StorageGateway) -> StorageResult<NotesMap> {
    let mut map: NotesMap = read(storage, NOTES_KEY)?;
    for (video_id, notes) in map.iter_mut() {
        for note in notes.iter_mut().filter(|n| n.video_id.is_empty()) {
            note.video_id = video_id.clone();
        }
    }
    Ok(map)
}

/// Load the stored sequence for one video
pub fn load_video_notes(storage: &dyn StorageGateway, video_id: &str) -> StorageResult<Vec<Note>> {
    Ok(load_notes_map(storage)?.remove(video_id).unwrap_or_default())
}

/// Replace one video's sequence in the notes map
///
/// The sequence is written sorted by timestamp ascending.
pub fn save_video_notes(
    storage: &dyn StorageGateway,
    video_id: &str,
    notes: &[Note],
) -> StorageResult<()> {
    let mut map = load_notes_map(storage)?;
    let mut sequence = notes.to_vec();
    sequence.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    map.insert(video_id.to_string(), sequence);
    write(storage, NOTES_KEY, &map)
}

/// Recently viewed video ids, most recent first
pub fn load_recent_videos(storage: &dyn StorageGateway) -> StorageResult<Vec<String>> {
    read(storage, RECENT_VIDEOS_KEY)
}

/// Move a video id to the front of the recent list
pub fn record_recent_video(storage: &dyn StorageGateway, video_id: &str) -> StorageResult<Vec<String>> {
    let recent = load_recent_videos(storage)?;
    let updated: Vec<String> = std::iter::once(video_id.to_string())
        .chain(recent.into_iter().filter(|id| id != video_id))
        .take(MAX_RECENT_VIDEOS)
        .collect();
    write(storage, RECENT_VIDEOS_KEY, &updated)?;
    Ok(updated)
}

/// Load the tag vocabulary and its MRU list
pub fn load_tag_lists(storage: &dyn StorageGateway) -> StorageResult<(Vec<String>, Vec<String>)> {
    let mut record = storage.get(&[GLOBAL_TAGS_KEY, RECENT_TAGS_KEY])?;
    let mut take = |key: &str| -> StorageResult<Vec<String>> {
        match record.remove(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| StorageError::InvalidBucket {
                key: key.to_string(),
                details: e.to_string(),
            }),
        }
    };
    let global = take(GLOBAL_TAGS_KEY)?;
    let recent = take(RECENT_TAGS_KEY)?;
    Ok((global, recent))
}

/// Persist both tag lists in one write
pub fn save_tag_lists(
    storage: &dyn StorageGateway,
    global: &[String],
    recent: &[String],
) -> StorageResult<()> {
    let record: Record = [entry(GLOBAL_TAGS_KEY, &global)?, entry(RECENT_TAGS_KEY, &recent)?]
        .into_iter()
        .collect();
    storage.set(record)
}

pub fn load_settings(storage: &dyn StorageGateway) -> StorageResult<Settings> {
    read(storage, SETTINGS_KEY)
}

pub fn save_settings(storage: &dyn StorageGateway, settings: &Settings) -> StorageResult<()> {
    write(storage, SETTINGS_KEY, settings)
}

pub fn load_channel_preferences(storage: &dyn StorageGateway) -> StorageResult<ChannelPreferences> {
    read(storage, CHANNEL_PREFERENCES_KEY)
}

/// Remember whether the sidebar should open for a channel
pub fn set_channel_preference(
    storage: &dyn StorageGateway,
    channel: &str,
    enabled: bool,
) -> StorageResult<ChannelPreference> {
    let mut prefs = load_channel_preferences(storage)?;
    let pref = ChannelPreference::new(enabled);
    prefs.insert(channel.to_string(), pref.clone());
    write(storage, CHANNEL_PREFERENCES_KEY, &prefs)?;
    Ok(pref)
}

/// Remove all notes, recent videos and both tag lists
///
/// Settings and channel preferences are kept. The recent tag list goes with
/// the vocabulary so it never names a tag the vocabulary lacks.
pub fn clear_all_data(storage: &dyn StorageGateway) -> StorageResult<()> {
    storage.remove(&[NOTES_KEY, RECENT_VIDEOS_KEY, GLOBAL_TAGS_KEY, RECENT_TAGS_KEY])?;
    info!("cleared notes, recent videos and tags");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoInfo;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn note(id: &str, video: &str, ts: f64) -> Note {
        Note::new(id, &VideoInfo::new(video), format!("note {}", id), ts)
    }

    #[test]
    fn test_read_missing_bucket_is_default() {
        let storage = MemoryStorage::new();
        let tags: Vec<String> = read(&storage, GLOBAL_TAGS_KEY).unwrap();
        assert!(tags.is_empty());
        assert_eq!(load_settings(&storage).unwrap(), Settings::default());
    }

    #[test]
    fn test_read_wrong_shape_is_error() {
        let storage = MemoryStorage::new();
        write(&storage, GLOBAL_TAGS_KEY, &json!({"not": "a list"})).unwrap();

        let err = read::<Vec<String>>(&storage, GLOBAL_TAGS_KEY).unwrap_err();
        assert!(matches!(err, StorageError::InvalidBucket { .. }));
    }

    #[test]
    fn test_save_video_notes_sorts_by_timestamp() {
        let storage = MemoryStorage::new();
        let notes = vec![note("1", "v1", 30.0), note("2", "v1", 5.0), note("3", "v1", 12.0)];
        save_video_notes(&storage, "v1", &notes).unwrap();

        let stored = load_video_notes(&storage, "v1").unwrap();
        let ids: Vec<_> = stored.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_save_video_notes_leaves_other_videos() {
        let storage = MemoryStorage::new();
        save_video_notes(&storage, "v1", &[note("1", "v1", 1.0)]).unwrap();
        save_video_notes(&storage, "v2", &[note("2", "v2", 1.0)]).unwrap();
        save_video_notes(&storage, "v1", &[]).unwrap();

        let map = load_notes_map(&storage).unwrap();
        assert!(map["v1"].is_empty());
        assert_eq!(map["v2"].len(), 1);
    }

    #[test]
    fn test_load_notes_map_backfills_video_id() {
        let storage = MemoryStorage::new();
        write(
            &storage,
            NOTES_KEY,
            &json!({"v9": [{"id": "1", "text": "legacy", "timestamp": 3, "createdAt": "2024-01-01T00:00:00Z"}]}),
        )
        .unwrap();

        let notes = load_video_notes(&storage, "v9").unwrap();
        assert_eq!(notes[0].video_id, "v9");
        assert!(notes[0].video_info.is_none());
    }

    #[test]
    fn test_record_recent_video_dedupes_and_bounds() {
        let storage = MemoryStorage::new();
        for i in 0..12 {
            record_recent_video(&storage, &format!("v{}", i)).unwrap();
        }
        let recent = record_recent_video(&storage, "v5").unwrap();

        assert_eq!(recent.len(), MAX_RECENT_VIDEOS);
        assert_eq!(recent[0], "v5");
        assert_eq!(recent.iter().filter(|id| *id == "v5").count(), 1);
        assert_eq!(recent[1], "v11");
    }

    #[test]
    fn test_tag_lists_round_trip() {
        let storage = MemoryStorage::new();
        save_tag_lists(&storage, &["a".into(), "b".into()], &["b".into()]).unwrap();

        let (global, recent) = load_tag_lists(&storage).unwrap();
        assert_eq!(global, vec!["a", "b"]);
        assert_eq!(recent, vec!["b"]);
    }

    #[test]
    fn test_channel_preferences() {
        let storage = MemoryStorage::new();
        set_channel_preference(&storage, "Fireship", true).unwrap();
        set_channel_preference(&storage, "Other", false).unwrap();
        set_channel_preference(&storage, "Fireship", false).unwrap();

        let prefs = load_channel_preferences(&storage).unwrap();
        assert_eq!(prefs.len(), 2);
        assert!(!prefs["Fireship"].enabled);
    }

    #[test]
    fn test_clear_all_data_keeps_settings() {
        let storage = MemoryStorage::new();
        save_video_notes(&storage, "v1", &[note("1", "v1", 1.0)]).unwrap();
        record_recent_video(&storage, "v1").unwrap();
        save_tag_lists(&storage, &["a".into()], &["a".into()]).unwrap();
        save_settings(
            &storage,
            &Settings {
                auto_activate_minutes: 5,
                remember_channels: false,
            },
        )
        .unwrap();

        clear_all_data(&storage).unwrap();

        assert!(load_notes_map(&storage).unwrap().is_empty());
        assert!(load_recent_videos(&storage).unwrap().is_empty());
        assert_eq!(load_settings(&storage).unwrap().auto_activate_minutes, 5);

        let (global, recent) = load_tag_lists(&storage).unwrap();
        assert!(global.is_empty());
        assert!(recent.is_empty());
    }
}
