//! Video command handlers
//!
//! Videos are not stored on their own; they are derived from the notes
//! that reference them.

use anyhow::{Context, Result};

use notestream_core::dashboard::search_videos;
use notestream_core::storage::buckets;
use notestream_core::{derive_videos, format_time, NoteStore, SharedStorage, Video, VideoInfo};

use super::{parse_video_ref, resolve_prefix};
use crate::output::{Output, OutputFormat};

/// List videos with notes, most recently updated first
pub fn list(storage: &SharedStorage, search: Option<String>, output: &Output) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    let videos = derive_videos(store.load_all()?);

    let shown = match &search {
        Some(query) => search_videos(&videos, query),
        None => videos.iter().collect(),
    };
    output.print_videos(&shown)
}

/// Show a video and its notes in timestamp order
pub fn show(storage: &SharedStorage, id: String, output: &Output) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    let videos = derive_videos(store.load_all()?);
    let video = find_video(&videos, &id)?;

    store.load(&video.id)?;
    let notes: Vec<_> = store.notes().iter().collect();

    match output.format {
        OutputFormat::Json => {
            output.json(&serde_json::json!({ "video": video, "notes": notes }))?;
        }
        OutputFormat::Quiet => println!("{}", video.id),
        OutputFormat::Human => {
            println!("ID:       {}", video.id);
            println!("Title:    {}", video.title);
            println!("Channel:  {}", video.channel);
            if video.duration > 0.0 {
                println!("Duration: {}", format_time(video.duration));
            }
            println!("URL:      {}", VideoInfo::watch_url(&video.id));
            println!("Updated:  {}", video.last_updated.format("%Y-%m-%d %H:%M"));
            println!();
            output.print_notes(&notes)?;
        }
    }

    Ok(())
}

/// Record a video as recently viewed
pub fn visit(storage: &SharedStorage, video: String, output: &Output) -> Result<()> {
    let video_id = parse_video_ref(&video)?;
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store.set_video(Some(VideoInfo::new(&video_id)))?;
    let recent = store.record_visit().context("Failed to record visit")?;

    if output.is_json() {
        output.json(&serde_json::json!({ "recent": recent }))?;
    } else {
        output.success(&format!("Recorded visit to {}", video_id));
    }
    Ok(())
}

/// List recently viewed videos, most recent first
pub fn recent(storage: &SharedStorage, output: &Output) -> Result<()> {
    let recent = buckets::load_recent_videos(storage.as_ref())
        .context("Failed to load recent videos")?;

    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    let videos = derive_videos(store.load_all()?);

    match output.format {
        OutputFormat::Json => output.json(&recent)?,
        OutputFormat::Quiet => {
            for id in &recent {
                println!("{}", id);
            }
        }
        OutputFormat::Human => {
            if recent.is_empty() {
                println!("No recent videos.");
                return Ok(());
            }
            for id in &recent {
                match videos.iter().find(|v| &v.id == id) {
                    Some(video) => println!("{} | {} | {}", id, video.title, video.channel),
                    None => println!("{} | (no notes)", id),
                }
            }
        }
    }
    Ok(())
}

fn find_video<'a>(videos: &'a [Video], id: &str) -> Result<&'a Video> {
    let id = parse_video_ref(id)?;
    resolve_prefix(videos, &id, "video", |v| v.id.as_str(), |v| v.title.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notestream_core::storage::MemoryStorage;
    use notestream_core::NoteContent;
    use std::sync::Arc;

    fn seeded() -> SharedStorage {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let mut store = NoteStore::open(storage.clone()).unwrap();
        store
            .set_video(Some(VideoInfo::new("abc123").with_title("Rust Talk")))
            .unwrap();
        store.create(NoteContent::new("one", 1.0)).unwrap();
        storage
    }

    #[test]
    fn test_find_video_by_prefix_and_url() {
        let storage = seeded();
        let mut store = NoteStore::open(storage).unwrap();
        let videos = derive_videos(store.load_all().unwrap());

        assert_eq!(find_video(&videos, "abc").unwrap().title, "Rust Talk");
        assert_eq!(
            find_video(&videos, "https://youtu.be/abc123").unwrap().id,
            "abc123"
        );
        assert!(find_video(&videos, "zzz").is_err());
    }

    #[test]
    fn test_visit_records_recent_video() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let output = Output::new(OutputFormat::Quiet);
        visit(&storage, "first".to_string(), &output).unwrap();
        visit(&storage, "second".to_string(), &output).unwrap();
        visit(&storage, "first".to_string(), &output).unwrap();

        assert_eq!(
            buckets::load_recent_videos(storage.as_ref()).unwrap(),
            vec!["first", "second"]
        );
    }
}
