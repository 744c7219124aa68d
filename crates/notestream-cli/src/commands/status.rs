//! Status command handler

use anyhow::{Context, Result};

use notestream_core::storage::{buckets, FileStorage};
use notestream_core::{derive_videos, Config, NoteStore, SharedStorage};

use crate::output::{Output, OutputFormat};

/// Show storage location, size and content counts
pub fn show(storage: &SharedStorage, config: &Config, output: &Output) -> Result<()> {
    let file = FileStorage::new(config.storage_path());

    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    let notes = store.load_all()?;
    let note_count = notes.len();
    let video_count = derive_videos(notes).len();
    let tag_count = store.tag_registry().global_tags().len();
    let recent_count = buckets::load_recent_videos(storage.as_ref())
        .context("Failed to load recent videos")?
        .len();

    match output.format {
        OutputFormat::Json => {
            output.json(&serde_json::json!({
                "storage": {
                    "path": file.path(),
                    "exists": file.exists(),
                    "size": file.size(),
                },
                "counts": {
                    "notes": note_count,
                    "videos": video_count,
                    "tags": tag_count,
                    "recent_videos": recent_count,
                }
            }))?;
        }
        OutputFormat::Quiet => {
            println!("{}", note_count);
        }
        OutputFormat::Human => {
            println!("NoteStream Status");
            println!("=================");
            println!();
            println!("Storage:");
            println!("  Location: {}", file.path().display());
            println!("  Size:     {}", human_size(file.size()));
            println!();
            println!("Contents:");
            println!("  Notes:         {}", note_count);
            println!("  Videos:        {}", video_count);
            println!("  Tags:          {}", tag_count);
            println!("  Recent videos: {}", recent_count);
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(3 * 1024 * 1024), "3.0 MB");
    }
}
