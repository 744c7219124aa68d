//! Clear command handler

use anyhow::{bail, Context, Result};

use notestream_core::storage::buckets;
use notestream_core::SharedStorage;

use crate::editor::confirm;
use crate::output::Output;

/// Remove every note, recent video and registered tag
///
/// Settings and channel preferences survive. Without `--yes` the user is
/// asked twice; non-interactive runs must pass `--yes`.
pub fn run(storage: &SharedStorage, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !output.should_prompt() {
            bail!("Refusing to clear data without --yes");
        }
        if !confirm("Delete all notes and tags?")? {
            println!("Cancelled.");
            return Ok(());
        }
        if !confirm("This cannot be undone. Are you really sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    buckets::clear_all_data(storage.as_ref()).context("Failed to clear data")?;
    output.success("Cleared all notes, recent videos and tags");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use notestream_core::storage::MemoryStorage;
    use notestream_core::{NoteContent, NoteStore, VideoInfo};
    use std::sync::Arc;

    #[test]
    fn test_clear_requires_yes_when_not_interactive() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let output = Output::new(OutputFormat::Quiet);
        assert!(run(&storage, false, &output).is_err());
    }

    #[test]
    fn test_clear_keeps_settings() {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let mut store = NoteStore::open(storage.clone()).unwrap();
        store.set_video(Some(VideoInfo::new("v1"))).unwrap();
        store
            .create(NoteContent::new("note", 1.0).with_tags(["t"]))
            .unwrap();
        buckets::set_channel_preference(storage.as_ref(), "Chan", true).unwrap();

        run(&storage, true, &Output::new(OutputFormat::Quiet)).unwrap();

        assert!(buckets::load_notes_map(storage.as_ref()).unwrap().is_empty());
        assert!(buckets::load_recent_videos(storage.as_ref()).unwrap().is_empty());
        let (global, recent) = buckets::load_tag_lists(storage.as_ref()).unwrap();
        assert!(global.is_empty());
        assert!(recent.is_empty());
        assert!(buckets::load_channel_preferences(storage.as_ref())
            .unwrap()
            .contains_key("Chan"));
    }
}
