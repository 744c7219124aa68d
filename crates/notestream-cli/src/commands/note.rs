//! Note command handlers
//!
//! `note add` plays both sides of the sidebar bridge: a host that knows the
//! video and the requested position, and a surface holding the note store.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use notestream_core::bridge::{
    bridge, Host, PlaybackControl, Surface, SurfaceRequest, VideoDescriptorProvider,
    DEFAULT_CAPACITY,
};
use notestream_core::storage::buckets;
use notestream_core::{
    derive_videos, format_time, Note, NoteContent, NoteStore, SharedStorage, VideoInfo,
};

use super::{parse_time_arg, parse_video_ref, resolve_prefix};
use crate::editor::{confirm, edit_note_text};
use crate::output::{short_id, truncate_line, Output, OutputFormat};

/// Video details given on the command line
#[derive(Debug, Clone, Default)]
pub struct VideoFlags {
    pub title: Option<String>,
    pub channel: Option<String>,
    pub duration: Option<String>,
}

/// Descriptor assembled from flags and earlier notes
struct KnownVideo(VideoInfo);

impl VideoDescriptorProvider for KnownVideo {
    fn current_video(&self) -> Option<VideoInfo> {
        Some(self.0.clone())
    }
}

/// Stand-in player parked at the requested position
struct Cursor {
    position: AtomicU64,
}

impl Cursor {
    fn at(seconds: f64) -> Self {
        Self {
            position: AtomicU64::new(seconds.to_bits()),
        }
    }
}

impl PlaybackControl for Cursor {
    fn current_time(&self) -> f64 {
        f64::from_bits(self.position.load(Ordering::SeqCst))
    }

    fn seek(&self, seconds: f64) {
        self.position.store(seconds.to_bits(), Ordering::SeqCst);
    }

    fn toggle_playback(&self) {
        debug!("no player attached, play/pause ignored");
    }
}

/// Build the descriptor for a video, preferring flags over stored details
pub fn describe_video(
    storage: &SharedStorage,
    video_id: &str,
    flags: &VideoFlags,
) -> Result<VideoInfo> {
    let notes = buckets::load_video_notes(storage.as_ref(), video_id)
        .context("Failed to load video notes")?;

    let mut info = VideoInfo::new(video_id);
    if let Some(known) = derive_videos(&notes).into_iter().next() {
        info = info
            .with_title(known.title)
            .with_channel(known.channel)
            .with_duration(known.duration);
    }

    if let Some(title) = &flags.title {
        info = info.with_title(title.as_str());
    }
    if let Some(channel) = &flags.channel {
        info = info.with_channel(channel.as_str());
    }
    if let Some(duration) = &flags.duration {
        info = info.with_duration(parse_time_arg(duration)?);
    }

    if !info.has_known_title() {
        warn!(video_id, "no title known for video, using placeholder");
    }
    Ok(info)
}

/// Add a note to a video
pub fn add(
    storage: &SharedStorage,
    video: String,
    text: Option<String>,
    at: Option<String>,
    tags: Vec<String>,
    flags: VideoFlags,
    output: &Output,
) -> Result<()> {
    let video_id = parse_video_ref(&video)?;
    let position = match at {
        Some(at) => parse_time_arg(&at)?,
        None => 0.0,
    };
    let info = describe_video(storage, &video_id, &flags)?;

    let text = match text {
        Some(text) => text,
        None => {
            let header = vec![
                format!("Adding note to: {}", info.title),
                format!("At {} on {}", format_time(position), info.url),
            ];
            edit_note_text(&header, "")?
        }
    };

    let store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    let mut surface = Surface::new(store);
    let mut host = Host::new(KnownVideo(info), Cursor::at(position), storage.clone());
    let (mut surface_end, mut host_end) = bridge(DEFAULT_CAPACITY);

    surface_end.send(SurfaceRequest::SidebarReady)?;
    surface_end.send(SurfaceRequest::GetCurrentTime)?;
    host.pump(&mut host_end)?;
    surface.sync(&mut surface_end)?;

    let note = surface
        .add_note_here(&text, tags)
        .context("Failed to add note")?;

    match output.format {
        OutputFormat::Json => output.json(&note)?,
        OutputFormat::Quiet => println!("{}", note.id),
        OutputFormat::Human => {
            let tags = if note.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", note.tags.join(", "))
            };
            output.success(&format!(
                "Added note {} at {} on {}{}",
                short_id(&note.id),
                note.timestamp_formatted,
                note.video_title(),
                tags
            ));
        }
    }

    Ok(())
}

/// List notes of one video, or of every video
pub fn list(
    storage: &SharedStorage,
    video: Option<String>,
    tag: Option<String>,
    search: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    match video {
        Some(video) => {
            store.load(&parse_video_ref(&video)?)?;
        }
        None => {
            store.load_all()?;
        }
    }

    let mut notes = match &search {
        Some(query) => store.search(query),
        None => store.filter_by_tag(None),
    };
    if let Some(tag) = &tag {
        notes.retain(|n| n.has_tag(tag));
    }

    output.print_notes(&notes)
}

/// Show one note
pub fn show(storage: &SharedStorage, id: String, output: &Output) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store.load_all()?;
    let note = find_note(store.notes(), &id)?;
    output.print_note(note)
}

/// Edit a note's text, timestamp or tags
///
/// Opens the editor when no field is given on the command line.
pub fn edit(
    storage: &SharedStorage,
    id: String,
    text: Option<String>,
    at: Option<String>,
    tags: Option<Vec<String>>,
    output: &Output,
) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store.load_all()?;
    let note = find_note(store.notes(), &id)?.clone();

    let mut content = NoteContent::from_note(&note);
    let interactive = text.is_none() && at.is_none() && tags.is_none();

    if interactive {
        let header = vec![
            format!("Editing note on: {}", note.video_title()),
            format!("At {}", note.timestamp_formatted),
        ];
        let edited = edit_note_text(&header, &note.text)?;
        if edited == note.text {
            output.message("No changes made.");
            return Ok(());
        }
        content.text = edited;
        content.rich_content = None;
    }

    if let Some(text) = text {
        content.text = text;
        content.rich_content = None;
    }
    if let Some(at) = at {
        content.timestamp = parse_time_arg(&at)?;
    }
    if let Some(tags) = tags {
        content.tags = tags;
    }

    match store.update(&note.id, content).context("Failed to update note")? {
        Some(updated) => {
            if output.is_json() {
                output.json(&updated)?;
            } else {
                output.success(&format!("Updated note {}", short_id(&updated.id)));
            }
        }
        None => bail!("Note not found: {}", id),
    }

    Ok(())
}

/// Delete a note
pub fn delete(storage: &SharedStorage, id: String, yes: bool, output: &Output) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store.load_all()?;
    let note = find_note(store.notes(), &id)?.clone();

    if output.should_prompt() && !yes {
        println!(
            "Delete note: {} - {}",
            short_id(&note.id),
            truncate_line(&note.text, 50)
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if store.delete(&note.id).context("Failed to delete note")? {
        output.success(&format!("Deleted note: {}", note.id));
    } else {
        output.message(&format!("Note {} was already deleted.", note.id));
    }

    Ok(())
}

fn find_note<'a>(notes: &'a [Note], id: &str) -> Result<&'a Note> {
    resolve_prefix(
        notes,
        id,
        "note",
        |n| n.id.as_str(),
        |n| truncate_line(&n.text, 50),
    )
}
