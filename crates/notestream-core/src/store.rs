//! Note store
//!
//! The `NoteStore` owns the active video context, a handle on the tag
//! registry and an in-memory cache of notes. It works in one of two scopes:
//! - **Video**: the notes of a single video (sidebar context)
//! - **All**: every note of every video (dashboard context)
//!
//! The per-video notes map in storage stays the source of truth. Local
//! mutations update the cache first and are rolled back when the write
//! fails; `load` always replaces the cache wholesale.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = NoteStore::open(storage)?;
//! store.set_video(Some(video))?;
//!
//! let note = store.create(NoteContent::new("Ownership rules", 65.0))?;
//! let questions = store.filter_by_tag(Some("question"));
//! ```

use std::collections::BTreeSet;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{normalize_tags, sort_by_first_seen_video, Note, VideoInfo};
use crate::storage::buckets;
use crate::storage::{SharedStorage, StorageError, StorageResult};
use crate::tags::{suggest, TagRegistry};

/// Errors reported by note operations
#[derive(Error, Debug)]
pub enum NoteError {
    /// Note text was empty or whitespace
    #[error("Note text cannot be empty")]
    EmptyText,

    /// No video is active to attach the note to
    #[error("No active video. Open a video before adding notes.")]
    NoActiveVideo,

    /// The storage layer failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type NoteResult<T> = Result<T, NoteError>;

/// Whether the store currently holds a loaded note list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Empty,
    Loaded,
}

/// Which notes the cache covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Notes of one video
    Video(String),
    /// Notes of every video
    All,
}

/// Editable fields of a note
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteContent {
    pub text: String,
    pub rich_content: Option<String>,
    pub tags: Vec<String>,
    pub timestamp: f64,
}

impl NoteContent {
    pub fn new(text: impl Into<String>, timestamp: f64) -> Self {
        Self {
            text: text.into(),
            timestamp,
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rich_content(mut self, rich: impl Into<String>) -> Self {
        self.rich_content = Some(rich.into());
        self
    }

    /// Content of an existing note, as a starting point for edits
    pub fn from_note(note: &Note) -> Self {
        Self {
            text: note.text.clone(),
            rich_content: note.rich_content.clone(),
            tags: note.tags.clone(),
            timestamp: note.timestamp,
        }
    }

    fn validate(&self) -> NoteResult<()> {
        if self.text.trim().is_empty() {
            return Err(NoteError::EmptyText);
        }
        Ok(())
    }
}

/// In-memory note collection backed by the storage gateway
pub struct NoteStore {
    storage: SharedStorage,
    tags: TagRegistry,
    video: Option<VideoInfo>,
    scope: Option<Scope>,
    notes: Vec<Note>,
    last_id: i64,
}

impl NoteStore {
    /// Open a store with an empty cache and no active video
    pub fn open(storage: SharedStorage) -> NoteResult<Self> {
        let tags = TagRegistry::load(storage.clone())?;
        Ok(Self {
            storage,
            tags,
            video: None,
            scope: None,
            notes: Vec::new(),
            last_id: 0,
        })
    }

    // ==================== Context ====================

    pub fn state(&self) -> LoadState {
        match self.scope {
            Some(_) => LoadState::Loaded,
            None => LoadState::Empty,
        }
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn active_video(&self) -> Option<&VideoInfo> {
        self.video.as_ref()
    }

    /// Switch the active video and load its notes
    ///
    /// Passing `None` clears the context and empties the cache.
    pub fn set_video(&mut self, video: Option<VideoInfo>) -> NoteResult<()> {
        match video {
            Some(video) => {
                let video_id = video.video_id.clone();
                self.video = Some(video);
                self.load(&video_id)?;
            }
            None => {
                self.video = None;
                self.clear();
            }
        }
        Ok(())
    }

    /// Record the active video as recently viewed
    pub fn record_visit(&self) -> NoteResult<Vec<String>> {
        let video = self.video.as_ref().ok_or(NoteError::NoActiveVideo)?;
        Ok(buckets::record_recent_video(
            self.storage.as_ref(),
            &video.video_id,
        )?)
    }

    pub fn tag_registry(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn tag_registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    // ==================== Loading ====================

    /// Replace the cache with the stored notes of one video
    pub fn load(&mut self, video_id: &str) -> NoteResult<&[Note]> {
        self.notes = buckets::load_video_notes(self.storage.as_ref(), video_id)?;
        self.scope = Some(Scope::Video(video_id.to_string()));
        self.tags.reload()?;
        debug!(video_id, count = self.notes.len(), "loaded video notes");
        Ok(&self.notes)
    }

    /// Replace the cache with every stored note
    ///
    /// Tags found on notes but missing from the registry are registered
    /// without touching the recent list.
    pub fn load_all(&mut self) -> NoteResult<&[Note]> {
        let map = buckets::load_notes_map(self.storage.as_ref())?;
        self.notes = map.into_values().flatten().collect();
        self.scope = Some(Scope::All);

        self.tags.reload()?;
        let tags: Vec<String> = self.notes.iter().flat_map(|n| n.tags.clone()).collect();
        if self.tags.ensure_registered(&tags)? {
            info!("registered tags found on stored notes");
        }

        debug!(count = self.notes.len(), "loaded all notes");
        Ok(&self.notes)
    }

    /// Drop the cache
    pub fn clear(&mut self) {
        self.notes.clear();
        self.scope = None;
    }

    // ==================== Mutations ====================

    /// Create a note on the active video
    ///
    /// When no tags are given, the top suggestion (if any) is applied.
    pub fn create(&mut self, content: NoteContent) -> NoteResult<Note> {
        content.validate()?;
        let video = self.video.clone().ok_or(NoteError::NoActiveVideo)?;

        let covered = match &self.scope {
            Some(Scope::All) => true,
            Some(Scope::Video(id)) => *id == video.video_id,
            None => false,
        };
        if !covered {
            self.load(&video.video_id)?;
        }

        let mut tags = normalize_tags(content.tags);
        if tags.is_empty() {
            let title = video.has_known_title().then_some(video.title.as_str());
            if let Some(top) = suggest(&content.text, title).into_iter().next() {
                debug!(tag = %top, "auto-applying suggested tag");
                tags.push(top);
            }
        }
        self.tags.register_all(&tags)?;

        let id = self.next_id();
        let mut note = Note::new(id, &video, content.text, content.timestamp).with_tags(tags);
        note.rich_content = content.rich_content;

        self.notes.push(note.clone());
        self.resort();

        if let Err(e) = self.persist_video(&video.video_id) {
            self.notes.retain(|n| n.id != note.id);
            return Err(e.into());
        }
        buckets::record_recent_video(self.storage.as_ref(), &video.video_id)?;

        info!(id = %note.id, video_id = %note.video_id, "created note");
        Ok(note)
    }

    /// Replace the editable fields of a note
    ///
    /// An unknown id is not an error: nothing changes and `None` is returned.
    pub fn update(&mut self, note_id: &str, content: NoteContent) -> NoteResult<Option<Note>> {
        content.validate()?;

        let Some(index) = self.position(note_id) else {
            warn!(note_id, "update of unknown note ignored");
            return Ok(None);
        };

        let tags = normalize_tags(content.tags);
        self.tags.register_all(&tags)?;

        let previous = self.notes[index].clone();
        let note = &mut self.notes[index];
        note.text = content.text;
        note.rich_content = content.rich_content;
        note.tags = tags;
        note.set_timestamp(content.timestamp);
        note.updated_at = Some(Utc::now());
        let updated = note.clone();

        self.resort();

        if let Err(e) = self.persist_video(&updated.video_id) {
            if let Some(index) = self.position(note_id) {
                self.notes[index] = previous;
            }
            self.resort();
            return Err(e.into());
        }

        info!(id = %updated.id, "updated note");
        Ok(Some(updated))
    }

    /// Remove a note; returns false when the id was not present
    pub fn delete(&mut self, note_id: &str) -> NoteResult<bool> {
        let Some(index) = self.position(note_id) else {
            debug!(note_id, "delete of unknown note ignored");
            return Ok(false);
        };

        let removed = self.notes.remove(index);
        if let Err(e) = self.persist_video(&removed.video_id) {
            self.notes.insert(index, removed);
            return Err(e.into());
        }

        info!(id = %removed.id, video_id = %removed.video_id, "deleted note");
        Ok(true)
    }

    // ==================== Queries ====================

    /// Cached notes in display order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn find(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    /// Notes carrying `tag`, or every note when `tag` is `None`
    pub fn filter_by_tag(&self, tag: Option<&str>) -> Vec<&Note> {
        match tag {
            Some(tag) => self.notes.iter().filter(|n| n.has_tag(tag)).collect(),
            None => self.notes.iter().collect(),
        }
    }

    /// Distinct tags across the cached notes, sorted
    pub fn unique_tags(&self) -> Vec<String> {
        self.notes
            .iter()
            .flat_map(|n| n.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Case-insensitive match on note text or tags
    pub fn search(&self, query: &str) -> Vec<&Note> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.notes.iter().collect();
        }

        self.notes
            .iter()
            .filter(|n| {
                n.text.to_lowercase().contains(&query)
                    || n.tags.iter().any(|t| t.to_lowercase().contains(&query))
            })
            .collect()
    }

    /// Tag suggestions for draft text on the active video
    pub fn suggestions(&self, text: &str) -> Vec<String> {
        let title = self
            .video
            .as_ref()
            .filter(|v| v.has_known_title())
            .map(|v| v.title.as_str());
        suggest(text, title)
    }

    // ==================== Internals ====================

    fn position(&self, note_id: &str) -> Option<usize> {
        self.notes.iter().position(|n| n.id == note_id)
    }

    /// Next millisecond id, strictly increasing and unused in the cache
    fn next_id(&mut self) -> String {
        let mut candidate = Utc::now().timestamp_millis().max(self.last_id + 1);
        while self.find(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        self.last_id = candidate;
        candidate.to_string()
    }

    /// Keep videos in first-seen order and each video's notes by timestamp
    fn resort(&mut self) {
        sort_by_first_seen_video(&mut self.notes, |a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    fn persist_video(&self, video_id: &str) -> StorageResult<()> {
        let sequence: Vec<Note> = self
            .notes
            .iter()
            .filter(|n| n.video_id == video_id)
            .cloned()
            .collect();
        buckets::save_video_notes(self.storage.as_ref(), video_id, &sequence)
    }
}
