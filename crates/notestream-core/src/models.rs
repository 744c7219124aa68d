//! Data models for NoteStream
//!
//! Defines the core data structures: Note, VideoInfo, Video and the
//! persisted preference records. Field names serialize in camelCase so the
//! stored buckets keep the layout the browser surfaces read.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timecode::format_time;

/// Title used when the video descriptor could not be determined
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Channel used when the video descriptor could not be determined
pub const UNKNOWN_CHANNEL: &str = "Unknown Channel";

fn unknown_title() -> String {
    UNKNOWN_TITLE.to_string()
}

fn unknown_channel() -> String {
    UNKNOWN_CHANNEL.to_string()
}

/// Snapshot of a video's descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    /// YouTube video identifier
    pub video_id: String,
    /// Video title
    #[serde(default = "unknown_title")]
    pub title: String,
    /// Channel name
    #[serde(default = "unknown_channel")]
    pub channel: String,
    /// Duration in seconds (0 when unknown)
    #[serde(default)]
    pub duration: f64,
    /// Page URL the descriptor was captured from
    #[serde(default)]
    pub url: String,
}

impl VideoInfo {
    /// Create a descriptor with placeholder title and channel
    pub fn new(video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        Self {
            url: Self::watch_url(&video_id),
            video_id,
            title: unknown_title(),
            channel: unknown_channel(),
            duration: 0.0,
        }
    }

    /// Set the title, keeping the placeholder for blank input
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.title = title.trim().to_string();
        }
        self
    }

    /// Set the channel, keeping the placeholder for blank input
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        let channel = channel.into();
        if !channel.trim().is_empty() {
            self.channel = channel.trim().to_string();
        }
        self
    }

    /// Set the duration in seconds
    pub fn with_duration(mut self, duration: f64) -> Self {
        if duration.is_finite() && duration > 0.0 {
            self.duration = duration;
        }
        self
    }

    /// Set the page URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Whether the title is a real title rather than the placeholder
    pub fn has_known_title(&self) -> bool {
        !self.title.is_empty() && self.title != UNKNOWN_TITLE
    }

    /// Canonical watch URL for a video id
    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }
}

/// A timestamped annotation attached to one video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier (millisecond creation time)
    pub id: String,
    /// Owning video; never reassigned after creation
    #[serde(default)]
    pub video_id: String,
    /// Plain-text content
    pub text: String,
    /// Formatted rendering of `text`, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_content: Option<String>,
    /// Seconds into the video
    #[serde(default)]
    pub timestamp: f64,
    /// Cached display form of `timestamp`
    #[serde(default)]
    pub timestamp_formatted: String,
    /// Tags in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
    /// When this note was created
    pub created_at: DateTime<Utc>,
    /// When this note was last edited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Descriptor of the owning video at creation time
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

impl Note {
    /// Create a note for the given video
    pub fn new(
        id: impl Into<String>,
        video: &VideoInfo,
        text: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        let timestamp = clamp_timestamp(timestamp);
        Self {
            id: id.into(),
            video_id: video.video_id.clone(),
            text: text.into(),
            rich_content: None,
            timestamp,
            timestamp_formatted: format_time(timestamp),
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            video_info: Some(video.clone()),
        }
    }

    /// Builder-style tag assignment
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    /// Builder-style rich content assignment
    pub fn with_rich_content(mut self, rich: impl Into<String>) -> Self {
        self.rich_content = Some(rich.into());
        self
    }

    /// Content to display: rich content when present, otherwise the text
    pub fn body(&self) -> &str {
        match self.rich_content.as_deref() {
            Some(rich) if !rich.trim().is_empty() => rich,
            _ => &self.text,
        }
    }

    /// Move the anchor point, regenerating the cached display string
    pub fn set_timestamp(&mut self, seconds: f64) {
        self.timestamp = clamp_timestamp(seconds);
        self.timestamp_formatted = format_time(self.timestamp);
    }

    /// Check whether the note carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Video title from the snapshot, or the placeholder
    pub fn video_title(&self) -> &str {
        self.video_info
            .as_ref()
            .filter(|info| !info.title.is_empty())
            .map(|info| info.title.as_str())
            .unwrap_or(UNKNOWN_TITLE)
    }

    /// Video channel from the snapshot, or the placeholder
    pub fn video_channel(&self) -> &str {
        self.video_info
            .as_ref()
            .filter(|info| !info.channel.is_empty())
            .map(|info| info.channel.as_str())
            .unwrap_or(UNKNOWN_CHANNEL)
    }

    /// Link that opens the video at this note's position
    pub fn timestamp_link(&self) -> String {
        format!(
            "https://youtube.com/watch?v={}&t={}s",
            self.video_id,
            self.timestamp.floor() as u64
        )
    }
}

/// Trim, drop empties and de-duplicate tags, keeping first occurrences
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.into().trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn clamp_timestamp(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// A video aggregated from the notes that reference it
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub title: String,
    pub channel: String,
    pub duration: f64,
    pub note_count: usize,
    pub last_updated: DateTime<Utc>,
}

/// Extension settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Open the sidebar automatically after this many minutes (0 = never)
    #[serde(default)]
    pub auto_activate_minutes: u32,
    /// Remember per-channel activation choices
    #[serde(default = "default_true")]
    pub remember_channels: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_activate_minutes: 0,
            remember_channels: true,
        }
    }
}

/// Remembered activation choice for a channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelPreference {
    pub enabled: bool,
    pub timestamp: DateTime<Utc>,
}

impl ChannelPreference {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timestamp: Utc::now(),
        }
    }
}

/// Stable sort that makes each video's notes contiguous
///
/// Videos keep the order in which they first appear. `within` orders notes of
/// the same video; a closure returning `Ordering::Equal` keeps the input order.
pub fn sort_by_first_seen_video<F>(notes: &mut [Note], within: F)
where
    F: Fn(&Note, &Note) -> Ordering,
{
    let mut rank: HashMap<String, usize> = HashMap::new();
    for note in notes.iter() {
        let next = rank.len();
        rank.entry(note.video_id.clone()).or_insert(next);
    }
    notes.sort_by(|a, b| {
        rank[&a.video_id]
            .cmp(&rank[&b.video_id])
            .then_with(|| within(a, b))
    });
}
