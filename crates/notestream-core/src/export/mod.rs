//! Export engine
//!
//! Pure functions that turn a note selection into a document in one of five
//! formats. Writing the document anywhere is the caller's job.
//!
//! Ordering rules shared by every format:
//! - grouped exports keep videos in first-seen order and each video's notes
//!   in the order the caller gave them
//! - ungrouped exports sort every note by timestamp

mod csv;
mod markdown;
mod study_guide;
mod text;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{sort_by_first_seen_video, Note};

pub use self::csv::escape as escape_csv;

/// Title used for a group whose notes carry no known title
pub const UNKNOWN_VIDEO: &str = "Unknown Video";

/// Channel used for a group whose notes carry no known title
pub const UNKNOWN_VIDEO_CHANNEL: &str = "Unknown Channel";

/// Errors reported by the export engine
#[derive(Error, Debug)]
pub enum ExportError {
    /// Nothing was selected for export
    #[error("No notes selected for export")]
    NoNotesSelected,

    /// JSON rendering failed
    #[error("Failed to serialize notes: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Markdown lesson plan
    Markdown,
    /// Markdown study guide
    StudyGuide,
    /// Plain text
    Text,
    /// Pretty-printed JSON note list
    Json,
    /// Comma-separated values
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Markdown,
        ExportFormat::StudyGuide,
        ExportFormat::Text,
        ExportFormat::Json,
        ExportFormat::Csv,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::StudyGuide => "study-guide",
            ExportFormat::Text => "text",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Markdown | ExportFormat::StudyGuide => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown | ExportFormat::StudyGuide => "text/markdown",
            ExportFormat::Text => "text/plain",
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "markdown" | "md" | "lesson-plan" => Ok(ExportFormat::Markdown),
            "study-guide" | "study_guide" | "studyguide" => Ok(ExportFormat::StudyGuide),
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!(
                "Unknown export format '{}'. Expected one of: markdown, study-guide, text, json, csv",
                other
            )),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> ExportFormat {
    ExportFormat::Markdown
}

/// Options controlling an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default = "default_format")]
    pub format: ExportFormat,
    #[serde(default = "default_true")]
    pub include_timestamps: bool,
    #[serde(default = "default_true")]
    pub include_tags: bool,
    #[serde(default = "default_true")]
    pub group_by_video: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: default_format(),
            include_timestamps: true,
            include_tags: true,
            group_by_video: true,
        }
    }
}

impl ExportOptions {
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }
}

/// A rendered export ready to be written or downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub filename: String,
    pub content: String,
    pub mime_type: &'static str,
}

/// Sort, render and name an export of `notes`
///
/// Fails with [`ExportError::NoNotesSelected`] on an empty selection.
pub fn export(
    notes: &[Note],
    options: &ExportOptions,
    generated_at: DateTime<Utc>,
) -> ExportResult<ExportDocument> {
    if notes.is_empty() {
        return Err(ExportError::NoNotesSelected);
    }

    let mut selection = notes.to_vec();
    sort_for_export(&mut selection, options.group_by_video);

    let content = render(&selection, options, generated_at)?;
    let filename = export_filename(&selection, options.format, generated_at);
    debug!(%filename, format = %options.format, count = selection.len(), "rendered export");

    Ok(ExportDocument {
        filename,
        content,
        mime_type: options.format.mime_type(),
    })
}

/// Render already-ordered notes in the requested format
pub fn render(
    notes: &[Note],
    options: &ExportOptions,
    generated_at: DateTime<Utc>,
) -> ExportResult<String> {
    let content = match options.format {
        ExportFormat::Markdown => markdown::render(notes, options),
        ExportFormat::StudyGuide => study_guide::render(notes, options),
        ExportFormat::Text => text::render(notes, options, generated_at),
        ExportFormat::Json => serde_json::to_string_pretty(notes)?,
        ExportFormat::Csv => csv::render(notes, options),
    };
    Ok(content)
}

/// Canonical selection order
///
/// Grouped: videos in first-seen order, the caller's order inside a video.
/// Ungrouped: every note by timestamp. Both sorts are stable.
pub fn sort_for_export(notes: &mut [Note], group_by_video: bool) {
    if group_by_video {
        sort_by_first_seen_video(notes, |_, _| Ordering::Equal);
    } else {
        notes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
}

/// Notes of one video inside an export
#[derive(Debug)]
pub struct VideoGroup<'a> {
    pub video_id: &'a str,
    pub title: String,
    pub channel: String,
    pub notes: Vec<&'a Note>,
}

/// Partition notes by video, keeping first-seen video order and the
/// caller's order inside each group
pub fn group_by_video(notes: &[Note]) -> Vec<VideoGroup<'_>> {
    let labels = VideoLabels::new(notes);
    let mut groups: Vec<VideoGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for note in notes {
        let id = note.video_id.as_str();
        let slot = *index.entry(id).or_insert_with(|| {
            let (title, channel) = labels.get(id);
            groups.push(VideoGroup {
                video_id: id,
                title: title.to_string(),
                channel: channel.to_string(),
                notes: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].notes.push(note);
    }

    groups
}

/// Best-known title and channel per video within a selection
pub(crate) struct VideoLabels<'a> {
    labels: HashMap<&'a str, (&'a str, &'a str)>,
}

impl<'a> VideoLabels<'a> {
    pub(crate) fn new(notes: &'a [Note]) -> Self {
        let mut labels: HashMap<&'a str, (&'a str, &'a str)> = HashMap::new();
        for note in notes {
            let Some(info) = note.video_info.as_ref().filter(|i| i.has_known_title()) else {
                continue;
            };
            labels
                .entry(note.video_id.as_str())
                .or_insert((info.title.as_str(), info.channel.as_str()));
        }
        Self { labels }
    }

    /// `(title, channel)`, or the unknown-video placeholders
    pub(crate) fn get(&self, video_id: &str) -> (&'a str, &'a str) {
        self.labels
            .get(video_id)
            .copied()
            .unwrap_or((UNKNOWN_VIDEO, UNKNOWN_VIDEO_CHANNEL))
    }
}

/// Distinct tags across notes, in first-seen order
pub(crate) fn distinct_tags(notes: &[Note]) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::new();
    for tag in notes.iter().flat_map(|n| n.tags.iter()) {
        if !tags.contains(&tag.as_str()) {
            tags.push(tag);
        }
    }
    tags
}

/// Filename for an export of `notes`
///
/// A single note is named after its video; anything else is dated.
pub fn export_filename(notes: &[Note], format: ExportFormat, date: DateTime<Utc>) -> String {
    match notes {
        [note] => {
            let title = note
                .video_info
                .as_ref()
                .filter(|i| i.has_known_title())
                .map_or("Note", |i| i.title.as_str());
            sanitize_filename(&format!("{} - Note.{}", title, format.extension()))
        }
        _ => format!(
            "NoteStream-Export-{}.{}",
            date.format("%Y-%m-%d"),
            format.extension()
        ),
    }
}

/// Replace characters that are unsafe in filenames with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if (c as u32) < 0x20 => '_',
            c => c,
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::VideoInfo;
    use chrono::TimeZone;

    fn date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_format_parse_and_display() {
        for format in ExportFormat::ALL {
            assert_eq!(format.to_string().parse::<ExportFormat>().unwrap(), format);
        }
        assert_eq!("MD".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_format_extensions_and_mime() {
        assert_eq!(ExportFormat::StudyGuide.extension(), "md");
        assert_eq!(ExportFormat::Text.extension(), "txt");
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::Json.mime_type(), "application/json");
    }

    #[test]
    fn test_export_rejects_empty_selection() {
        let err = export(&[], &ExportOptions::default(), date()).unwrap_err();
        assert!(matches!(err, ExportError::NoNotesSelected));
    }

    #[test]
    fn test_sort_for_export_grouped() {
        let rust = rust_video();
        let go = go_video();
        let mut notes = vec![
            note("1", &go, "g late", 50.0, &[]),
            note("2", &rust, "r", 10.0, &[]),
            note("3", &go, "g early", 5.0, &[]),
        ];
        sort_for_export(&mut notes, true);
        let ids: Vec<_> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "2"]);

        sort_for_export(&mut notes, false);
        let ids: Vec<_> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
    }

    #[test]
    fn test_group_by_video_first_seen_order() {
        let rust = rust_video();
        let go = go_video();
        let notes = vec![
            note("1", &go, "a", 50.0, &[]),
            note("2", &rust, "b", 10.0, &[]),
            note("3", &go, "c", 5.0, &[]),
        ];

        let groups = group_by_video(&notes);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].video_id, "go1");
        assert_eq!(groups[0].title, "Go Basics");
        let ids: Vec<_> = groups[0].notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_group_without_known_title_uses_placeholder() {
        let unknown = VideoInfo::new("x");
        let notes = vec![note("1", &unknown, "a", 0.0, &[])];

        let groups = group_by_video(&notes);
        assert_eq!(groups[0].title, UNKNOWN_VIDEO);
        assert_eq!(groups[0].channel, UNKNOWN_VIDEO_CHANNEL);
    }

    #[test]
    fn test_export_filenames() {
        let notes = vec![note("1", &rust_video(), "a", 0.0, &[])];
        assert_eq!(
            export_filename(&notes, ExportFormat::Text, date()),
            "Rust Basics - Note.txt"
        );

        let odd = VideoInfo::new("o").with_title("What? A/B: test*");
        let notes = vec![note("1", &odd, "a", 0.0, &[])];
        assert_eq!(
            export_filename(&notes, ExportFormat::Markdown, date()),
            "What_ A_B_ test_ - Note.md"
        );

        let notes = vec![note("1", &VideoInfo::new("u"), "a", 0.0, &[])];
        assert_eq!(
            export_filename(&notes, ExportFormat::Json, date()),
            "Note - Note.json"
        );

        let notes = vec![
            note("1", &rust_video(), "a", 0.0, &[]),
            note("2", &rust_video(), "b", 0.0, &[]),
        ];
        assert_eq!(
            export_filename(&notes, ExportFormat::Csv, date()),
            "NoteStream-Export-2024-03-09.csv"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a<b>c:d\"e"), "a_b_c_d_e");
        assert_eq!(sanitize_filename("x\ty\u{1}z"), "x_y_z");
        assert_eq!(sanitize_filename("plain name.md"), "plain name.md");
    }

    #[test]
    fn test_json_export_round_trips() {
        let notes = vec![
            note("1", &rust_video(), "first", 1.5, &["a"]),
            note("2", &go_video(), "second", 0.0, &[]).with_rich_content("<i>second</i>"),
        ];
        let options = ExportOptions::default().with_format(ExportFormat::Json);

        let content = render(&notes, &options, date()).unwrap();
        let parsed: Vec<Note> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, notes);
    }

    #[test]
    fn test_export_document() {
        let notes = vec![
            note("1", &rust_video(), "b", 20.0, &[]),
            note("2", &rust_video(), "a", 10.0, &[]),
        ];
        let options = ExportOptions::default().with_format(ExportFormat::Text);

        let doc = export(&notes, &options, date()).unwrap();
        assert_eq!(doc.mime_type, "text/plain");
        assert_eq!(doc.filename, "NoteStream-Export-2024-03-09.txt");
        let a = doc.content.find("[0:10] a").unwrap();
        let b = doc.content.find("[0:20] b").unwrap();
        assert!(b < a, "grouped export keeps the caller's order");

        let options = ExportOptions {
            group_by_video: false,
            ..options
        };
        let doc = export(&notes, &options, date()).unwrap();
        let a = doc.content.find("[0:10] a").unwrap();
        let b = doc.content.find("[0:20] b").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_grouped_export_keeps_caller_order_within_video() {
        let rust = rust_video();
        let go = go_video();
        let notes = vec![
            note("1", &rust, "r late", 90.0, &[]),
            note("2", &go, "go note", 30.0, &[]),
            note("3", &rust, "r early", 15.0, &[]),
        ];
        let options = ExportOptions::default().with_format(ExportFormat::Csv);

        let doc = export(&notes, &options, date()).unwrap();
        let late = doc.content.find("r late").unwrap();
        let early = doc.content.find("r early").unwrap();
        let go_row = doc.content.find("go note").unwrap();
        assert!(late < early);
        assert!(early < go_row);
    }

    #[test]
    fn test_options_deserialize_defaults() {
        let options: ExportOptions = toml::from_str("format = \"study-guide\"").unwrap();
        assert_eq!(options.format, ExportFormat::StudyGuide);
        assert!(options.include_timestamps);
        assert!(options.group_by_video);
    }
}
