//! Cross-video aggregation
//!
//! Everything here is derived at read time from a note list; nothing is
//! persisted.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{Note, Video, UNKNOWN_CHANNEL, UNKNOWN_TITLE};
use crate::tags::tag_counts;

/// Keywords counted by the concept analysis
const CONCEPTS: &[&str] = &[
    "react",
    "javascript",
    "python",
    "css",
    "html",
    "node",
    "api",
    "database",
    "machine learning",
    "ai",
    "docker",
    "kubernetes",
    "aws",
    "tutorial",
    "example",
    "pattern",
    "best practice",
    "performance",
    "security",
    "testing",
];

const MAX_CONCEPTS: usize = 10;

/// Short videos are under ten minutes
const SHORT_VIDEO_SECS: f64 = 600.0;

/// Medium videos are under thirty minutes
const MEDIUM_VIDEO_SECS: f64 = 1800.0;

/// Build one `Video` per distinct video id, most recently updated first
///
/// Title, channel and duration come from the earliest-created note whose
/// snapshot carries a real title; otherwise the placeholders are used.
pub fn derive_videos(notes: &[Note]) -> Vec<Video> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_video: HashMap<&str, Vec<&Note>> = HashMap::new();
    for note in notes {
        by_video
            .entry(note.video_id.as_str())
            .or_insert_with(|| {
                order.push(note.video_id.as_str());
                Vec::new()
            })
            .push(note);
    }

    let mut videos: Vec<Video> = order
        .into_iter()
        .filter_map(|id| {
            let mut group = by_video.remove(id)?;
            group.sort_by_key(|n| n.created_at);

            let info = group
                .iter()
                .filter_map(|n| n.video_info.as_ref())
                .find(|info| info.has_known_title());
            let last_updated = group.iter().map(|n| n.created_at).max()?;

            Some(Video {
                id: id.to_string(),
                title: info.map_or(UNKNOWN_TITLE, |i| i.title.as_str()).to_string(),
                channel: info
                    .map(|i| i.channel.as_str())
                    .filter(|c| !c.is_empty())
                    .unwrap_or(UNKNOWN_CHANNEL)
                    .to_string(),
                duration: info.map_or(0.0, |i| i.duration),
                note_count: group.len(),
                last_updated,
            })
        })
        .collect();

    videos.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    videos
}

/// Case-insensitive match on video title or channel
pub fn search_videos<'a>(videos: &'a [Video], query: &str) -> Vec<&'a Video> {
    let query = query.trim().to_lowercase();
    videos
        .iter()
        .filter(|v| {
            query.is_empty()
                || v.title.to_lowercase().contains(&query)
                || v.channel.to_lowercase().contains(&query)
        })
        .collect()
}

/// Number of videos per length bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationBuckets {
    /// Under 10 minutes (including unknown length)
    pub short: usize,
    /// 10 to 30 minutes
    pub medium: usize,
    /// 30 minutes or more
    pub long: usize,
}

/// Aggregate learning statistics over a note collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub total_notes: usize,
    pub total_videos: usize,
    /// Rounded to one decimal
    pub average_notes_per_video: f64,
    pub tag_distribution: Vec<(String, usize)>,
    pub top_channels: Vec<(String, usize)>,
    pub durations: DurationBuckets,
    /// Most frequent concept keywords, at most ten
    pub concepts: Vec<(String, usize)>,
}

impl LearningStats {
    pub fn compute(notes: &[Note]) -> Self {
        let videos = derive_videos(notes);

        let average_notes_per_video = if videos.is_empty() {
            0.0
        } else {
            (notes.len() as f64 / videos.len() as f64 * 10.0).round() / 10.0
        };

        let mut durations = DurationBuckets::default();
        for video in &videos {
            if video.duration < SHORT_VIDEO_SECS {
                durations.short += 1;
            } else if video.duration < MEDIUM_VIDEO_SECS {
                durations.medium += 1;
            } else {
                durations.long += 1;
            }
        }

        let channels = notes
            .iter()
            .filter_map(|n| n.video_info.as_ref())
            .map(|info| info.channel.as_str())
            .filter(|c| !c.is_empty());

        let concepts = notes.iter().flat_map(|n| {
            let text = n.text.to_lowercase();
            CONCEPTS
                .iter()
                .filter(move |c| text.contains(*c))
                .copied()
        });
        let mut concepts = ranked(concepts);
        concepts.truncate(MAX_CONCEPTS);

        Self {
            total_notes: notes.len(),
            total_videos: videos.len(),
            average_notes_per_video,
            tag_distribution: tag_counts(notes),
            top_channels: ranked(channels),
            durations,
            concepts,
        }
    }
}

/// Count occurrences, most frequent first, ties in first-seen order
fn ranked<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(name, _)| name == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
