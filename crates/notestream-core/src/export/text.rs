//! Plain text export

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::{group_by_video, ExportOptions, VideoLabels};
use crate::models::Note;

pub(super) fn render(notes: &[Note], options: &ExportOptions, generated_at: DateTime<Utc>) -> String {
    let mut out = String::from("NOTESTREAM EXPORT\n=================\n\n");
    let _ = write!(
        out,
        "Generated: {}\nTotal Notes: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        notes.len()
    );

    if options.group_by_video {
        for group in group_by_video(notes) {
            let _ = write!(
                out,
                "VIDEO: {}\nChannel: {}\nNotes: {}\n\n",
                group.title,
                group.channel,
                group.notes.len()
            );
            for (i, note) in group.notes.iter().enumerate() {
                push_line(&mut out, i, note, options);
                push_tags(&mut out, note, options);
                out.push('\n');
            }
            out.push_str("---\n\n");
        }
    } else {
        let labels = VideoLabels::new(notes);
        for (i, note) in notes.iter().enumerate() {
            push_line(&mut out, i, note, options);
            let _ = writeln!(out, "   Video: {}", labels.get(&note.video_id).0);
            push_tags(&mut out, note, options);
            out.push('\n');
        }
    }

    out
}

fn push_line(out: &mut String, index: usize, note: &Note, options: &ExportOptions) {
    let _ = write!(out, "{}. ", index + 1);
    if options.include_timestamps {
        let _ = write!(out, "[{}] ", note.timestamp_formatted);
    }
    let _ = writeln!(out, "{}", note.text);
}

fn push_tags(out: &mut String, note: &Note, options: &ExportOptions) {
    if options.include_tags && !note.tags.is_empty() {
        let _ = writeln!(out, "   Tags: {}", note.tags.join(", "));
    }
}
