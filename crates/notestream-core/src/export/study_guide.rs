//! Markdown study guide

use std::fmt::Write;

use super::{distinct_tags, group_by_video, ExportOptions, VideoLabels};
use crate::models::Note;

/// Characters of note text shown in a heading
const PREVIEW_CHARS: usize = 50;

pub(super) fn render(notes: &[Note], options: &ExportOptions) -> String {
    let mut out = String::from("# 📖 Study Guide\n\n");

    let topics = distinct_tags(notes);
    if !topics.is_empty() {
        out.push_str("## 🔑 Key Topics\n");
        for topic in topics {
            let count = notes.iter().filter(|n| n.has_tag(topic)).count();
            let _ = writeln!(out, "- **{}** ({} notes)", topic, count);
        }
        out.push('\n');
    }

    if options.group_by_video {
        for group in group_by_video(notes) {
            let _ = writeln!(out, "## 📺 {}", group.title);
            for note in group.notes {
                push_heading(&mut out, note, options);
                if push_topics(&mut out, note, options) {
                    out.push('\n');
                }
            }
            out.push('\n');
        }
    } else {
        let labels = VideoLabels::new(notes);
        for note in notes {
            push_heading(&mut out, note, options);
            let _ = writeln!(out, "*Source: {}*", labels.get(&note.video_id).0);
            push_topics(&mut out, note, options);
            out.push_str("\n---\n\n");
        }
    }

    out
}

/// Heading with a short preview, followed by the full text
fn push_heading(out: &mut String, note: &Note, options: &ExportOptions) {
    out.push_str("### ");
    if options.include_timestamps {
        let _ = write!(out, "[{}] ", note.timestamp_formatted);
    }
    let _ = write!(out, "{}\n\n{}\n\n", preview(&note.text), note.text);
}

/// Returns whether a topics line was written
fn push_topics(out: &mut String, note: &Note, options: &ExportOptions) -> bool {
    if options.include_tags && !note.tags.is_empty() {
        let _ = writeln!(out, "*Related topics: {}*", note.tags.join(", "));
        return true;
    }
    false
}

/// First 50 characters on one line, with an ellipsis when cut
fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    let flat = flat.trim();

    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        flat.to_string()
    }
}
