//! Markdown lesson plan

use std::fmt::Write;

use super::{distinct_tags, group_by_video, ExportOptions, VideoLabels};
use crate::models::Note;

const TUTORIAL_ACTIVITY: &str =
    "- Follow along with the demonstration\n- Practice the technique independently\n";
const QUESTION_ACTIVITY: &str =
    "- Discuss this question in small groups\n- Research and present findings\n";
const REFLECTION_ACTIVITY: &str = "- Reflect on how this concept applies to your projects\n- Create examples demonstrating this principle\n";

pub(super) fn render(notes: &[Note], options: &ExportOptions) -> String {
    let mut out = String::from("# 📚 Lesson Plan\n\n");

    let tags = distinct_tags(notes);
    if !tags.is_empty() {
        out.push_str("## 🎯 Learning Objectives\n");
        for tag in tags {
            let _ = writeln!(out, "- Master **{}** concepts and applications", tag);
        }
        out.push('\n');
    }

    if options.group_by_video {
        for group in group_by_video(notes) {
            let _ = write!(out, "## 📺 {}\n*Source: {}*\n\n", group.title, group.channel);

            for (i, note) in group.notes.iter().enumerate() {
                let _ = write!(out, "### Section {}", i + 1);
                push_link(&mut out, note, options);
                out.push_str("\n\n");

                let _ = write!(out, "**Key Concept**: {}\n\n", note.text);
                push_tags(&mut out, note, options);
                push_activity(&mut out, note);
                out.push_str("---\n\n");
            }
        }
    } else {
        let labels = VideoLabels::new(notes);
        for (i, note) in notes.iter().enumerate() {
            let _ = write!(out, "## Section {}", i + 1);
            push_link(&mut out, note, options);
            out.push_str("\n\n");

            let (title, channel) = labels.get(&note.video_id);
            let _ = write!(out, "*From: {} by {}*\n\n", title, channel);
            let _ = write!(out, "{}\n\n", note.text);
            push_tags(&mut out, note, options);
            push_activity(&mut out, note);
            out.push_str("---\n\n");
        }
    }

    out
}

fn push_link(out: &mut String, note: &Note, options: &ExportOptions) {
    if options.include_timestamps {
        let _ = write!(out, " - [{}]({})", note.timestamp_formatted, note.timestamp_link());
    }
}

fn push_tags(out: &mut String, note: &Note, options: &ExportOptions) {
    if options.include_tags && !note.tags.is_empty() {
        let _ = write!(out, "**Tags**: {}\n\n", note.tags.join(", "));
    }
}

fn push_activity(out: &mut String, note: &Note) {
    let activity = if note.has_tag("tutorial") {
        TUTORIAL_ACTIVITY
    } else if note.has_tag("question") {
        QUESTION_ACTIVITY
    } else {
        REFLECTION_ACTIVITY
    };
    out.push_str("**Suggested Activity**: \n");
    out.push_str(activity);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures::*;

    #[test]
    fn test_grouped_lesson_plan() {
        let rust = rust_video();
        let notes = vec![
            note("1", &rust, "Ownership moves values", 65.0, &["tutorial"]),
            note("2", &rust, "Why borrow?", 130.0, &["question", "memory"]),
        ];

        let out = render(&notes, &options(true));
        assert!(out.starts_with("# 📚 Lesson Plan\n\n## 🎯 Learning Objectives\n"));
        assert!(out.contains("- Master **tutorial** concepts and applications\n"));
        assert!(out.contains("- Master **memory** concepts and applications\n\n"));
        assert!(out.contains("## 📺 Rust Basics\n*Source: Ferris*\n\n"));
        assert!(out.contains(
            "### Section 1 - [1:05](https://youtube.com/watch?v=rust1&t=65s)\n\n**Key Concept**: Ownership moves values\n\n"
        ));
        assert!(out.contains("**Tags**: question, memory\n\n"));
        assert!(out.contains("- Follow along with the demonstration\n"));
        assert!(out.contains("- Discuss this question in small groups\n"));
        assert_eq!(out.matches("---\n\n").count(), 2);
    }

    #[test]
    fn test_objectives_omitted_without_tags() {
        let notes = vec![note("1", &rust_video(), "plain", 0.0, &[])];
        let out = render(&notes, &options(true));
        assert!(!out.contains("Learning Objectives"));
        assert!(out.contains("- Reflect on how this concept applies to your projects\n"));
    }

    #[test]
    fn test_ungrouped_sections_without_timestamps() {
        let notes = vec![
            note("1", &rust_video(), "first", 3.0, &["x"]),
            note("2", &go_video(), "second", 9.0, &[]),
        ];
        let opts = ExportOptions {
            include_timestamps: false,
            include_tags: false,
            ..options(false)
        };

        let out = render(&notes, &opts);
        assert!(out.contains("## Section 1\n\n*From: Rust Basics by Ferris*\n\nfirst\n\n"));
        assert!(out.contains("## Section 2\n\n*From: Go Basics by Gopher*\n\nsecond\n\n"));
        assert!(!out.contains("**Tags**"));
        assert!(!out.contains("youtube.com"));
    }
}
