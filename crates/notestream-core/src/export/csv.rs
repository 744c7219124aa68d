//! CSV export

use std::fmt::Write;

use super::{ExportOptions, VideoLabels};
use crate::models::Note;

pub(super) fn render(notes: &[Note], options: &ExportOptions) -> String {
    let mut out = String::from("Video Title,Video Channel,Video ID");
    if options.include_timestamps {
        out.push_str(",Timestamp,Timestamp (seconds)");
    }
    out.push_str(",Note");
    if options.include_tags {
        out.push_str(",Tags");
    }
    out.push('\n');

    let labels = VideoLabels::new(notes);
    for note in notes {
        let (title, channel) = labels.get(&note.video_id);
        let _ = write!(out, "{},{},{}", escape(title), escape(channel), escape(&note.video_id));

        if options.include_timestamps {
            let formatted = if note.timestamp_formatted.is_empty() {
                "0:00"
            } else {
                note.timestamp_formatted.as_str()
            };
            let _ = write!(out, ",{},{}", formatted, seconds(note.timestamp));
        }

        let _ = write!(out, ",{}", escape(&note.text));

        if options.include_tags {
            let _ = write!(out, ",{}", escape(&note.tags.join("; ")));
        }
        out.push('\n');
    }

    out
}

/// Quote a field when it contains a comma, quote or line break
pub fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Seconds without a trailing `.0` for whole values
fn seconds(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures::*;
    use crate::models::VideoInfo;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("He said, \"hi\""), "\"He said, \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_seconds() {
        assert_eq!(seconds(65.0), "65");
        assert_eq!(seconds(12.5), "12.5");
        assert_eq!(seconds(0.0), "0");
    }

    #[test]
    fn test_full_csv() {
        let video = VideoInfo::new("v1").with_title("Intro, Part 1").with_channel("Chan");
        let notes = vec![note("1", &video, "He said, \"hi\"", 65.5, &["a", "b"])];

        let out = render(&notes, &options(false));
        let mut lines = out.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Video Title,Video Channel,Video ID,Timestamp,Timestamp (seconds),Note,Tags"
        );
        assert_eq!(
            lines.next().unwrap(),
            "\"Intro, Part 1\",Chan,v1,1:05,65.5,\"He said, \"\"hi\"\"\",a; b"
        );
    }

    #[test]
    fn test_minimal_columns() {
        let notes = vec![note("1", &go_video(), "text", 3.0, &["x"])];
        let opts = ExportOptions {
            include_timestamps: false,
            include_tags: false,
            ..options(false)
        };

        assert_eq!(
            render(&notes, &opts),
            "Video Title,Video Channel,Video ID,Note\nGo Basics,Gopher,go1,text\n"
        );
    }

    #[test]
    fn test_unknown_video_placeholders() {
        let notes = vec![note("1", &VideoInfo::new("u1"), "t", 0.0, &[])];
        let out = render(&notes, &options(false));
        assert!(out.contains("Unknown Video,Unknown Channel,u1,0:00,0,t,\n"));
    }
}
