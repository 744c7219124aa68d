//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::fmt::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use notestream_core::dashboard::LearningStats;
use notestream_core::{Note, Video};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print any serializable value as pretty JSON
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", text);
        Ok(())
    }

    /// Print a single note
    pub fn print_note(&self, note: &Note) -> Result<()> {
        match self.format {
            OutputFormat::Human => print!("{}", note_details(note)),
            OutputFormat::Json => self.json(note)?,
            OutputFormat::Quiet => println!("{}", note.id),
        }
        Ok(())
    }

    /// Print a list of notes
    pub fn print_notes(&self, notes: &[&Note]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if notes.is_empty() {
                    println!("No notes found.");
                    return Ok(());
                }
                for note in notes {
                    let tags = if note.tags.is_empty() {
                        String::new()
                    } else {
                        format!(" [{}]", note.tags.join(", "))
                    };
                    println!(
                        "{} | {:>8} | {}{} | {}",
                        short_id(&note.id),
                        note.timestamp_formatted,
                        truncate_line(&note.text, 50),
                        tags,
                        truncate(note.video_title(), 30)
                    );
                }
                println!("\n{} note(s)", notes.len());
            }
            OutputFormat::Json => self.json(notes)?,
            OutputFormat::Quiet => {
                for note in notes {
                    println!("{}", note.id);
                }
            }
        }
        Ok(())
    }

    /// Print a list of derived videos
    pub fn print_videos(&self, videos: &[&Video]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if videos.is_empty() {
                    println!("No videos found.");
                    return Ok(());
                }
                for video in videos {
                    println!(
                        "{} | {} | {} | {} note(s) | {}",
                        video.id,
                        truncate(&video.title, 40),
                        truncate(&video.channel, 20),
                        video.note_count,
                        video.last_updated.format("%Y-%m-%d")
                    );
                }
                println!("\n{} video(s)", videos.len());
            }
            OutputFormat::Json => self.json(videos)?,
            OutputFormat::Quiet => {
                for video in videos {
                    println!("{}", video.id);
                }
            }
        }
        Ok(())
    }

    /// Print a list of tags with usage counts
    pub fn print_tags(&self, tags: &[(String, usize)], recent: &[String]) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                if tags.is_empty() {
                    println!("No tags found.");
                    return Ok(());
                }
                for (name, count) in tags {
                    println!("{} ({})", name, count);
                }
                println!("\n{} tag(s)", tags.len());
                if !recent.is_empty() {
                    println!("Recent: {}", recent.join(", "));
                }
            }
            OutputFormat::Json => {
                let json_tags: Vec<_> = tags
                    .iter()
                    .map(|(name, count)| serde_json::json!({"name": name, "count": count}))
                    .collect();
                self.json(&serde_json::json!({"tags": json_tags, "recent": recent}))?;
            }
            OutputFormat::Quiet => {
                for (name, _) in tags {
                    println!("{}", name);
                }
            }
        }
        Ok(())
    }

    /// Print learning statistics
    pub fn print_stats(&self, stats: &LearningStats) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("Learning Statistics");
                println!("===================");
                println!();
                println!("Notes:           {}", stats.total_notes);
                println!("Videos:          {}", stats.total_videos);
                println!("Notes per video: {:.1}", stats.average_notes_per_video);
                println!();
                println!("Video length:");
                println!("  < 10 min:  {}", stats.durations.short);
                println!("  10-30 min: {}", stats.durations.medium);
                println!("  > 30 min:  {}", stats.durations.long);
                print_ranking("Top tags", &stats.tag_distribution);
                print_ranking("Top channels", &stats.top_channels);
                print_ranking("Concepts", &stats.concepts);
            }
            OutputFormat::Json => self.json(stats)?,
            OutputFormat::Quiet => println!("{}", stats.total_notes),
        }
        Ok(())
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Human-readable detail view of one note
///
/// The body shows rich content when present and falls back to the text.
fn note_details(note: &Note) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:        {}", note.id);
    let _ = writeln!(out, "Video:     {} ({})", note.video_title(), note.video_id);
    let _ = writeln!(out, "Channel:   {}", note.video_channel());
    let _ = writeln!(
        out,
        "Timestamp: {}  {}",
        note.timestamp_formatted,
        note.timestamp_link()
    );
    if !note.tags.is_empty() {
        let _ = writeln!(out, "Tags:      {}", note.tags.join(", "));
    }
    let _ = writeln!(out, "Created:   {}", note.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(updated) = note.updated_at {
        let _ = writeln!(out, "Updated:   {}", updated.format("%Y-%m-%d %H:%M"));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", note.body());
    out
}

fn print_ranking(heading: &str, items: &[(String, usize)]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", heading);
    for (name, count) in items.iter().take(10) {
        println!("  {} ({})", name, count);
    }
}

/// First eight characters of an id, the usual prefix shown in listings
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
pub fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ééééééééééé", 5), "éé...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("line one\nline two", 20), "line one");
    }

    #[test]
    fn test_note_details_prefers_rich_content() {
        let video = notestream_core::VideoInfo::new("abc").with_title("Lecture");
        let plain = Note::new("1700000000001", &video, "plain text", 65.0);
        let details = note_details(&plain);
        assert!(details.contains("Video:     Lecture (abc)"));
        assert!(details.ends_with("plain text\n"));

        let rich = plain.clone().with_rich_content("<b>rich</b> text");
        assert!(note_details(&rich).ends_with("<b>rich</b> text\n"));

        let blank_rich = plain.with_rich_content("   ");
        assert!(note_details(&blank_rich).ends_with("plain text\n"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("1700000000123"), "17000000");
        assert_eq!(short_id("42"), "42");
    }
}
