//! Command handlers
//!
//! Shared helpers for resolving note ids, video references and timestamps
//! from command-line arguments live here.

pub mod channel;
pub mod clear;
pub mod config;
pub mod export;
pub mod note;
pub mod settings;
pub mod stats;
pub mod status;
pub mod tag;
pub mod video;

use anyhow::{bail, Result};

use notestream_core::parse_timestamp;

/// Resolve a full id or a unique prefix among `items`
///
/// Exact matches win over prefix matches.
pub fn resolve_prefix<'a, T>(
    items: &'a [T],
    id: &str,
    kind: &str,
    key: impl Fn(&T) -> &str,
    label: impl Fn(&T) -> String,
) -> Result<&'a T> {
    let id = id.trim();
    if id.is_empty() {
        bail!("No {} ID given", kind);
    }

    if let Some(exact) = items.iter().find(|item| key(item) == id) {
        return Ok(exact);
    }

    let matches: Vec<&T> = items.iter().filter(|item| key(item).starts_with(id)).collect();

    match matches.len() {
        0 => bail!("No {} found matching: {}", kind, id),
        1 => Ok(matches[0]),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, id);
            for item in &matches {
                eprintln!("  {} - {}", key(item), label(item));
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// Extract a video id from a bare id or a YouTube URL
///
/// Accepts `watch?v=<id>`, `youtu.be/<id>`, `/shorts/<id>` and `/embed/<id>`.
pub fn parse_video_ref(input: &str) -> Result<String> {
    let input = input.trim();

    let id = if let Some((_, rest)) = input.split_once("v=") {
        rest
    } else if let Some((_, rest)) = input.split_once("youtu.be/") {
        rest
    } else if let Some((_, rest)) = input.split_once("/shorts/") {
        rest
    } else if let Some((_, rest)) = input.split_once("/embed/") {
        rest
    } else {
        input
    };

    let id: String = id
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if id.is_empty() {
        bail!("Could not find a video ID in '{}'", input);
    }
    Ok(id)
}

/// Parse `H:MM:SS`, `M:SS` or plain seconds
pub fn parse_time_arg(input: &str) -> Result<f64> {
    match parse_timestamp(input) {
        Some(seconds) => Ok(seconds),
        None => bail!(
            "Invalid timestamp '{}'. Use H:MM:SS, M:SS or seconds.",
            input
        ),
    }
}
