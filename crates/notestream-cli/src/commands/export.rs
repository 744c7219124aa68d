//! Export command handler

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use notestream_core::export::{self, ExportDocument};
use notestream_core::{Config, ExportFormat, ExportOptions, Note, NoteStore, SharedStorage};

use super::{parse_video_ref, resolve_prefix};
use crate::output::{truncate_line, Output, OutputFormat};

/// Which notes to export
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub video: Option<String>,
    pub tag: Option<String>,
    pub ids: Vec<String>,
}

/// Overrides of the configured export defaults
#[derive(Debug, Clone, Default)]
pub struct OptionFlags {
    pub format: Option<ExportFormat>,
    pub no_timestamps: bool,
    pub no_tags: bool,
    pub no_group: bool,
}

impl OptionFlags {
    fn apply(&self, defaults: ExportOptions) -> ExportOptions {
        let mut options = defaults;
        if let Some(format) = self.format {
            options.format = format;
        }
        if self.no_timestamps {
            options.include_timestamps = false;
        }
        if self.no_tags {
            options.include_tags = false;
        }
        if self.no_group {
            options.group_by_video = false;
        }
        options
    }
}

/// Where the rendered document goes
#[derive(Debug, Clone, Default)]
pub struct Destination {
    pub output: Option<PathBuf>,
    pub stdout: bool,
}

/// Export the selected notes
pub fn run(
    storage: &SharedStorage,
    config: &Config,
    selection: Selection,
    flags: OptionFlags,
    destination: Destination,
    output: &Output,
) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store.load_all()?;
    let notes = select(store.notes(), &selection)?;

    let options = flags.apply(config.export);
    let doc = export::export(&notes, &options, Utc::now()).context("Export failed")?;

    if destination.stdout {
        print!("{}", doc.content);
        return Ok(());
    }

    let path = destination
        .output
        .unwrap_or_else(|| config.export_path().join(&doc.filename));
    write_document(&path, &doc)?;
    info!(path = %path.display(), notes = notes.len(), format = %options.format, "exported notes");

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "path": path,
            "format": options.format,
            "mimeType": doc.mime_type,
            "notes": notes.len(),
        }))?,
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => output.success(&format!(
            "Exported {} note(s) as {} to {}",
            notes.len(),
            options.format,
            path.display()
        )),
    }
    Ok(())
}

/// Pick notes by explicit ids, or by video and tag filters
fn select(notes: &[Note], selection: &Selection) -> Result<Vec<Note>> {
    if !selection.ids.is_empty() {
        let mut picked: Vec<Note> = Vec::new();
        for id in &selection.ids {
            let note = resolve_prefix(
                notes,
                id,
                "note",
                |n| n.id.as_str(),
                |n| truncate_line(&n.text, 50),
            )?;
            if !picked.iter().any(|p| p.id == note.id) {
                picked.push(note.clone());
            }
        }
        return Ok(picked);
    }

    let video_id = selection
        .video
        .as_deref()
        .map(parse_video_ref)
        .transpose()?;

    Ok(notes
        .iter()
        .filter(|n| video_id.as_ref().map_or(true, |id| &n.video_id == id))
        .filter(|n| selection.tag.as_ref().map_or(true, |tag| n.has_tag(tag)))
        .cloned()
        .collect())
}

fn write_document(path: &Path, doc: &ExportDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create export directory: {:?}", parent))?;
        }
    }
    fs::write(path, &doc.content)
        .with_context(|| format!("Failed to write export file: {:?}", path))
}
