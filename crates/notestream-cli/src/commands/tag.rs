//! Tag command handlers

use anyhow::{Context, Result};

use notestream_core::models::normalize_tags;
use notestream_core::tags::tag_counts;
use notestream_core::{color_for, suggest, NoteStore, SharedStorage};

use crate::output::{Output, OutputFormat};

/// List every registered tag with its usage count
pub fn list(storage: &SharedStorage, output: &Output) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store.load_all()?;

    let counts = usage(&store);
    output.print_tags(&counts, store.tag_registry().recent_tags())
}

/// Register tags without attaching them to a note
pub fn add(storage: &SharedStorage, tags: Vec<String>, output: &Output) -> Result<()> {
    let tags = normalize_tags(tags);
    if tags.is_empty() {
        anyhow::bail!("No tags given");
    }

    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    store
        .tag_registry_mut()
        .register_all(&tags)
        .context("Failed to register tags")?;

    output.success(&format!("Registered {}", tags.join(", ")));
    Ok(())
}

/// Suggest tags for a piece of text
pub fn suggest_for(text: String, title: Option<String>, output: &Output) -> Result<()> {
    let suggestions = suggest(&text, title.as_deref());

    match output.format {
        OutputFormat::Json => output.json(&suggestions)?,
        OutputFormat::Quiet => {
            for tag in &suggestions {
                println!("{}", tag);
            }
        }
        OutputFormat::Human => {
            if suggestions.is_empty() {
                println!("No suggestions.");
            } else {
                println!("Suggested: {}", suggestions.join(", "));
                println!("Applied automatically: {}", suggestions[0]);
            }
        }
    }
    Ok(())
}

/// Show the display colours of a tag
pub fn color(tag: String, output: &Output) -> Result<()> {
    let colors = color_for(&tag);

    match output.format {
        OutputFormat::Json => output.json(&serde_json::json!({
            "tag": tag,
            "background": colors.background.to_string(),
            "text": colors.text.to_string(),
        }))?,
        OutputFormat::Quiet => println!("{}", colors.background),
        OutputFormat::Human => {
            println!("Tag:        {}", tag);
            println!("Background: {}", colors.background);
            println!("Text:       {}", colors.text);
        }
    }
    Ok(())
}

/// Usage counts of every registered tag, including unused ones
fn usage(store: &NoteStore) -> Vec<(String, usize)> {
    let mut counts = tag_counts(store.notes());
    for tag in store.tag_registry().global_tags() {
        if !counts.iter().any(|(name, _)| name == tag) {
            counts.push((tag.clone(), 0));
        }
    }
    counts
}
