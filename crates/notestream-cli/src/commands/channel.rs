//! Channel preference command handlers

use anyhow::{Context, Result};

use notestream_core::storage::buckets;
use notestream_core::SharedStorage;

use crate::output::{Output, OutputFormat};

/// Remember whether the sidebar opens for a channel
pub fn set(storage: &SharedStorage, channel: String, enabled: bool, output: &Output) -> Result<()> {
    let channel = channel.trim();
    if channel.is_empty() {
        anyhow::bail!("Channel name cannot be empty");
    }

    buckets::set_channel_preference(storage.as_ref(), channel, enabled)
        .context("Failed to save channel preference")?;

    let state = if enabled { "enabled" } else { "disabled" };
    output.success(&format!("Sidebar {} for {}", state, channel));
    Ok(())
}

/// Show every remembered channel preference
pub fn show(storage: &SharedStorage, output: &Output) -> Result<()> {
    let prefs = buckets::load_channel_preferences(storage.as_ref())
        .context("Failed to load channel preferences")?;

    match output.format {
        OutputFormat::Json => output.json(&prefs)?,
        OutputFormat::Quiet => {
            for (channel, pref) in &prefs {
                if pref.enabled {
                    println!("{}", channel);
                }
            }
        }
        OutputFormat::Human => {
            if prefs.is_empty() {
                println!("No channel preferences.");
                return Ok(());
            }
            for (channel, pref) in &prefs {
                println!(
                    "{} | {} | {}",
                    channel,
                    if pref.enabled { "on" } else { "off" },
                    pref.timestamp.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}
