//! Settings command handlers
//!
//! Settings live in the bucket store next to the notes, not in the
//! config file, so every surface sharing the store sees the same values.

use anyhow::{bail, Context, Result};

use notestream_core::storage::buckets;
use notestream_core::{Settings, SharedStorage};

use crate::output::{Output, OutputFormat};

/// Show the stored settings
pub fn show(storage: &SharedStorage, output: &Output) -> Result<()> {
    let settings = buckets::load_settings(storage.as_ref()).context("Failed to load settings")?;

    match output.format {
        OutputFormat::Json => output.json(&settings)?,
        OutputFormat::Quiet => println!("{}", settings.auto_activate_minutes),
        OutputFormat::Human => {
            let auto = match settings.auto_activate_minutes {
                0 => "never".to_string(),
                minutes => format!("after {} min", minutes),
            };
            println!("Settings:");
            println!("  auto_activate_minutes: {} ({})", settings.auto_activate_minutes, auto);
            println!("  remember_channels:     {}", settings.remember_channels);
        }
    }
    Ok(())
}

/// Set one setting
pub fn set(storage: &SharedStorage, key: String, value: String, output: &Output) -> Result<()> {
    let mut settings =
        buckets::load_settings(storage.as_ref()).context("Failed to load settings")?;
    apply(&mut settings, &key, &value)?;
    buckets::save_settings(storage.as_ref(), &settings).context("Failed to save settings")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn apply(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "auto_activate_minutes" => {
            settings.auto_activate_minutes = value
                .parse()
                .context("Invalid value for auto_activate_minutes. Use a whole number of minutes.")?;
        }
        "remember_channels" => {
            settings.remember_channels = value
                .parse()
                .context("Invalid value for remember_channels. Use 'true' or 'false'.")?;
        }
        _ => {
            bail!(
                "Unknown setting: '{}'\n\
                 Valid keys: auto_activate_minutes, remember_channels",
                key
            );
        }
    }
    Ok(())
}
