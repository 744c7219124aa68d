//! Config command handlers

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use notestream_core::{Config, ExportFormat};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            output.json(&serde_json::json!({
                "data_dir": config.data_dir,
                "log_file": config.log_file,
                "export_dir": config.export_dir,
                "export": config.export,
            }))?;
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:   {}", config.data_dir.display());
            println!("  log_file:   {}", display_optional(config.log_file.as_deref()));
            println!("  export_dir: {}", display_optional(config.export_dir.as_deref()));
            println!();
            println!("Export defaults:");
            println!("  format:             {}", config.export.format);
            println!("  include_timestamps: {}", config.export.include_timestamps);
            println!("  include_tags:       {}", config.export.include_tags);
            println!("  group_by_video:     {}", config.export.group_by_video);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "log_file" => {
            config.log_file = optional_path(value);
        }
        "export_dir" => {
            config.export_dir = optional_path(value);
        }
        "export.format" => {
            config.export.format = value.parse::<ExportFormat>().map_err(anyhow::Error::msg)?;
        }
        "export.include_timestamps" => {
            config.export.include_timestamps = parse_bool(key, value)?;
        }
        "export.include_tags" => {
            config.export.include_tags = parse_bool(key, value)?;
        }
        "export.group_by_video" => {
            config.export.group_by_video = parse_bool(key, value)?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, log_file, export_dir, export.format, \
                 export.include_timestamps, export.include_tags, export.group_by_video",
                key
            );
        }
    }
    Ok(())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.into())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("Invalid value for {}. Use 'true' or 'false'.", key))
}

fn display_optional(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}
