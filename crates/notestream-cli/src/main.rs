//! NoteStream CLI
//!
//! Command-line interface for NoteStream - timestamped notes on YouTube
//! videos, tags and exports.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notestream_core::{storage, Config, ExportFormat, SharedStorage};

mod commands;
mod editor;
mod output;

use commands::export::{Destination, OptionFlags, Selection};
use commands::note::VideoFlags;
use output::{Output, OutputFormat};

/// Environment variable holding the log filter
const LOG_ENV: &str = "NOTESTREAM_LOG";

#[derive(Parser)]
#[command(name = "notestream")]
#[command(about = "NoteStream - Timestamped notes for YouTube videos")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// Browse videos that have notes
    Video {
        #[command(subcommand)]
        command: VideoCommands,
    },
    /// Manage the tag vocabulary
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Export notes to a file
    Export {
        /// Only notes of this video (ID or URL)
        #[arg(long)]
        video: Option<String>,
        /// Only notes carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Export exactly these notes (full ID or prefix)
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Format: markdown, study-guide, text, json, csv
        #[arg(short, long)]
        format: Option<ExportFormat>,
        /// Leave out timestamps
        #[arg(long)]
        no_timestamps: bool,
        /// Leave out tags
        #[arg(long)]
        no_tags: bool,
        /// Do not group notes by video
        #[arg(long)]
        no_group: bool,
        /// Write to this file instead of the export directory
        #[arg(short, long, conflicts_with = "stdout")]
        output: Option<PathBuf>,
        /// Print the document instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Show learning statistics
    Stats,
    /// Show or change stored settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Show or change per-channel sidebar preferences
    Channel {
        #[command(subcommand)]
        command: Option<ChannelCommands>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show storage status
    Status,
    /// Delete all notes, recent videos and tags
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum NoteCommands {
    /// Add a note to a video
    #[command(alias = "create")]
    Add {
        /// Video ID or URL
        video: String,
        /// Note text (opens editor if not provided)
        text: Option<String>,
        /// Position in the video (H:MM:SS, M:SS or seconds)
        #[arg(short, long)]
        at: Option<String>,
        /// Tags to add
        #[arg(short, long, value_delimiter = ',')]
        tag: Vec<String>,
        /// Video title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Video channel
        #[arg(short, long)]
        channel: Option<String>,
        /// Video length (H:MM:SS, M:SS or seconds)
        #[arg(short, long)]
        duration: Option<String>,
    },
    /// List notes
    #[command(alias = "ls")]
    List {
        /// Only notes of this video (ID or URL)
        video: Option<String>,
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Search note text and tags
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show note details
    Show {
        /// Note ID (full ID or prefix)
        id: String,
    },
    /// Edit a note
    Edit {
        /// Note ID (full ID or prefix)
        id: String,
        /// New text
        #[arg(long)]
        text: Option<String>,
        /// New position in the video
        #[arg(short, long)]
        at: Option<String>,
        /// Replace the tags
        #[arg(short, long, value_delimiter = ',')]
        tag: Option<Vec<String>>,
    },
    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Note ID (full ID or prefix)
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum VideoCommands {
    /// List videos with notes
    #[command(alias = "ls")]
    List {
        /// Search titles and channels
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a video and its notes
    Show {
        /// Video ID (full ID, prefix or URL)
        id: String,
    },
    /// Record a video as recently viewed
    Visit {
        /// Video ID or URL
        video: String,
    },
    /// List recently viewed videos
    Recent,
}

#[derive(Subcommand)]
enum TagCommands {
    /// List tags with usage counts
    #[command(alias = "ls")]
    List,
    /// Register tags
    Add {
        /// Tags to register
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Suggest tags for some text
    Suggest {
        /// Draft note text
        text: String,
        /// Video title to take into account
        #[arg(short = 'T', long)]
        title: Option<String>,
    },
    /// Show the display colours of a tag
    Color {
        /// Tag name
        tag: String,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show settings
    Show,
    /// Change a setting
    Set {
        /// Setting key (auto_activate_minutes, remember_channels)
        key: String,
        /// Setting value
        value: String,
    },
}

#[derive(Subcommand)]
enum ChannelCommands {
    /// Show remembered channels
    Show,
    /// Remember whether the sidebar opens for a channel
    Set {
        /// Channel name
        channel: String,
        /// true to open the sidebar, false to keep it closed
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, export_dir, export.*)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening storage
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config)?;

    let storage = storage::open(&config)?;

    match cli.command {
        Commands::Note { command } => handle_note_command(command, &storage, &output),
        Commands::Video { command } => handle_video_command(command, &storage, &output),
        Commands::Tag { command } => handle_tag_command(command, &storage, &output),
        Commands::Export {
            video,
            tag,
            ids,
            format,
            no_timestamps,
            no_tags,
            no_group,
            output: path,
            stdout,
        } => commands::export::run(
            &storage,
            &config,
            Selection { video, tag, ids },
            OptionFlags {
                format,
                no_timestamps,
                no_tags,
                no_group,
            },
            Destination {
                output: path,
                stdout,
            },
            &output,
        ),
        Commands::Stats => commands::stats::show(&storage, &output),
        Commands::Settings { command } => match command {
            Some(SettingsCommands::Show) | None => commands::settings::show(&storage, &output),
            Some(SettingsCommands::Set { key, value }) => {
                commands::settings::set(&storage, key, value, &output)
            }
        },
        Commands::Channel { command } => match command {
            Some(ChannelCommands::Show) | None => commands::channel::show(&storage, &output),
            Some(ChannelCommands::Set { channel, enabled }) => {
                commands::channel::set(&storage, channel, enabled, &output)
            }
        },
        Commands::Status => commands::status::show(&storage, &config, &output),
        Commands::Clear { yes } => commands::clear::run(&storage, yes, &output),
        Commands::Config { .. } => Ok(()),
    }
}

fn handle_note_command(
    command: NoteCommands,
    storage: &SharedStorage,
    output: &Output,
) -> Result<()> {
    match command {
        NoteCommands::Add {
            video,
            text,
            at,
            tag,
            title,
            channel,
            duration,
        } => commands::note::add(
            storage,
            video,
            text,
            at,
            tag,
            VideoFlags {
                title,
                channel,
                duration,
            },
            output,
        ),
        NoteCommands::List { video, tag, search } => {
            commands::note::list(storage, video, tag, search, output)
        }
        NoteCommands::Show { id } => commands::note::show(storage, id, output),
        NoteCommands::Edit { id, text, at, tag } => {
            commands::note::edit(storage, id, text, at, tag, output)
        }
        NoteCommands::Delete { id, yes } => commands::note::delete(storage, id, yes, output),
    }
}

fn handle_video_command(
    command: VideoCommands,
    storage: &SharedStorage,
    output: &Output,
) -> Result<()> {
    match command {
        VideoCommands::List { search } => commands::video::list(storage, search, output),
        VideoCommands::Show { id } => commands::video::show(storage, id, output),
        VideoCommands::Visit { video } => commands::video::visit(storage, video, output),
        VideoCommands::Recent => commands::video::recent(storage, output),
    }
}

fn handle_tag_command(command: TagCommands, storage: &SharedStorage, output: &Output) -> Result<()> {
    match command {
        TagCommands::List => commands::tag::list(storage, output),
        TagCommands::Add { tags } => commands::tag::add(storage, tags, output),
        TagCommands::Suggest { text, title } => commands::tag::suggest_for(text, title, output),
        TagCommands::Color { tag } => commands::tag::color(tag, output),
    }
}

/// Install the tracing subscriber
///
/// Logs go to the configured log file when set, otherwise to stderr.
/// The filter comes from NOTESTREAM_LOG and defaults to warnings.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;

            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_note_add() {
        let cli = Cli::try_parse_from([
            "notestream",
            "note",
            "add",
            "dQw4w9WgXcQ",
            "Key idea",
            "--at",
            "1:05",
            "--tag",
            "rust,cli",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Note {
                command: NoteCommands::Add { text, at, tag, .. },
            } => {
                assert_eq!(text.as_deref(), Some("Key idea"));
                assert_eq!(at.as_deref(), Some("1:05"));
                assert_eq!(tag, vec!["rust", "cli"]);
            }
            _ => panic!("expected note add"),
        }
    }

    #[test]
    fn test_parse_export_format() {
        let cli = Cli::try_parse_from(["notestream", "export", "--format", "md", "--stdout"])
            .unwrap();
        match cli.command {
            Commands::Export { format, stdout, .. } => {
                assert_eq!(format, Some(ExportFormat::Markdown));
                assert!(stdout);
            }
            _ => panic!("expected export"),
        }

        assert!(Cli::try_parse_from(["notestream", "export", "--format", "pdf"]).is_err());
    }

    #[test]
    fn test_parse_channel_set() {
        let cli = Cli::try_parse_from(["notestream", "channel", "set", "Fireship", "false"])
            .unwrap();
        match cli.command {
            Commands::Channel {
                command: Some(ChannelCommands::Set { channel, enabled }),
            } => {
                assert_eq!(channel, "Fireship");
                assert!(!enabled);
            }
            _ => panic!("expected channel set"),
        }
    }
}
