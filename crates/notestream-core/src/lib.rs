//! NoteStream Core Library
//!
//! This crate provides the core functionality for NoteStream: timestamped
//! notes on YouTube videos, a shared tag vocabulary and multi-format exports.
//!
//! # Architecture
//!
//! - **Storage gateway**: named JSON buckets; the per-video notes map is the
//!   source of truth
//! - **Note store**: in-memory cache over one video or all videos
//! - **Tag registry**: global tag set plus a most-recently-used list
//! - **Export engine**: pure renderers for five document formats
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let storage = storage::open(&config)?;
//! let mut store = NoteStore::open(storage)?;
//!
//! store.set_video(Some(VideoInfo::new("dQw4w9WgXcQ").with_title("Example")))?;
//! store.create(NoteContent::new("Key idea here", 65.0))?;
//!
//! let doc = export::export(store.notes(), &ExportOptions::default(), Utc::now())?;
//! ```
//!
//! # Modules
//!
//! - `store`: Note store (main entry point)
//! - `models`: Notes, video descriptors, settings
//! - `tags`: Tag registry, colours and suggestions
//! - `export`: Lesson plan, study guide, text, JSON and CSV renderers
//! - `dashboard`: Derived video list and learning statistics
//! - `bridge`: Typed messages between the player host and the notes surface
//! - `storage`: Bucket store, typed accessors and migration
//! - `timecode`: Timestamp formatting and parsing
//! - `config`: Application configuration

pub mod bridge;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod models;
pub mod storage;
pub mod store;
pub mod tags;
pub mod timecode;

pub use config::Config;
pub use dashboard::{derive_videos, LearningStats};
pub use export::{ExportDocument, ExportError, ExportFormat, ExportOptions};
pub use models::{ChannelPreference, Note, Settings, Video, VideoInfo};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, StorageError, StorageGateway};
pub use store::{NoteContent, NoteError, NoteStore};
pub use tags::{color_for, suggest, TagRegistry};
pub use timecode::{format_time, parse_timestamp};
