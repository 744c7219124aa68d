//! Messaging between the video page host and the notes surface
//!
//! The host owns the player: it answers descriptor and time queries, seeks,
//! toggles playback and tracks sidebar visibility. The surface owns a
//! `NoteStore` and reacts to the host's events. Both ends talk over a pair of
//! bounded channels carrying typed messages tagged by `action`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::{Note, VideoInfo, UNKNOWN_CHANNEL};
use crate::storage::buckets;
use crate::storage::{SharedStorage, StorageError};
use crate::store::{NoteContent, NoteError, NoteStore};

/// Default capacity of each direction of the bridge
pub const DEFAULT_CAPACITY: usize = 32;

/// Source of the descriptor of the video currently on the page
pub trait VideoDescriptorProvider: Send + Sync {
    /// `None` when no video is loaded
    fn current_video(&self) -> Option<VideoInfo>;
}

/// Control over the page's player
pub trait PlaybackControl: Send + Sync {
    /// Playback position in seconds
    fn current_time(&self) -> f64;
    fn seek(&self, seconds: f64);
    fn toggle_playback(&self);
}

/// Messages sent by the notes surface to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SurfaceRequest {
    GetVideoInfo,
    GetCurrentTime,
    JumpToTime {
        time: f64,
    },
    TogglePlayPause,
    ToggleSidebar,
    CloseSidebar,
    SidebarReady,
    #[serde(rename_all = "camelCase")]
    RecordVideoView {
        video_id: String,
    },
}

/// Messages sent by the host to the notes surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum SurfaceEvent {
    #[serde(rename_all = "camelCase")]
    VideoLoaded { video_info: Option<VideoInfo> },
    #[serde(rename_all = "camelCase")]
    SidebarOpened {
        video_info: Option<VideoInfo>,
        current_time: f64,
    },
    #[serde(rename_all = "camelCase")]
    TimeUpdate { current_time: f64 },
    #[serde(rename_all = "camelCase")]
    VideoInfo { video_info: Option<VideoInfo> },
}

/// Errors raised while moving messages across the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge channel is full")]
    Full,

    #[error("Bridge channel is closed")]
    Closed,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Note(#[from] NoteError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl<T> From<mpsc::error::TrySendError<T>> for BridgeError {
    fn from(err: mpsc::error::TrySendError<T>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => BridgeError::Full,
            mpsc::error::TrySendError::Closed(_) => BridgeError::Closed,
        }
    }
}

/// Surface end of the bridge
pub struct SurfaceHandle {
    pub request_tx: mpsc::Sender<SurfaceRequest>,
    pub event_rx: mpsc::Receiver<SurfaceEvent>,
}

/// Host end of the bridge
pub struct HostHandle {
    pub request_rx: mpsc::Receiver<SurfaceRequest>,
    pub event_tx: mpsc::Sender<SurfaceEvent>,
}

/// Create a connected pair of bridge ends
pub fn bridge(capacity: usize) -> (SurfaceHandle, HostHandle) {
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (event_tx, event_rx) = mpsc::channel(capacity);
    (
        SurfaceHandle {
            request_tx,
            event_rx,
        },
        HostHandle {
            request_rx,
            event_tx,
        },
    )
}

impl SurfaceHandle {
    /// Queue a request without waiting
    pub fn send(&self, request: SurfaceRequest) -> BridgeResult<()> {
        Ok(self.request_tx.try_send(request)?)
    }

    /// Next pending event, if any
    pub fn try_next(&mut self) -> Option<SurfaceEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Host-side dispatcher backed by the provider and playback traits
pub struct Host<P, C> {
    provider: P,
    playback: C,
    storage: SharedStorage,
    sidebar_visible: bool,
}

impl<P, C> Host<P, C>
where
    P: VideoDescriptorProvider,
    C: PlaybackControl,
{
    pub fn new(provider: P, playback: C, storage: SharedStorage) -> Self {
        Self {
            provider,
            playback,
            storage,
            sidebar_visible: false,
        }
    }

    pub fn sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    /// Handle one request, returning the reply event if there is one
    pub fn handle(&mut self, request: SurfaceRequest) -> BridgeResult<Option<SurfaceEvent>> {
        debug!(?request, "host handling request");
        let reply = match request {
            SurfaceRequest::GetVideoInfo => Some(SurfaceEvent::VideoInfo {
                video_info: self.provider.current_video(),
            }),
            SurfaceRequest::GetCurrentTime => Some(SurfaceEvent::TimeUpdate {
                current_time: self.playback.current_time(),
            }),
            SurfaceRequest::JumpToTime { time } => {
                self.playback.seek(time.max(0.0));
                None
            }
            SurfaceRequest::TogglePlayPause => {
                self.playback.toggle_playback();
                None
            }
            SurfaceRequest::ToggleSidebar => self.toggle_sidebar()?,
            SurfaceRequest::CloseSidebar => {
                if self.sidebar_visible {
                    self.toggle_sidebar()?
                } else {
                    None
                }
            }
            SurfaceRequest::SidebarReady => Some(SurfaceEvent::VideoLoaded {
                video_info: self.provider.current_video(),
            }),
            SurfaceRequest::RecordVideoView { video_id } => {
                buckets::record_recent_video(self.storage.as_ref(), &video_id)?;
                None
            }
        };
        Ok(reply)
    }

    /// Flip sidebar visibility; opening announces the video and remembers
    /// the channel when channel preferences are enabled
    fn toggle_sidebar(&mut self) -> BridgeResult<Option<SurfaceEvent>> {
        self.sidebar_visible = !self.sidebar_visible;
        if !self.sidebar_visible {
            return Ok(None);
        }

        let video_info = self.provider.current_video();
        if let Some(info) = &video_info {
            let settings = buckets::load_settings(self.storage.as_ref())?;
            if settings.remember_channels && info.channel != UNKNOWN_CHANNEL {
                buckets::set_channel_preference(self.storage.as_ref(), &info.channel, true)?;
            }
        }

        Ok(Some(SurfaceEvent::SidebarOpened {
            video_info,
            current_time: self.playback.current_time(),
        }))
    }

    /// Handle every queued request without blocking
    ///
    /// Returns the number of requests handled.
    pub fn pump(&mut self, handle: &mut HostHandle) -> BridgeResult<usize> {
        let mut handled = 0;
        while let Ok(request) = handle.request_rx.try_recv() {
            if let Some(event) = self.handle(request)? {
                handle.event_tx.try_send(event)?;
            }
            handled += 1;
        }
        Ok(handled)
    }

    /// Serve requests until the surface end is dropped
    pub async fn serve(mut self, mut handle: HostHandle) -> BridgeResult<()> {
        while let Some(request) = handle.request_rx.recv().await {
            match self.handle(request) {
                Ok(Some(event)) => {
                    if handle.event_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("host request failed: {}", e),
            }
        }
        Ok(())
    }
}

/// Surface-side state: the note store plus the last known playback time
pub struct Surface {
    pub store: NoteStore,
    current_time: f64,
}

impl Surface {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            current_time: 0.0,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Apply a host event to the surface state
    pub fn apply(&mut self, event: SurfaceEvent) -> BridgeResult<()> {
        match event {
            SurfaceEvent::VideoLoaded { video_info } | SurfaceEvent::VideoInfo { video_info } => {
                match video_info {
                    Some(info) => self.store.set_video(Some(info))?,
                    None => warn!("host sent no video descriptor"),
                }
            }
            SurfaceEvent::SidebarOpened {
                video_info,
                current_time,
            } => {
                self.current_time = current_time;
                match video_info {
                    Some(info) => self.store.set_video(Some(info))?,
                    None => warn!("sidebar opened without a video descriptor"),
                }
            }
            SurfaceEvent::TimeUpdate { current_time } => self.current_time = current_time,
        }
        Ok(())
    }

    /// Drain and apply every pending event; returns how many were applied
    pub fn sync(&mut self, handle: &mut SurfaceHandle) -> BridgeResult<usize> {
        let mut applied = 0;
        while let Some(event) = handle.try_next() {
            self.apply(event)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Save a note anchored at the last known playback time
    pub fn add_note_here<I, S>(&mut self, text: &str, tags: I) -> BridgeResult<Note>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let content = NoteContent::new(text, self.current_time).with_tags(tags);
        Ok(self.store.create(content)?)
    }
}
