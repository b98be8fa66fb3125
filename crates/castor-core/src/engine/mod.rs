//! Contracts for the external collaborators
//!
//! The controller never decodes media or negotiates licenses itself. It
//! drives a [`StreamingEngine`] (manifest loading, ABR, DRM) and a
//! [`PlaybackSurface`] (the element that actually renders) through the
//! traits below and reacts to the lifecycle events they emit.

mod recording;

pub use recording::{EngineCall, RecordingEngine, RecordingSurface, SurfaceCall};

use crate::{
    config::StreamingProfile,
    drm::{DrmConfig, KeySystem},
    error::{EngineError, Result},
    types::{EngineStats, SeekRange, TrackDescriptor},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration payload applied to the engine before each load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub streaming: StreamingProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drm: Option<DrmConfig>,
}

/// Adaptive-streaming engine capability set
#[async_trait]
pub trait StreamingEngine: Send + Sync {
    /// Apply streaming tuning and (optional) DRM configuration
    fn configure(&self, config: &EngineConfig) -> std::result::Result<(), EngineError>;

    /// Load a manifest URL or inline manifest
    async fn load(&self, target: &str) -> std::result::Result<(), EngineError>;

    /// Release everything held for the current load
    async fn unload(&self) -> std::result::Result<(), EngineError>;

    /// Current variant track list
    fn variant_tracks(&self) -> std::result::Result<Vec<TrackDescriptor>, EngineError>;

    fn select_audio_language(&self, language: &str);

    fn select_variant_track(&self, track: &TrackDescriptor, clear_buffer: bool);

    /// Live predicate, if the engine exposes one
    fn is_live(&self) -> Option<bool> {
        None
    }

    /// Seekable window of a live stream
    fn seek_range(&self) -> std::result::Result<SeekRange, EngineError> {
        Err(EngineError::not_ready("seek range"))
    }

    /// Whether automatic bitrate selection is on
    fn abr_enabled(&self) -> bool;

    fn set_abr_enabled(&self, enabled: bool);

    fn stats(&self) -> EngineStats {
        EngineStats::default()
    }

    /// Whether the platform can open the given key system
    async fn probe_key_system(&self, _system: KeySystem) -> bool {
        false
    }
}

/// Raw playback surface (the media element)
#[async_trait]
pub trait PlaybackSurface: Send + Sync {
    fn current_time(&self) -> f64;

    /// Total duration; may be NaN or infinite while unknown or live
    fn duration(&self) -> f64;

    /// Move the playhead
    fn seek(&self, time: f64) -> Result<()>;

    /// End of the last buffered range, if anything is buffered
    fn buffered_end(&self) -> Option<f64>;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    fn paused(&self) -> bool;

    fn pause(&self);

    /// Start playback; rejected when blocked by autoplay policy
    async fn play(&self) -> Result<()>;
}

/// Engine lifecycle events
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Loading,
    Loaded,
    Streaming,
    Adaptation,
    TracksChanged,
    Error(EngineError),
}

impl EngineEvent {
    /// Events after which the track list may have changed
    pub fn refreshes_tracks(&self) -> bool {
        !matches!(self, EngineEvent::Error(_))
    }
}

/// Playback surface lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Playing,
    Pause,
    Ended,
    Waiting,
    TimeUpdate,
    DurationChange,
    Progress,
    VolumeChange,
}

impl SurfaceEvent {
    /// Events that move the progress bar
    pub fn is_progress_tick(&self) -> bool {
        matches!(
            self,
            SurfaceEvent::TimeUpdate | SurfaceEvent::DurationChange | SurfaceEvent::Progress
        )
    }
}
