//! Castor Core - playback session controller
//!
//! This crate drives a streaming engine and a playback surface on behalf of
//! a user-facing player:
//! - Session requests with optional ClearKey DRM and separate audio
//! - Inline master playlist composition for split audio/video sources
//! - Live/VOD timeline classification and progress synchronization
//! - Audio and quality menus built from the engine's variant tracks
//! - Player information panel and status notices
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Castor Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │   Request    │  │     DRM      │  │   Manifest   │           │
//! │  │  Validation  │  │    Config    │  │   Composer   │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Session   │◄──── engine / surface events │
//! │                    │ Controller  │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │   Timeline   │  │  Progress   │  │    Track     │            │
//! │  │   Resolver   │  │    Sync     │  │    Menus     │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine and surface are reached only through the [`StreamingEngine`]
//! and [`PlaybackSurface`] traits. [`RecordingEngine`] and
//! [`RecordingSurface`] are in-memory implementations for tests and
//! dry runs.

pub mod config;
pub mod drm;
pub mod engine;
pub mod error;
pub mod format;
pub mod info;
pub mod manifest;
pub mod presets;
pub mod progress;
pub mod session;
pub mod timeline;
pub mod tracks;
pub mod types;

pub use config::{ControllerConfig, LiveSync, StreamingProfile};
pub use drm::{DrmConfig, KeySystem, RetryPolicy};
pub use engine::{
    EngineCall, EngineConfig, EngineEvent, PlaybackSurface, RecordingEngine, RecordingSurface,
    StreamingEngine, SurfaceCall, SurfaceEvent,
};
pub use error::{EngineError, Error, Result, DRM_CATEGORY};
pub use info::{Notice, NoticeLevel, PlaybackStatus, PlayerInfo};
pub use manifest::{compose, decode_inline, detect_manifest_kind, ManifestKind};
pub use presets::Preset;
pub use progress::{LiveEdge, ProgressSync, ProgressView};
pub use session::{ActiveSession, AutoplayOutcome, LoadOutcome, LoadPlan, SessionController, VolumeView};
pub use timeline::TimelineSnapshot;
pub use tracks::{AudioEntry, QualityChoice, QualityEntry, TrackMenuBuilder, TrackMenus};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the controller library
pub fn init() {
    tracing::info!(version = VERSION, "Castor Core initialized");
}
