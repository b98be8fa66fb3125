//! In-memory engine and surface that record every call
//!
//! Used by the CLI dry run and by tests. Track state, the live flag, the
//! seek range and failures are scriptable.

use super::{EngineConfig, PlaybackSurface, StreamingEngine};
use crate::{
    drm::KeySystem,
    error::{EngineError, Error, Result},
    types::{EngineStats, SeekRange, TrackDescriptor},
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// A call received by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum EngineCall {
    Configure { config: EngineConfig },
    Load { target: String },
    Unload,
    SelectAudioLanguage { language: String },
    SelectVariantTrack { id: u64, clear_buffer: bool },
    SetAbrEnabled { enabled: bool },
}

#[derive(Debug, Default)]
struct EngineState {
    calls: Vec<EngineCall>,
    tracks: Vec<TrackDescriptor>,
    live: Option<bool>,
    seek_range: Option<SeekRange>,
    abr_enabled: bool,
    stats: EngineStats,
    load_failure: Option<EngineError>,
    tracks_failure: Option<EngineError>,
    key_systems: Vec<KeySystem>,
    load_gate: Option<Arc<Notify>>,
}

/// Streaming engine double that records calls instead of streaming
#[derive(Debug)]
pub struct RecordingEngine {
    state: Mutex<EngineState>,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState {
                abr_enabled: true,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Targets passed to `load`, in order
    pub fn loaded_targets(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Load { target } => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent configuration applied
    pub fn last_config(&self) -> Option<EngineConfig> {
        self.state().calls.iter().rev().find_map(|call| match call {
            EngineCall::Configure { config } => Some(config.clone()),
            _ => None,
        })
    }

    pub fn set_tracks(&self, tracks: Vec<TrackDescriptor>) {
        self.state().tracks = tracks;
    }

    pub fn set_live(&self, live: Option<bool>) {
        self.state().live = live;
    }

    pub fn set_seek_range(&self, range: Option<SeekRange>) {
        self.state().seek_range = range;
    }

    pub fn set_stats(&self, stats: EngineStats) {
        self.state().stats = stats;
    }

    /// Make every subsequent load fail with `error`
    pub fn fail_loads_with(&self, error: Option<EngineError>) {
        self.state().load_failure = error;
    }

    /// Make track queries fail with `error`
    pub fn fail_track_queries_with(&self, error: Option<EngineError>) {
        self.state().tracks_failure = error;
    }

    pub fn set_supported_key_systems(&self, systems: Vec<KeySystem>) {
        self.state().key_systems = systems;
    }

    /// Hold the next load until the returned handle is notified
    pub fn gate_next_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().load_gate = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl StreamingEngine for RecordingEngine {
    fn configure(&self, config: &EngineConfig) -> std::result::Result<(), EngineError> {
        self.state().calls.push(EngineCall::Configure {
            config: config.clone(),
        });
        Ok(())
    }

    async fn load(&self, target: &str) -> std::result::Result<(), EngineError> {
        let gate = {
            let mut state = self.state();
            state.calls.push(EngineCall::Load {
                target: target.to_string(),
            });
            state.load_gate.take()
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.state().load_failure.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn unload(&self) -> std::result::Result<(), EngineError> {
        self.state().calls.push(EngineCall::Unload);
        Ok(())
    }

    fn variant_tracks(&self) -> std::result::Result<Vec<TrackDescriptor>, EngineError> {
        let state = self.state();
        match &state.tracks_failure {
            Some(error) => Err(error.clone()),
            None => Ok(state.tracks.clone()),
        }
    }

    fn select_audio_language(&self, language: &str) {
        let mut state = self.state();
        state.calls.push(EngineCall::SelectAudioLanguage {
            language: language.to_string(),
        });

        let current_height = state.tracks.iter().find(|t| t.active).and_then(|t| t.height);
        let matches_language = |t: &TrackDescriptor| t.language.as_deref() == Some(language);
        let chosen = state
            .tracks
            .iter()
            .find(|t| matches_language(t) && t.height == current_height)
            .or_else(|| state.tracks.iter().find(|t| matches_language(t)))
            .map(|t| t.id);

        if let Some(id) = chosen {
            for track in state.tracks.iter_mut() {
                track.active = track.id == id;
            }
        }
    }

    fn select_variant_track(&self, track: &TrackDescriptor, clear_buffer: bool) {
        let mut state = self.state();
        state.calls.push(EngineCall::SelectVariantTrack {
            id: track.id,
            clear_buffer,
        });
        if state.tracks.iter().any(|t| t.id == track.id) {
            for t in state.tracks.iter_mut() {
                t.active = t.id == track.id;
            }
        }
    }

    fn is_live(&self) -> Option<bool> {
        self.state().live
    }

    fn seek_range(&self) -> std::result::Result<SeekRange, EngineError> {
        self.state()
            .seek_range
            .ok_or_else(|| EngineError::not_ready("seek range"))
    }

    fn abr_enabled(&self) -> bool {
        self.state().abr_enabled
    }

    fn set_abr_enabled(&self, enabled: bool) {
        let mut state = self.state();
        state.calls.push(EngineCall::SetAbrEnabled { enabled });
        state.abr_enabled = enabled;
    }

    fn stats(&self) -> EngineStats {
        self.state().stats
    }

    async fn probe_key_system(&self, system: KeySystem) -> bool {
        self.state().key_systems.contains(&system)
    }
}

/// A call received by [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum SurfaceCall {
    Seek { time: f64 },
    Play,
    Pause,
    SetVolume { volume: f64 },
    SetMuted { muted: bool },
}

#[derive(Debug)]
struct SurfaceState {
    calls: Vec<SurfaceCall>,
    current_time: f64,
    duration: f64,
    buffered_end: Option<f64>,
    volume: f64,
    muted: bool,
    paused: bool,
    autoplay_block: Option<String>,
    seek_failure: Option<String>,
}

/// Playback surface double
#[derive(Debug)]
pub struct RecordingSurface {
    state: Mutex<SurfaceState>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// A paused surface with unknown duration
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceState {
                calls: Vec::new(),
                current_time: 0.0,
                duration: f64::NAN,
                buffered_end: None,
                volume: 1.0,
                muted: false,
                paused: true,
                autoplay_block: None,
                seek_failure: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state().calls.clone()
    }

    /// Positions passed to `seek`, in order
    pub fn seeks(&self) -> Vec<f64> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::Seek { time } => Some(*time),
                _ => None,
            })
            .collect()
    }

    pub fn set_current_time(&self, time: f64) {
        self.state().current_time = time;
    }

    pub fn set_duration(&self, duration: f64) {
        self.state().duration = duration;
    }

    pub fn set_buffered_end(&self, end: Option<f64>) {
        self.state().buffered_end = end;
    }

    /// Reject `play()` as an autoplay policy would
    pub fn block_autoplay(&self, reason: Option<String>) {
        self.state().autoplay_block = reason;
    }

    pub fn fail_seeks_with(&self, reason: Option<String>) {
        self.state().seek_failure = reason;
    }
}

#[async_trait]
impl PlaybackSurface for RecordingSurface {
    fn current_time(&self) -> f64 {
        self.state().current_time
    }

    fn duration(&self) -> f64 {
        self.state().duration
    }

    fn seek(&self, time: f64) -> Result<()> {
        let mut state = self.state();
        state.calls.push(SurfaceCall::Seek { time });
        if let Some(reason) = &state.seek_failure {
            return Err(Error::Surface(reason.clone()));
        }
        state.current_time = time;
        Ok(())
    }

    fn buffered_end(&self) -> Option<f64> {
        self.state().buffered_end
    }

    fn volume(&self) -> f64 {
        self.state().volume
    }

    fn set_volume(&self, volume: f64) {
        let mut state = self.state();
        state.calls.push(SurfaceCall::SetVolume { volume });
        state.volume = volume;
    }

    fn muted(&self) -> bool {
        self.state().muted
    }

    fn set_muted(&self, muted: bool) {
        let mut state = self.state();
        state.calls.push(SurfaceCall::SetMuted { muted });
        state.muted = muted;
    }

    fn paused(&self) -> bool {
        self.state().paused
    }

    fn pause(&self) {
        let mut state = self.state();
        state.calls.push(SurfaceCall::Pause);
        state.paused = true;
    }

    async fn play(&self) -> Result<()> {
        let mut state = self.state();
        state.calls.push(SurfaceCall::Play);
        if let Some(reason) = &state.autoplay_block {
            return Err(Error::AutoplayBlocked(reason.clone()));
        }
        state.paused = false;
        Ok(())
    }
}
