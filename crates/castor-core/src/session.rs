//! Session controller - main orchestrator for a playback session
//!
//! Coordinates:
//! - Request validation, DRM and load-target assembly
//! - Engine load/unload sequencing and supersession
//! - Track menu rebuilds on engine lifecycle events
//! - Progress synchronization on surface events
//! - Player information panel and status notices

use crate::{
    config::ControllerConfig,
    drm::{DrmConfig, KeySystem},
    engine::{EngineConfig, EngineEvent, PlaybackSurface, StreamingEngine, SurfaceEvent},
    error::EngineError,
    info::{Notice, PlaybackStatus, PlayerInfo},
    manifest::{compose, detect_manifest_kind, ManifestKind},
    progress::{ProgressSync, ProgressView},
    timeline::TimelineSnapshot,
    tracks::{TrackMenuBuilder, TrackMenus},
    types::*,
    Error, Result,
};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Everything derived from a validated request before touching the engine
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPlan {
    /// Configuration applied to the engine
    pub engine_config: EngineConfig,
    /// URL or inline playlist handed to the engine
    pub target: String,
    pub manifest_kind: ManifestKind,
}

impl LoadPlan {
    pub fn new(request: &ValidatedRequest, config: &ControllerConfig) -> Result<Self> {
        let target = compose(&request.manifest_url, request.audio_url.as_deref())?;
        let drm = DrmConfig::build(request.key_pair.as_ref(), config.retry);

        Ok(Self {
            engine_config: EngineConfig {
                streaming: config.streaming,
                drm,
            },
            manifest_kind: detect_manifest_kind(&target),
            target,
        })
    }
}

/// The session currently registered with the controller
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub id: SessionId,
    pub request: ValidatedRequest,
    pub target: String,
    pub manifest_kind: ManifestKind,
}

/// What happened to an autoplay request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AutoplayOutcome {
    NotRequested,
    Started,
    /// The surface refused to play; playback waits for the user
    Blocked(String),
}

/// Result of a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub session_id: SessionId,
    pub autoplay: AutoplayOutcome,
}

/// Volume as last reported by the surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeView {
    pub volume: f64,
    pub muted: bool,
}

impl Default for VolumeView {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

#[derive(Debug)]
struct ControllerState {
    phase: SessionPhase,
    current: Option<ActiveSession>,
    progress: ProgressSync,
    menus: TrackMenuBuilder,
    info: PlayerInfo,
    notice: Option<Notice>,
    last_error: Option<String>,
    volume: VolumeView,
}

/// Playback session controller
///
/// Holds at most one session. Every load supersedes the previous one: the
/// engine is unloaded first, and a load that completes after being
/// superseded is discarded.
pub struct SessionController {
    engine: Arc<dyn StreamingEngine>,
    surface: Arc<dyn PlaybackSurface>,
    config: ControllerConfig,
    state: RwLock<ControllerState>,
    phase_tx: watch::Sender<SessionPhase>,
    /// Bumped by every load and unload; stale loads compare against it
    generation: AtomicU64,
}

impl SessionController {
    /// Create a controller over an engine and a playback surface
    pub fn new(
        engine: Arc<dyn StreamingEngine>,
        surface: Arc<dyn PlaybackSurface>,
        config: ControllerConfig,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Idle);

        Self {
            engine,
            surface,
            state: RwLock::new(ControllerState {
                phase: SessionPhase::Idle,
                current: None,
                progress: ProgressSync::new(config.live_edge_threshold),
                menus: TrackMenuBuilder::new(),
                info: PlayerInfo::default(),
                notice: None,
                last_error: None,
                volume: VolumeView::default(),
            }),
            config,
            phase_tx,
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Get current phase
    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    pub async fn current_session(&self) -> Option<ActiveSession> {
        self.state.read().await.current.clone()
    }

    pub async fn progress(&self) -> ProgressView {
        self.state.read().await.progress.view().clone()
    }

    pub async fn is_seeking(&self) -> bool {
        self.state.read().await.progress.is_dragging()
    }

    pub async fn menus(&self) -> TrackMenus {
        self.state.read().await.menus.menus().clone()
    }

    pub async fn info(&self) -> PlayerInfo {
        self.state.read().await.info.clone()
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.state.read().await.notice.clone()
    }

    /// Message of the most recent load or engine failure
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn volume(&self) -> VolumeView {
        self.state.read().await.volume
    }

    fn transition(&self, state: &mut ControllerState, to: SessionPhase) {
        let from = state.phase;
        if from == to {
            return;
        }
        if !from.can_transition_to(to) {
            warn!(from = %from, to = %to, "Unexpected phase transition");
        }

        state.phase = to;
        self.phase_tx.send_replace(to);
        info!(from = %from, to = %to, "Phase transition");
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Load a new session, superseding any current one
    #[instrument(skip(self, request), fields(manifest = %request.manifest_url))]
    pub async fn load(&self, request: SessionRequest) -> Result<LoadOutcome> {
        let (request, plan) = match request
            .validate()
            .and_then(|r| LoadPlan::new(&r, &self.config).map(|plan| (r, plan)))
        {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "Rejected session request");
                self.state.write().await.notice = Some(Notice::error(e.to_string()));
                return Err(e);
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let id = SessionId::new();
        info!(
            session_id = %id,
            kind = %plan.manifest_kind,
            drm = plan.engine_config.drm.is_some(),
            separate_audio = request.audio_url.is_some(),
            "Loading stream"
        );

        let needs_unload = {
            let mut state = self.state.write().await;
            let busy = state.current.take().is_some() || state.phase != SessionPhase::Idle;
            if busy {
                self.transition(&mut state, SessionPhase::Unloading);
            }
            state.progress.reset();
            state.menus.clear();
            state.notice = None;
            state.last_error = None;
            busy
        };

        if needs_unload {
            if let Err(e) = self.release_engine().await {
                warn!(error = %e, "Unloading previous session failed");
            }
        }
        if !self.is_current(generation) {
            return Err(Error::Superseded);
        }

        {
            let mut state = self.state.write().await;
            self.transition(&mut state, SessionPhase::Loading);
            state.info.set_status(PlaybackStatus::Loading);
            state.info.drm = DrmConfig::label(plan.engine_config.drm.as_ref()).to_string();
        }

        if let Err(e) = self.engine.configure(&plan.engine_config) {
            return self.fail_load(generation, e).await;
        }

        let loaded = self.engine.load(&plan.target).await;
        if !self.is_current(generation) {
            debug!(session_id = %id, "Discarding completion of superseded load");
            return Err(Error::Superseded);
        }
        if let Err(e) = loaded {
            return self.fail_load(generation, e).await;
        }

        self.select_preferred_audio();

        {
            let mut state = self.state.write().await;
            if !self.is_current(generation) {
                return Err(Error::Superseded);
            }
            state.current = Some(ActiveSession {
                id,
                request: request.clone(),
                target: plan.target.clone(),
                manifest_kind: plan.manifest_kind,
            });
            self.transition(&mut state, SessionPhase::Active);
            state.menus.refresh(self.engine.as_ref());
            state.info.set_status(PlaybackStatus::Paused);
            refresh_stream_info(&mut state, self.engine.as_ref());
            state.notice = Some(Notice::success("Stream loaded successfully!"));
        }
        info!(session_id = %id, "Stream loaded");

        let autoplay = if request.autoplay {
            self.start_autoplay(generation).await
        } else {
            AutoplayOutcome::NotRequested
        };

        Ok(LoadOutcome {
            session_id: id,
            autoplay,
        })
    }

    async fn fail_load(&self, generation: u64, e: EngineError) -> Result<LoadOutcome> {
        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            return Err(Error::Superseded);
        }

        error!(code = e.code, category = e.category, message = %e.message, "Stream loading failed");
        self.transition(&mut state, SessionPhase::Error);
        state.current = None;
        state.info.set_status(PlaybackStatus::Error);
        state.last_error = Some(e.describe());
        state.notice = Some(Notice::error(format!("Failed to load stream: {}", e.describe())));
        self.transition(&mut state, SessionPhase::Idle);

        Err(Error::Engine(e))
    }

    // The last listed audio language is preferred over the engine default
    fn select_preferred_audio(&self) {
        let tracks = match self.engine.variant_tracks() {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(error = %e, "Audio language selection failed");
                return;
            }
        };

        let current = tracks
            .iter()
            .find(|t| t.active)
            .and_then(|t| t.language.as_deref());
        let Some(last) = tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Variant)
            .filter_map(|t| t.language.as_deref())
            .last()
        else {
            return;
        };

        if current != Some(last) {
            info!(language = last, "Selecting audio language");
            self.engine.select_audio_language(last);
        }
    }

    async fn start_autoplay(&self, generation: u64) -> AutoplayOutcome {
        match self.surface.play().await {
            Ok(()) => {
                let mut state = self.state.write().await;
                if self.is_current(generation) {
                    state.info.set_status(PlaybackStatus::Playing);
                    refresh_stream_info(&mut state, self.engine.as_ref());
                }
                AutoplayOutcome::Started
            }
            Err(e) => {
                warn!(error = %e, "Autoplay prevented");
                let mut state = self.state.write().await;
                if self.is_current(generation) {
                    state.notice = Some(Notice::error("Autoplay prevented - click play button"));
                }
                AutoplayOutcome::Blocked(e.to_string())
            }
        }
    }

    async fn release_engine(&self) -> std::result::Result<(), EngineError> {
        self.surface.pause();
        self.engine.unload().await
    }

    /// Stop the current session and release the engine
    #[instrument(skip(self))]
    pub async fn unload(&self) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut state = self.state.write().await;
            if state.phase == SessionPhase::Idle && state.current.is_none() {
                debug!("Nothing to unload");
                return Ok(());
            }
            self.transition(&mut state, SessionPhase::Unloading);
            state.current = None;
        }

        info!("Stopping stream");
        let result = self.release_engine().await;

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            return result.map_err(Error::from);
        }
        self.transition(&mut state, SessionPhase::Idle);
        state.progress.reset();
        state.menus.clear();
        state.info.set_status(PlaybackStatus::Stopped);
        state.notice = Some(match &result {
            Ok(()) => Notice::success("Stream stopped"),
            Err(_) => Notice::error("Error stopping stream"),
        });

        result.map_err(Error::from)
    }

    /// Engine lifecycle event
    pub async fn handle_engine_event(&self, event: EngineEvent) {
        let mut state = self.state.write().await;

        match &event {
            EngineEvent::Loading => state.info.set_status(PlaybackStatus::Loading),
            EngineEvent::Loaded => state.info.set_status(PlaybackStatus::Playing),
            EngineEvent::Streaming | EngineEvent::Adaptation | EngineEvent::TracksChanged => {}
            EngineEvent::Error(e) => {
                error!(code = e.code, category = e.category, message = %e.message, "Engine error");
                state.info.set_status(PlaybackStatus::Error);
                state.last_error = Some(e.describe());
                state.notice = Some(Notice::error(e.describe()));
            }
        }

        if event.refreshes_tracks() {
            state.menus.refresh(self.engine.as_ref());
        }
        if matches!(event, EngineEvent::Streaming | EngineEvent::Adaptation) {
            refresh_stream_info(&mut state, self.engine.as_ref());
        }
    }

    /// Playback surface event
    pub async fn handle_surface_event(&self, event: SurfaceEvent) {
        let mut state = self.state.write().await;

        if event.is_progress_tick() {
            let snapshot = TimelineSnapshot::read(self.engine.as_ref(), self.surface.as_ref());
            state.progress.on_tick(snapshot);
            return;
        }

        match event {
            SurfaceEvent::Playing => {
                state.info.set_status(PlaybackStatus::Playing);
                refresh_stream_info(&mut state, self.engine.as_ref());
            }
            SurfaceEvent::Pause => state.info.set_status(PlaybackStatus::Paused),
            SurfaceEvent::Ended => state.info.set_status(PlaybackStatus::Ended),
            SurfaceEvent::Waiting => state.info.set_status(PlaybackStatus::Buffering),
            SurfaceEvent::VolumeChange => {
                state.volume = VolumeView {
                    volume: self.surface.volume(),
                    muted: self.surface.muted(),
                };
            }
            SurfaceEvent::TimeUpdate | SurfaceEvent::DurationChange | SurfaceEvent::Progress => {}
        }
    }

    /// Pointer pressed on the seek bar
    pub async fn begin_seek(&self, value: f64) {
        self.state.write().await.progress.begin_drag(value);
    }

    /// Pointer moved on the seek bar
    pub async fn drag_seek(&self, value: f64) {
        self.state.write().await.progress.drag_to(value);
    }

    /// Pointer released: issue the one seek for this drag
    pub async fn end_seek(&self) -> Result<Option<f64>> {
        let target = self.state.write().await.progress.end_drag();
        self.seek_surface(target)
    }

    /// Set the seek bar programmatically and seek there
    pub async fn commit_seek(&self, value: f64) -> Result<Option<f64>> {
        let target = self.state.write().await.progress.commit(value);
        self.seek_surface(target)
    }

    /// Jump to the live edge when the badge reads "Back Live"
    pub async fn seek_to_live_edge(&self) -> Result<Option<f64>> {
        let target = self.state.read().await.progress.live_edge_target();
        self.seek_surface(target)
    }

    fn seek_surface(&self, target: Option<f64>) -> Result<Option<f64>> {
        let Some(time) = target else {
            return Ok(None);
        };
        debug!(time, "Seeking");
        self.surface.seek(time)?;
        Ok(Some(time))
    }

    /// Select the audio menu entry at `index`
    pub async fn select_audio(&self, index: usize) -> bool {
        let mut state = self.state.write().await;
        state.menus.select_audio(self.engine.as_ref(), index)
    }

    /// Select the quality menu entry at `index`
    pub async fn select_quality(&self, index: usize) -> bool {
        let mut state = self.state.write().await;
        state.menus.select_quality(self.engine.as_ref(), index)
    }

    /// Play when paused, pause when playing
    pub async fn toggle_playback(&self) -> Result<()> {
        if self.surface.paused() {
            self.surface.play().await
        } else {
            self.surface.pause();
            Ok(())
        }
    }

    /// Set volume, clamped to `[0, 1]`; a non-zero volume unmutes
    pub fn set_volume(&self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        self.surface.set_volume(volume);
        if volume > 0.0 && self.surface.muted() {
            self.surface.set_muted(false);
        }
    }

    pub fn toggle_mute(&self) {
        self.surface.set_muted(!self.surface.muted());
    }

    /// Ask the engine which key systems the platform supports
    pub async fn probe_key_systems(&self) -> Vec<(KeySystem, bool)> {
        let mut support = Vec::with_capacity(KeySystem::ALL.len());
        for system in KeySystem::ALL {
            let supported = self.engine.probe_key_system(system).await;
            debug!(system = %system, supported, "Key system probed");
            support.push((system, supported));
        }
        support
    }
}

fn refresh_stream_info(state: &mut ControllerState, engine: &dyn StreamingEngine) {
    if let Some(active) = state.menus.active_track().cloned() {
        state.info.update_stream(&active, &engine.stats());
    }
}
