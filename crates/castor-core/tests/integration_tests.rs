//! Integration tests for Castor Core

use castor_core::{
    decode_inline, AutoplayOutcome, ControllerConfig, EngineCall, EngineError, EngineEvent,
    Error, LiveEdge, NoticeLevel, PlaybackStatus, Preset, QualityChoice, RecordingEngine,
    RecordingSurface, SeekRange, SessionController, SessionPhase, SessionRequest, StreamKind,
    SurfaceCall, SurfaceEvent, TrackDescriptor, DRM_CATEGORY,
};
use std::sync::Arc;

fn setup() -> (Arc<RecordingEngine>, Arc<RecordingSurface>, SessionController) {
    let engine = Arc::new(RecordingEngine::new());
    let surface = Arc::new(RecordingSurface::new());
    let controller =
        SessionController::new(engine.clone(), surface.clone(), ControllerConfig::default());
    (engine, surface, controller)
}

fn ladder() -> Vec<TrackDescriptor> {
    vec![
        TrackDescriptor::new(1)
            .with_language("en")
            .with_resolution(640, 360)
            .with_bandwidth(800_000),
        TrackDescriptor::new(2)
            .with_language("en")
            .with_resolution(1280, 720)
            .with_bandwidth(2_500_000)
            .active(true),
        TrackDescriptor::new(3)
            .with_language("en")
            .with_resolution(1920, 1080)
            .with_bandwidth(5_000_000),
    ]
}

// =============================================================================
// Session Loading
// =============================================================================

#[tokio::test]
async fn test_clearkey_session_loads_plain_target() {
    let (engine, surface, controller) = setup();

    let request = SessionRequest::new("https://x/a.mpd").with_keys("ab12", "cd34");
    let outcome = controller.load(request).await.unwrap();

    let config = engine.last_config().unwrap();
    let drm = config.drm.unwrap();
    assert_eq!(drm.clear_keys.get("ab12").map(String::as_str), Some("cd34"));
    assert_eq!(drm.clear_keys.len(), 1);

    assert_eq!(engine.loaded_targets(), vec!["https://x/a.mpd".to_string()]);
    assert_eq!(outcome.autoplay, AutoplayOutcome::NotRequested);
    assert!(!surface.calls().contains(&SurfaceCall::Play));
    assert_eq!(controller.info().await.drm, "ClearKey");
}

#[tokio::test]
async fn test_separate_audio_loads_inline_playlist() {
    let (engine, _, controller) = setup();

    let request = SessionRequest::new("https://x/video.m3u8").with_audio("https://x/audio.m3u8");
    controller.load(request).await.unwrap();

    let targets = engine.loaded_targets();
    assert_eq!(targets.len(), 1);
    assert!(targets[0].starts_with("data:application/x-mpegurl;base64,"));

    let playlist = decode_inline(&targets[0]).unwrap();
    assert!(playlist.contains("URI=\"https://x/audio.m3u8\""));
    assert!(playlist.contains("https://x/video.m3u8"));
    assert!(engine.last_config().unwrap().drm.is_none());
    assert_eq!(controller.info().await.drm, "None");
}

#[tokio::test]
async fn test_rejected_requests_never_reach_engine() {
    let (engine, _, controller) = setup();

    let blank = SessionRequest::new("   ").with_keys("ab12", "cd34");
    assert!(matches!(controller.load(blank).await, Err(Error::MissingManifest)));

    let mut half = SessionRequest::new("https://x/a.mpd");
    half.key_value = Some("cd34".into());
    assert!(matches!(controller.load(half).await, Err(Error::MismatchedKeyPair)));

    assert!(engine.calls().is_empty());
    assert_eq!(controller.phase().await, SessionPhase::Idle);
}

#[tokio::test]
async fn test_load_failure_returns_to_idle() {
    let (engine, _, controller) = setup();
    engine.fail_loads_with(Some(EngineError::new(6007, DRM_CATEGORY, "license")));

    let result = controller.load(SessionRequest::new("https://x/a.mpd")).await;
    assert!(matches!(result, Err(Error::Engine(ref e)) if e.code == 6007));

    assert_eq!(controller.phase().await, SessionPhase::Idle);
    assert!(controller.current_session().await.is_none());
    assert_eq!(controller.info().await.status, PlaybackStatus::Error);

    let notice = controller.notice().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(
        notice.message,
        "Failed to load stream: DRM Error: License request failed"
    );

    engine.fail_loads_with(None);
    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();
    assert_eq!(controller.phase().await, SessionPhase::Active);
    assert!(controller.last_error().await.is_none());
}

#[tokio::test]
async fn test_newer_load_supersedes_pending_one() {
    let (engine, _, controller) = setup();
    let gate = engine.gate_next_load();

    let (first, second) = tokio::join!(
        controller.load(SessionRequest::new("https://x/first.mpd")),
        async {
            tokio::task::yield_now().await;
            let result = controller.load(SessionRequest::new("https://x/second.mpd")).await;
            gate.notify_one();
            result
        }
    );

    assert!(matches!(first, Err(Error::Superseded)));
    let second = second.unwrap();

    let current = controller.current_session().await.unwrap();
    assert_eq!(current.id, second.session_id);
    assert_eq!(current.target, "https://x/second.mpd");
    assert_eq!(controller.phase().await, SessionPhase::Active);

    let calls = engine.calls();
    let unload = calls.iter().position(|c| *c == EngineCall::Unload).unwrap();
    let second_load = calls
        .iter()
        .position(|c| *c == EngineCall::Load { target: "https://x/second.mpd".into() })
        .unwrap();
    assert!(unload < second_load);
}

#[tokio::test]
async fn test_unload_cancels_pending_load() {
    let (engine, _, controller) = setup();
    let gate = engine.gate_next_load();

    let (loaded, unloaded) = tokio::join!(
        controller.load(SessionRequest::new("https://x/slow.mpd")),
        async {
            tokio::task::yield_now().await;
            let result = controller.unload().await;
            gate.notify_one();
            result
        }
    );

    unloaded.unwrap();
    assert!(matches!(loaded, Err(Error::Superseded)));
    assert_eq!(controller.phase().await, SessionPhase::Idle);
    assert!(controller.current_session().await.is_none());
    assert_eq!(controller.info().await.status, PlaybackStatus::Stopped);
    assert!(engine.calls().contains(&EngineCall::Unload));
}

#[tokio::test]
async fn test_blocked_autoplay_is_not_a_failure() {
    let (_, surface, controller) = setup();
    surface.block_autoplay(Some("NotAllowedError".into()));

    let request = SessionRequest::new("https://x/a.m3u8").with_autoplay(true);
    let outcome = controller.load(request).await.unwrap();

    assert!(matches!(outcome.autoplay, AutoplayOutcome::Blocked(_)));
    assert_eq!(controller.phase().await, SessionPhase::Active);
    assert_eq!(
        controller.notice().await.unwrap().message,
        "Autoplay prevented - click play button"
    );
}

#[tokio::test]
async fn test_autoplay_starts_playback() {
    let (_, surface, controller) = setup();

    let request = SessionRequest::new("https://x/a.m3u8").with_autoplay(true);
    let outcome = controller.load(request).await.unwrap();

    assert_eq!(outcome.autoplay, AutoplayOutcome::Started);
    assert!(surface.calls().contains(&SurfaceCall::Play));
    assert_eq!(controller.info().await.status, PlaybackStatus::Playing);
}

#[tokio::test]
async fn test_preset_request_loads() {
    let (engine, _, controller) = setup();
    controller.load(Preset::Shaka.request()).await.unwrap();

    let drm = engine.last_config().unwrap().drm.unwrap();
    assert!(drm.clear_keys.contains_key("eb676abbcb345e96bbcf616630f1a3da"));
}

// =============================================================================
// Progress Tests
// =============================================================================

#[tokio::test]
async fn test_live_progress_and_edge_badge() {
    let (engine, surface, controller) = setup();
    engine.set_live(Some(true));
    engine.set_seek_range(SeekRange::new(100.0, 160.0));
    controller.load(SessionRequest::new("https://x/live.mpd")).await.unwrap();

    surface.set_current_time(158.0);
    controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;
    let view = controller.progress().await;
    assert_eq!(view.kind, Some(StreamKind::Live));
    assert_eq!(view.slider_max, 60.0);
    assert_eq!(view.slider_value, 58.0);
    assert_eq!(view.live_edge, Some(LiveEdge::Live));
    assert_eq!(controller.seek_to_live_edge().await.unwrap(), None);

    surface.set_current_time(150.0);
    controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;
    assert_eq!(controller.progress().await.live_edge, Some(LiveEdge::BackLive));
    assert_eq!(controller.progress().await.live_edge.unwrap().label(), "Back Live");

    assert_eq!(controller.seek_to_live_edge().await.unwrap(), Some(160.0));
    assert_eq!(surface.seeks(), vec![160.0]);
}

#[tokio::test]
async fn test_drag_ignores_ticks_and_seeks_once() {
    let (engine, surface, controller) = setup();
    engine.set_live(Some(true));
    engine.set_seek_range(SeekRange::new(100.0, 160.0));
    controller.load(SessionRequest::new("https://x/live.mpd")).await.unwrap();

    surface.set_current_time(158.0);
    controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;

    controller.begin_seek(20.0).await;
    controller.drag_seek(30.0).await;
    assert!(controller.is_seeking().await);

    surface.set_current_time(159.0);
    engine.set_seek_range(SeekRange::new(102.0, 162.0));
    controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;
    assert_eq!(controller.progress().await.slider_value, 30.0);

    let target = controller.end_seek().await.unwrap();
    assert_eq!(target, Some(132.0));
    assert_eq!(surface.seeks(), vec![132.0]);
    assert!(!controller.is_seeking().await);

    assert_eq!(controller.end_seek().await.unwrap(), None);
    assert_eq!(surface.seeks().len(), 1);
}

#[tokio::test]
async fn test_drag_release_after_range_dropout() {
    let (engine, surface, controller) = setup();
    engine.set_live(Some(true));
    engine.set_seek_range(SeekRange::new(100.0, 160.0));
    controller.load(SessionRequest::new("https://x/live.mpd")).await.unwrap();

    surface.set_current_time(150.0);
    controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;
    controller.begin_seek(20.0).await;

    engine.set_seek_range(None);
    surface.set_current_time(151.0);
    controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;

    assert_eq!(controller.end_seek().await.unwrap(), Some(120.0));
    assert_eq!(surface.seeks(), vec![120.0]);
}

#[tokio::test]
async fn test_failed_seek_restores_tracking() {
    let (_, surface, controller) = setup();
    surface.set_duration(200.0);
    controller.load(SessionRequest::new("https://x/vod.mp4")).await.unwrap();
    controller.handle_surface_event(SurfaceEvent::DurationChange).await;

    surface.fail_seeks_with(Some("not seekable".into()));
    controller.begin_seek(50.0).await;
    assert!(matches!(controller.end_seek().await, Err(Error::Surface(_))));
    assert!(!controller.is_seeking().await);

    surface.fail_seeks_with(None);
    assert_eq!(controller.commit_seek(25.0).await.unwrap(), Some(50.0));
}

#[tokio::test]
async fn test_vod_progress() {
    let (_, surface, controller) = setup();
    surface.set_duration(100.0);
    controller.load(SessionRequest::new("https://x/vod.mp4")).await.unwrap();

    surface.set_current_time(25.0);
    surface.set_buffered_end(Some(70.0));
    controller.handle_surface_event(SurfaceEvent::Progress).await;

    let view = controller.progress().await;
    assert_eq!(view.kind, Some(StreamKind::Vod));
    assert_eq!(view.position_percent, 25.0);
    assert_eq!(view.buffered_percent, 70.0);
    assert_eq!(view.time_label, "0:25");
    assert_eq!(view.duration_label, "1:40");
    assert_eq!(view.live_edge, None);
}

// =============================================================================
// Track Menu Tests
// =============================================================================

#[tokio::test]
async fn test_menus_rebuild_idempotently() {
    let (engine, _, controller) = setup();
    engine.set_tracks(ladder());
    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();

    controller.handle_engine_event(EngineEvent::TracksChanged).await;
    let first = controller.menus().await;
    controller.handle_engine_event(EngineEvent::Adaptation).await;
    controller.handle_engine_event(EngineEvent::TracksChanged).await;
    let second = controller.menus().await;

    assert_eq!(first, second);
    assert_eq!(first.audio.len(), 1);
    assert_eq!(first.quality.len(), 4);
    assert_eq!(first.active_quality_label, "Auto (720p)");
}

#[tokio::test]
async fn test_lifecycle_events_rebuild_menus() {
    let (engine, _, controller) = setup();
    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();

    engine.set_tracks(vec![TrackDescriptor::new(1)
        .with_language("en")
        .with_resolution(1280, 720)
        .active(true)]);
    controller.handle_engine_event(EngineEvent::Loading).await;
    assert_eq!(controller.menus().await.quality.len(), 2);

    engine.set_tracks(ladder());
    controller.handle_engine_event(EngineEvent::Loaded).await;
    assert_eq!(controller.menus().await.quality.len(), 4);

    let mut tracks = ladder();
    tracks.push(
        TrackDescriptor::new(4)
            .with_language("de")
            .with_resolution(1280, 720),
    );
    engine.set_tracks(tracks);
    controller.handle_engine_event(EngineEvent::Streaming).await;
    let menus = controller.menus().await;
    assert_eq!(menus.audio.len(), 2);
    assert_eq!(menus.audio[1].label, "de");
}

#[tokio::test]
async fn test_manual_quality_then_auto() {
    let (engine, _, controller) = setup();
    engine.set_tracks(ladder());
    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();

    let menus = controller.menus().await;
    let index = menus
        .quality
        .iter()
        .position(|e| e.choice == QualityChoice::Height(1080))
        .unwrap();
    assert!(controller.select_quality(index).await);

    assert!(engine.calls().contains(&EngineCall::SetAbrEnabled { enabled: false }));
    assert!(engine
        .calls()
        .contains(&EngineCall::SelectVariantTrack { id: 3, clear_buffer: true }));

    let menus = controller.menus().await;
    assert_eq!(menus.active_quality_label, "1080p");
    assert!(!menus.quality[0].checked);

    assert!(controller.select_quality(0).await);
    assert!(controller.menus().await.quality[0].checked);
}

#[tokio::test]
async fn test_last_audio_language_is_preferred() {
    let (engine, _, controller) = setup();
    engine.set_tracks(vec![
        TrackDescriptor::new(1)
            .with_language("en")
            .with_resolution(1280, 720)
            .active(true),
        TrackDescriptor::new(2)
            .with_language("de")
            .with_resolution(1280, 720),
    ]);

    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();

    assert!(engine
        .calls()
        .contains(&EngineCall::SelectAudioLanguage { language: "de".into() }));
    assert_eq!(controller.menus().await.active_audio_label, "de");
}

#[tokio::test]
async fn test_track_query_failure_keeps_menus() {
    let (engine, _, controller) = setup();
    engine.set_tracks(ladder());
    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();
    let before = controller.menus().await;

    engine.fail_track_queries_with(Some(EngineError::not_ready("tracks")));
    controller.handle_engine_event(EngineEvent::TracksChanged).await;

    assert_eq!(controller.menus().await, before);
}

// =============================================================================
// Info Panel Tests
// =============================================================================

#[tokio::test]
async fn test_info_panel_follows_events() {
    let (engine, _, controller) = setup();
    engine.set_tracks(ladder());
    engine.set_stats(castor_core::EngineStats {
        estimated_bandwidth: Some(3_000_000.0),
    });
    controller.load(SessionRequest::new("https://x/a.mpd")).await.unwrap();

    controller.handle_surface_event(SurfaceEvent::Playing).await;
    let info = controller.info().await;
    assert_eq!(info.status, PlaybackStatus::Playing);
    assert_eq!(info.resolution, "1280x720");
    assert_eq!(info.bandwidth, "3.00 Mbps");

    controller.handle_surface_event(SurfaceEvent::Waiting).await;
    assert_eq!(controller.info().await.status.to_string(), "Buffering...");

    controller
        .handle_engine_event(EngineEvent::Error(EngineError::new(6001, DRM_CATEGORY, "x")))
        .await;
    assert_eq!(
        controller.notice().await.unwrap().message,
        "DRM Error: Requested key system not supported"
    );

    controller.unload().await.unwrap();
    let info = controller.info().await;
    assert_eq!(info.status, PlaybackStatus::Stopped);
    assert_eq!(controller.notice().await.unwrap().message, "Stream stopped");
    assert_eq!(controller.phase().await, SessionPhase::Idle);
}
