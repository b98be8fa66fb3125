//! CLI command implementations

use crate::output::{emit, or_dash};
use crate::RequestArgs;
use castor_core::{
    decode_inline, detect_manifest_kind, AutoplayOutcome, ControllerConfig, EngineCall,
    EngineConfig, EngineError, KeySystem, ManifestKind, Preset, ProgressSync, ProgressView,
    RecordingEngine, RecordingSurface, SeekRange, SessionController, SessionRequest,
    TimelineSnapshot,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Load the controller configuration, or defaults when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ControllerConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading configuration");
            Ok(ControllerConfig::load(path)?)
        }
        None => Ok(ControllerConfig::default()),
    }
}

fn build_request(args: RequestArgs) -> anyhow::Result<SessionRequest> {
    let mut request = match args.preset.as_deref() {
        Some(name) => Preset::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset '{}'", name))?
            .request(),
        None => SessionRequest::default(),
    };

    if let Some(manifest) = args.manifest {
        request.manifest_url = manifest;
    }
    if args.audio.is_some() {
        request.audio_url = args.audio;
    }
    if args.key_id.is_some() {
        request.key_id = args.key_id;
    }
    if args.key.is_some() {
        request.key_value = args.key;
    }
    request.autoplay |= args.autoplay;

    Ok(request)
}

#[derive(Serialize)]
struct PlanReport {
    session_id: String,
    manifest_kind: ManifestKind,
    target: String,
    drm: String,
    engine_config: Option<EngineConfig>,
    autoplay: AutoplayOutcome,
    engine_calls: Vec<EngineCall>,
}

/// Dry-run a session load against the recording engine
pub async fn plan(args: RequestArgs, config: ControllerConfig, format: &str) -> anyhow::Result<()> {
    let request = build_request(args)?;

    let engine = Arc::new(RecordingEngine::new());
    let surface = Arc::new(RecordingSurface::new());
    let controller = SessionController::new(engine.clone(), surface, config);

    let outcome = controller.load(request).await?;
    let session = controller
        .current_session()
        .await
        .ok_or_else(|| anyhow::anyhow!("Session was not registered"))?;

    let report = PlanReport {
        session_id: outcome.session_id.to_string(),
        manifest_kind: session.manifest_kind,
        target: session.target,
        drm: controller.info().await.drm,
        engine_config: engine.last_config(),
        autoplay: outcome.autoplay,
        engine_calls: engine.calls(),
    };

    emit(&report, format, |r| {
        println!("Session: {}", r.session_id);
        println!("  Manifest: {}", r.manifest_kind);
        println!("  Target: {}", r.target);
        println!("  DRM: {}", r.drm);
        println!("  Autoplay: {:?}", r.autoplay);

        if let Some(config) = &r.engine_config {
            println!("\nEngine configuration:");
            println!(
                "{}",
                serde_json::to_string_pretty(config).unwrap_or_else(|_| "{}".to_string())
            );
        }

        println!("\nEngine calls:");
        for (i, call) in r.engine_calls.iter().enumerate() {
            println!("  {}. {}", i + 1, describe_call(call));
        }
    })
}

fn describe_call(call: &EngineCall) -> String {
    match call {
        EngineCall::Configure { config } => format!(
            "configure (drm: {})",
            if config.drm.is_some() { "yes" } else { "no" }
        ),
        EngineCall::Load { target } => format!("load {}", target),
        EngineCall::Unload => "unload".to_string(),
        EngineCall::SelectAudioLanguage { language } => format!("select audio language {}", language),
        EngineCall::SelectVariantTrack { id, clear_buffer } => {
            format!("select variant {} (clear buffer: {})", id, clear_buffer)
        }
        EngineCall::SetAbrEnabled { enabled } => format!("set abr {}", enabled),
    }
}

#[derive(Serialize)]
struct ComposeReport {
    manifest_kind: ManifestKind,
    target: String,
    playlist: Option<String>,
}

/// Print the effective load target
pub fn compose(manifest: &str, audio: Option<&str>, decode: bool, format: &str) -> anyhow::Result<()> {
    let target = castor_core::compose(manifest, audio)?;
    let report = ComposeReport {
        manifest_kind: detect_manifest_kind(&target),
        playlist: decode.then(|| decode_inline(&target)).flatten(),
        target,
    };

    emit(&report, format, |r| {
        println!("{}", r.target);
        if let Some(playlist) = &r.playlist {
            println!("\n{}", playlist);
        }
    })
}

#[derive(Serialize)]
struct ExplainReport {
    code: u32,
    category: u32,
    drm: bool,
    message: String,
}

/// Print the user-facing message for an engine error
pub fn explain(code: u32, category: u32, message: &str, format: &str) -> anyhow::Result<()> {
    let error = EngineError::new(code, category, message);
    let report = ExplainReport {
        code,
        category,
        drm: error.is_drm(),
        message: error.describe(),
    };

    emit(&report, format, |r| println!("{}", r.message))
}

/// Timeline shape for the progress command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timeline {
    Vod { duration: f64 },
    Live { range: SeekRange },
}

impl Timeline {
    pub fn from_args(duration: Option<f64>, range: Option<(f64, f64)>) -> anyhow::Result<Self> {
        match (duration, range) {
            (Some(duration), None) => Ok(Timeline::Vod { duration }),
            (None, Some((start, end))) => SeekRange::new(start, end)
                .map(|range| Timeline::Live { range })
                .ok_or_else(|| anyhow::anyhow!("Invalid seek range {}..{}", start, end)),
            _ => anyhow::bail!("Pass either --duration or --start/--end"),
        }
    }
}

/// Compute the seek bar for one timeline position
pub fn progress(
    time: f64,
    timeline: Timeline,
    buffered: Option<f64>,
    config: &ControllerConfig,
    format: &str,
) -> anyhow::Result<()> {
    let snapshot = match timeline {
        Timeline::Vod { duration } => TimelineSnapshot::vod(time, duration),
        Timeline::Live { range } => TimelineSnapshot::live(time, Some(range)),
    }
    .with_buffered_end(buffered);

    let mut sync = ProgressSync::new(config.live_edge_threshold);
    let view: ProgressView = sync.on_tick(snapshot).clone();

    emit(&view, format, |v| {
        println!("Kind: {}", or_dash(v.kind));
        println!("Time: {} / {}", v.time_label, v.duration_label);
        println!("Position: {:.1}%", v.position_percent);
        println!("Buffered: {:.1}%", v.buffered_percent);
        println!("Slider: {:.1} of {:.1}", v.slider_value, v.slider_max);
        println!("Live edge: {}", or_dash(v.live_edge.map(|e| e.label())));
    })
}

#[derive(Serialize)]
struct PresetRow {
    name: &'static str,
    description: &'static str,
    manifest_url: String,
    clear_key: bool,
}

/// List stream presets
pub fn presets(format: &str) -> anyhow::Result<()> {
    let rows: Vec<PresetRow> = Preset::ALL
        .into_iter()
        .map(|p| {
            let request = p.request();
            PresetRow {
                name: p.name(),
                description: p.description(),
                clear_key: request.key_id.is_some(),
                manifest_url: request.manifest_url,
            }
        })
        .collect();

    emit(&rows, format, |rows| {
        println!("Presets:");
        for row in rows {
            println!("  {:<8} {}", row.name, row.description);
            if !row.manifest_url.is_empty() {
                println!("           {}", row.manifest_url);
            }
        }
    })
}

#[derive(Serialize)]
struct KeySystemRow {
    name: &'static str,
    key_system: &'static str,
    system_id: &'static str,
}

/// List known DRM key systems
pub fn key_systems(format: &str) -> anyhow::Result<()> {
    let rows: Vec<KeySystemRow> = KeySystem::ALL
        .into_iter()
        .map(|k| KeySystemRow {
            name: k.name(),
            key_system: k.key_system_id(),
            system_id: k.system_id(),
        })
        .collect();

    emit(&rows, format, |rows| {
        println!("Key systems:");
        for row in rows {
            println!("  {:<10} {:<28} {}", row.name, row.key_system, row.system_id);
        }
    })
}
