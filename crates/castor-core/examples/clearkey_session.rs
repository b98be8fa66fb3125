//! ClearKey session example
//!
//! Loads the Shaka ClearKey preset against the in-memory engine, feeds a
//! few surface ticks and switches quality.
//!
//! Run with: cargo run -p castor-core --example clearkey_session

use castor_core::{
    ControllerConfig, EngineEvent, Preset, RecordingEngine, RecordingSurface, SessionController,
    SurfaceEvent, TrackDescriptor,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> castor_core::Result<()> {
    println!("Castor Core - ClearKey Session Example");
    println!("======================================\n");

    let engine = Arc::new(RecordingEngine::new());
    let surface = Arc::new(RecordingSurface::new());
    engine.set_tracks(vec![
        TrackDescriptor::new(1).with_language("en").with_resolution(640, 360).active(true),
        TrackDescriptor::new(2).with_language("en").with_resolution(1280, 720),
        TrackDescriptor::new(3).with_language("en").with_resolution(1920, 1080),
    ]);
    surface.set_duration(596.0);

    let controller =
        SessionController::new(engine.clone(), surface.clone(), ControllerConfig::default());

    let outcome = controller.load(Preset::Shaka.request()).await?;
    println!("Session {} loaded", outcome.session_id);
    println!("Info: {:?}\n", controller.info().await);

    controller.handle_engine_event(EngineEvent::TracksChanged).await;
    let menus = controller.menus().await;
    println!("Quality menu ({}):", menus.active_quality_label);
    for entry in &menus.quality {
        println!("  [{}] {}", if entry.checked { "x" } else { " " }, entry.label);
    }

    controller.select_quality(1).await;
    println!("\nAfter manual selection: {}", controller.menus().await.active_quality_label);

    for t in [0.0, 120.0, 298.0] {
        surface.set_current_time(t);
        controller.handle_surface_event(SurfaceEvent::TimeUpdate).await;
        let view = controller.progress().await;
        println!("{} / {} ({:.1}%)", view.time_label, view.duration_label, view.position_percent);
    }

    controller.unload().await?;
    println!("\nEngine calls:");
    for call in engine.calls() {
        println!("  {:?}", call);
    }

    Ok(())
}
