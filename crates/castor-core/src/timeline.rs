//! Live/VOD classification and seek-range resolution

use crate::{
    engine::{PlaybackSurface, StreamingEngine},
    error::EngineError,
    format::normalize_duration,
    types::{SeekRange, StreamKind},
};
use tracing::debug;

/// Decide whether a session is live.
///
/// The engine's own predicate wins. Without one, an unbounded or zero
/// surface duration is taken to mean live: the surface alone cannot tell
/// "still probing" from "no end".
pub fn classify(engine_reports_live: Option<bool>, surface_duration: f64) -> StreamKind {
    match engine_reports_live {
        Some(true) => StreamKind::Live,
        Some(false) => StreamKind::Vod,
        None if !surface_duration.is_finite() || surface_duration == 0.0 => StreamKind::Live,
        None => StreamKind::Vod,
    }
}

/// Seekable window for the session.
///
/// Live asks the engine; an engine that is not ready yields `None`. VOD
/// spans `[0, duration]` when the duration is known.
pub fn resolve<F>(kind: StreamKind, surface_duration: f64, engine_seek_range: F) -> Option<SeekRange>
where
    F: FnOnce() -> Result<SeekRange, EngineError>,
{
    match kind {
        StreamKind::Live => match engine_seek_range() {
            Ok(range) => SeekRange::new(range.start, range.end),
            Err(e) => {
                debug!(error = %e, "Seek range unavailable");
                None
            }
        },
        StreamKind::Vod => {
            normalize_duration(surface_duration).and_then(|d| SeekRange::new(0.0, d))
        }
    }
}

/// Everything the progress bar needs from one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineSnapshot {
    pub kind: StreamKind,
    pub current_time: f64,
    pub duration: f64,
    pub range: Option<SeekRange>,
    pub buffered_end: Option<f64>,
}

impl TimelineSnapshot {
    /// Read engine and surface state for one progress tick
    pub fn read(engine: &dyn StreamingEngine, surface: &dyn PlaybackSurface) -> Self {
        let duration = surface.duration();
        let kind = classify(engine.is_live(), duration);
        let range = resolve(kind, duration, || engine.seek_range());

        Self {
            kind,
            current_time: surface.current_time(),
            duration,
            range,
            buffered_end: surface.buffered_end(),
        }
    }

    pub fn vod(current_time: f64, duration: f64) -> Self {
        Self {
            kind: StreamKind::Vod,
            current_time,
            duration,
            range: resolve(StreamKind::Vod, duration, || {
                Err(EngineError::not_ready("seek range"))
            }),
            buffered_end: None,
        }
    }

    pub fn live(current_time: f64, range: Option<SeekRange>) -> Self {
        Self {
            kind: StreamKind::Live,
            current_time,
            duration: f64::INFINITY,
            range,
            buffered_end: None,
        }
    }

    pub fn with_buffered_end(mut self, end: Option<f64>) -> Self {
        self.buffered_end = end;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_predicate_wins() {
        assert_eq!(classify(Some(true), 120.0), StreamKind::Live);
        assert_eq!(classify(Some(false), f64::INFINITY), StreamKind::Vod);
    }

    #[test]
    fn test_duration_fallback() {
        assert_eq!(classify(None, f64::INFINITY), StreamKind::Live);
        assert_eq!(classify(None, f64::NAN), StreamKind::Live);
        assert_eq!(classify(None, 0.0), StreamKind::Live);
        assert_eq!(classify(None, 95.5), StreamKind::Vod);
    }

    #[test]
    fn test_live_range_from_engine() {
        let range = resolve(StreamKind::Live, f64::INFINITY, || {
            Ok(SeekRange { start: 100.0, end: 160.0 })
        });
        assert_eq!(range, Some(SeekRange { start: 100.0, end: 160.0 }));
    }

    #[test]
    fn test_live_engine_not_ready() {
        let range = resolve(StreamKind::Live, f64::INFINITY, || {
            Err(EngineError::not_ready("seek range"))
        });
        assert_eq!(range, None);
    }

    #[test]
    fn test_live_inverted_range_dropped() {
        let range = resolve(StreamKind::Live, f64::INFINITY, || {
            Ok(SeekRange { start: 50.0, end: 40.0 })
        });
        assert_eq!(range, None);
    }

    #[test]
    fn test_vod_range() {
        let never = || -> Result<SeekRange, EngineError> { panic!("VOD must not query the engine") };
        assert_eq!(
            resolve(StreamKind::Vod, 300.0, never),
            Some(SeekRange { start: 0.0, end: 300.0 })
        );
        assert_eq!(resolve(StreamKind::Vod, f64::NAN, never), None);
        assert_eq!(resolve(StreamKind::Vod, 0.0, never), None);
    }
}
