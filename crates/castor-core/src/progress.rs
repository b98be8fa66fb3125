//! Progress synchronization
//!
//! Turns surface time/buffer ticks and the resolved seek range into the
//! numbers a seek bar shows. Two modes:
//!
//! ```text
//!            begin_drag / drag_to
//!   Tracking ─────────────────────▶ Dragging
//!      ▲                               │
//!      └──────── end_drag / commit ────┘  (one seek issued)
//! ```
//!
//! While dragging, ticks are recorded but never move the bar: the bar
//! follows the pointer only, so a sliding live window cannot fight the
//! user's gesture.
//!
//! The slider value is seconds into the window for live sessions and a
//! percentage for VOD sessions.

use crate::{
    format::{format_time, normalize_duration, percent_of},
    timeline::TimelineSnapshot,
    types::{SeekRange, StreamKind},
};
use serde::Serialize;
use tracing::debug;

/// Live badge state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LiveEdge {
    /// Playhead within the threshold of the live edge
    Live,
    /// Playhead behind the live edge; clicking jumps back to it
    BackLive,
}

impl LiveEdge {
    pub fn label(&self) -> &'static str {
        match self {
            LiveEdge::Live => "Live",
            LiveEdge::BackLive => "Back Live",
        }
    }
}

/// What the seek bar shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub kind: Option<StreamKind>,
    /// Played fill and thumb position (0-100)
    pub position_percent: f64,
    /// Buffered fill (0-100)
    pub buffered_percent: f64,
    /// Slider input value: seconds into the live window, or percent for VOD
    pub slider_value: f64,
    /// Slider input maximum: live window width, or 100 for VOD
    pub slider_max: f64,
    pub time_label: String,
    pub duration_label: String,
    pub live_edge: Option<LiveEdge>,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            kind: None,
            position_percent: 0.0,
            buffered_percent: 0.0,
            slider_value: 0.0,
            slider_max: 100.0,
            time_label: format_time(0.0),
            duration_label: format_time(0.0),
            live_edge: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SyncMode {
    Tracking,
    Dragging { value: f64 },
}

/// Seek bar state machine
#[derive(Debug, Clone)]
pub struct ProgressSync {
    mode: SyncMode,
    view: ProgressView,
    last: Option<TimelineSnapshot>,
    /// Last usable live window; survives ticks where the engine has no range
    live_range: Option<SeekRange>,
    live_edge_threshold: f64,
}

impl Default for ProgressSync {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl ProgressSync {
    pub fn new(live_edge_threshold: f64) -> Self {
        Self {
            mode: SyncMode::Tracking,
            view: ProgressView::default(),
            last: None,
            live_range: None,
            live_edge_threshold,
        }
    }

    pub fn view(&self) -> &ProgressView {
        &self.view
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, SyncMode::Dragging { .. })
    }

    /// Forget the previous session's timeline
    pub fn reset(&mut self) {
        self.mode = SyncMode::Tracking;
        self.view = ProgressView::default();
        self.last = None;
        self.live_range = None;
    }

    /// Surface time, progress or duration change
    pub fn on_tick(&mut self, snapshot: TimelineSnapshot) -> &ProgressView {
        self.last = Some(snapshot);
        match snapshot.kind {
            StreamKind::Live => {
                if let Some(range) = snapshot.range.filter(|r| r.window() > 0.0) {
                    self.live_range = Some(range);
                }
            }
            StreamKind::Vod => self.live_range = None,
        }
        if !self.is_dragging() {
            self.track(&snapshot);
        }
        &self.view
    }

    fn track(&mut self, snap: &TimelineSnapshot) {
        self.view.kind = Some(snap.kind);
        self.view.time_label = format_time(snap.current_time);

        match snap.kind {
            StreamKind::Vod => {
                self.view.live_edge = None;
                self.view.duration_label = format_time(snap.duration);

                let Some(percent) = percent_of(snap.current_time, snap.duration) else {
                    return;
                };
                self.view.position_percent = percent;
                self.view.slider_value = percent;
                self.view.slider_max = 100.0;

                if let Some(buffered) = snap
                    .buffered_end
                    .and_then(|end| percent_of(end, snap.duration))
                {
                    self.view.buffered_percent = buffered;
                }
            }
            StreamKind::Live => {
                let Some(range) = snap.range.filter(|r| r.window() > 0.0) else {
                    return;
                };
                if !snap.current_time.is_finite() {
                    return;
                }

                let window = range.window();
                let offset = (snap.current_time - range.start).clamp(0.0, window);

                self.view.position_percent = offset / window * 100.0;
                self.view.slider_value = offset;
                self.view.slider_max = window;
                self.view.duration_label = format_time(window);

                if let Some(end) = snap.buffered_end.filter(|e| e.is_finite()) {
                    let buffered = (end - range.start).clamp(0.0, window);
                    self.view.buffered_percent = buffered / window * 100.0;
                }

                self.view.live_edge = Some(if range.end - snap.current_time <= self.live_edge_threshold {
                    LiveEdge::Live
                } else {
                    LiveEdge::BackLive
                });
            }
        }
    }

    /// Pointer pressed on the seek control
    pub fn begin_drag(&mut self, value: f64) {
        debug!(value, "Seek drag started");
        self.mode = SyncMode::Dragging { value };
        self.follow_pointer(value);
    }

    /// Pointer moved; an input event without a prior press also starts a drag
    pub fn drag_to(&mut self, value: f64) {
        self.mode = SyncMode::Dragging { value };
        self.follow_pointer(value);
    }

    /// Pointer released: back to tracking, returns where to seek.
    ///
    /// The mode is reset before the caller seeks, so a failing seek never
    /// leaves the bar stuck in dragging.
    pub fn end_drag(&mut self) -> Option<f64> {
        let SyncMode::Dragging { value } = std::mem::replace(&mut self.mode, SyncMode::Tracking)
        else {
            return None;
        };
        let target = self.seek_target(value);
        debug!(value, ?target, "Seek drag released");
        target
    }

    /// Programmatic seek through the slider
    pub fn commit(&mut self, value: f64) -> Option<f64> {
        self.drag_to(value);
        self.end_drag()
    }

    /// Live edge to jump to when the badge reads "Back Live"
    pub fn live_edge_target(&self) -> Option<f64> {
        match self.view.live_edge {
            Some(LiveEdge::BackLive) => self.live_window().map(|r| r.end),
            _ => None,
        }
    }

    fn live_window(&self) -> Option<SeekRange> {
        self.last
            .filter(|s| s.kind == StreamKind::Live)
            .and(self.live_range)
    }

    fn vod_duration(&self) -> Option<f64> {
        self.last
            .filter(|s| s.kind == StreamKind::Vod)
            .and_then(|s| normalize_duration(s.duration))
    }

    fn follow_pointer(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        if let Some(range) = self.live_window() {
            let window = range.window();
            let offset = value.clamp(0.0, window);
            self.view.slider_value = offset;
            self.view.position_percent = offset / window * 100.0;
            self.view.time_label = format_time(range.start + offset);
        } else if let Some(duration) = self.vod_duration() {
            let percent = value.clamp(0.0, 100.0);
            self.view.slider_value = percent;
            self.view.position_percent = percent;
            self.view.time_label = format_time(percent / 100.0 * duration);
        }
    }

    fn seek_target(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }

        let target = if let Some(range) = self.live_window() {
            range.start + value.clamp(0.0, range.window())
        } else {
            value.clamp(0.0, 100.0) / 100.0 * self.vod_duration()?
        };

        target.is_finite().then_some(target)
    }
}
