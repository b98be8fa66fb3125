//! Player information panel and status notices

use crate::types::{EngineStats, TrackDescriptor};
use serde::Serialize;

/// Playback status shown in the information panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Buffering,
    Error,
    Stopped,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "Idle"),
            PlaybackStatus::Loading => write!(f, "Loading..."),
            PlaybackStatus::Playing => write!(f, "Playing"),
            PlaybackStatus::Paused => write!(f, "Paused"),
            PlaybackStatus::Ended => write!(f, "Ended"),
            PlaybackStatus::Buffering => write!(f, "Buffering..."),
            PlaybackStatus::Error => write!(f, "Error"),
            PlaybackStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Status, resolution, bandwidth and DRM of the current session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerInfo {
    pub status: PlaybackStatus,
    pub resolution: String,
    pub bandwidth: String,
    pub drm: String,
}

impl Default for PlayerInfo {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Idle,
            resolution: "-".to_string(),
            bandwidth: "-".to_string(),
            drm: "-".to_string(),
        }
    }
}

impl PlayerInfo {
    /// Change status and blank the stream details
    pub fn set_status(&mut self, status: PlaybackStatus) {
        self.status = status;
        self.resolution = "-".to_string();
        self.bandwidth = "-".to_string();
    }

    /// Fill resolution and bandwidth from the active track and engine stats
    pub fn update_stream(&mut self, active: &TrackDescriptor, stats: &EngineStats) {
        self.resolution = active.resolution().unwrap_or_else(|| "Unknown".to_string());
        self.bandwidth = stats
            .estimated_bandwidth
            .filter(|bps| bps.is_finite() && *bps > 0.0)
            .map(|bps| format!("{:.2} Mbps", bps / 1_000_000.0))
            .unwrap_or_else(|| "Unknown".to_string());
    }
}

/// Severity of a status notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-facing status message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(PlaybackStatus::Loading.to_string(), "Loading...");
        assert_eq!(PlaybackStatus::Buffering.to_string(), "Buffering...");
        assert_eq!(PlaybackStatus::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn test_stream_details() {
        let mut info = PlayerInfo::default();
        let track = TrackDescriptor::new(1).with_resolution(1920, 1080);
        let stats = EngineStats {
            estimated_bandwidth: Some(5_250_000.0),
        };

        info.update_stream(&track, &stats);
        assert_eq!(info.resolution, "1920x1080");
        assert_eq!(info.bandwidth, "5.25 Mbps");

        info.update_stream(&TrackDescriptor::new(2), &EngineStats::default());
        assert_eq!(info.resolution, "Unknown");
        assert_eq!(info.bandwidth, "Unknown");

        info.set_status(PlaybackStatus::Paused);
        assert_eq!(info.resolution, "-");
    }
}
