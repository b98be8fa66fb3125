//! Controller configuration

use crate::{drm::RetryPolicy, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Live-sync latency targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveSync {
    /// Target distance from the live edge (seconds)
    pub target_latency: f64,
    /// Latency after which the engine catches up (seconds)
    pub max_latency: f64,
}

impl Default for LiveSync {
    fn default() -> Self {
        Self {
            target_latency: 5.0,
            max_latency: 20.0,
        }
    }
}

/// Streaming tuning profile pushed to the engine on every load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingProfile {
    pub live_sync: LiveSync,
    /// Seconds of media to buffer ahead
    pub buffering_goal: f64,
    /// Seconds required before playback resumes after a stall
    pub rebuffering_goal: f64,
    /// Seconds of media kept behind the playhead
    pub buffer_behind: f64,
}

impl Default for StreamingProfile {
    fn default() -> Self {
        Self {
            live_sync: LiveSync::default(),
            buffering_goal: 30.0,
            rebuffering_goal: 2.0,
            buffer_behind: 30.0,
        }
    }
}

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    /// Engine streaming profile
    pub streaming: StreamingProfile,
    /// Retry policy for license requests
    pub retry: RetryPolicy,
    /// Distance from the live edge still shown as "Live" (seconds)
    pub live_edge_threshold: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            streaming: StreamingProfile::default(),
            retry: RetryPolicy::default(),
            live_edge_threshold: 5.0,
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ControllerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let streaming = &self.streaming;
        let seconds = [
            ("liveSync.targetLatency", streaming.live_sync.target_latency),
            ("liveSync.maxLatency", streaming.live_sync.max_latency),
            ("bufferingGoal", streaming.buffering_goal),
            ("rebufferingGoal", streaming.rebuffering_goal),
            ("bufferBehind", streaming.buffer_behind),
            ("liveEdgeThreshold", self.live_edge_threshold),
        ];
        for (name, value) in seconds {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if streaming.live_sync.max_latency < streaming.live_sync.target_latency {
            return Err(Error::InvalidConfig(
                "liveSync.maxLatency must not be below liveSync.targetLatency".to_string(),
            ));
        }

        self.retry.validate()
    }
}
