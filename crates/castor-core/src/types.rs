//! Core types for Castor

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user submitted to start a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// Primary manifest (or demuxed video stream) URL
    pub manifest_url: String,
    /// Separate audio stream URL
    #[serde(default)]
    pub audio_url: Option<String>,
    /// ClearKey key id (hex)
    #[serde(default)]
    pub key_id: Option<String>,
    /// ClearKey key (hex)
    #[serde(default)]
    pub key_value: Option<String>,
    /// Start playback once loaded
    #[serde(default)]
    pub autoplay: bool,
}

impl SessionRequest {
    pub fn new(manifest_url: impl Into<String>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            ..Default::default()
        }
    }

    pub fn with_audio(mut self, audio_url: impl Into<String>) -> Self {
        self.audio_url = Some(audio_url.into());
        self
    }

    pub fn with_keys(mut self, key_id: impl Into<String>, key_value: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self.key_value = Some(key_value.into());
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Trim the form fields and enforce the input rules.
    ///
    /// Blank fields count as absent. The key id and key must be given
    /// together or not at all.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let manifest_url = self.manifest_url.trim();
        if manifest_url.is_empty() {
            return Err(Error::MissingManifest);
        }

        let key_pair = match (non_blank(&self.key_id), non_blank(&self.key_value)) {
            (Some(key_id), Some(key)) => Some(ClearKeyPair {
                key_id: key_id.to_string(),
                key: key.to_string(),
            }),
            (None, None) => None,
            _ => return Err(Error::MismatchedKeyPair),
        };

        Ok(ValidatedRequest {
            manifest_url: manifest_url.to_string(),
            audio_url: non_blank(&self.audio_url).map(str::to_string),
            key_pair,
            autoplay: self.autoplay,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// ClearKey key id and key, always present together
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearKeyPair {
    pub key_id: String,
    pub key: String,
}

impl ClearKeyPair {
    pub fn new(key_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Debug for ClearKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearKeyPair")
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub manifest_url: String,
    pub audio_url: Option<String>,
    pub key_pair: Option<ClearKeyPair>,
    pub autoplay: bool,
}

/// Whether the session is a sliding live window or a fixed-length asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamKind {
    Live,
    Vod,
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Live => write!(f, "live"),
            StreamKind::Vod => write!(f, "vod"),
        }
    }
}

/// Currently seekable window in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekRange {
    pub start: f64,
    pub end: f64,
}

impl SeekRange {
    /// Build a range, rejecting non-finite bounds and `end < start`
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && end >= start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Width of the window in seconds
    pub fn window(&self) -> f64 {
        self.end - self.start
    }
}

/// Track type as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Variant,
}

/// Read-only snapshot of one engine variant track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Engine-assigned track id
    pub id: u64,
    pub language: Option<String>,
    pub label: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Declared bandwidth in bits per second
    pub bandwidth: u64,
    pub active: bool,
    pub kind: TrackKind,
}

impl TrackDescriptor {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            language: None,
            label: None,
            width: None,
            height: None,
            bandwidth: 0,
            active: false,
            kind: TrackKind::Variant,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_bandwidth(mut self, bandwidth: u64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The (language, label) pair that identifies an audio choice
    pub fn audio_key(&self) -> (Option<&str>, Option<&str>) {
        (self.language.as_deref(), self.label.as_deref())
    }

    /// `WxH` when both dimensions are known
    pub fn resolution(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// Engine statistics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Estimated bandwidth in bits per second
    pub estimated_bandwidth: Option<f64>,
}

/// Orchestrator lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session loaded
    Idle,
    /// Engine load in flight
    Loading,
    /// Session loaded and current
    Active,
    /// Releasing engine resources
    Unloading,
    /// Load failed; settles back to Idle
    Error,
}

impl SessionPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (Idle, Loading) |
            (Loading, Active) | (Loading, Error) | (Loading, Unloading) |
            (Active, Unloading) |
            (Unloading, Idle) | (Unloading, Loading) |
            (Error, Idle)
        )
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "idle"),
            SessionPhase::Loading => write!(f, "loading"),
            SessionPhase::Active => write!(f, "active"),
            SessionPhase::Unloading => write!(f, "unloading"),
            SessionPhase::Error => write!(f, "error"),
        }
    }
}
