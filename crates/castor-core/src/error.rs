//! Error types for Castor Core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Engine error category reserved for DRM failures
pub const DRM_CATEGORY: u32 = 6;

/// Structured error reported by the streaming engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    /// Numeric engine error code
    pub code: u32,
    /// Engine error category
    pub category: u32,
    /// Engine-provided message
    pub message: String,
}

impl EngineError {
    pub fn new(code: u32, category: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            category,
            message: message.into(),
        }
    }

    /// Error raised when an optional engine capability is not available yet
    pub fn not_ready(what: &str) -> Self {
        Self::new(0, 0, format!("{what} not available"))
    }

    /// Returns true if this is a DRM-class failure
    pub fn is_drm(&self) -> bool {
        self.category == DRM_CATEGORY
    }

    /// Human-readable message shown to the user
    pub fn describe(&self) -> String {
        if !self.is_drm() {
            return format!("Error {}: {}", self.code, self.message);
        }

        match self.code {
            6001 => "DRM Error: Requested key system not supported".to_string(),
            6007 => "DRM Error: License request failed".to_string(),
            6008 => "DRM Error: License response rejected".to_string(),
            6012 => "DRM Error: No license server configured".to_string(),
            6015 => "DRM Error: Invalid server certificate".to_string(),
            code => format!("DRM Error {}: {}", code, self.message),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

impl std::error::Error for EngineError {}

/// Controller error types
#[derive(Error, Debug)]
pub enum Error {
    // Input validation errors
    #[error("Please enter a manifest URL")]
    MissingManifest,

    #[error("Please enter both Key ID and Key, or leave both empty for unencrypted streams")]
    MismatchedKeyPair,

    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),

    // Engine errors
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Load superseded by a newer request")]
    Superseded,

    // Playback surface errors
    #[error("Autoplay prevented: {0}")]
    AutoplayBlocked(String),

    #[error("Playback surface error: {0}")]
    Surface(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error came from input validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingManifest | Error::MismatchedKeyPair | Error::InvalidUrl(_)
        )
    }

    /// Returns true if the user can simply retry the action
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Engine(e) => !e.is_drm(),
            Error::Superseded | Error::AutoplayBlocked(_) | Error::Surface(_) => true,
            _ => false,
        }
    }

    /// Returns the error code for logs and CLI output
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::MissingManifest => "MISSING_MANIFEST",
            Error::MismatchedKeyPair => "MISMATCHED_KEY_PAIR",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Engine(e) if e.is_drm() => "ENGINE_DRM",
            Error::Engine(_) => "ENGINE",
            Error::Superseded => "SUPERSEDED",
            Error::AutoplayBlocked(_) => "AUTOPLAY_BLOCKED",
            Error::Surface(_) => "SURFACE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO",
            Error::Json(_) => "JSON",
        }
    }
}
