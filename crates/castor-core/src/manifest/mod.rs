//! Manifest handling
//!
//! The engine parses manifests itself. Here we only classify load targets
//! and, when video and audio arrive as two separate single-rendition
//! streams, wrap them in a multivariant playlist the engine can load as a
//! single item.

mod compose;

pub use compose::{
    compose, decode_inline, synthesize_playlist, AUDIO_GROUP_ID, COMBINED_BANDWIDTH,
    INLINE_PLAYLIST_PREFIX,
};

use serde::{Deserialize, Serialize};
use url::Url;

/// Manifest types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManifestKind {
    Hls,
    Dash,
    /// Playlist carried inline in a `data:` URI
    Inline,
}

impl std::fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestKind::Hls => write!(f, "HLS"),
            ManifestKind::Dash => write!(f, "DASH"),
            ManifestKind::Inline => write!(f, "inline HLS"),
        }
    }
}

/// Detect manifest type from a load target
pub fn detect_manifest_kind(target: &str) -> ManifestKind {
    if target.starts_with("data:") {
        return ManifestKind::Inline;
    }

    // Check URL extension first, then fall back to the raw string
    let path = match Url::parse(target) {
        Ok(url) => url.path().to_lowercase(),
        Err(_) => target
            .split(['?', '#'])
            .next()
            .unwrap_or(target)
            .to_lowercase(),
    };

    if path.ends_with(".mpd") {
        return ManifestKind::Dash;
    }

    // Default to HLS
    ManifestKind::Hls
}
