//! Wrapper playlist for separate video and audio streams
//!
//! The engine can only load one manifest. When the user supplies a video
//! stream and an audio stream separately, both are assumed to be demuxed
//! single-rendition streams, so we describe them as one variant with an
//! attached audio group and hand the engine that playlist inline.

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use m3u8_rs::{AlternativeMedia, AlternativeMediaType, MasterPlaylist, VariantStream};
use tracing::debug;

/// Prefix of every inline playlist target
pub const INLINE_PLAYLIST_PREFIX: &str = "data:application/x-mpegurl;base64,";

/// Group id linking the variant to its audio rendition
pub const AUDIO_GROUP_ID: &str = "audio";

/// Bandwidth declared for the combined variant.
///
/// Set high so the engine's initial selection prefers it; real codec and
/// resolution parameters are probed from the streams themselves.
pub const COMBINED_BANDWIDTH: u64 = 100_000_000;

/// Build the multivariant playlist referencing both streams
pub fn synthesize_playlist(primary_url: &str, audio_url: &str) -> MasterPlaylist {
    let audio = AlternativeMedia {
        media_type: AlternativeMediaType::Audio,
        uri: Some(audio_url.to_string()),
        group_id: AUDIO_GROUP_ID.to_string(),
        name: "Audio".to_string(),
        default: true,
        autoselect: true,
        ..Default::default()
    };

    let variant = VariantStream {
        uri: primary_url.to_string(),
        bandwidth: COMBINED_BANDWIDTH,
        audio: Some(AUDIO_GROUP_ID.to_string()),
        ..Default::default()
    };

    MasterPlaylist {
        alternatives: vec![audio],
        variants: vec![variant],
        ..Default::default()
    }
}

/// Effective load target for a primary URL and optional separate audio URL
pub fn compose(primary_url: &str, audio_url: Option<&str>) -> Result<String> {
    let Some(audio_url) = audio_url else {
        return Ok(primary_url.to_string());
    };

    for url in [primary_url, audio_url] {
        check_playlist_safe(url)?;
    }

    let mut text = Vec::new();
    synthesize_playlist(primary_url, audio_url).write_to(&mut text)?;

    debug!(bytes = text.len(), "Synthesized inline playlist");

    Ok(format!("{}{}", INLINE_PLAYLIST_PREFIX, STANDARD.encode(&text)))
}

/// Playlist text of an inline target, `None` for ordinary URLs
pub fn decode_inline(target: &str) -> Option<String> {
    let encoded = target.strip_prefix(INLINE_PLAYLIST_PREFIX)?;
    let bytes = STANDARD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

// A quote or line break would escape the quoted attribute or the URI line
fn check_playlist_safe(url: &str) -> Result<()> {
    if url.is_empty() || url.contains(['"', '\n', '\r']) {
        return Err(Error::InvalidUrl(url.to_string()));
    }
    Ok(())
}
