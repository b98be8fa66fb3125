//! Audio and quality menus built from the engine's variant tracks
//!
//! Menus are always rebuilt from a fresh track snapshot and replace the
//! previous content wholesale, so any number of rebuilds from the same
//! engine state gives the same menus.

use crate::{engine::StreamingEngine, types::TrackDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Label of the placeholder shown when the engine reports no tracks
pub const NO_TRACKS_LABEL: &str = "No tracks available";

/// Label of the automatic quality entry
pub const AUTO_LABEL: &str = "Auto";

/// One audio menu entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioEntry {
    pub label: String,
    pub language: Option<String>,
    /// First track seen with this (language, label); `None` for the placeholder
    pub track: Option<TrackDescriptor>,
    pub checked: bool,
    pub enabled: bool,
}

/// Quality menu choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QualityChoice {
    /// Automatic bitrate selection
    Auto,
    /// Fixed vertical resolution
    Height(u32),
}

/// One quality menu entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityEntry {
    pub choice: QualityChoice,
    pub label: String,
    /// Last track seen at this height; `None` for Auto
    pub track: Option<TrackDescriptor>,
    pub checked: bool,
}

/// Both menus plus the labels shown on their buttons
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMenus {
    pub audio: Vec<AudioEntry>,
    pub quality: Vec<QualityEntry>,
    pub active_audio_label: String,
    pub active_quality_label: String,
}

impl Default for TrackMenus {
    fn default() -> Self {
        Self::build(&[], true)
    }
}

fn audio_label(track: &TrackDescriptor) -> String {
    let label = track.label.as_deref().filter(|l| !l.is_empty());
    let language = track.language.as_deref().filter(|l| !l.is_empty());
    label.or(language).unwrap_or("Default").to_string()
}

fn height_label(height: u32) -> String {
    format!("{}p", height)
}

impl TrackMenus {
    /// Build both menus from a track snapshot and the engine's ABR flag
    pub fn build(tracks: &[TrackDescriptor], abr_enabled: bool) -> Self {
        let active = tracks.iter().find(|t| t.active);

        Self {
            audio: Self::audio_entries(tracks, active),
            quality: Self::quality_entries(tracks, active, abr_enabled),
            active_audio_label: active.map(audio_label).unwrap_or_else(|| "None".to_string()),
            active_quality_label: Self::quality_button_label(active, abr_enabled),
        }
    }

    fn audio_entries(tracks: &[TrackDescriptor], active: Option<&TrackDescriptor>) -> Vec<AudioEntry> {
        let mut entries: Vec<AudioEntry> = Vec::new();

        for track in tracks {
            let seen = entries
                .iter()
                .filter_map(|e| e.track.as_ref())
                .any(|t| t.audio_key() == track.audio_key());
            if seen {
                continue;
            }

            entries.push(AudioEntry {
                label: audio_label(track),
                language: track.language.clone(),
                track: Some(track.clone()),
                checked: active.is_some_and(|a| a.audio_key() == track.audio_key()),
                enabled: true,
            });
        }

        if entries.is_empty() {
            entries.push(AudioEntry {
                label: NO_TRACKS_LABEL.to_string(),
                language: None,
                track: None,
                checked: false,
                enabled: false,
            });
        }

        entries
    }

    /// Auto first, then one entry per height, tallest first.
    ///
    /// A height entry is checked by height: with ABR off, the entry whose
    /// height equals the active track's height is checked, even when the
    /// active track differs from the entry's representative track.
    fn quality_entries(
        tracks: &[TrackDescriptor],
        active: Option<&TrackDescriptor>,
        abr_enabled: bool,
    ) -> Vec<QualityEntry> {
        let mut by_height: BTreeMap<u32, &TrackDescriptor> = BTreeMap::new();
        for track in tracks {
            if let Some(height) = track.height {
                by_height.insert(height, track);
            }
        }

        let active_height = active.and_then(|a| a.height);
        let mut entries = vec![QualityEntry {
            choice: QualityChoice::Auto,
            label: AUTO_LABEL.to_string(),
            track: None,
            checked: abr_enabled,
        }];

        entries.extend(by_height.into_iter().rev().map(|(height, track)| QualityEntry {
            choice: QualityChoice::Height(height),
            label: height_label(height),
            track: Some(track.clone()),
            checked: !abr_enabled && active_height == Some(height),
        }));

        entries
    }

    fn quality_button_label(active: Option<&TrackDescriptor>, abr_enabled: bool) -> String {
        let height = active.and_then(|a| a.height);
        match (abr_enabled, height) {
            (true, Some(h)) => format!("{} ({})", AUTO_LABEL, height_label(h)),
            (true, None) => AUTO_LABEL.to_string(),
            (false, Some(h)) => height_label(h),
            (false, None) => "Unknown".to_string(),
        }
    }
}

/// Keeps the last good menus and applies menu selections to the engine
#[derive(Debug, Clone, Default)]
pub struct TrackMenuBuilder {
    tracks: Vec<TrackDescriptor>,
    menus: TrackMenus,
}

impl TrackMenuBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn menus(&self) -> &TrackMenus {
        &self.menus
    }

    /// Track snapshot the current menus were built from
    pub fn tracks(&self) -> &[TrackDescriptor] {
        &self.tracks
    }

    pub fn active_track(&self) -> Option<&TrackDescriptor> {
        self.tracks.iter().find(|t| t.active)
    }

    /// Drop everything from the previous session
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Rebuild from fresh engine state.
    ///
    /// A failing track query keeps the last good menus.
    pub fn refresh(&mut self, engine: &dyn StreamingEngine) -> &TrackMenus {
        match engine.variant_tracks() {
            Ok(tracks) => {
                self.menus = TrackMenus::build(&tracks, engine.abr_enabled());
                self.tracks = tracks;
                debug!(
                    tracks = self.tracks.len(),
                    audio = self.menus.audio.len(),
                    quality = self.menus.quality.len(),
                    "Track menus rebuilt"
                );
            }
            Err(e) => warn!(error = %e, "Track refresh failed, keeping previous menus"),
        }
        &self.menus
    }

    /// Switch audio to the entry at `index`; returns false for a disabled entry
    pub fn select_audio(&mut self, engine: &dyn StreamingEngine, index: usize) -> bool {
        let Some(track) = self
            .menus
            .audio
            .get(index)
            .filter(|e| e.enabled)
            .and_then(|e| e.track.clone())
        else {
            return false;
        };

        info!(language = ?track.language, label = ?track.label, "Audio track selected");
        if let Some(language) = track.language.as_deref() {
            engine.select_audio_language(language);
        }
        engine.select_variant_track(&track, true);

        self.refresh(engine);
        true
    }

    /// Apply the quality entry at `index`
    pub fn select_quality(&mut self, engine: &dyn StreamingEngine, index: usize) -> bool {
        let Some(entry) = self.menus.quality.get(index).cloned() else {
            return false;
        };

        match entry.choice {
            QualityChoice::Auto => {
                info!("Automatic quality selected");
                engine.set_abr_enabled(true);
            }
            QualityChoice::Height(height) => {
                let Some(track) = self.track_for_height(height, entry.track.as_ref()) else {
                    return false;
                };
                info!(height, track_id = track.id, "Manual quality selected");
                engine.set_abr_enabled(false);
                engine.select_variant_track(&track, true);
            }
        }

        self.refresh(engine);
        true
    }

    // Prefer the variant at `height` that keeps the current audio
    fn track_for_height(
        &self,
        height: u32,
        fallback: Option<&TrackDescriptor>,
    ) -> Option<TrackDescriptor> {
        let active_audio = self.active_track().map(|a| a.audio_key());
        self.tracks
            .iter()
            .find(|t| t.height == Some(height) && Some(t.audio_key()) == active_audio)
            .or(fallback)
            .cloned()
    }
}
