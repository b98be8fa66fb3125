//! Ready-made session requests

use crate::types::SessionRequest;
use serde::Serialize;

/// Built-in form presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Preset {
    /// Encrypted linear DASH stream with its ClearKey pair
    Example,
    /// Public ClearKey DASH test asset
    Shaka,
    /// Empty form
    Clear,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Example, Preset::Shaka, Preset::Clear];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Example => "example",
            Preset::Shaka => "shaka",
            Preset::Clear => "clear",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn description(&self) -> &'static str {
        match self {
            Preset::Example => "Encrypted linear DASH stream (ClearKey)",
            Preset::Shaka => "Angel One ClearKey DASH test asset",
            Preset::Clear => "Empty form",
        }
    }

    pub fn request(&self) -> SessionRequest {
        match self {
            Preset::Example => SessionRequest::new(
                "https://a201aivottlinear-a.akamaihd.net/OTTB/lhr-nitro/clients/dash/enc/kav10mdj91/out/v1/bd3b0c314fff4bb1ab4693358f3cd2d3/cenc.mpd",
            )
            .with_keys("5deb190b1dac28e46c0bdada7668b7de", "ddd2b372702e42b0d2708a70b91dec8d"),
            Preset::Shaka => SessionRequest::new(
                "https://storage.googleapis.com/shaka-demo-assets/angel-one-clearkey/dash.mpd",
            )
            .with_keys("eb676abbcb345e96bbcf616630f1a3da", "100b6c20940f779a4589152b57d2dacb"),
            Preset::Clear => SessionRequest::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_lookup() {
        assert_eq!(Preset::from_name("SHAKA"), Some(Preset::Shaka));
        assert_eq!(Preset::from_name("nope"), None);
    }

    #[test]
    fn test_keyed_presets_validate() {
        for preset in [Preset::Example, Preset::Shaka] {
            let valid = preset.request().validate().unwrap();
            assert!(valid.key_pair.is_some());
        }
    }

    #[test]
    fn test_clear_preset_is_empty() {
        assert!(matches!(Preset::Clear.request().validate(), Err(Error::MissingManifest)));
    }
}
