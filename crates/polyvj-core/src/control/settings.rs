//! Settings persistence.
//!
//! Control-surface filters and the CC mapping table live in `~/.polyvj.toml`.
//! Loading is tolerant: a missing or unparseable file yields the defaults
//! (all inputs, all channels, identity mapping) without raising an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::CcMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControlSettings {
    /// "all" or a MIDI input port name
    pub selected_input: String,
    /// "all" or "1".."16"
    pub selected_channel: String,
    /// Last audio capture device, restored by the host on startup
    pub last_audio_device: Option<String>,
    /// Controller number (string key) to parameter name
    pub cc_mapping: BTreeMap<String, String>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            selected_input: "all".to_string(),
            selected_channel: "all".to_string(),
            last_audio_device: None,
            cc_mapping: CcMap::identity().to_table(),
        }
    }
}

impl ControlSettings {
    fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".polyvj.toml"))
    }

    pub fn load() -> Self {
        let path = match Self::path() {
            Some(p) => p,
            None => return Self::default(),
        };
        fs::read_to_string(&path)
            .map(|text| Self::parse(&text))
            .unwrap_or_default()
    }

    /// Parse persisted settings, substituting defaults on any failure.
    pub fn parse(text: &str) -> Self {
        toml::from_str(text).unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Ok(content) = toml::to_string(self) {
                let _ = fs::write(&path, &content);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Param;

    #[test]
    fn test_settings_round_trip() {
        let mut mapping = CcMap::identity();
        mapping.bind(74, Param::NoiseScale);

        let settings = ControlSettings {
            selected_input: "nanoKONTROL2".to_string(),
            selected_channel: "7".to_string(),
            last_audio_device: Some("pipewire".to_string()),
            cc_mapping: mapping.to_table(),
        };

        let text = toml::to_string(&settings).unwrap();
        let restored = ControlSettings::parse(&text);
        assert_eq!(restored, settings);
        assert_eq!(
            CcMap::from_table(&restored.cc_mapping).lookup(74),
            Some(Param::NoiseScale)
        );
    }

    #[test]
    fn test_corrupt_text_yields_defaults() {
        for text in ["{{{not toml", "selected_input = 42", "cc_mapping = \"x\""] {
            let settings = ControlSettings::parse(text);
            assert_eq!(settings, ControlSettings::default());
        }
    }

    #[test]
    fn test_partial_file_fills_missing_fields() {
        let settings = ControlSettings::parse("selected_channel = \"3\"\n");
        assert_eq!(settings.selected_channel, "3");
        assert_eq!(settings.selected_input, "all");
        assert_eq!(
            CcMap::from_table(&settings.cc_mapping),
            CcMap::identity()
        );
    }

    #[test]
    fn test_default_settings_describe_identity_mapping() {
        let settings = ControlSettings::default();
        assert_eq!(settings.selected_input, "all");
        assert_eq!(settings.selected_channel, "all");
        let map = CcMap::from_table(&settings.cc_mapping);
        assert_eq!(map, CcMap::identity());
    }
}
