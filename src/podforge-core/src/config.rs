//! Studio configuration loaded from a JSON file.
//!
//! The configuration describes the show and the speaker roster. It is
//! loaded once per episode and stays immutable for the whole run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::StudioError;

/// TTS provider backing a speaker's voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Elevenlabs,
    Openai,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Elevenlabs => write!(f, "elevenlabs"),
            Provider::Openai => write!(f, "openai"),
        }
    }
}

/// Fine-grained voice tuning knobs. All ratios are bounded in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceSettings {
    pub stability: f64,
    pub similarity_boost: f64,
    #[serde(default)]
    pub style: f64,
    #[serde(default)]
    pub speaker_boost: bool,
}

/// Synthesis settings for a single speaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeakerSettings {
    pub voice_id: String,
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default = "default_voice_model")]
    pub voice_model: String,
    #[serde(default)]
    pub voice_settings: Option<VoiceSettings>,
}

fn default_provider() -> Provider {
    Provider::Elevenlabs
}

fn default_voice_model() -> String {
    "eleven_multilingual_v2".to_string()
}

/// A speaker on the show: display name, a short bio used when drafting
/// the script, and the synthesis settings for their voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Speaker {
    pub name: String,
    pub about: String,
    pub settings: SpeakerSettings,
}

/// Show metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Show {
    pub name: String,
    pub about: String,
    pub language: String,
}

/// Root studio configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudioConfig {
    pub show: Show,
    pub speakers: HashMap<String, Speaker>,
}

impl StudioConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StudioError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| StudioError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_str(&content)
    }

    /// Parse and validate a configuration from JSON content.
    pub fn from_str(content: &str) -> Result<Self, StudioError> {
        let config: StudioConfig = serde_json::from_str(content)
            .map_err(|e| StudioError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express: a non-empty roster and
    /// voice knobs within their bounds.
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.speakers.is_empty() {
            return Err(StudioError::Config(
                "At least one speaker must be configured".to_string(),
            ));
        }

        for (speaker_id, speaker) in &self.speakers {
            if speaker.settings.voice_id.is_empty() {
                return Err(StudioError::Config(format!(
                    "Speaker '{}' has an empty voice_id",
                    speaker_id
                )));
            }

            if let Some(vs) = &speaker.settings.voice_settings {
                for (knob, value) in [
                    ("stability", vs.stability),
                    ("similarity_boost", vs.similarity_boost),
                    ("style", vs.style),
                ] {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(StudioError::Config(format!(
                            "Speaker '{}': {} must be within [0, 1], got {}",
                            speaker_id, knob, value
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Human-readable show summary, used when drafting the script.
    pub fn show_info(&self) -> String {
        format!(
            "Show:\n\n\tName: {}\n\tAbout: {}\n\tLanguage: {}",
            self.show.name, self.show.about, self.show.language
        )
    }

    /// Human-readable roster summary, used when drafting the script.
    pub fn speakers_info(&self) -> String {
        let mut speaker_ids: Vec<&String> = self.speakers.keys().collect();
        speaker_ids.sort();

        speaker_ids
            .iter()
            .map(|id| {
                let speaker = &self.speakers[*id];
                format!("{}:\n\n\tName: {}\n\tAbout: {}", id, speaker.name, speaker.about)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config_json() -> &'static str {
        r#"{
            "show": {
                "name": "Tech Waves",
                "about": "A show about technology trends",
                "language": "en"
            },
            "speakers": {
                "speaker1": {
                    "name": "Alex",
                    "about": "The curious host",
                    "settings": {
                        "voice_id": "abc123",
                        "provider": "elevenlabs",
                        "voice_model": "eleven_multilingual_v2",
                        "voice_settings": {
                            "stability": 0.5,
                            "similarity_boost": 0.75
                        }
                    }
                },
                "speaker2": {
                    "name": "Sam",
                    "about": "The skeptical expert",
                    "settings": {
                        "voice_id": "nova",
                        "provider": "openai",
                        "voice_model": "tts-1"
                    }
                }
            }
        }"#
    }

    #[test]
    fn test_parse_valid_config() {
        let config = StudioConfig::from_str(sample_config_json()).unwrap();
        assert_eq!(config.show.name, "Tech Waves");
        assert_eq!(config.speakers.len(), 2);
        assert_eq!(
            config.speakers["speaker1"].settings.provider,
            Provider::Elevenlabs
        );
        assert_eq!(config.speakers["speaker2"].settings.provider, Provider::Openai);
    }

    #[test]
    fn test_unknown_provider_tag_rejected() {
        let json = sample_config_json().replace("\"openai\"", "\"acmetts\"");
        let err = StudioConfig::from_str(&json).unwrap_err();
        assert!(matches!(err, StudioError::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = sample_config_json().replace(
            "\"language\": \"en\"",
            "\"language\": \"en\", \"theme_song\": \"jingle.mp3\"",
        );
        assert!(StudioConfig::from_str(&json).is_err());
    }

    #[test]
    fn test_out_of_range_voice_setting_rejected() {
        let json = sample_config_json().replace("\"stability\": 0.5", "\"stability\": 1.5");
        let err = StudioConfig::from_str(&json).unwrap_err();
        assert!(err.to_string().contains("stability"));
    }

    #[test]
    fn test_empty_roster_rejected() {
        let json = r#"{
            "show": {"name": "x", "about": "y", "language": "en"},
            "speakers": {}
        }"#;
        assert!(StudioConfig::from_str(json).is_err());
    }

    #[test]
    fn test_speakers_info_sorted_by_id() {
        let config = StudioConfig::from_str(sample_config_json()).unwrap();
        let info = config.speakers_info();
        let first = info.find("speaker1").unwrap();
        let second = info.find("speaker2").unwrap();
        assert!(first < second);
    }
}
