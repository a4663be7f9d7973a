//! Podcast script model.
//!
//! A script is an ordered collection of sections, each holding an ordered
//! list of speaker segments. Sections are keyed by identifier and played
//! back in sorted key order, which a `BTreeMap` gives us directly; segment
//! order within a section is list order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::StudioError;

/// A single speaker utterance, the atomic unit of the script.
///
/// Segments are immutable once drafted; the audio pipeline only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Identifier, unique within its section.
    pub id: String,
    /// Speaker identifier; must exist in the studio configuration.
    pub speaker: String,
    /// The text to speak.
    pub content: String,
    /// Trailing silence in seconds, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blank_duration: Option<f64>,
}

/// An ordered group of segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub segments: Vec<Segment>,
}

/// A full podcast script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub sections: BTreeMap<String, Section>,
}

impl Script {
    /// Load a script from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StudioError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parse a script from JSON content.
    pub fn from_str(content: &str) -> Result<Self, StudioError> {
        serde_json::from_str(content)
            .map_err(|e| StudioError::Script(format!("Failed to parse script: {}", e)))
    }

    /// Persist the script as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StudioError> {
        let json = serde_json::to_string(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Flatten the script into playback order: sections in sorted key
    /// order, then segments in list order within each section.
    pub fn ordered_segments(&self) -> Vec<(&str, &Segment)> {
        self.sections
            .iter()
            .flat_map(|(section_id, section)| {
                section
                    .segments
                    .iter()
                    .map(move |segment| (section_id.as_str(), segment))
            })
            .collect()
    }

    /// Total number of segments across all sections.
    pub fn segment_count(&self) -> usize {
        self.sections.values().map(|s| s.segments.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_count() == 0
    }
}

/// Strip the punctuation marks the synthesis voices mispronounce.
///
/// Runs before fingerprinting and before synthesis, so removing one of
/// these characters from a drafted segment does not invalidate its cached
/// audio.
pub fn clean_speech_text(content: &str) -> String {
    content.replace('¡', "").replace('¿', "")
}
