//! Podforge Core Library
//!
//! Turns text content into a multi-speaker podcast episode: a chat model
//! drafts the dialogue script, per-speaker TTS providers synthesize each
//! segment through a content-addressed cache, and the ordered clips are
//! composed into one normalized track.

pub mod assembler;
pub mod audio;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod script;
pub mod studio;
pub mod tts;
pub mod writer;

#[cfg(test)]
pub(crate) mod testutil;

pub use assembler::{assemble, validate_roster};
pub use audio::{AudioClip, PIPELINE_SAMPLE_RATE, compose};
pub use cache::SegmentCache;
pub use config::{Provider, Show, Speaker, SpeakerSettings, StudioConfig, VoiceSettings};
pub use error::StudioError;
pub use export::{ExportFormat, export};
pub use extract::extract;
pub use script::{Script, Section, Segment, clean_speech_text};
pub use studio::{EpisodeOutcome, Studio, StudioCallback, StudioEvent};
pub use tts::{ElevenLabsBackend, OpenAiBackend, SpeechBackend, SpeechSynthesizer};
pub use writer::ScriptWriter;
