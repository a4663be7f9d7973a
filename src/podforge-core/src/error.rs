//! Error types for the podcast studio.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown speaker '{0}' referenced by the script")]
    UnknownSpeaker(String),

    #[error("Invalid script: {0}")]
    Script(String),

    #[error("Script drafting failed: {0}")]
    ScriptDraft(String),

    #[error("OpenAI API error: {0}")]
    OpenAIError(#[from] async_openai::error::OpenAIError),

    #[error("Synthesis failed for voice '{voice}': {message}")]
    Synthesis { voice: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Content extraction failed: {0}")]
    Extraction(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
