//! Speech synthesis backends.
//!
//! Each TTS provider sits behind the [`SpeechBackend`] trait, and the
//! [`SpeechSynthesizer`] picks a backend per invocation from the speaker's
//! configured provider tag, so one script can freely mix providers.

use async_trait::async_trait;
use std::env;
use std::time::Duration;

use crate::config::{Provider, Speaker, SpeakerSettings};
use crate::error::StudioError;

const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io/v1";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// A single-utterance synthesis call against one provider.
///
/// Implementations perform exactly one request per call; retry policy, if
/// any, belongs to the caller.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Synthesize `text` with the given speaker settings, returning the
    /// provider's raw audio bytes (MP3).
    async fn synthesize(
        &self,
        text: &str,
        settings: &SpeakerSettings,
    ) -> Result<Vec<u8>, StudioError>;
}

fn http_client() -> Result<reqwest::Client, StudioError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| StudioError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// ElevenLabs text-to-speech.
pub struct ElevenLabsBackend {
    client: reqwest::Client,
    api_key: String,
}

impl ElevenLabsBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, StudioError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SpeechBackend for ElevenLabsBackend {
    async fn synthesize(
        &self,
        text: &str,
        settings: &SpeakerSettings,
    ) -> Result<Vec<u8>, StudioError> {
        let url = format!("{}/text-to-speech/{}", ELEVENLABS_API_BASE, settings.voice_id);

        let mut body = serde_json::json!({
            "text": text,
            "model_id": settings.voice_model,
        });
        if let Some(vs) = &settings.voice_settings {
            body["voice_settings"] = serde_json::json!({
                "stability": vs.stability,
                "similarity_boost": vs.similarity_boost,
                "style": vs.style,
                "use_speaker_boost": vs.speaker_boost,
            });
        }

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| StudioError::Synthesis {
                voice: settings.voice_id.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(StudioError::Synthesis {
                voice: settings.voice_id.clone(),
                message: format!("{}: {}", status, detail),
            });
        }

        let bytes = response.bytes().await.map_err(|e| StudioError::Synthesis {
            voice: settings.voice_id.clone(),
            message: e.to_string(),
        })?;

        Ok(bytes.to_vec())
    }
}

/// OpenAI text-to-speech.
///
/// Pays a fixed one-second delay after each successful call to stay well
/// inside the endpoint's rate limits. This is this backend's policy only.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, StudioError> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl SpeechBackend for OpenAiBackend {
    async fn synthesize(
        &self,
        text: &str,
        settings: &SpeakerSettings,
    ) -> Result<Vec<u8>, StudioError> {
        let url = format!("{}/audio/speech", OPENAI_API_BASE);

        let body = serde_json::json!({
            "model": settings.voice_model,
            "voice": settings.voice_id,
            "input": text,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StudioError::Synthesis {
                voice: settings.voice_id.clone(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(StudioError::Synthesis {
                voice: settings.voice_id.clone(),
                message: format!("{}: {}", status, detail),
            });
        }

        let bytes = response.bytes().await.map_err(|e| StudioError::Synthesis {
            voice: settings.voice_id.clone(),
            message: e.to_string(),
        })?;

        tokio::time::sleep(Duration::from_secs(1)).await;

        Ok(bytes.to_vec())
    }
}

/// Dispatches synthesis calls to the backend matching each speaker's
/// provider tag.
pub struct SpeechSynthesizer {
    elevenlabs: Box<dyn SpeechBackend>,
    openai: Box<dyn SpeechBackend>,
}

impl SpeechSynthesizer {
    pub fn new(elevenlabs: Box<dyn SpeechBackend>, openai: Box<dyn SpeechBackend>) -> Self {
        Self { elevenlabs, openai }
    }

    /// Build both provider backends with API keys from the environment
    /// (`ELEVENLABS_API_KEY`, `OPENAI_API_KEY`). Missing keys surface as
    /// authorization failures on first use, not here.
    pub fn from_env() -> Result<Self, StudioError> {
        let elevenlabs = ElevenLabsBackend::new(env::var("ELEVENLABS_API_KEY").unwrap_or_default())?;
        let openai = OpenAiBackend::new(env::var("OPENAI_API_KEY").unwrap_or_default())?;
        Ok(Self::new(Box::new(elevenlabs), Box::new(openai)))
    }

    pub async fn synthesize(&self, text: &str, speaker: &Speaker) -> Result<Vec<u8>, StudioError> {
        let backend = match speaker.settings.provider {
            Provider::Elevenlabs => &self.elevenlabs,
            Provider::Openai => &self.openai,
        };
        backend.synthesize(text, &speaker.settings).await
    }
}
