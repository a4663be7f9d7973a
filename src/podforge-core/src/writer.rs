//! Script drafting through an OpenAI-compatible chat API.
//!
//! One completion turns the extracted source material into a full episode
//! script. The reply is sanitized (models love to wrap JSON in code
//! fences), parsed, and validated against the speaker roster before it is
//! accepted.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
};
use std::env;
use std::time::Duration;

use crate::config::StudioConfig;
use crate::error::StudioError;
use crate::script::Script;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_SCRIPT_TOKENS: u32 = 8192;

const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are the script writer for a podcast.

{show_info}

Speakers available for this episode:

{speakers_info}

Turn the source material the user provides into a complete episode script
written in {language}, as a natural conversation between the speakers above.
Cover the key points of the material, keep each utterance short enough to
speak in one breath, and give the episode a clear opening and closing.

Reply with a single JSON object and nothing else, in this exact shape:

{"sections": {"<section id>": {"segments": [{"id": "<segment id>", "speaker": "<speaker id>", "content": "<words to speak>", "blank_duration": 1.0}]}}}

Rules:
- Section ids must sort lexically in playback order: prefix them "01_", "02_", and so on.
- Segment ids must be unique within their section.
- "speaker" must be one of: {speaker_ids}.
- "content" is exactly the words to speak. No stage directions, no markdown, no speaker labels.
- "blank_duration" is optional trailing silence in seconds; use it sparingly for pauses between beats.
"#;

/// Drafts podcast scripts against an OpenAI-compatible API.
pub struct ScriptWriter {
    api_base: String,
    api_key: String,
    model: String,
}

impl ScriptWriter {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Build a writer from `OPENAI_API_BASE`/`OPENAI_BASE_URL` and
    /// `OPENAI_API_KEY`, with an optional model override.
    pub fn from_env(model: Option<String>) -> Self {
        let api_base = env::var("OPENAI_API_BASE")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let api_key = env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(api_base, api_key, model.unwrap_or_else(|| DEFAULT_MODEL.to_string()))
    }

    /// Draft a script for the given source material.
    pub async fn draft(&self, content: &str, config: &StudioConfig) -> Result<Script, StudioError> {
        let system_prompt = build_system_prompt(config);
        let user_message = format!("Source material for this episode:\n\n{}", content);

        let reply = self.get_completion(&system_prompt, &user_message).await?;

        let json = extract_json_object(&reply).ok_or_else(|| {
            StudioError::ScriptDraft("model reply contains no JSON object".to_string())
        })?;
        let script = Script::from_str(&json)
            .map_err(|e| StudioError::ScriptDraft(format!("draft rejected: {}", e)))?;

        validate_draft(&script, config)?;
        Ok(script)
    }

    /// Request one completion, retrying transient API errors with
    /// exponential backoff.
    async fn get_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, StudioError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StudioError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let config = OpenAIConfig::new()
            .with_api_key(&self.api_key)
            .with_api_base(&self.api_base);

        let client = Client::with_config(config).with_http_client(http_client);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_completion_tokens(MAX_SCRIPT_TOKENS)
            .messages(vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: system_prompt.to_string().into(),
                    name: None,
                }),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: user_message.to_string().into(),
                    name: None,
                }),
            ])
            .build()?;

        let max_retries = 3;
        let mut last_error = None;

        for attempt in 0..max_retries {
            if attempt > 0 {
                // Exponential backoff: 2s, 4s
                let delay = Duration::from_secs(1 << attempt);
                tracing::warn!("Retrying script draft (attempt {}/{})", attempt + 1, max_retries);
                tokio::time::sleep(delay).await;
            }

            match client.chat().create(request.clone()).await {
                Ok(response) => {
                    let content = response
                        .choices
                        .first()
                        .and_then(|c| c.message.content.clone())
                        .unwrap_or_default();
                    if content.trim().is_empty() {
                        last_error = None;
                        continue;
                    }
                    return Ok(content);
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(StudioError::from(e)),
            None => Err(StudioError::ScriptDraft(format!(
                "model returned an empty reply after {} attempts",
                max_retries
            ))),
        }
    }
}

/// Fill the prompt template with show metadata and the roster.
fn build_system_prompt(config: &StudioConfig) -> String {
    let mut speaker_ids: Vec<&str> = config.speakers.keys().map(String::as_str).collect();
    speaker_ids.sort_unstable();

    SYSTEM_PROMPT_TEMPLATE
        .replace("{show_info}", &config.show_info())
        .replace("{speakers_info}", &config.speakers_info())
        .replace("{language}", &config.show.language)
        .replace("{speaker_ids}", &speaker_ids.join(", "))
}

/// Pull the JSON object out of a model reply, tolerating code fences and
/// surrounding prose.
fn extract_json_object(reply: &str) -> Option<String> {
    let fenced = regex::Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").ok()?;
    if let Some(captures) = fenced.captures(reply) {
        return Some(captures[1].to_string());
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if start < end {
        Some(reply[start..=end].to_string())
    } else {
        None
    }
}

/// Reject drafts that are empty, reference unknown speakers, have blank
/// content, or reuse a segment id within a section.
fn validate_draft(script: &Script, config: &StudioConfig) -> Result<(), StudioError> {
    if script.is_empty() {
        return Err(StudioError::ScriptDraft(
            "draft contains no segments".to_string(),
        ));
    }

    for (section_id, section) in &script.sections {
        let mut seen_ids = std::collections::HashSet::new();
        for segment in &section.segments {
            if !config.speakers.contains_key(&segment.speaker) {
                return Err(StudioError::ScriptDraft(format!(
                    "draft references unknown speaker '{}'",
                    segment.speaker
                )));
            }
            if segment.content.trim().is_empty() {
                return Err(StudioError::ScriptDraft(format!(
                    "segment '{}' in section '{}' has empty content",
                    segment.id, section_id
                )));
            }
            if !seen_ids.insert(segment.id.as_str()) {
                return Err(StudioError::ScriptDraft(format!(
                    "duplicate segment id '{}' in section '{}'",
                    segment.id, section_id
                )));
            }
        }
    }

    Ok(())
}
