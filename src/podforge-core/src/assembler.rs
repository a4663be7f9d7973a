//! Segment assembly: script in, ordered audio clips out.
//!
//! Walks the script in playback order (sections by sorted key, segments by
//! list position), resolves each segment through the cache, and inserts
//! trailing silence where the script asks for it. Concatenation and
//! normalization happen later, in the compositor.

use crate::audio::AudioClip;
use crate::cache::SegmentCache;
use crate::config::StudioConfig;
use crate::error::StudioError;
use crate::script::Script;
use crate::tts::SpeechSynthesizer;

/// Check every segment's speaker reference and silence duration before
/// any synthesis happens.
pub fn validate_roster(script: &Script, config: &StudioConfig) -> Result<(), StudioError> {
    for (section_id, segment) in script.ordered_segments() {
        if !config.speakers.contains_key(&segment.speaker) {
            return Err(StudioError::UnknownSpeaker(segment.speaker.clone()));
        }
        if let Some(duration) = segment.blank_duration {
            if duration < 0.0 {
                return Err(StudioError::Script(format!(
                    "Segment '{}' in section '{}' has negative blank_duration {}",
                    segment.id, section_id, duration
                )));
            }
        }
    }
    Ok(())
}

/// Produce the ordered clip list for a script.
///
/// Each speech clip is followed by a silence clip when its segment carries
/// a positive `blank_duration`. Segments are processed strictly one at a
/// time in playback order.
pub async fn assemble(
    script: &Script,
    config: &StudioConfig,
    cache: &SegmentCache,
    synthesizer: &SpeechSynthesizer,
) -> Result<Vec<AudioClip>, StudioError> {
    validate_roster(script, config)?;

    let segments = script.ordered_segments();
    let total = segments.len();
    let mut clips = Vec::with_capacity(total);

    for (index, (section_id, segment)) in segments.into_iter().enumerate() {
        let speaker = &config.speakers[&segment.speaker];

        tracing::info!(
            section = section_id,
            segment = %segment.id,
            speaker = %speaker.name,
            "recording segment {}/{}",
            index + 1,
            total
        );

        let path = cache.resolve(section_id, segment, speaker, synthesizer).await?;
        clips.push(AudioClip::from_file(&path)?);

        if let Some(duration) = segment.blank_duration {
            if duration > 0.0 {
                clips.push(AudioClip::silence(duration));
            }
        }
    }

    Ok(clips)
}
