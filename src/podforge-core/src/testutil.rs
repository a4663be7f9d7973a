//! Shared test fixtures: a two-speaker studio config, an in-memory WAV
//! fixture, and a counting mock backend.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::StudioConfig;
use crate::error::StudioError;
use crate::tts::{SpeechBackend, SpeechSynthesizer};

/// A config with `speaker1` on ElevenLabs and `speaker2` on OpenAI.
pub(crate) fn test_config() -> StudioConfig {
    StudioConfig::from_str(
        r#"{
            "show": {
                "name": "Test Show",
                "about": "A show used in tests",
                "language": "en"
            },
            "speakers": {
                "speaker1": {
                    "name": "Alex",
                    "about": "Host",
                    "settings": {
                        "voice_id": "voice-a",
                        "provider": "elevenlabs"
                    }
                },
                "speaker2": {
                    "name": "Sam",
                    "about": "Guest",
                    "settings": {
                        "voice_id": "voice-b",
                        "provider": "openai",
                        "voice_model": "tts-1"
                    }
                }
            }
        }"#,
    )
    .unwrap()
}

/// A small mono 16-bit WAV at the pipeline rate. The symphonia probe
/// accepts it regardless of the `.mp3` cache file naming.
pub(crate) fn wav_fixture(num_samples: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: crate::audio::PIPELINE_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    {
        let mut writer = hound::WavWriter::new(std::io::Cursor::new(&mut buf), spec).unwrap();
        for i in 0..num_samples {
            writer.write_sample(((i % 64) as i16 - 32) * 256).unwrap();
        }
        writer.finalize().unwrap();
    }
    buf
}

/// Mock backend that counts invocations and either returns a WAV fixture
/// or fails every call.
pub(crate) struct CountingBackend {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

impl CountingBackend {
    pub(crate) fn ok() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }
    }

    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SpeechBackend for CountingBackend {
    async fn synthesize(
        &self,
        _text: &str,
        settings: &crate::config::SpeakerSettings,
    ) -> Result<Vec<u8>, StudioError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StudioError::Synthesis {
                voice: settings.voice_id.clone(),
                message: "backend down".to_string(),
            });
        }
        Ok(wav_fixture(441))
    }
}

/// A synthesizer with counting mocks on both provider slots.
pub(crate) fn mock_synthesizer() -> (SpeechSynthesizer, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let elevenlabs = CountingBackend::ok();
    let openai = CountingBackend::ok();
    let elevenlabs_calls = elevenlabs.calls();
    let openai_calls = openai.calls();
    (
        SpeechSynthesizer::new(Box::new(elevenlabs), Box::new(openai)),
        elevenlabs_calls,
        openai_calls,
    )
}

/// A synthesizer whose backends always fail.
pub(crate) fn failing_synthesizer() -> SpeechSynthesizer {
    SpeechSynthesizer::new(
        Box::new(CountingBackend::failing()),
        Box::new(CountingBackend::failing()),
    )
}
