//! Episode orchestration.
//!
//! Walks one episode through script acquisition, assembly, composition,
//! and export. The script stage fails loudly; the audio stage is the one
//! place errors are contained, so a drafted script is never lost to a
//! flaky synthesis backend - callers get a [`EpisodeOutcome::AudioFailed`]
//! with the cached script still on disk, ready for a retry.

use std::fs;
use std::path::{Path, PathBuf};

use crate::assembler::{assemble, validate_roster};
use crate::audio::{AudioClip, compose};
use crate::cache::SegmentCache;
use crate::config::StudioConfig;
use crate::error::StudioError;
use crate::export::{ExportFormat, export};
use crate::script::Script;
use crate::tts::SpeechSynthesizer;
use crate::writer::ScriptWriter;

/// Progress events emitted while producing an episode.
#[derive(Debug, Clone)]
pub enum StudioEvent {
    /// The script is available, freshly drafted or loaded from cache.
    ScriptReady { cached: bool },
    /// Segment recording is about to start.
    RecordingStart { segments: usize },
    /// The composed track is being written out.
    Exporting { path: PathBuf },
}

/// Callback for studio progress events.
pub type StudioCallback = Box<dyn Fn(StudioEvent) + Send + Sync>;

/// How an episode run ended.
#[derive(Debug)]
pub enum EpisodeOutcome {
    /// The caller asked for the script only; no audio was produced.
    ScriptOnly { script_path: PathBuf },
    /// The full episode was produced and exported.
    Complete {
        script_path: PathBuf,
        output_path: PathBuf,
        duration_secs: f64,
    },
    /// A script exists (and stays cached), but the audio stage failed.
    AudioFailed {
        script_path: PathBuf,
        error: String,
    },
}

/// Produces podcast episodes into per-episode working directories under
/// an output root.
pub struct Studio {
    config: StudioConfig,
    writer: ScriptWriter,
    synthesizer: SpeechSynthesizer,
    output_root: PathBuf,
    callback: Option<StudioCallback>,
}

impl Studio {
    pub fn new(config: StudioConfig, writer: ScriptWriter, synthesizer: SpeechSynthesizer) -> Self {
        Self {
            config,
            writer,
            synthesizer,
            output_root: PathBuf::from("output"),
            callback: None,
        }
    }

    /// Change where episode working directories are created.
    pub fn with_output_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.output_root = root.as_ref().to_path_buf();
        self
    }

    /// Set a callback for progress events.
    pub fn with_callback(mut self, callback: StudioCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// The working directory for an episode name.
    pub fn work_dir(&self, name: &str) -> PathBuf {
        self.output_root.join(name)
    }

    /// Produce one episode from extracted content.
    ///
    /// An existing `script.json` in the working directory is reused
    /// without re-drafting; assembly and composition always run from the
    /// script, with the segment cache making re-runs cheap.
    pub async fn produce_episode(
        &self,
        name: &str,
        content: &str,
        format: ExportFormat,
        only_script: bool,
    ) -> Result<EpisodeOutcome, StudioError> {
        let work_dir = self.work_dir(name);
        fs::create_dir_all(&work_dir)?;

        let script_path = work_dir.join("script.json");
        let script = if script_path.exists() {
            tracing::info!("Loading cached script from {}", script_path.display());
            let script = Script::load(&script_path)?;
            self.emit(StudioEvent::ScriptReady { cached: true });
            script
        } else {
            tracing::info!("Drafting podcast script");
            let script = self.writer.draft(content, &self.config).await?;
            script.save(&script_path)?;
            self.emit(StudioEvent::ScriptReady { cached: false });
            script
        };

        if only_script {
            return Ok(EpisodeOutcome::ScriptOnly { script_path });
        }

        // Unknown speakers are a configuration problem, not an audio
        // failure; raise them before any synthesis starts.
        validate_roster(&script, &self.config)?;

        self.emit(StudioEvent::RecordingStart {
            segments: script.segment_count(),
        });

        let episode = match self.record(&script, &work_dir).await {
            Ok(track) => track,
            Err(err) => {
                tracing::error!("Error recording episode '{}': {}", name, err);
                return Ok(EpisodeOutcome::AudioFailed {
                    script_path,
                    error: err.to_string(),
                });
            }
        };

        let output_path = work_dir.join(format!("output.{}", format.extension()));
        self.emit(StudioEvent::Exporting {
            path: output_path.clone(),
        });
        export(&episode, &output_path, format)?;

        tracing::info!("Episode exported to {}", output_path.display());

        Ok(EpisodeOutcome::Complete {
            script_path,
            output_path,
            duration_secs: episode.duration_secs(),
        })
    }

    async fn record(&self, script: &Script, work_dir: &Path) -> Result<AudioClip, StudioError> {
        let cache = SegmentCache::open(work_dir)?;
        let clips = assemble(script, &self.config, &cache, &self.synthesizer).await?;
        Ok(compose(clips))
    }

    fn emit(&self, event: StudioEvent) {
        if let Some(ref callback) = self.callback {
            callback(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{failing_synthesizer, mock_synthesizer, test_config};
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    fn dummy_writer() -> ScriptWriter {
        // Never reaches the network in these tests: a cached script.json
        // is always present before produce_episode runs.
        ScriptWriter::new("http://localhost:9", "unused", "unused-model")
    }

    fn cached_script_json() -> &'static str {
        r#"{
            "sections": {
                "01_intro": {
                    "segments": [
                        {"id": "s1", "speaker": "speaker1", "content": "Welcome.", "blank_duration": 0.5},
                        {"id": "s2", "speaker": "speaker2", "content": "Hi."}
                    ]
                }
            }
        }"#
    }

    fn write_cached_script(root: &Path, name: &str) -> PathBuf {
        let work_dir = root.join(name);
        fs::create_dir_all(&work_dir).unwrap();
        let script_path = work_dir.join("script.json");
        fs::write(&script_path, cached_script_json()).unwrap();
        script_path
    }

    #[tokio::test]
    async fn test_script_only_skips_synthesis() {
        let root = tempfile::tempdir().unwrap();
        write_cached_script(root.path(), "ep1");

        let (synth, elevenlabs_calls, openai_calls) = mock_synthesizer();
        let studio = Studio::new(test_config(), dummy_writer(), synth)
            .with_output_root(root.path());

        let outcome = studio
            .produce_episode("ep1", "unused", ExportFormat::Wav, true)
            .await
            .unwrap();

        assert!(matches!(outcome, EpisodeOutcome::ScriptOnly { .. }));
        assert_eq!(elevenlabs_calls.load(Ordering::SeqCst), 0);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_complete_run_exports_audio() {
        let root = tempfile::tempdir().unwrap();
        write_cached_script(root.path(), "ep1");

        let (synth, _, _) = mock_synthesizer();
        let studio = Studio::new(test_config(), dummy_writer(), synth)
            .with_output_root(root.path());

        let outcome = studio
            .produce_episode("ep1", "unused", ExportFormat::Wav, false)
            .await
            .unwrap();

        match outcome {
            EpisodeOutcome::Complete {
                output_path,
                duration_secs,
                ..
            } => {
                assert!(output_path.ends_with("ep1/output.wav"));
                assert!(output_path.exists());
                assert!(duration_secs > 0.0);
            }
            other => panic!("expected Complete, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_audio_failure_is_contained_and_script_survives() {
        let root = tempfile::tempdir().unwrap();
        let script_path = write_cached_script(root.path(), "ep1");
        let script_bytes = fs::read(&script_path).unwrap();

        let studio = Studio::new(test_config(), dummy_writer(), failing_synthesizer())
            .with_output_root(root.path());

        let outcome = studio
            .produce_episode("ep1", "unused", ExportFormat::Wav, false)
            .await
            .unwrap();

        match outcome {
            EpisodeOutcome::AudioFailed { script_path, error } => {
                assert!(error.contains("backend down"));
                assert_eq!(fs::read(&script_path).unwrap(), script_bytes);
                assert!(Script::load(&script_path).is_ok());
            }
            other => panic!("expected AudioFailed, got {:?}", other),
        }

        // A later run with a healthy backend reuses the cached script and
        // succeeds; the dummy writer proves no re-draft happened.
        let (synth, _, _) = mock_synthesizer();
        let studio = Studio::new(test_config(), dummy_writer(), synth)
            .with_output_root(root.path());
        let outcome = studio
            .produce_episode("ep1", "unused", ExportFormat::Wav, false)
            .await
            .unwrap();
        assert!(matches!(outcome, EpisodeOutcome::Complete { .. }));
    }

    #[tokio::test]
    async fn test_unknown_speaker_propagates_before_synthesis() {
        let root = tempfile::tempdir().unwrap();
        let work_dir = root.path().join("ep1");
        fs::create_dir_all(&work_dir).unwrap();
        fs::write(
            work_dir.join("script.json"),
            r#"{"sections": {"01": {"segments": [
                {"id": "s1", "speaker": "ghost", "content": "Boo."}
            ]}}}"#,
        )
        .unwrap();

        let (synth, elevenlabs_calls, openai_calls) = mock_synthesizer();
        let studio = Studio::new(test_config(), dummy_writer(), synth)
            .with_output_root(root.path());

        let err = studio
            .produce_episode("ep1", "unused", ExportFormat::Wav, false)
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::UnknownSpeaker(_)));
        assert_eq!(elevenlabs_calls.load(Ordering::SeqCst), 0);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_events_are_emitted_in_order() {
        let root = tempfile::tempdir().unwrap();
        write_cached_script(root.path(), "ep1");

        let events: Arc<Mutex<Vec<StudioEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let (synth, _, _) = mock_synthesizer();
        let studio = Studio::new(test_config(), dummy_writer(), synth)
            .with_output_root(root.path())
            .with_callback(Box::new(move |event| {
                sink.lock().unwrap().push(event);
            }));

        studio
            .produce_episode("ep1", "unused", ExportFormat::Wav, false)
            .await
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], StudioEvent::ScriptReady { cached: true }));
        assert!(matches!(events[1], StudioEvent::RecordingStart { segments: 2 }));
        assert!(matches!(events[2], StudioEvent::Exporting { .. }));
    }
}
