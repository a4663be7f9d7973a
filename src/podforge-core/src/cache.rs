//! Content-addressed segment cache.
//!
//! Every synthesized segment is stored under
//! `<workdir>/segments/{section}_{segment}_{md5-of-cleaned-text}.mp3`.
//! The fingerprint covers the cleaned text, so edits to the stripped
//! punctuation do not invalidate an entry while any other text change
//! does. Entries are kept per slot: two segments with identical text in
//! different positions get separate files, which keeps every clip
//! traceable to its position in the script.
//!
//! Entries are never evicted; storage grows with each distinct segment
//! version.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Speaker;
use crate::error::StudioError;
use crate::script::{Segment, clean_speech_text};
use crate::tts::SpeechSynthesizer;

pub struct SegmentCache {
    dir: PathBuf,
}

impl SegmentCache {
    /// Open the cache under `work_dir`, creating the segments directory
    /// if it does not exist yet.
    pub fn open<P: AsRef<Path>>(work_dir: P) -> Result<Self, StudioError> {
        let dir = work_dir.as_ref().join("segments");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The cache file path for a segment slot and its current text.
    pub fn entry_path(&self, section_id: &str, segment: &Segment) -> PathBuf {
        self.entry_for(section_id, &segment.id, &clean_speech_text(&segment.content))
    }

    fn entry_for(&self, section_id: &str, segment_id: &str, cleaned_text: &str) -> PathBuf {
        let fingerprint = md5::compute(cleaned_text.as_bytes());
        self.dir
            .join(format!("{}_{}_{:x}.mp3", section_id, segment_id, fingerprint))
    }

    /// Return the audio file for this segment, synthesizing it on a miss.
    ///
    /// A hit returns the existing file untouched. A miss makes exactly one
    /// synthesis call and persists the bytes only if it succeeds, so a
    /// failed call leaves no entry behind.
    pub async fn resolve(
        &self,
        section_id: &str,
        segment: &Segment,
        speaker: &Speaker,
        synthesizer: &SpeechSynthesizer,
    ) -> Result<PathBuf, StudioError> {
        let text = clean_speech_text(&segment.content);
        let path = self.entry_for(section_id, &segment.id, &text);

        if path.exists() {
            tracing::debug!(entry = %path.display(), "segment cache hit");
            return Ok(path);
        }

        tracing::debug!(entry = %path.display(), "segment cache miss, synthesizing");
        let audio = synthesizer.synthesize(&text, speaker).await?;
        fs::write(&path, &audio)?;

        Ok(path)
    }
}
