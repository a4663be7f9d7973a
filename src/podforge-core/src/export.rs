//! Final episode export.
//!
//! Encodes the composed track into the container the caller selected:
//! WAV through hound, MP3 through LAME, OGG Vorbis through vorbis_rs.

use std::fs::File;
use std::io::BufWriter;
use std::num::{NonZeroU8, NonZeroU32};
use std::path::Path;

use mp3lame_encoder::{Builder, FlushNoGap, MonoPcm};
use vorbis_rs::VorbisEncoderBuilder;

use crate::audio::AudioClip;
use crate::error::StudioError;

/// Supported export containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Wav,
    Mp3,
    Ogg,
}

impl ExportFormat {
    /// Look up a format by name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "wav" => Some(ExportFormat::Wav),
            "mp3" => Some(ExportFormat::Mp3),
            "ogg" => Some(ExportFormat::Ogg),
            _ => None,
        }
    }

    /// List all available format names.
    pub fn available_formats() -> Vec<&'static str> {
        vec!["wav", "mp3", "ogg"]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Wav => "wav",
            ExportFormat::Mp3 => "mp3",
            ExportFormat::Ogg => "ogg",
        }
    }
}

/// Write the clip to `path` in the given container.
pub fn export<P: AsRef<Path>>(
    clip: &AudioClip,
    path: P,
    format: ExportFormat,
) -> Result<(), StudioError> {
    match format {
        ExportFormat::Wav => write_wav(clip, path.as_ref()),
        ExportFormat::Mp3 => write_mp3(clip, path.as_ref()),
        ExportFormat::Ogg => write_ogg(clip, path.as_ref()),
    }
}

fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

fn write_wav(clip: &AudioClip, path: &Path) -> Result<(), StudioError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| StudioError::Audio(format!("Failed to create WAV file: {}", e)))?;

    for sample in to_i16(&clip.samples) {
        writer
            .write_sample(sample)
            .map_err(|e| StudioError::Audio(format!("Failed to write WAV sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| StudioError::Audio(format!("Failed to finalize WAV file: {}", e)))
}

fn write_mp3(clip: &AudioClip, path: &Path) -> Result<(), StudioError> {
    let pcm = to_i16(&clip.samples);

    let mut builder =
        Builder::new().ok_or_else(|| StudioError::Audio("Failed to create MP3 encoder".to_string()))?;
    builder
        .set_num_channels(1)
        .map_err(|e| StudioError::Audio(format!("MP3 encoder channels: {:?}", e)))?;
    builder
        .set_sample_rate(clip.sample_rate)
        .map_err(|e| StudioError::Audio(format!("MP3 encoder sample rate: {:?}", e)))?;
    builder
        .set_brate(mp3lame_encoder::Birtate::Kbps160)
        .map_err(|e| StudioError::Audio(format!("MP3 encoder bitrate: {:?}", e)))?;
    builder
        .set_quality(mp3lame_encoder::Quality::Best)
        .map_err(|e| StudioError::Audio(format!("MP3 encoder quality: {:?}", e)))?;
    let mut encoder = builder
        .build()
        .map_err(|e| StudioError::Audio(format!("MP3 encoder init: {:?}", e)))?;

    let mut output: Vec<u8> = Vec::new();
    output.reserve(mp3lame_encoder::max_required_buffer_size(pcm.len()));

    let written = encoder
        .encode(MonoPcm(&pcm), output.spare_capacity_mut())
        .map_err(|e| StudioError::Audio(format!("MP3 encoding failed: {:?}", e)))?;
    // SAFETY: the encoder initialized exactly `written` bytes of the spare capacity.
    unsafe { output.set_len(output.len() + written) };

    let written = encoder
        .flush::<FlushNoGap>(output.spare_capacity_mut())
        .map_err(|e| StudioError::Audio(format!("MP3 flush failed: {:?}", e)))?;
    // SAFETY: as above, for the flushed tail.
    unsafe { output.set_len(output.len() + written) };

    std::fs::write(path, &output)?;
    Ok(())
}

fn write_ogg(clip: &AudioClip, path: &Path) -> Result<(), StudioError> {
    let sample_rate = NonZeroU32::new(clip.sample_rate)
        .ok_or_else(|| StudioError::Audio("Sample rate must be non-zero".to_string()))?;

    let mut sink = BufWriter::new(File::create(path)?);

    let mut encoder = VorbisEncoderBuilder::new(sample_rate, NonZeroU8::MIN, &mut sink)
        .map_err(|e| StudioError::Audio(format!("OGG encoder init: {}", e)))?
        .build()
        .map_err(|e| StudioError::Audio(format!("OGG encoder init: {}", e)))?;

    if !clip.samples.is_empty() {
        encoder
            .encode_audio_block([&clip.samples[..]])
            .map_err(|e| StudioError::Audio(format!("OGG encoding failed: {}", e)))?;
    }

    encoder
        .finish()
        .map_err(|e| StudioError::Audio(format!("OGG finalize failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::PIPELINE_SAMPLE_RATE;

    fn short_clip() -> AudioClip {
        let samples = (0..4410)
            .map(|i| ((i as f32 / 100.0) * std::f32::consts::TAU).sin() * 0.8)
            .collect();
        AudioClip {
            samples,
            sample_rate: PIPELINE_SAMPLE_RATE,
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ExportFormat::from_name("wav"), Some(ExportFormat::Wav));
        assert_eq!(ExportFormat::from_name("MP3"), Some(ExportFormat::Mp3));
        assert_eq!(ExportFormat::from_name("ogg"), Some(ExportFormat::Ogg));
        assert_eq!(ExportFormat::from_name("flac"), None);
    }

    #[test]
    fn test_extension_matches_name() {
        for name in ExportFormat::available_formats() {
            let format = ExportFormat::from_name(name).unwrap();
            assert_eq!(format.extension(), name);
        }
    }

    #[test]
    fn test_export_wav_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.wav");

        export(&short_clip(), &path, ExportFormat::Wav).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, PIPELINE_SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 4410);
    }

    #[test]
    fn test_export_empty_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.wav");

        export(&AudioClip::empty(), &path, ExportFormat::Wav).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 0);
    }

    #[test]
    fn test_export_ogg_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.ogg");

        export(&short_clip(), &path, ExportFormat::Ogg).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert!(data.starts_with(b"OggS"));
    }

    #[test]
    fn test_export_mp3_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.mp3");

        export(&short_clip(), &path, ExportFormat::Mp3).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert!(!data.is_empty());
    }
}
