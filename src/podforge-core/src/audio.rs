//! PCM audio clips and the episode compositor.
//!
//! All clips in the pipeline are mono f32 PCM at [`PIPELINE_SAMPLE_RATE`].
//! Cached segment files (whatever container the provider returned) are
//! decoded, downmixed, and resampled on load, so concatenation downstream
//! is a plain buffer append.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::StudioError;

/// Sample rate every clip is normalized to before assembly.
pub const PIPELINE_SAMPLE_RATE: u32 = 44_100;

/// Peak headroom left by loudness normalization, in dB.
const NORMALIZE_HEADROOM_DB: f64 = 0.1;

/// An owned mono PCM buffer.
#[derive(Debug, Clone, Default)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    /// A zero-duration clip.
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: PIPELINE_SAMPLE_RATE,
        }
    }

    /// A silent clip of the given duration.
    pub fn silence(seconds: f64) -> Self {
        let sample_count = (seconds * PIPELINE_SAMPLE_RATE as f64).round() as usize;
        Self {
            samples: vec![0.0; sample_count],
            sample_rate: PIPELINE_SAMPLE_RATE,
        }
    }

    /// Decode an audio file into a pipeline-rate mono clip.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StudioError> {
        let data = fs::read(path.as_ref())?;
        let (samples, sample_rate, channels) = decode(data)?;
        let mono = downmix(&samples, channels);
        let samples = resample(&mono, sample_rate, PIPELINE_SAMPLE_RATE);
        Ok(Self {
            samples,
            sample_rate: PIPELINE_SAMPLE_RATE,
        })
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Decode any probe-able container into interleaved f32 samples.
fn decode(data: Vec<u8>) -> Result<(Vec<f32>, u32, usize), StudioError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| StudioError::Audio(format!("Probe failed: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| StudioError::Audio("No audio track found".to_string()))?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| StudioError::Audio("Unknown sample rate".to_string()))?;

    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| StudioError::Audio("Unknown channel count".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| StudioError::Audio(format!("Decoder creation failed: {}", e)))?;

    let track_id = track.id;
    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(StudioError::Audio(format!("Packet read error: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Decode error (skipping packet): {}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();
        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        let actual_samples = num_frames * spec.channels.count();
        samples.extend(&sample_buf.samples()[..actual_samples]);
    }

    Ok((samples, sample_rate, channels))
}

/// Average interleaved channels down to mono.
fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample using linear interpolation between adjacent samples.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f32 / to_rate as f32;
    let new_len = (samples.len() as f32 / ratio) as usize;
    let mut result = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_pos = i as f32 * ratio;
        let src_idx = src_pos as usize;
        let frac = src_pos - src_idx as f32;

        if src_idx + 1 < samples.len() {
            let sample = samples[src_idx] * (1.0 - frac) + samples[src_idx + 1] * frac;
            result.push(sample);
        } else if src_idx < samples.len() {
            result.push(samples[src_idx]);
        }
    }

    result
}

/// Concatenate clips in the given order and normalize loudness over the
/// whole track. An empty clip list composes to a zero-duration clip.
pub fn compose(clips: Vec<AudioClip>) -> AudioClip {
    let total: usize = clips.iter().map(|c| c.samples.len()).sum();
    let mut samples = Vec::with_capacity(total);

    for clip in clips {
        if clip.sample_rate == PIPELINE_SAMPLE_RATE {
            samples.extend(clip.samples);
        } else {
            samples.extend(resample(
                &clip.samples,
                clip.sample_rate,
                PIPELINE_SAMPLE_RATE,
            ));
        }
    }

    normalize(&mut samples);

    AudioClip {
        samples,
        sample_rate: PIPELINE_SAMPLE_RATE,
    }
}

/// Scale the whole track so its peak sits `NORMALIZE_HEADROOM_DB` below
/// full scale. Runs once, over the concatenated episode.
fn normalize(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    if peak == 0.0 {
        return;
    }

    let target = 10.0_f64.powf(-NORMALIZE_HEADROOM_DB / 20.0) as f32;
    let gain = target / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}
