// src/audio_buffer.rs

use crate::error::{Result, SoundboardError};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Audio data plus the format it was recorded or decoded at.
/// Samples are interleaved when `channels > 1`.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, 1, samples)
    }

    /// Number of frames (samples per channel).
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f32 / self.sample_rate as f32
    }

    /// Averages interleaved channels down to a single channel.
    pub fn into_mono(self) -> Self {
        let channels = self.channels as usize;
        if channels <= 1 {
            return self;
        }
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        Self::mono(self.sample_rate, samples)
    }
}

/// Decodes a WAV file to mono f32 samples, keeping its original sample rate.
/// Integer PCM of any width and 32-bit float are accepted.
pub fn load_wav(path: &Path) -> Result<AudioBuffer> {
    if !path.is_file() {
        return Err(SoundboardError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let reader = hound::WavReader::new(BufReader::new(File::open(path)?))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    Ok(AudioBuffer::new(spec.sample_rate, spec.channels, samples).into_mono())
}

/// Writes the buffer as 16-bit PCM, replacing any existing file at `path`.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let amplitude = i16::MAX as f32;
    for &sample in &buffer.samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * amplitude) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
