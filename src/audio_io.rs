// src/audio_io.rs

use crate::audio_device;
use crate::capture_state::SharedCaptureState;
use crate::error::{Result, SoundboardError};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, Stream, StreamConfig};
use log::{error, info, warn};
use ringbuf::{HeapProducer, HeapRb};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocking source of live mono audio.
pub trait Recorder {
    /// Records exactly `num_samples` mono samples at `sample_rate`, blocking until done.
    fn capture(&mut self, num_samples: usize, sample_rate: u32) -> Result<Vec<f32>>;
}

/// Records from a cpal input device. The device is looked up on every capture,
/// so unplugging it only fails the next mix.
pub struct CpalRecorder {
    device_name: Option<String>,
    state: SharedCaptureState,
}

impl CpalRecorder {
    pub fn new(device_name: Option<String>, state: SharedCaptureState) -> Self {
        Self { device_name, state }
    }
}

/// Clears the shared recording flag however the capture ends.
struct CaptureGuard<'a>(&'a SharedCaptureState);

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

impl Recorder for CpalRecorder {
    fn capture(&mut self, num_samples: usize, sample_rate: u32) -> Result<Vec<f32>> {
        let device = audio_device::find_input_device(self.device_name.as_deref())?;
        info!("Using input device: {}", audio_device::device_name(&device));

        let default_config = device
            .default_input_config()
            .map_err(SoundboardError::device)?;
        let sample_format = default_config.sample_format();
        let mut config: StreamConfig = default_config.into();
        config.sample_rate = cpal::SampleRate(sample_rate);

        // One second of slack so a slow reader never drops samples.
        let rb = HeapRb::<f32>::new(num_samples + sample_rate as usize);
        let (producer, mut consumer) = rb.split();
        let failed = Arc::new(AtomicBool::new(false));

        let stream = match sample_format {
            SampleFormat::F32 => build_input_stream::<f32>(&device, &config, producer, self.state.clone(), failed.clone())?,
            SampleFormat::I16 => build_input_stream::<i16>(&device, &config, producer, self.state.clone(), failed.clone())?,
            SampleFormat::U16 => build_input_stream::<u16>(&device, &config, producer, self.state.clone(), failed.clone())?,
            format => {
                return Err(SoundboardError::Device(format!(
                    "Unsupported sample format {}",
                    format
                )))
            }
        };

        self.state.begin(num_samples);
        let _guard = CaptureGuard(&self.state);
        stream.play().map_err(SoundboardError::device)?;
        info!(
            "Recording {} samples at {} Hz ({} channel input)",
            num_samples, sample_rate, config.channels
        );

        let mut captured = Vec::with_capacity(num_samples);
        let mut chunk = vec![0.0f32; 4096];
        while captured.len() < num_samples {
            if failed.load(Ordering::Relaxed) {
                return Err(SoundboardError::Device(
                    "Input device became unavailable during capture".to_string(),
                ));
            }
            let wanted = (num_samples - captured.len()).min(chunk.len());
            let read = consumer.pop_slice(&mut chunk[..wanted]);
            captured.extend_from_slice(&chunk[..read]);
            self.state.set_captured(captured.len());
            if read == 0 {
                thread::sleep(POLL_INTERVAL);
            }
        }
        drop(stream);

        info!("Recording finished.");
        Ok(captured)
    }
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: HeapProducer<f32>,
    state: SharedCaptureState,
    failed: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: Sample + cpal::SizedSample,
    f32: FromSample<T>,
{
    let err_fn = move |err: cpal::StreamError| match err {
        cpal::StreamError::DeviceNotAvailable => {
            error!("Input device is no longer available");
            failed.store(true, Ordering::Relaxed);
        }
        other => warn!("an error occurred on input stream: {}", other),
    };
    let channels = config.channels as usize;

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let peak = push_mono_frames(data, channels, &mut producer);
                state.set_peak(peak);
            },
            err_fn,
            None,
        )
        .map_err(SoundboardError::device)?;
    Ok(stream)
}

/// Downmixes interleaved frames into the ring buffer and returns the block peak.
/// Samples that do not fit are dropped.
fn push_mono_frames<T>(data: &[T], channels: usize, producer: &mut HeapProducer<f32>) -> f32
where
    T: Sample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    let mut peak = 0.0f32;
    for frame in data.chunks(channels) {
        let mono_sample = frame.iter().map(|s| f32::from_sample(*s)).sum::<f32>() / channels as f32;
        peak = peak.max(mono_sample.abs());
        if producer.push(mono_sample).is_err() {
            // buffer full
        }
    }
    peak
}
