// src/player.rs

use crate::audio_buffer::{self, AudioBuffer};
use crate::audio_device;
use crate::clip_store::ClipRef;
use crate::error::{Result, SoundboardError};
use log::{debug, info, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};

/// Fire-and-forget playback. Calls return once the audio is handed to the device.
pub trait Player {
    fn play_buffer(&mut self, buffer: &AudioBuffer) -> Result<()>;

    fn play_clip(&mut self, clip: &ClipRef) -> Result<()> {
        let buffer = audio_buffer::load_wav(clip.path())?;
        debug!(
            "Playing clip '{}' ({:.2}s)",
            clip.name,
            buffer.duration_secs()
        );
        self.play_buffer(&buffer)
    }
}

/// Plays through rodio. The output stream is not `Send`, so this lives on
/// whichever thread created it.
pub struct RodioPlayer {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl RodioPlayer {
    pub fn new(output_device_name: Option<&str>) -> Result<Self> {
        let (stream, handle) = match output_device_name {
            Some(_) => {
                let device = audio_device::find_output_device(output_device_name)?;
                info!("Using output device: {}", audio_device::device_name(&device));
                OutputStream::try_from_device(&device).map_err(SoundboardError::device)?
            }
            None => {
                info!("Using default output device");
                OutputStream::try_default().map_err(|e| match e {
                    rodio::StreamError::NoDevice => SoundboardError::NoOutputDevice,
                    other => SoundboardError::device(other),
                })?
            }
        };
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl Player for RodioPlayer {
    fn play_buffer(&mut self, buffer: &AudioBuffer) -> Result<()> {
        let sink = Sink::try_new(&self.handle).map_err(SoundboardError::playback)?;
        sink.append(SamplesBuffer::new(
            buffer.channels,
            buffer.sample_rate,
            buffer.samples.clone(),
        ));
        sink.detach();
        Ok(())
    }
}

/// Opens its output on first use and again after any failed play, so a missing
/// or unplugged device fails single plays instead of stopping the engine.
pub struct LazyPlayer<P, F> {
    open: F,
    output: Option<P>,
}

impl<P, F> LazyPlayer<P, F>
where
    P: Player,
    F: FnMut() -> Result<P>,
{
    pub fn new(open: F) -> Self {
        Self { open, output: None }
    }

    /// Opens the output now if it is not open yet.
    pub fn connect(&mut self) -> Result<()> {
        if self.output.is_none() {
            self.output = Some((self.open)()?);
        }
        Ok(())
    }
}

impl<P, F> Player for LazyPlayer<P, F>
where
    P: Player,
    F: FnMut() -> Result<P>,
{
    fn play_buffer(&mut self, buffer: &AudioBuffer) -> Result<()> {
        let mut output = match self.output.take() {
            Some(output) => output,
            None => (self.open)()?,
        };
        let result = output.play_buffer(buffer);
        match &result {
            Ok(()) => self.output = Some(output),
            Err(e) => warn!("Output dropped after failed play, reopening next time: {}", e),
        }
        result
    }
}
