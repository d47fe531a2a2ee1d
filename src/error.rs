// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SoundboardError>;

/// Everything that can stop a soundboard operation. None of these are fatal:
/// the engine logs them, reports them to the UI and keeps running.
#[derive(Error, Debug)]
pub enum SoundboardError {
    #[error("Sound file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("No background clips found in {}", dir.display())]
    EmptyLibrary { dir: PathBuf },

    #[error("Sample rate mismatch in {source_name}: expected {expected} Hz, found {found} Hz")]
    RateMismatch {
        source_name: String,
        expected: u32,
        found: u32,
    },

    #[error("No mixed audio recorded yet")]
    NoPriorMix,

    #[error("Clip contains no samples: {}", path.display())]
    EmptyClip { path: PathBuf },

    #[error("Invalid recording duration: {0}s")]
    InvalidDuration(f32),

    #[error("No default input device")]
    NoInputDevice,

    #[error("Input device not found: {0}")]
    InputDeviceNotFound(String),

    #[error("No default output device")]
    NoOutputDevice,

    #[error("Output device not found: {0}")]
    OutputDeviceNotFound(String),

    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Playback error: {0}")]
    Playback(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SoundboardError {
    pub fn device(err: impl std::fmt::Display) -> Self {
        SoundboardError::Device(err.to_string())
    }

    pub fn playback(err: impl std::fmt::Display) -> Self {
        SoundboardError::Playback(err.to_string())
    }
}
