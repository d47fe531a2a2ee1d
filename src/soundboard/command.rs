// src/soundboard/command.rs

use crate::clip_store::ClipRef;
use crate::session::Channel;
use std::path::PathBuf;

/// Requests from the UI and the hotkey listener to the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundboardCommand {
    PlayClip(ClipRef),
    RecordAndMix,
    Replay,
    SetVolume { channel: Channel, value: f32 },
    ListClips,
    Shutdown,
}

/// Results reported back from the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub enum SoundboardEvent {
    Clips(Vec<ClipRef>),
    Playing(String),
    RecordingStarted,
    MixReady { path: PathBuf, duration_secs: f32 },
    Replaying,
    VolumeChanged { channel: Channel, value: f32 },
    Failed(String),
}
