// src/session.rs

use crate::audio_buffer::AudioBuffer;
use crate::error::{Result, SoundboardError};
use crate::player::Player;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A mix source. The foreground is the live capture, the background the clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Foreground,
    Background,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Foreground => write!(f, "foreground"),
            Channel::Background => write!(f, "background"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Volumes {
    pub foreground: f32,
    pub background: f32,
}

impl Default for Volumes {
    fn default() -> Self {
        Self {
            foreground: 0.5,
            background: 0.5,
        }
    }
}

impl Volumes {
    pub fn get(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Foreground => self.foreground,
            Channel::Background => self.background,
        }
    }

    /// Stores `value` clamped to [0, 1] and returns what was stored.
    /// NaN leaves the current weight in place.
    pub fn set(&mut self, channel: Channel, value: f32) -> f32 {
        let slot = match channel {
            Channel::Foreground => &mut self.foreground,
            Channel::Background => &mut self.background,
        };
        if !value.is_nan() {
            *slot = value.clamp(0.0, 1.0);
        }
        *slot
    }
}

/// Mix weights plus the single retained result of the last successful mix.
#[derive(Debug, Default)]
pub struct Session {
    volumes: Volumes,
    last_mix: Option<AudioBuffer>,
}

impl Session {
    pub fn new(volumes: Volumes) -> Self {
        let mut session = Self::default();
        session.set_volume(Channel::Foreground, volumes.foreground);
        session.set_volume(Channel::Background, volumes.background);
        session
    }

    pub fn volumes(&self) -> Volumes {
        self.volumes
    }

    pub fn set_volume(&mut self, channel: Channel, value: f32) -> f32 {
        self.volumes.set(channel, value)
    }

    pub fn last_mix(&self) -> Option<&AudioBuffer> {
        self.last_mix.as_ref()
    }

    pub fn store_mix(&mut self, mix: AudioBuffer) -> &AudioBuffer {
        self.last_mix.insert(mix)
    }

    pub fn replay<P: Player + ?Sized>(&self, player: &mut P) -> Result<()> {
        let mix = self.last_mix.as_ref().ok_or(SoundboardError::NoPriorMix)?;
        player.play_buffer(mix)
    }
}
