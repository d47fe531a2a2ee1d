// src/soundboard.rs

pub mod command;

use crate::audio_buffer::{self, AudioBuffer};
use crate::audio_io::{CpalRecorder, Recorder};
use crate::capture_state::SharedCaptureState;
use crate::clip_store::{self, ClipRef};
use crate::error::{Result, SoundboardError};
use crate::mixer::Mixer;
use crate::player::{LazyPlayer, Player, RodioPlayer};
use crate::session::{Channel, Session, Volumes};
use crate::settings::AppSettings;
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

pub use command::{SoundboardCommand, SoundboardEvent};

/// Everything the engine needs from the settings file, with paths resolved.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardConfig {
    pub mixer: Mixer,
    pub clip_dir: PathBuf,
    pub mix_output: PathBuf,
    pub volumes: Volumes,
}

impl BoardConfig {
    pub fn from_settings(settings: &AppSettings, base: &Path) -> Self {
        Self {
            mixer: Mixer::new(settings.sample_rate, settings.record_seconds),
            clip_dir: settings.clip_dir_in(base),
            mix_output: settings.mix_output_in(base),
            volumes: settings.volumes(),
        }
    }
}

/// The soundboard core: owns the session and the audio devices and runs
/// one operation at a time.
pub struct Soundboard<R: Recorder, P: Player> {
    mixer: Mixer,
    clip_dir: PathBuf,
    mix_output: PathBuf,
    session: Session,
    recorder: R,
    player: P,
    rng: StdRng,
}

impl<R: Recorder, P: Player> Soundboard<R, P> {
    pub fn new(config: BoardConfig, recorder: R, player: P) -> Self {
        Self {
            mixer: config.mixer,
            clip_dir: config.clip_dir,
            mix_output: config.mix_output,
            session: Session::new(config.volumes),
            recorder,
            player,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the clip-selection random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn list_clips(&self) -> Result<Vec<ClipRef>> {
        clip_store::list_clips(&self.clip_dir)
    }

    pub fn play_clip(&mut self, clip: &ClipRef) -> Result<()> {
        self.player.play_clip(clip)
    }

    /// Captures, mixes, saves and plays a new mix. The output file and the last
    /// mix are only replaced once the mix itself has succeeded.
    pub fn record_and_mix(&mut self) -> Result<&AudioBuffer> {
        let clips = self.list_clips()?;
        let mixed = self.mixer.record_and_mix(
            &mut self.recorder,
            &mut self.rng,
            &self.clip_dir,
            &clips,
            self.session.volumes(),
        )?;

        audio_buffer::write_wav(&self.mix_output, &mixed)?;
        info!("Mixed audio saved to {}", self.mix_output.display());
        let mix = self.session.store_mix(mixed);

        info!("Playing mixed audio...");
        self.player.play_buffer(mix)?;
        Ok(mix)
    }

    pub fn replay(&mut self) -> Result<()> {
        self.session.replay(&mut self.player)?;
        info!("Replaying last mixed audio...");
        Ok(())
    }

    pub fn set_volume(&mut self, channel: Channel, value: f32) -> f32 {
        self.session.set_volume(channel, value)
    }

    /// Runs one command, reporting its outcome on `events`.
    /// Returns false once the engine should stop.
    pub fn handle_command(
        &mut self,
        command: SoundboardCommand,
        events: &Sender<SoundboardEvent>,
    ) -> bool {
        let event = match command {
            SoundboardCommand::PlayClip(clip) => self
                .play_clip(&clip)
                .map(|_| SoundboardEvent::Playing(clip.name)),
            SoundboardCommand::RecordAndMix => {
                send_event(events, SoundboardEvent::RecordingStarted);
                let mix_output = self.mix_output.clone();
                self.record_and_mix().map(|mix| SoundboardEvent::MixReady {
                    path: mix_output,
                    duration_secs: mix.duration_secs(),
                })
            }
            SoundboardCommand::Replay => self.replay().map(|_| SoundboardEvent::Replaying),
            SoundboardCommand::SetVolume { channel, value } => {
                let value = self.set_volume(channel, value);
                debug!("{} volume set to {:.2}", channel, value);
                Ok(SoundboardEvent::VolumeChanged { channel, value })
            }
            SoundboardCommand::ListClips => self.list_clips().map(SoundboardEvent::Clips),
            SoundboardCommand::Shutdown => return false,
        };

        match event {
            Ok(event) => send_event(events, event),
            Err(e) => {
                match e {
                    SoundboardError::NotFound { .. }
                    | SoundboardError::EmptyLibrary { .. }
                    | SoundboardError::NoPriorMix => warn!("{}", e),
                    _ => error!("{}", e),
                }
                send_event(events, SoundboardEvent::Failed(e.to_string()));
            }
        }
        true
    }
}

fn send_event(events: &Sender<SoundboardEvent>, event: SoundboardEvent) {
    if events.send(event).is_err() {
        warn!("Event receiver dropped; soundboard event discarded.");
    }
}

/// The engine thread and the channels used to talk to it.
pub struct SoundboardHandle {
    command_sender: Sender<SoundboardCommand>,
    event_receiver: Receiver<SoundboardEvent>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SoundboardHandle {
    /// Starts the engine thread. Audio devices are opened on that thread
    /// because the output stream cannot move between threads. The engine keeps
    /// running without an output; each play retries opening it.
    pub fn spawn(
        config: BoardConfig,
        input_device: Option<String>,
        output_device: Option<String>,
        capture_state: SharedCaptureState,
    ) -> Self {
        let (command_sender, command_receiver) = mpsc::channel::<SoundboardCommand>();
        let (event_sender, event_receiver) = mpsc::channel::<SoundboardEvent>();

        let thread_handle = thread::spawn(move || {
            let mut player =
                LazyPlayer::new(move || RodioPlayer::new(output_device.as_deref()));
            if let Err(e) = player.connect() {
                warn!("Audio output unavailable, will retry on the next play: {}", e);
                send_event(&event_sender, SoundboardEvent::Failed(e.to_string()));
            }
            let recorder = CpalRecorder::new(input_device, capture_state);
            let mut board = Soundboard::new(config, recorder, player);
            info!("Soundboard engine started.");

            while let Ok(command) = command_receiver.recv() {
                if !board.handle_command(command, &event_sender) {
                    break;
                }
            }
            info!("Soundboard engine stopped.");
        });

        Self {
            command_sender,
            event_receiver,
            thread_handle: Some(thread_handle),
        }
    }

    /// A sender for other control surfaces, such as the hotkey listener.
    pub fn sender(&self) -> Sender<SoundboardCommand> {
        self.command_sender.clone()
    }

    /// Returns false when the engine thread is no longer receiving.
    pub fn send(&self, command: SoundboardCommand) -> bool {
        match self.command_sender.send(command) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send command: {}. Engine thread may be offline.", e);
                false
            }
        }
    }

    pub fn try_recv(&self) -> Option<SoundboardEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Asks the engine to stop and waits for it. A capture in progress runs to
    /// completion first.
    pub fn shutdown(&mut self) {
        let _ = self.command_sender.send(SoundboardCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                error!("Error joining soundboard thread: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_buffer::write_wav;
    use crate::mixer::tests::ScriptedRecorder;
    use crate::player::tests::RecordingPlayer;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const RATE: u32 = 1000;

    fn config_in(dir: &TempDir) -> BoardConfig {
        BoardConfig {
            mixer: Mixer::new(RATE, 0.05),
            clip_dir: dir.path().join("clips"),
            mix_output: dir.path().join("out").join("mixed_output.wav"),
            volumes: Volumes::default(),
        }
    }

    fn board_in(
        dir: &TempDir,
        waveform: Vec<f32>,
    ) -> Soundboard<ScriptedRecorder, RecordingPlayer> {
        Soundboard::new(
            config_in(dir),
            ScriptedRecorder::new(waveform),
            RecordingPlayer::default(),
        )
        .with_rng(StdRng::seed_from_u64(42))
    }

    fn add_clip(dir: &TempDir, name: &str, samples: Vec<f32>) {
        let clip_dir = dir.path().join("clips");
        fs::create_dir_all(&clip_dir).unwrap();
        write_wav(&clip_dir.join(name), &AudioBuffer::mono(RATE, samples)).unwrap();
    }

    #[test]
    fn mix_is_saved_kept_and_played() {
        let dir = tempdir().unwrap();
        add_clip(&dir, "caw.wav", vec![0.5; 20]);
        let mut board = board_in(&dir, vec![0.2]);

        let mix = board.record_and_mix().unwrap().clone();

        assert_eq!(mix.len(), 50);
        assert_eq!(board.session().last_mix(), Some(&mix));
        assert_eq!(board.player().played, vec![mix.clone()]);
        let saved = audio_buffer::load_wav(&dir.path().join("out").join("mixed_output.wav")).unwrap();
        assert_eq!(saved.len(), 50);

        board.replay().unwrap();
        assert_eq!(board.player().played.len(), 2);
    }

    #[test]
    fn empty_library_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let mut board = board_in(&dir, vec![0.2]);

        let result = board.record_and_mix();

        assert!(matches!(result, Err(SoundboardError::EmptyLibrary { .. })));
        assert!(board.session().last_mix().is_none());
        assert!(board.player().played.is_empty());
        assert!(!dir.path().join("out").join("mixed_output.wav").exists());
        assert!(dir.path().join("clips").is_dir());
    }

    #[test]
    fn failed_mix_keeps_the_previous_result() {
        let dir = tempdir().unwrap();
        add_clip(&dir, "caw.wav", vec![0.5; 20]);
        let mut board = board_in(&dir, vec![0.2]);
        let first = board.record_and_mix().unwrap().clone();
        let output = dir.path().join("out").join("mixed_output.wav");
        let saved_bytes = fs::read(&output).unwrap();

        fs::remove_file(dir.path().join("clips").join("caw.wav")).unwrap();
        let wrong = dir.path().join("clips").join("wrong_rate.wav");
        write_wav(&wrong, &AudioBuffer::mono(RATE * 2, vec![0.1; 10])).unwrap();

        let result = board.record_and_mix();

        assert!(matches!(result, Err(SoundboardError::RateMismatch { .. })));
        assert_eq!(board.session().last_mix(), Some(&first));
        assert_eq!(fs::read(&output).unwrap(), saved_bytes);
    }

    #[test]
    fn volume_changes_apply_to_the_next_mix() {
        let dir = tempdir().unwrap();
        add_clip(&dir, "caw.wav", vec![0.9; 7]);
        let mut board = board_in(&dir, vec![0.3, -0.3]);

        board.set_volume(Channel::Foreground, 1.0);
        board.set_volume(Channel::Background, 0.0);
        let mix = board.record_and_mix().unwrap();

        let expected: Vec<f32> = [0.3, -0.3].iter().copied().cycle().take(50).collect();
        assert_eq!(mix.samples, expected);
    }

    #[test]
    fn commands_report_their_outcome() {
        let dir = tempdir().unwrap();
        let mut board = board_in(&dir, vec![0.2]);
        let (tx, rx) = mpsc::channel();

        assert!(board.handle_command(SoundboardCommand::Replay, &tx));
        assert!(board.handle_command(
            SoundboardCommand::SetVolume {
                channel: Channel::Background,
                value: 2.5,
            },
            &tx,
        ));
        assert!(board.handle_command(SoundboardCommand::ListClips, &tx));
        assert!(!board.handle_command(SoundboardCommand::Shutdown, &tx));

        let events: Vec<SoundboardEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SoundboardEvent::Failed("No mixed audio recorded yet".to_string()),
                SoundboardEvent::VolumeChanged {
                    channel: Channel::Background,
                    value: 1.0,
                },
                SoundboardEvent::Clips(Vec::new()),
            ]
        );
        assert!(board.player().played.is_empty());
    }

    #[test]
    fn record_command_announces_the_capture_then_the_result() {
        let dir = tempdir().unwrap();
        add_clip(&dir, "caw.wav", vec![0.5; 20]);
        let mut board = board_in(&dir, vec![0.2]);
        let (tx, rx) = mpsc::channel();

        board.handle_command(SoundboardCommand::RecordAndMix, &tx);

        let events: Vec<SoundboardEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SoundboardEvent::RecordingStarted);
        match &events[1] {
            SoundboardEvent::MixReady { path, duration_secs } => {
                assert_eq!(path, &dir.path().join("out").join("mixed_output.wav"));
                assert!((duration_secs - 0.05).abs() < 1e-6);
            }
            other => panic!("expected MixReady, got {:?}", other),
        }
    }

    #[test]
    fn missing_clip_is_reported_not_played() {
        let dir = tempdir().unwrap();
        let mut board = board_in(&dir, vec![0.2]);
        let (tx, rx) = mpsc::channel();
        let clip = ClipRef::new(dir.path().join("clips").join("kenku_call1.wav")).unwrap();

        board.handle_command(SoundboardCommand::PlayClip(clip), &tx);

        match rx.try_recv().unwrap() {
            SoundboardEvent::Failed(msg) => assert!(msg.starts_with("Sound file not found")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert!(board.player().played.is_empty());
    }

    #[test]
    fn engine_keeps_working_without_an_output_device() {
        let dir = tempdir().unwrap();
        add_clip(&dir, "caw.wav", vec![0.5; 20]);
        let mut opens = 0;
        let player = LazyPlayer::new(|| {
            opens += 1;
            Err::<RecordingPlayer, _>(SoundboardError::NoOutputDevice)
        });
        let mut board = Soundboard::new(config_in(&dir), ScriptedRecorder::new(vec![0.2]), player)
            .with_rng(StdRng::seed_from_u64(42));
        let (tx, rx) = mpsc::channel();

        assert!(board.handle_command(SoundboardCommand::RecordAndMix, &tx));
        assert!(board.handle_command(SoundboardCommand::Replay, &tx));
        assert!(board.handle_command(SoundboardCommand::ListClips, &tx));

        let events: Vec<SoundboardEvent> = rx.try_iter().collect();
        let no_output = SoundboardEvent::Failed(SoundboardError::NoOutputDevice.to_string());
        assert_eq!(events[0], SoundboardEvent::RecordingStarted);
        assert_eq!(events[1], no_output);
        assert_eq!(events[2], no_output);
        match &events[3] {
            SoundboardEvent::Clips(clips) => assert_eq!(clips.len(), 1),
            other => panic!("expected Clips, got {:?}", other),
        }
        assert_eq!(board.session().last_mix().map(|mix| mix.len()), Some(50));
        assert!(dir.path().join("out").join("mixed_output.wav").is_file());
        drop(board);
        assert_eq!(opens, 2);
    }
}
