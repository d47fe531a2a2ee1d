// src/app.rs
use crate::capture_state::SharedCaptureState;
use crate::clip_store::ClipRef;
use crate::hotkeys::{self, HotkeyMap, ListenerHealth};
use crate::session::{Channel, Volumes};
use crate::settings::{self, AppSettings};
use crate::soundboard::{BoardConfig, SoundboardCommand, SoundboardEvent, SoundboardHandle};
use crate::ui;
use egui::Color32;
use log::{info, warn};
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
const ENGINE_OFFLINE: &str = "Soundboard engine is offline. Restart the app.";

pub struct SoundboardApp {
    // --- App State ---
    pub settings: AppSettings,
    pub config_dir: PathBuf,
    pub hotkeys: HotkeyMap,
    pub clips: Vec<ClipRef>,
    pub status: Option<(String, Color32, Instant)>,
    pub last_mix: Option<PathBuf>,
    pub window_hotkeys: bool,

    // --- UI / Shared State ---
    pub volumes: Volumes,
    pub capture_state: SharedCaptureState,
    pub displayed_input_peak: f32,

    // --- Engine Resources (managed) ---
    engine: SoundboardHandle,
    hotkey_health: ListenerHealth,
    _hotkey_thread: Option<JoinHandle<()>>,
}

impl SoundboardApp {
    pub fn new(_cc: &eframe::CreationContext) -> Self {
        let settings = settings::load_settings();
        let config_dir = settings::get_config_dir().unwrap_or_else(|| PathBuf::from("."));
        let config = BoardConfig::from_settings(&settings, &config_dir);
        info!("Clip directory: {}", config.clip_dir.display());

        let hotkeys = HotkeyMap::from_settings(&settings, &config_dir);
        let capture_state = SharedCaptureState::new();
        let volumes = config.volumes;
        let engine = SoundboardHandle::spawn(
            config,
            settings.input_device.clone(),
            settings.output_device.clone(),
            capture_state.clone(),
        );
        engine.send(SoundboardCommand::ListClips);

        let hotkey_health = ListenerHealth::default();
        let hotkey_thread =
            Self::start_global_hotkeys(&settings, &hotkeys, &engine, &hotkey_health);
        let window_hotkeys = hotkey_thread.is_none();
        if window_hotkeys {
            info!("Hotkeys only work while the window is focused.");
        }

        Self {
            settings,
            config_dir,
            hotkeys,
            clips: Vec::new(),
            status: None,
            last_mix: None,
            window_hotkeys,
            volumes,
            capture_state,
            displayed_input_peak: 0.0,
            engine,
            hotkey_health,
            _hotkey_thread: hotkey_thread,
        }
    }

    #[cfg(feature = "global-hotkeys")]
    fn start_global_hotkeys(
        settings: &AppSettings,
        hotkeys: &HotkeyMap,
        engine: &SoundboardHandle,
        health: &ListenerHealth,
    ) -> Option<JoinHandle<()>> {
        settings.global_hotkeys.then(|| {
            hotkeys::global::spawn_listener(hotkeys.clone(), engine.sender(), health.clone())
        })
    }

    #[cfg(not(feature = "global-hotkeys"))]
    fn start_global_hotkeys(
        _settings: &AppSettings,
        _hotkeys: &HotkeyMap,
        _engine: &SoundboardHandle,
        _health: &ListenerHealth,
    ) -> Option<JoinHandle<()>> {
        None
    }

    pub fn send_command(&mut self, command: SoundboardCommand) {
        if !self.engine.send(command) {
            self.set_status(ENGINE_OFFLINE, Color32::RED);
        }
    }

    pub fn set_volume(&mut self, channel: Channel, value: f32) {
        let value = self.volumes.set(channel, value);
        self.send_command(SoundboardCommand::SetVolume { channel, value });
    }

    pub fn is_recording(&self) -> bool {
        self.capture_state.is_recording()
    }

    fn set_status(&mut self, message: impl Into<String>, color: Color32) {
        self.status = Some((message.into(), color, Instant::now()));
    }

    fn handle_engine_events(&mut self) {
        while let Some(event) = self.engine.try_recv() {
            match event {
                SoundboardEvent::Clips(clips) => self.clips = clips,
                SoundboardEvent::Playing(name) => {
                    self.set_status(format!("Playing {}", name), Color32::LIGHT_GRAY)
                }
                SoundboardEvent::RecordingStarted => {
                    self.set_status("Recording...", Color32::LIGHT_RED)
                }
                SoundboardEvent::MixReady {
                    path,
                    duration_secs,
                } => {
                    self.set_status(
                        format!("Mixed {:.1}s saved to {}", duration_secs, path.display()),
                        Color32::LIGHT_GREEN,
                    );
                    self.last_mix = Some(path);
                    self.send_command(SoundboardCommand::ListClips);
                }
                SoundboardEvent::Replaying => {
                    self.set_status("Replaying last mixed audio", Color32::LIGHT_GRAY)
                }
                SoundboardEvent::VolumeChanged { channel, value } => {
                    self.volumes.set(channel, value);
                }
                SoundboardEvent::Failed(message) => self.set_status(message, Color32::RED),
            }
        }
    }

    /// Hands the bindings to the window if the global listener has died.
    fn check_hotkey_listener(&mut self) {
        if !self.window_hotkeys && self.hotkey_health.take_stopped() {
            warn!("Global hotkeys stopped; falling back to window hotkeys.");
            self.window_hotkeys = true;
            self.set_status(
                "Global hotkeys unavailable, hotkeys now work while the window is focused",
                Color32::YELLOW,
            );
        }
    }

    fn handle_window_keys(&mut self, ctx: &egui::Context) {
        if !self.window_hotkeys {
            return;
        }
        let pressed: Vec<egui::Key> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => Some(*key),
                    _ => None,
                })
                .collect()
        });
        for key in pressed {
            let command = hotkeys::egui_key_names(key)
                .iter()
                .find_map(|name| self.hotkeys.action_for(name))
                .map(|action| action.command());
            if let Some(command) = command {
                self.send_command(command);
            }
        }
    }
}

impl eframe::App for SoundboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // --- State Updates ---
        self.handle_engine_events();
        self.check_hotkey_listener();
        self.handle_window_keys(ctx);

        let status_expired = matches!(
            &self.status,
            Some((message, _, time))
                if time.elapsed() > STATUS_TIMEOUT && message.as_str() != ENGINE_OFFLINE
        );
        if status_expired && !self.is_recording() {
            self.status = None;
        }

        // --- Peak Meter Decay Logic ---
        let new_input_peak = self.capture_state.take_peak();
        self.displayed_input_peak = (self.displayed_input_peak * 0.95).max(new_input_peak);

        ctx.request_repaint_after(Duration::from_millis(30));

        // --- UI Drawing ---
        ui::draw_main_view(self, ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.engine.shutdown();
        self.settings.set_volumes(self.volumes);
        settings::save_settings(&self.settings);
    }
}
