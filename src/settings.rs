use crate::session::Volumes;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";

/// A key name bound to a clip. Relative clip paths resolve against the clip directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KeyBinding {
    pub key: String,
    pub clip: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub clip_dir: PathBuf,
    pub mix_output: PathBuf,
    pub sample_rate: u32,
    pub record_seconds: f32,
    pub foreground_volume: f32,
    pub background_volume: f32,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub bindings: Vec<KeyBinding>,
    pub record_key: String,
    pub replay_key: String,
    pub global_hotkeys: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            clip_dir: PathBuf::from("kenku_sounds"),
            mix_output: PathBuf::from("mixed_output.wav"),
            sample_rate: 44100,
            record_seconds: 5.0,
            foreground_volume: 0.5,
            background_volume: 0.5,
            input_device: None,
            output_device: None,
            bindings: (1..=3)
                .map(|i| KeyBinding {
                    key: format!("numpad{}", i),
                    clip: PathBuf::from(format!("kenku_call{}.wav", i)),
                })
                .collect(),
            record_key: "numpad0".to_string(),
            replay_key: "numpad9".to_string(),
            global_hotkeys: true,
        }
    }
}

impl AppSettings {
    pub fn volumes(&self) -> Volumes {
        Volumes {
            foreground: self.foreground_volume,
            background: self.background_volume,
        }
    }

    pub fn set_volumes(&mut self, volumes: Volumes) {
        self.foreground_volume = volumes.foreground;
        self.background_volume = volumes.background;
    }

    pub fn clip_dir_in(&self, base: &Path) -> PathBuf {
        resolve(base, &self.clip_dir)
    }

    pub fn mix_output_in(&self, base: &Path) -> PathBuf {
        resolve(base, &self.mix_output)
    }

    pub fn binding_path_in(&self, base: &Path, binding: &KeyBinding) -> PathBuf {
        resolve(&self.clip_dir_in(base), &binding.clip)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// `AppSettings/` next to the executable, created on first use.
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let app_settings_dir = exe_dir.join("AppSettings");
            if !app_settings_dir.exists() {
                if let Err(e) = fs::create_dir_all(&app_settings_dir) {
                    error!(
                        "Failed to create directory at {}: {}",
                        app_settings_dir.display(),
                        e
                    );
                    return None;
                }
            }
            return Some(app_settings_dir);
        }
    }
    error!("Could not determine application directory.");
    None
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) {
    match serde_json::to_string_pretty(settings) {
        Ok(json_string) => {
            if let Err(e) = fs::write(path, json_string) {
                error!("Failed to write settings to {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            error!("Failed to serialize settings: {}", e);
        }
    }
}

pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }
    match fs::read_to_string(path) {
        Ok(json_string) => match serde_json::from_str(&json_string) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse settings file, using defaults. Error: {}", e);
                AppSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read settings file, using defaults. Error: {}", e);
            AppSettings::default()
        }
    }
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(dir) = get_config_dir() {
        save_settings_to(&dir.join(SETTINGS_FILE), settings);
    }
}

pub fn load_settings() -> AppSettings {
    match get_config_dir() {
        Some(dir) => load_settings_from(&dir.join(SETTINGS_FILE)),
        None => AppSettings::default(),
    }
}
