// src/hotkeys.rs

//! Key bindings. Key names are backend-neutral strings such as `numpad1`,
//! `f5`, `q` or `space`; the global listener and the window both translate
//! their own key codes into these names.

use crate::clip_store::ClipRef;
use crate::settings::AppSettings;
use crate::soundboard::SoundboardCommand;
use log::warn;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum HotkeyAction {
    PlayClip(ClipRef),
    RecordAndMix,
    Replay,
}

impl HotkeyAction {
    pub fn command(&self) -> SoundboardCommand {
        match self {
            HotkeyAction::PlayClip(clip) => SoundboardCommand::PlayClip(clip.clone()),
            HotkeyAction::RecordAndMix => SoundboardCommand::RecordAndMix,
            HotkeyAction::Replay => SoundboardCommand::Replay,
        }
    }
}

/// Lowercases a configured key name and checks that some backend can produce it.
/// `kp1` is accepted as an alias for `numpad1`.
pub fn normalize_key_name(name: &str) -> Option<String> {
    let name = name.trim().to_ascii_lowercase();
    let name = match name.strip_prefix("kp") {
        Some(digit) if is_digit(digit) => format!("numpad{}", digit),
        _ => name,
    };

    let known = match name.as_str() {
        "space" => true,
        n if n.len() == 1 => n.chars().all(|c| c.is_ascii_alphanumeric()),
        n => match (n.strip_prefix("numpad"), n.strip_prefix('f')) {
            (Some(digit), _) => is_digit(digit),
            (None, Some(num)) => num.parse::<u8>().map_or(false, |n| (1..=12).contains(&n)),
            _ => false,
        },
    };
    known.then_some(name)
}

fn is_digit(s: &str) -> bool {
    s.len() == 1 && s.chars().all(|c| c.is_ascii_digit())
}

/// The static binding table: one action per key name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotkeyMap {
    bindings: Vec<(String, HotkeyAction)>,
}

impl HotkeyMap {
    pub fn from_settings(settings: &AppSettings, base: &Path) -> Self {
        let mut map = Self::default();
        map.bind(&settings.record_key, HotkeyAction::RecordAndMix);
        map.bind(&settings.replay_key, HotkeyAction::Replay);
        for binding in &settings.bindings {
            match ClipRef::new(settings.binding_path_in(base, binding)) {
                Some(clip) => map.bind(&binding.key, HotkeyAction::PlayClip(clip)),
                None => warn!("Binding for '{}' has no clip file name", binding.key),
            }
        }
        map
    }

    /// Earlier bindings win when a key is bound twice.
    pub fn bind(&mut self, key: &str, action: HotkeyAction) {
        let Some(name) = normalize_key_name(key) else {
            warn!("Unknown hotkey '{}', binding ignored", key);
            return;
        };
        if self.action_for(&name).is_some() {
            warn!("Hotkey '{}' is already bound, ignoring {:?}", name, action);
            return;
        }
        self.bindings.push((name, action));
    }

    pub fn action_for(&self, key_name: &str) -> Option<&HotkeyAction> {
        self.bindings
            .iter()
            .find(|(name, _)| name == key_name)
            .map(|(_, action)| action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HotkeyAction)> {
        self.bindings.iter().map(|(name, action)| (name.as_str(), action))
    }

    pub fn key_for(&self, wanted: &HotkeyAction) -> Option<&str> {
        self.iter()
            .find(|(_, action)| *action == wanted)
            .map(|(name, _)| name)
    }
}

/// Fires once per physical press: auto-repeat presses are swallowed until the
/// key is released.
#[derive(Debug, Default)]
pub struct KeyLatch {
    held: Vec<String>,
}

impl KeyLatch {
    pub fn press(&mut self, key_name: &str) -> bool {
        if self.held.iter().any(|k| k == key_name) {
            return false;
        }
        self.held.push(key_name.to_string());
        true
    }

    pub fn release(&mut self, key_name: &str) {
        self.held.retain(|k| k != key_name);
    }
}

/// Set by the global listener when it stops, so the window can take over the
/// bindings.
#[derive(Clone, Debug, Default)]
pub struct ListenerHealth {
    stopped: Arc<AtomicBool>,
}

impl ListenerHealth {
    pub fn mark_stopped(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// True once after the listener has stopped.
    pub fn take_stopped(&self) -> bool {
        self.stopped.swap(false, Ordering::Relaxed)
    }
}

/// Names a window key event can match. egui reports numpad digits as plain
/// digits, so those match both spellings.
pub fn egui_key_names(key: egui::Key) -> Vec<String> {
    let name = key.name().to_ascii_lowercase();
    match name.as_str() {
        "space" => vec![name],
        n if is_digit(n) => vec![n.to_string(), format!("numpad{}", n)],
        _ => normalize_key_name(&name).into_iter().collect(),
    }
}

#[cfg(feature = "global-hotkeys")]
pub mod global {
    use super::{HotkeyMap, KeyLatch, ListenerHealth};
    use crate::soundboard::SoundboardCommand;
    use log::{error, info, warn};
    use rdev::{listen, Event, EventType, Key};
    use std::fmt::Debug;
    use std::sync::mpsc::Sender;
    use std::thread::{self, JoinHandle};

    pub fn rdev_key_name(key: Key) -> Option<String> {
        let name = match key {
            Key::Kp0 => "numpad0",
            Key::Kp1 => "numpad1",
            Key::Kp2 => "numpad2",
            Key::Kp3 => "numpad3",
            Key::Kp4 => "numpad4",
            Key::Kp5 => "numpad5",
            Key::Kp6 => "numpad6",
            Key::Kp7 => "numpad7",
            Key::Kp8 => "numpad8",
            Key::Kp9 => "numpad9",
            Key::Num0 => "0",
            Key::Num1 => "1",
            Key::Num2 => "2",
            Key::Num3 => "3",
            Key::Num4 => "4",
            Key::Num5 => "5",
            Key::Num6 => "6",
            Key::Num7 => "7",
            Key::Num8 => "8",
            Key::Num9 => "9",
            Key::F1 => "f1",
            Key::F2 => "f2",
            Key::F3 => "f3",
            Key::F4 => "f4",
            Key::F5 => "f5",
            Key::F6 => "f6",
            Key::F7 => "f7",
            Key::F8 => "f8",
            Key::F9 => "f9",
            Key::F10 => "f10",
            Key::F11 => "f11",
            Key::F12 => "f12",
            Key::Space => "space",
            Key::KeyA => "a",
            Key::KeyB => "b",
            Key::KeyC => "c",
            Key::KeyD => "d",
            Key::KeyE => "e",
            Key::KeyF => "f",
            Key::KeyG => "g",
            Key::KeyH => "h",
            Key::KeyI => "i",
            Key::KeyJ => "j",
            Key::KeyK => "k",
            Key::KeyL => "l",
            Key::KeyM => "m",
            Key::KeyN => "n",
            Key::KeyO => "o",
            Key::KeyP => "p",
            Key::KeyQ => "q",
            Key::KeyR => "r",
            Key::KeyS => "s",
            Key::KeyT => "t",
            Key::KeyU => "u",
            Key::KeyV => "v",
            Key::KeyW => "w",
            Key::KeyX => "x",
            Key::KeyY => "y",
            Key::KeyZ => "z",
            _ => return None,
        };
        Some(name.to_string())
    }

    /// Listens for system-wide key events on a background thread and forwards
    /// bound presses as commands. The platform delivers one callback per event.
    pub fn spawn_listener(
        map: HotkeyMap,
        commands: Sender<SoundboardCommand>,
        health: ListenerHealth,
    ) -> JoinHandle<()> {
        spawn_with(map, commands, health, |callback| listen(callback))
    }

    /// Runs `listen` on a new thread with the binding callback. Marks `health`
    /// stopped when `listen` returns, whether it failed or not.
    pub(crate) fn spawn_with<L, E>(
        map: HotkeyMap,
        commands: Sender<SoundboardCommand>,
        health: ListenerHealth,
        listen: L,
    ) -> JoinHandle<()>
    where
        L: FnOnce(Box<dyn FnMut(Event)>) -> Result<(), E> + Send + 'static,
        E: Debug,
    {
        thread::spawn(move || {
            info!("Global hotkey listener started.");
            let mut latch = KeyLatch::default();
            let callback = move |event: Event| match event.event_type {
                EventType::KeyPress(key) => {
                    let Some(name) = rdev_key_name(key) else { return };
                    if !latch.press(&name) {
                        return;
                    }
                    if let Some(action) = map.action_for(&name) {
                        if commands.send(action.command()).is_err() {
                            error!("Soundboard engine is offline; hotkey '{}' dropped", name);
                        }
                    }
                }
                EventType::KeyRelease(key) => {
                    if let Some(name) = rdev_key_name(key) {
                        latch.release(&name);
                    }
                }
                _ => {}
            };
            match listen(Box::new(callback)) {
                Ok(()) => warn!("Global hotkey listener exited."),
                Err(e) => error!("Global hotkey listener stopped: {:?}", e),
            }
            health.mark_stopped();
        })
    }

}
