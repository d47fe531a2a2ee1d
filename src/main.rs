#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod audio_buffer;
mod audio_device;
mod audio_io;
mod capture_state;
mod clip_store;
mod error;
mod hotkeys;
mod mixer;
mod player;
mod session;
mod settings;
mod soundboard;
mod ui;

use crate::app::SoundboardApp;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([440.0, 620.0])
            .with_min_inner_size([320.0, 400.0]),
        ..Default::default()
    };

    let run_result = eframe::run_native(
        "Kenku Soundboard",
        native_options,
        Box::new(|cc| Ok(Box::new(SoundboardApp::new(cc)))),
    );

    if let Err(e) = run_result {
        return Err(anyhow::anyhow!("Eframe run error: {}", e));
    }

    Ok(())
}
