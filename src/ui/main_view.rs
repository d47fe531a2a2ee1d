use crate::app::SoundboardApp;
use crate::hotkeys::HotkeyAction;
use crate::soundboard::SoundboardCommand;
use crate::ui;
use egui::{Button, CentralPanel, Color32, ProgressBar, RichText, ScrollArea, TopBottomPanel, Ui};

pub fn draw_main_view(app: &mut SoundboardApp, ctx: &egui::Context) {
    TopBottomPanel::top("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Kenku Soundboard").strong());
            ui.separator();
            match &app.status {
                Some((message, color, _)) => {
                    ui.label(RichText::new(message).monospace().color(*color));
                }
                None => {
                    ui.label(RichText::new("Ready").monospace().color(Color32::GRAY));
                }
            }
        });
    });

    TopBottomPanel::bottom("mixer_panel")
        .resizable(false)
        .show(ctx, |ui| {
            ui::draw_mixer_panel(app, ui);
        });

    CentralPanel::default().show(ctx, |ui| {
        draw_record_panel(app, ui);
        ui.separator();
        draw_bound_sounds(app, ui);
        ui.separator();
        draw_clip_library(app, ui);
    });
}

fn key_label(app: &SoundboardApp, action: &HotkeyAction) -> String {
    app.hotkeys
        .key_for(action)
        .map(|key| format!(" ({})", key.to_uppercase()))
        .unwrap_or_default()
}

fn draw_record_panel(app: &mut SoundboardApp, ui: &mut Ui) {
    let is_recording = app.is_recording();
    ui.horizontal(|ui| {
        let record_label = format!("Record + Mix{}", key_label(app, &HotkeyAction::RecordAndMix));
        let record_button = if is_recording {
            Button::new(RichText::new(record_label).color(Color32::WHITE))
                .fill(Color32::from_rgb(139, 0, 0))
        } else {
            Button::new(record_label)
        };
        if ui.add_enabled(!is_recording, record_button).clicked() {
            app.send_command(SoundboardCommand::RecordAndMix);
        }

        let replay_label = format!("Replay Mixed Audio{}", key_label(app, &HotkeyAction::Replay));
        if ui
            .add_enabled(app.last_mix.is_some(), Button::new(replay_label))
            .clicked()
        {
            app.send_command(SoundboardCommand::Replay);
        }
    });

    let progress = app.capture_state.progress();
    let text = if is_recording {
        format!("Recording {:.1}s", app.settings.record_seconds)
    } else {
        format!("{:.1}s capture", app.settings.record_seconds)
    };
    ui.add(
        ProgressBar::new(progress)
            .desired_width(ui.available_width())
            .text(text),
    );
}

fn draw_bound_sounds(app: &mut SoundboardApp, ui: &mut Ui) {
    ui.label(RichText::new("Hotkeys").strong());
    if !app.window_hotkeys {
        ui.label(RichText::new("Listening system-wide").small().color(Color32::GRAY));
    }
    let mut clicked = None;
    for (key, action) in app.hotkeys.iter() {
        if let HotkeyAction::PlayClip(clip) = action {
            let file_name = clip
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| clip.name.clone());
            if ui
                .button(format!("{}: {}", key.to_uppercase(), file_name))
                .clicked()
            {
                clicked = Some(clip.clone());
            }
        }
    }
    if let Some(clip) = clicked {
        app.send_command(SoundboardCommand::PlayClip(clip));
    }
}

fn draw_clip_library(app: &mut SoundboardApp, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("Background Clips").strong());
        if ui.small_button("Rescan").clicked() {
            app.send_command(SoundboardCommand::ListClips);
        }
    });
    let clip_dir = app.settings.clip_dir_in(&app.config_dir);
    ui.label(
        RichText::new(clip_dir.display().to_string())
            .small()
            .color(Color32::GRAY),
    );

    if app.clips.is_empty() {
        ui.label("No clips found. Add .wav files to the folder above.");
        return;
    }

    let mut clicked = None;
    ScrollArea::vertical().show(ui, |ui| {
        for clip in &app.clips {
            if ui.button(clip.name.as_str()).clicked() {
                clicked = Some(clip.clone());
            }
        }
    });
    if let Some(clip) = clicked {
        app.send_command(SoundboardCommand::PlayClip(clip));
    }
}
