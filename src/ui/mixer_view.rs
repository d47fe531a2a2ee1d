// src/ui/mixer_view.rs

use crate::app::SoundboardApp;
use crate::session::Channel;
use egui::{epaint, vec2, Color32, CornerRadius, Pos2, Rect, Response, RichText, Sense, Stroke, Ui};

const TRACK_BG: Color32 = Color32::from_gray(20);
const THUMB_COLOR: Color32 = Color32::from_gray(120);
const METER_COLOR: Color32 = Color32::from_rgb(60, 180, 75);
const METER_CLIP_COLOR: Color32 = Color32::from_rgb(230, 25, 75);

fn linear_to_db(linear: f32) -> f32 {
    if linear <= 1e-6 {
        -f32::INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// A 0..1 fader. `peak_level`, when non-zero, is drawn post-fader behind the thumb.
pub fn horizontal_volume_fader(ui: &mut Ui, value: &mut f32, peak_level: f32) -> Response {
    let desired_size = vec2(ui.available_width() * 0.8, 20.0);
    let (rect, mut response) = ui.allocate_exact_size(desired_size, Sense::click_and_drag());

    if response.dragged() || response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let new_value = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
            if new_value != *value {
                *value = new_value;
                response.mark_changed();
            }
        }
    }

    if ui.is_rect_visible(rect) {
        let painter = ui.painter_at(rect);

        painter.rect(
            rect,
            CornerRadius::ZERO,
            TRACK_BG,
            Stroke::NONE,
            epaint::StrokeKind::Inside,
        );

        if peak_level > 0.0 {
            let post_fader_peak = peak_level * *value;
            let bar_width = rect.width() * post_fader_peak.clamp(0.0, 1.0);
            let bar_rect = Rect::from_min_size(rect.left_top(), vec2(bar_width, rect.height()));
            let color = if post_fader_peak >= 1.0 {
                METER_CLIP_COLOR
            } else {
                METER_COLOR
            };
            painter.rect_filled(bar_rect, CornerRadius::ZERO, color);
        }

        let thumb_width = 8.0;
        let thumb_x = rect.left() + rect.width() * value.clamp(0.0, 1.0);
        let thumb_center = Pos2::new(thumb_x, rect.center().y);
        let thumb_rect =
            Rect::from_center_size(thumb_center, vec2(thumb_width, rect.height() + 4.0));
        painter.rect(
            thumb_rect,
            CornerRadius::from(3.0),
            THUMB_COLOR,
            Stroke::new(1.0, ui.visuals().text_color()),
            epaint::StrokeKind::Inside,
        );
    }

    response
}

pub fn draw_mixer_panel(app: &mut SoundboardApp, ui: &mut Ui) {
    ui.label(RichText::new("Mix Volumes").strong());
    for (channel, label) in [
        (Channel::Background, "Background clip"),
        (Channel::Foreground, "Live voice"),
    ] {
        let mut value = app.volumes.get(channel);
        let peak = match channel {
            Channel::Foreground => app.displayed_input_peak,
            Channel::Background => 0.0,
        };
        let db = linear_to_db(value);
        let db_text = if db.is_finite() {
            format!("{:+.1} dB", db)
        } else {
            "-inf dB".to_string()
        };
        ui.label(format!("{}: {:.2} ({})", label, value, db_text));
        if horizontal_volume_fader(ui, &mut value, peak).changed() {
            app.set_volume(channel, value);
        }
        ui.add_space(4.0);
    }
}
