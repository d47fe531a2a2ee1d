mod main_view;
mod mixer_view;

pub use main_view::draw_main_view;
pub use mixer_view::draw_mixer_panel;
