pub mod options_panel;
pub mod status_bar;
pub mod thumbnail_panel;
pub mod toolbar;
