//! Application menu bar and settings window

use eframe::egui;

use crate::i18n::{lang, set_lang, t};
use crate::state::{AppState, Language};
use crate::ui::toolbar;

/// Show the file menu
pub fn file_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.file"), |ui| {
        if ui.button(t("menu.open")).clicked() {
            ui.close_menu();
            toolbar::action_open_model(state);
        }
        let can_save = state.session.thumbnail.is_some() || state.session.canvas.snapshot().is_some();
        if ui
            .add_enabled(can_save, egui::Button::new(t("menu.save_thumbnail")))
            .clicked()
        {
            ui.close_menu();
            toolbar::action_save_thumbnail(state);
        }
        ui.separator();
        if ui.button(t("menu.quit")).clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
        }
    });
}

/// Show the view menu
pub fn view_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.view"), |ui| {
        ui.checkbox(&mut state.panels.options, t("menu.options"));
        ui.checkbox(&mut state.panels.thumbnail, t("menu.thumbnail"));
        if ui
            .checkbox(&mut state.settings.viewport.show_camera_info, t("menu.camera_info"))
            .changed()
            | ui
                .checkbox(&mut state.settings.indicator.visible, t("menu.indicator"))
                .changed()
        {
            state.touch_settings();
        }
        ui.separator();
        if ui.button(t("menu.reset_camera")).clicked() {
            toolbar::action_reset_camera(state);
            ui.close_menu();
        }
        if ui.button(t("menu.reset_view")).clicked() {
            toolbar::action_reset_view(state);
            ui.close_menu();
        }
        ui.separator();
        ui.menu_button(t("menu.language"), |ui| {
            if ui.selectable_label(lang() == Language::Ru, "Русский").clicked() {
                set_lang(Language::Ru);
                state.set_language(Language::Ru);
                ui.close_menu();
            }
            if ui.selectable_label(lang() == Language::En, "English").clicked() {
                set_lang(Language::En);
                state.set_language(Language::En);
                ui.close_menu();
            }
        });
    });
}

pub fn settings_menu(ui: &mut egui::Ui, state: &mut AppState) {
    ui.menu_button(t("menu.settings"), |ui| {
        if ui.button(t("menu.preferences")).clicked() {
            state.show_settings_window = true;
            ui.close_menu();
        }
    });
}

/// Show the settings window
pub fn settings_window(ctx: &egui::Context, state: &mut AppState) {
    let mut open = state.show_settings_window;
    egui::Window::new(t("settings.title"))
        .open(&mut open)
        .resizable(true)
        .default_width(360.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                show_viewport_settings(ui, state);
                show_capture_settings(ui, state);
                show_composite_settings(ui, state);
                show_indicator_settings(ui, state);
                show_ui_settings(ui, state);
                show_settings_buttons(ui, state);
            });
        });
    state.show_settings_window = open;
}

fn show_viewport_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.viewport"));
    let viewport = &mut state.settings.viewport;
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label(t("settings.grid_range"));
        changed |= ui
            .add(egui::DragValue::new(&mut viewport.grid_range).speed(1).range(1..=50))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label(t("settings.grid_cell"));
        changed |= ui
            .add(egui::DragValue::new(&mut viewport.grid_cell).speed(0.05).range(0.05..=10.0))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label(t("settings.grid_opacity"));
        changed |= ui
            .add(egui::Slider::new(&mut viewport.grid_opacity, 0.0..=1.0))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label(t("settings.surface_size"));
        changed |= ui
            .add(
                egui::DragValue::new(&mut viewport.surface_size)
                    .speed(8)
                    .range(64..=2048)
                    .suffix(" px"),
            )
            .changed();
    });

    if changed {
        state.touch_settings();
    }
    ui.add_space(10.0);
}

fn show_capture_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.capture"));
    ui.horizontal(|ui| {
        ui.label(t("settings.throttle"));
        let response = ui.add(
            egui::DragValue::new(&mut state.settings.capture.throttle_ms)
                .speed(5)
                .range(0..=2000)
                .suffix(" ms"),
        );
        if response.changed() {
            state.session.capture.set_throttle(state.settings.capture.throttle());
            state.touch_settings();
        }
    });
    ui.add_space(10.0);
}

fn show_composite_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.composite"));
    ui.horizontal(|ui| {
        ui.label(t("settings.background"));
        let [r, g, b] = state.settings.composite.background;
        let mut color = egui::Color32::from_rgb(r, g, b);
        if ui.color_edit_button_srgba(&mut color).changed() {
            let rgb = [color.r(), color.g(), color.b()];
            state.settings.composite.background = rgb;
            state.session.canvas.set_background(rgb);
            state.touch_settings();
        }
    });
    ui.add_space(10.0);
}

fn show_indicator_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.indicator"));
    ui.horizontal(|ui| {
        ui.label(t("settings.indicator_distance"));
        let response = ui.add(
            egui::DragValue::new(&mut state.settings.indicator.distance)
                .speed(0.1)
                .range(1.0..=20.0),
        );
        if response.changed() {
            state.session.indicator = crate::viewport::indicator::OrientationIndicator::new(
                state.settings.indicator.distance,
                state.settings.indicator.size,
            );
            state.touch_settings();
        }
    });
    ui.add_space(10.0);
}

fn show_ui_settings(ui: &mut egui::Ui, state: &mut AppState) {
    ui.heading(t("settings.ui"));
    ui.horizontal(|ui| {
        ui.label(t("settings.font_size"));
        let response = ui.add(
            egui::DragValue::new(&mut state.settings.ui.font_size)
                .speed(0.5)
                .range(8.0..=24.0)
                .suffix(" pt"),
        );
        if response.changed() {
            state.touch_settings();
        }
    });
    ui.add_space(10.0);
}

fn show_settings_buttons(ui: &mut egui::Ui, state: &mut AppState) {
    ui.separator();
    ui.horizontal(|ui| {
        if ui.button(t("settings.apply")).clicked() {
            state.settings.save();
        }
        if ui.button(t("settings.reset")).clicked() {
            let defaults = crate::state::AppSettings::default();
            state.set_options(defaults.options.clone());
            state.session.capture.set_throttle(defaults.capture.throttle());
            state.session.canvas.set_background(defaults.composite.background);
            state.settings.viewport = defaults.viewport;
            state.settings.capture = defaults.capture;
            state.settings.ui.font_size = defaults.ui.font_size;
            state.touch_settings();
        }
        if ui.button(t("settings.close")).clicked() {
            state.show_settings_window = false;
        }
    });
}
