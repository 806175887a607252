//! Viewer options and model info

use egui::Ui;
use shared::{EnvironmentPreset, Rgb, ToneMapping};

use crate::i18n::t;
use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading(t("opt.title"));
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        show_options(ui, state);
        ui.add_space(8.0);
        show_guide(ui, state);
        ui.add_space(8.0);
        show_asset_info(ui, state);
    });
}

fn show_options(ui: &mut Ui, state: &mut AppState) {
    let mut options = state.settings.options.clone();

    egui::CollapsingHeader::new(t("opt.scene"))
        .id_salt("opt_scene")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("opt_scene_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    ui.label(t("opt.environment"));
                    egui::ComboBox::from_id_salt("environment_combo")
                        .selected_text(options.environment.display_name())
                        .show_ui(ui, |ui| {
                            for preset in EnvironmentPreset::all() {
                                ui.selectable_value(&mut options.environment, *preset, preset.display_name());
                            }
                        });
                    ui.end_row();

                    ui.label(t("opt.point_size"));
                    ui.add(egui::Slider::new(&mut options.point_size, 1.0..=16.0));
                    ui.end_row();
                });
            ui.checkbox(&mut options.grid, t("opt.grid"));
            ui.checkbox(&mut options.auto_rotate, t("opt.auto_rotate"));
            ui.checkbox(&mut options.wireframe, t("opt.wireframe"));
            ui.checkbox(&mut options.skeleton, t("opt.skeleton"));
        });

    egui::CollapsingHeader::new(t("opt.lighting"))
        .id_salt("opt_lighting")
        .default_open(true)
        .show(ui, |ui| {
            egui::Grid::new("opt_lighting_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    ui.label(t("opt.exposure"));
                    ui.add(egui::Slider::new(&mut options.exposure, 0.0..=4.0));
                    ui.end_row();

                    ui.label(t("opt.tone_mapping"));
                    egui::ComboBox::from_id_salt("tone_mapping_combo")
                        .selected_text(options.tone_mapping.display_name())
                        .show_ui(ui, |ui| {
                            for mapping in ToneMapping::all() {
                                ui.selectable_value(&mut options.tone_mapping, *mapping, mapping.display_name());
                            }
                        });
                    ui.end_row();

                    ui.strong(t("opt.ambient"));
                    ui.end_row();
                    ui.label(t("opt.intensity"));
                    ui.add(egui::Slider::new(&mut options.ambient_intensity, 0.0..=4.0));
                    ui.end_row();
                    ui.label(t("opt.color"));
                    color_button(ui, &mut options.ambient_color);
                    ui.end_row();

                    ui.strong(t("opt.direct"));
                    ui.end_row();
                    ui.label(t("opt.intensity"));
                    ui.add(egui::Slider::new(&mut options.direct_intensity, 0.0..=10.0));
                    ui.end_row();
                    ui.label(t("opt.color"));
                    color_button(ui, &mut options.direct_color);
                    ui.end_row();
                });
        });

    state.set_options(options);
}

fn show_guide(ui: &mut Ui, state: &mut AppState) {
    egui::CollapsingHeader::new(t("opt.guide"))
        .id_salt("opt_guide")
        .default_open(false)
        .show(ui, |ui| {
            let name = state
                .settings
                .composite
                .guide_path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| t("opt.guide_none").to_string());
            ui.horizontal(|ui| {
                ui.monospace(name);
            });

            ui.horizontal(|ui| {
                if ui.button(t("opt.guide_load")).clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title(t("opt.guide_title"))
                        .add_filter("Image", &["png", "jpg", "jpeg"])
                        .pick_file()
                    {
                        if !state.set_guide_path(path) {
                            state.session.status =
                                crate::session::Status::Error(t("opt.guide_failed").to_string());
                        }
                    }
                }
                if ui
                    .add_enabled(state.session.canvas.has_guide(), egui::Button::new(t("opt.guide_clear")))
                    .clicked()
                {
                    state.clear_guide();
                }
            });

            let mut opacity = state.settings.composite.guide_opacity;
            let response = ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).text(t("opt.guide_opacity")));
            // Reloading the guide is costly, wait for the slider to settle
            if response.drag_stopped() || (response.changed() && !response.dragged()) {
                state.set_guide_opacity(opacity);
            } else if response.changed() {
                state.settings.composite.guide_opacity = opacity;
            }
        });
}

fn show_asset_info(ui: &mut Ui, state: &AppState) {
    egui::CollapsingHeader::new(t("info.title"))
        .id_salt("asset_info")
        .default_open(true)
        .show(ui, |ui| {
            let session = &state.session;
            let Some(asset) = session.asset() else {
                ui.weak(t("info.none"));
                return;
            };

            if let Some(name) = session.asset_name() {
                ui.strong(name);
            }
            egui::Grid::new("asset_info_grid")
                .num_columns(2)
                .spacing([8.0, 4.0])
                .show(ui, |ui| {
                    ui.label(format!("{}:", t("info.nodes")));
                    ui.label(asset.node_count().to_string());
                    ui.end_row();

                    ui.label(format!("{}:", t("info.meshes")));
                    ui.label(asset.meshes.len().to_string());
                    ui.end_row();

                    ui.label(format!("{}:", t("info.vertices")));
                    ui.label(asset.vertex_count().to_string());
                    ui.end_row();

                    if let Some(framing) = session.framing() {
                        ui.label(format!("{}:", t("info.scale")));
                        ui.monospace(format!("{:.4}", framing.scale));
                        ui.end_row();
                    }
                });

            if !asset.animations.is_empty() {
                ui.add_space(4.0);
                ui.label(format!("{}:", t("info.animations")));
                for clip in &asset.animations {
                    ui.horizontal(|ui| {
                        ui.label(&clip.name);
                        ui.weak(format!("{:.2}s", clip.duration));
                    });
                }
            }
        });
}

fn color_button(ui: &mut Ui, rgb: &mut Rgb) {
    let mut color = egui::Color32::from_rgb(rgb[0], rgb[1], rgb[2]);
    if ui.color_edit_button_srgba(&mut color).changed() {
        *rgb = [color.r(), color.g(), color.b()];
    }
}
