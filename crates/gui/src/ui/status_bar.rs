use egui::Ui;

use crate::i18n::t;
use crate::session::Status;
use crate::state::AppState;

pub fn show(ui: &mut Ui, state: &AppState) {
    let session = &state.session;
    ui.horizontal(|ui| {
        match &session.status {
            Status::Empty => {
                ui.weak(t("status.empty"));
            }
            Status::Loading(name) => {
                ui.spinner();
                ui.label(format!("{}: {name}", t("status.loading")));
            }
            Status::Loaded(name) => {
                ui.label(format!("{}: {name}", t("status.loaded")));
            }
            Status::Error(msg) => {
                ui.colored_label(
                    egui::Color32::from_rgb(230, 90, 80),
                    format!("{}: {msg}", t("status.error")),
                );
            }
            Status::Info(msg) => {
                ui.label(msg);
            }
        }

        if session.interaction.activity.is_interacting() {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(255, 200, 100), t("status.interacting"));
        }

        // Right-aligned capture counters
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.weak(format!("modelshot v{}", env!("CARGO_PKG_VERSION")));
            ui.separator();
            ui.weak(format!(
                "{}: {}/{}",
                t("status.captures"),
                session.canvas.applied_sequence(),
                session.capture.last_sequence()
            ));
        });
    });
}
