//! Toolbar actions and UI

use egui::Ui;

use crate::export::suggested_filename;
use crate::i18n::t;
use crate::session::Status;
use crate::state::AppState;

// ── Public actions (callable from menus and shortcuts too) ───

pub fn action_open_model(state: &mut AppState) {
    let Some(path) = rfd::FileDialog::new()
        .set_title(t("menu.open_title"))
        .add_filter("GLTF", &["glb", "gltf"])
        .pick_file()
    else {
        return;
    };
    match state.session.open_path(&path) {
        Ok(framing) => tracing::info!(
            "Opened {} (scale {:.4})",
            path.display(),
            framing.scale
        ),
        Err(e) => tracing::error!("Failed to open {}: {e}", path.display()),
    }
}

pub fn action_use_snapshot(state: &mut AppState) {
    if let Err(e) = state.session.use_snapshot() {
        tracing::warn!("Use snapshot: {e}");
    }
}

/// Save the current thumbnail, baking one first if there is none yet
pub fn action_save_thumbnail(state: &mut AppState) {
    if state.session.thumbnail.is_none() {
        action_use_snapshot(state);
    }
    let Some(raster) = &state.session.thumbnail else {
        return;
    };
    let Some(path) = rfd::FileDialog::new()
        .set_title(t("menu.save_title"))
        .add_filter("PNG", &["png"])
        .set_file_name(suggested_filename(&chrono::Local::now()))
        .save_file()
    else {
        return;
    };
    match raster.save(&path) {
        Ok(()) => {
            state.session.status = Status::Info(format!("{}: {}", t("thumb.saved"), path.display()));
        }
        Err(e) => {
            tracing::error!("Failed to write thumbnail: {e}");
            state.session.status = Status::Error(e.to_string());
        }
    }
}

pub fn action_copy_data_uri(ctx: &egui::Context, state: &mut AppState) {
    if let Some(raster) = &state.session.thumbnail {
        ctx.copy_text(raster.to_data_uri());
        state.session.status = Status::Info(t("thumb.copied").to_string());
    }
}

pub fn action_reset_camera(state: &mut AppState) {
    state.session.reset_camera();
}

pub fn action_reset_view(state: &mut AppState) {
    state.session.reset_view();
}

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button(t("tb.open")).on_hover_text(t("menu.open")).clicked() {
            action_open_model(state);
        }

        ui.separator();

        let has_model = state.session.asset().is_some();
        if ui
            .add_enabled(has_model, egui::Button::new(t("tb.reset_camera")))
            .on_hover_text(t("menu.reset_camera"))
            .clicked()
        {
            action_reset_camera(state);
        }

        let mut options = state.settings.options.clone();
        ui.toggle_value(&mut options.auto_rotate, t("opt.auto_rotate"));
        ui.toggle_value(&mut options.grid, t("opt.grid"));
        ui.toggle_value(&mut options.wireframe, t("opt.wireframe"));
        state.set_options(options);

        ui.separator();

        let can_use = state.session.canvas.snapshot().is_some();
        if ui
            .add_enabled(can_use, egui::Button::new(t("tb.use_snapshot")))
            .on_hover_text(t("thumb.use"))
            .clicked()
        {
            action_use_snapshot(state);
        }
    });
}
