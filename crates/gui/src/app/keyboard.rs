//! Keyboard shortcut handling

use eframe::egui;

use crate::state::AppState;
use crate::ui::toolbar;

/// Actions bound to keys. Dialogs must run outside the input lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shortcut {
    OpenModel,
    SaveThumbnail,
    UseSnapshot,
    ResetCamera,
    ResetView,
}

/// Handle keyboard shortcuts for the application
pub fn handle_keyboard(ctx: &egui::Context, state: &mut AppState) {
    // Don't handle shortcuts when a text field is focused
    if ctx.memory(|m| m.focused().is_some()) {
        return;
    }

    let pressed = ctx.input(|i| {
        let mut pressed = Vec::new();
        // Ctrl+O: open model
        if i.modifiers.command && i.key_pressed(egui::Key::O) {
            pressed.push(Shortcut::OpenModel);
        }
        // Ctrl+S: save thumbnail
        if i.modifiers.command && i.key_pressed(egui::Key::S) {
            pressed.push(Shortcut::SaveThumbnail);
        }
        // Space: bake the composite
        if i.key_pressed(egui::Key::Space) && !i.modifiers.command {
            pressed.push(Shortcut::UseSnapshot);
        }
        // Home: framed camera
        if i.key_pressed(egui::Key::Home) {
            pressed.push(Shortcut::ResetCamera);
        }
        // 0: identity thumbnail transform
        if i.key_pressed(egui::Key::Num0) && !i.modifiers.command {
            pressed.push(Shortcut::ResetView);
        }
        pressed
    });

    for shortcut in pressed {
        match shortcut {
            Shortcut::OpenModel => toolbar::action_open_model(state),
            Shortcut::SaveThumbnail => toolbar::action_save_thumbnail(state),
            Shortcut::UseSnapshot => toolbar::action_use_snapshot(state),
            Shortcut::ResetCamera => toolbar::action_reset_camera(state),
            Shortcut::ResetView => toolbar::action_reset_view(state),
        }
    }
}
