//! Viewport overlay drawing (indicator labels, camera info)

use egui::Painter;

use super::camera::{project_point, OrbitCamera};
use super::indicator::OrientationIndicator;

/// Label the indicator's axis tips. `rect` is where the indicator texture is
/// shown on screen.
pub fn draw_indicator_labels(painter: &Painter, rect: egui::Rect, indicator: &OrientationIndicator) {
    let colors = [
        egui::Color32::from_rgb(220, 70, 70),
        egui::Color32::from_rgb(70, 200, 70),
        egui::Color32::from_rgb(70, 110, 220),
    ];
    let vp = indicator.view_projection();

    for ((pos, label), color) in indicator.label_positions().into_iter().zip(colors) {
        let Some(p) = project_point(vp, pos, rect.width(), rect.height()) else {
            continue;
        };
        let screen = rect.min + egui::vec2(p.x, p.y);
        if rect.contains(screen) {
            painter.text(
                screen,
                egui::Align2::CENTER_CENTER,
                label,
                egui::FontId::monospace(12.0),
                color,
            );
        }
    }
}

pub fn draw_camera_info(painter: &Painter, rect: egui::Rect, camera: &OrbitCamera) {
    let overlay_rect = egui::Rect::from_min_size(
        egui::pos2(rect.right() - 140.0, rect.top() + 4.0),
        egui::vec2(136.0, 58.0),
    );
    painter.rect_filled(
        overlay_rect,
        4.0,
        egui::Color32::from_rgba_premultiplied(0, 0, 0, 140),
    );
    painter.text(
        overlay_rect.min + egui::vec2(6.0, 4.0),
        egui::Align2::LEFT_TOP,
        format!(
            "Dist: {:.2}\nYaw: {:.0}  Pitch: {:.0}\nClip: {:.3}..{:.0}",
            camera.distance,
            camera.yaw.to_degrees(),
            camera.pitch.to_degrees(),
            camera.near,
            camera.far,
        ),
        egui::FontId::monospace(10.0),
        egui::Color32::from_rgb(160, 160, 170),
    );
}
