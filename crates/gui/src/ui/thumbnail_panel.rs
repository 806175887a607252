//! Thumbnail composite panel: the live canvas, bake button and the current
//! thumbnail with save/copy actions.

use std::sync::Arc;
use std::time::Instant;

use egui::Ui;
use glam::Vec2;

use crate::app::styles::ACCENT;
use crate::i18n::t;
use crate::interaction::{DragButton, Surface, SurfaceMapping};
use crate::state::AppState;
use crate::ui::toolbar;

#[derive(Default)]
pub struct ThumbnailPanel {
    texture: Option<egui::TextureHandle>,
    /// Canvas revision currently uploaded
    uploaded_revision: Option<u64>,
    preview: PreviewBytes,
}

/// Encoded bytes of the baked thumbnail, registered with egui under one URI
/// per bake revision.
#[derive(Default)]
struct PreviewBytes {
    current: Option<(u64, String, Arc<[u8]>)>,
}

impl PreviewBytes {
    /// Track `revision` (or no thumbnail), returning the URI that went stale
    fn update(&mut self, revision: Option<u64>, png: impl FnOnce() -> Arc<[u8]>) -> Option<String> {
        if self.current.as_ref().map(|(held, _, _)| *held) == revision {
            return None;
        }
        let fresh = revision.map(|rev| (rev, format!("bytes://thumbnail-{rev}.png"), png()));
        std::mem::replace(&mut self.current, fresh).map(|(_, old, _)| old)
    }

    fn image(&self) -> Option<(String, egui::load::Bytes)> {
        self.current
            .as_ref()
            .map(|(_, uri, png)| (uri.clone(), egui::load::Bytes::Shared(png.clone())))
    }
}

impl ThumbnailPanel {
    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        ui.heading(t("thumb.title"));
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            self.show_canvas(ui, state);
            ui.add_space(6.0);
            show_controls(ui, state);
            ui.add_space(8.0);
            self.show_current(ui, state);
        });
    }

    fn sync_texture(&mut self, ctx: &egui::Context, state: &AppState) -> egui::TextureId {
        let canvas = &state.session.canvas;
        let revision = canvas.revision();
        let surface = canvas.surface();
        let image = || {
            egui::ColorImage::from_rgba_unmultiplied(
                [surface.width() as usize, surface.height() as usize],
                surface.as_raw(),
            )
        };

        let handle = self
            .texture
            .get_or_insert_with(|| ctx.load_texture("thumbnail_canvas", image(), egui::TextureOptions::LINEAR));
        if self.uploaded_revision != Some(revision) {
            handle.set(image(), egui::TextureOptions::LINEAR);
            self.uploaded_revision = Some(revision);
        }
        handle.id()
    }

    fn show_current(&mut self, ui: &mut Ui, state: &mut AppState) {
        let session = &state.session;
        let revision = session.thumbnail.as_ref().map(|_| session.thumbnail_revision());
        let stale = self.preview.update(revision, || {
            session.thumbnail.as_ref().map(|r| Arc::from(r.png.as_slice())).unwrap_or_else(|| Arc::from([]))
        });
        if let Some(uri) = stale {
            ui.ctx().forget_image(&uri);
        }

        let (Some(raster), Some((uri, bytes))) = (&session.thumbnail, self.preview.image()) else {
            return;
        };
        ui.separator();
        ui.label(format!("{} ({}x{})", t("thumb.current"), raster.width, raster.height));

        let width = ui.available_width().min(raster.width as f32);
        ui.add(
            egui::Image::from_bytes(uri, bytes)
                .fit_to_exact_size(egui::vec2(width, width * raster.height as f32 / raster.width.max(1) as f32)),
        );

        ui.horizontal(|ui| {
            if ui.button(t("thumb.save")).clicked() {
                toolbar::action_save_thumbnail(state);
            }
            if ui.button(t("thumb.copy_uri")).clicked() {
                toolbar::action_copy_data_uri(ui.ctx(), state);
            }
        });
    }

    fn show_canvas(&mut self, ui: &mut Ui, state: &mut AppState) {
        let texture = self.sync_texture(ui.ctx(), state);
        let (cw, ch) = state.session.canvas.size();

        let width = ui.available_width().max(1.0);
        let height = width * ch as f32 / cw.max(1) as f32;
        let (rect, response) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::drag());
        let mapping = SurfaceMapping::new(Vec2::new(width, height), cw, ch);

        handle_input(ui, &response, rect, &mapping, state);

        let painter = ui.painter_at(rect);
        painter.image(
            texture,
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let session = &state.session;
        if session.canvas.snapshot().is_none() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                t("thumb.empty"),
                egui::FontId::proportional(12.0),
                egui::Color32::from_rgb(90, 90, 100),
            );
        }

        let stroke = if session.interaction.activity.is_interacting() {
            egui::Stroke::new(2.0, ACCENT)
        } else {
            egui::Stroke::new(1.0, egui::Color32::from_gray(60))
        };
        painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Inside);

        ui.weak(t("thumb.hint"));
    }
}

fn handle_input(
    ui: &Ui,
    response: &egui::Response,
    rect: egui::Rect,
    mapping: &SurfaceMapping,
    state: &mut AppState,
) {
    let session = &mut state.session;
    let now = Instant::now();
    let to_surface = |pos: egui::Pos2| mapping.to_surface(Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y));

    if response.drag_started_by(egui::PointerButton::Primary) {
        if let Some(pos) = response.interact_pointer_pos() {
            session.pointer_down(Surface::Canvas, to_surface(pos), DragButton::Primary);
        }
    }

    if response.dragged() && session.interaction.is_dragging(Surface::Canvas) {
        if let Some(pos) = response.interact_pointer_pos() {
            if rect.contains(pos) {
                session.pointer_move(Surface::Canvas, to_surface(pos));
            } else {
                session.pointer_up(Surface::Canvas, now);
            }
        }
    }

    if response.drag_stopped() && session.interaction.is_dragging(Surface::Canvas) {
        session.pointer_up(Surface::Canvas, now);
    }

    if response.hovered() {
        // One scale step per wheel event, independent of scroll speed
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll != 0.0 {
            session.wheel(Surface::Canvas, scroll, now);
        }
    }
}

fn show_controls(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        let canvas = &state.session.canvas;
        let mut button = egui::Button::new(t("thumb.use"));
        if canvas.export_available() {
            button = button.fill(ACCENT);
        }
        if ui.add_enabled(canvas.snapshot().is_some(), button).clicked() {
            toolbar::action_use_snapshot(state);
        }
        if ui
            .add_enabled(!state.session.canvas.transform().is_identity(), egui::Button::new(t("thumb.reset")))
            .clicked()
        {
            toolbar::action_reset_view(state);
        }
    });

    let transform = state.session.canvas.transform();
    ui.monospace(format!(
        "x {:.0}  y {:.0}  ×{:.3}",
        transform.offset_x, transform.offset_y, transform.scale
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(b: &[u8]) -> impl FnOnce() -> Arc<[u8]> + '_ {
        move || Arc::from(b)
    }

    #[test]
    fn rebake_replaces_previous_uri() {
        let mut preview = PreviewBytes::default();
        assert_eq!(preview.update(Some(1), bytes(&[1])), None);
        let (first, _) = preview.image().unwrap();
        assert_eq!(first, "bytes://thumbnail-1.png");

        assert_eq!(preview.update(Some(2), bytes(&[2])), Some(first));
        assert_eq!(preview.image().unwrap().0, "bytes://thumbnail-2.png");
        assert_eq!(preview.update(None, bytes(&[])), Some("bytes://thumbnail-2.png".to_string()));
        assert!(preview.image().is_none());
    }

    #[test]
    fn same_revision_shares_bytes() {
        let mut preview = PreviewBytes::default();
        preview.update(Some(3), bytes(&[9, 9, 9]));
        let mut called = false;
        assert_eq!(preview.update(Some(3), || { called = true; Arc::from([]) }), None);
        assert!(!called);

        let (_, a) = preview.image().unwrap();
        let (_, b) = preview.image().unwrap();
        match (a, b) {
            (egui::load::Bytes::Shared(a), egui::load::Bytes::Shared(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected shared bytes"),
        }
    }
}
