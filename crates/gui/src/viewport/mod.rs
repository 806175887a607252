//! 3D viewport panel with offscreen OpenGL rendering

mod gl_renderer;
mod overlays;
pub use modelshot_gui_lib::viewport::{camera, indicator, mesh};

use std::sync::Arc;
use std::time::{Duration, Instant};

use egui::Ui;
use glam::Vec2;

use crate::i18n::t;
use crate::interaction::{DragButton, Surface, SurfaceMapping};
use crate::state::AppState;
use gl_renderer::{GlRenderer, GlSurface};

/// Flipped vertically: GL textures have their origin at the bottom-left
const GL_UV: egui::Rect = egui::Rect {
    min: egui::Pos2 { x: 0.0, y: 1.0 },
    max: egui::Pos2 { x: 1.0, y: 0.0 },
};

/// Textures registered with egui for the offscreen targets
struct Textures {
    surface: egui::TextureId,
    indicator: egui::TextureId,
}

/// 3D viewport panel
pub struct ViewportPanel {
    gl_renderer: Option<GlRenderer>,
    textures: Option<Textures>,
    last_frame: Option<Instant>,
}

impl ViewportPanel {
    pub fn new() -> Self {
        Self {
            gl_renderer: None,
            textures: None,
            last_frame: None,
        }
    }

    /// Initialize GL renderer (must be called with a GL context)
    pub fn init_gl(&mut self, gl: &glow::Context, state: &AppState) {
        let settings = &state.settings;
        match GlRenderer::new(gl, settings.viewport.surface_size, settings.indicator.size) {
            Ok(mut renderer) => {
                renderer.update_grid(gl, &settings.viewport);
                self.gl_renderer = Some(renderer);
            }
            Err(e) => tracing::error!("GL renderer unavailable: {e}"),
        }
    }

    /// Advance the session by one frame and render into the offscreen
    /// targets. Runs before any panel is laid out.
    pub fn prepare(&mut self, frame: &mut eframe::Frame, state: &mut AppState) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|prev| now.saturating_duration_since(prev))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);

        let Some(gl) = frame.gl().map(Arc::clone) else {
            state.session.interaction.activity.tick(now);
            state.session.apply_decoded();
            return;
        };
        let Some(renderer) = self.gl_renderer.as_mut() else {
            state.session.apply_decoded();
            return;
        };

        if self.textures.is_none() {
            self.textures = Some(Textures {
                surface: frame.register_native_glow_texture(renderer.texture()),
                indicator: frame.register_native_glow_texture(renderer.indicator_texture()),
            });
        }

        renderer.update_grid(&gl, &state.settings.viewport);
        let mut surface = GlSurface {
            gl: &gl,
            renderer: &mut *renderer,
        };
        state.session.tick(&mut surface, now, dt);

        if state.settings.indicator.visible {
            renderer.paint_indicator(&gl, &state.session.indicator);
        }
    }

    pub fn show(&mut self, ui: &mut Ui, state: &mut AppState) {
        let (Some(renderer), Some(textures)) = (&self.gl_renderer, &self.textures) else {
            ui.centered_and_justified(|ui| {
                ui.weak(t("vp.no_gl"));
            });
            return;
        };

        // Square surface, centered in the available space
        let available = ui.available_rect_before_wrap();
        let side = available.width().min(available.height()).max(1.0);
        let rect = egui::Rect::from_center_size(available.center(), egui::vec2(side, side));
        let response = ui.allocate_rect(rect, egui::Sense::click_and_drag());

        let surface_size = renderer.surface_size();
        let mapping = SurfaceMapping::new(Vec2::splat(side), surface_size, surface_size);
        self.handle_input(ui, &response, rect, &mapping, state);

        let painter = ui.painter_at(rect);
        painter.image(textures.surface, rect, GL_UV, egui::Color32::WHITE);

        if state.session.asset().is_none() {
            painter.text(
                egui::pos2(rect.center().x, rect.bottom() - 20.0),
                egui::Align2::CENTER_BOTTOM,
                t("vp.drop_hint"),
                egui::FontId::proportional(11.0),
                egui::Color32::from_rgb(100, 100, 110),
            );
        }

        if state.settings.indicator.visible {
            let size = state.settings.indicator.size as f32;
            let indicator_rect = egui::Rect::from_min_size(
                egui::pos2(rect.left() + 4.0, rect.bottom() - size - 4.0),
                egui::vec2(size, size),
            );
            painter.image(textures.indicator, indicator_rect, GL_UV, egui::Color32::WHITE);
            overlays::draw_indicator_labels(&painter, indicator_rect, &state.session.indicator);
        }

        if state.settings.viewport.show_camera_info {
            overlays::draw_camera_info(&painter, rect, &state.session.camera);
        }

        if state.session.interaction.activity.is_interacting() {
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(1.0, crate::app::styles::ACCENT),
                egui::StrokeKind::Inside,
            );
        }
    }

    fn handle_input(
        &self,
        ui: &Ui,
        response: &egui::Response,
        rect: egui::Rect,
        mapping: &SurfaceMapping,
        state: &mut AppState,
    ) {
        let session = &mut state.session;
        let now = Instant::now();
        let to_surface = |pos: egui::Pos2| mapping.to_surface(Vec2::new(pos.x - rect.min.x, pos.y - rect.min.y));

        if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                let button = if response.dragged_by(egui::PointerButton::Secondary)
                    || ui.input(|i| i.modifiers.shift)
                {
                    DragButton::Secondary
                } else {
                    DragButton::Primary
                };
                session.pointer_down(Surface::Viewport, to_surface(pos), button);
            }
        }

        if response.dragged() && session.interaction.is_dragging(Surface::Viewport) {
            if let Some(pos) = response.interact_pointer_pos() {
                if rect.contains(pos) {
                    session.pointer_move(Surface::Viewport, to_surface(pos));
                } else {
                    // Leaving the surface ends the gesture
                    session.pointer_up(Surface::Viewport, now);
                }
            }
        }

        if response.drag_stopped() && session.interaction.is_dragging(Surface::Viewport) {
            session.pointer_up(Surface::Viewport, now);
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                session.wheel(Surface::Viewport, scroll, now);
            }
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        if let Some(mut renderer) = self.gl_renderer.take() {
            renderer.destroy(gl);
        }
        self.textures = None;
    }
}
