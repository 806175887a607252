//! Main application module

mod keyboard;
mod menus;
pub(crate) mod styles;

use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;

use crate::i18n::set_lang;
use crate::state::{AppSettings, AppState};
use crate::ui::{options_panel, status_bar, thumbnail_panel, toolbar};
use crate::viewport::ViewportPanel;

/// Polling interval for decodes finishing off the UI thread
const IDLE_REPAINT: Duration = Duration::from_millis(50);

/// Main application
pub struct ModelshotApp {
    state: AppState,
    viewport: ViewportPanel,
    thumbnail: thumbnail_panel::ThumbnailPanel,
    /// Last applied font size (to detect changes)
    last_font_size: f32,
    /// Last saved settings version
    last_saved_version: u64,
}

impl ModelshotApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_model: Option<PathBuf>) -> Self {
        let settings = AppSettings::load();
        set_lang(settings.ui.language);

        // Apply initial styles with font size from settings
        styles::configure_styles(&cc.egui_ctx, settings.ui.font_size);
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let mut state = AppState::new(settings);

        let mut viewport = ViewportPanel::new();

        // Initialize GL renderer if glow context is available
        if let Some(gl) = cc.gl.as_ref() {
            viewport.init_gl(gl, &state);
        } else {
            tracing::warn!("No glow context; the 3D viewport is disabled");
        }

        if let Some(path) = initial_model {
            if let Err(e) = state.session.open_path(&path) {
                tracing::error!("Failed to open {}: {e}", path.display());
            }
        }

        let last_font_size = state.settings.ui.font_size;
        let last_saved_version = state.settings_version();

        Self {
            state,
            viewport,
            thumbnail: thumbnail_panel::ThumbnailPanel::default(),
            last_font_size,
            last_saved_version,
        }
    }
}

impl eframe::App for ModelshotApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        // Apply font size if changed
        if self.state.settings.ui.font_size != self.last_font_size {
            styles::apply_font_size(ctx, self.state.settings.ui.font_size);
            self.last_font_size = self.state.settings.ui.font_size;
        }

        keyboard::handle_keyboard(ctx, &mut self.state);

        // Render and capture before layout so the panels show this frame
        self.viewport.prepare(frame, &mut self.state);

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.state);
                menus::view_menu(ui, &mut self.state);
                menus::settings_menu(ui, &mut self.state);
            });
        });

        // ── Settings window ──────────────────────────────────
        menus::settings_window(ctx, &mut self.state);

        // ── Toolbar ───────────────────────────────────────────
        egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 4)),
            )
            .show(ctx, |ui| {
                toolbar::show(ui, &mut self.state);
            });

        // ── Status bar ───────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(22.0)
            .frame(
                egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
            )
            .show(ctx, |ui| {
                status_bar::show(ui, &self.state);
            });

        // ── Left panel: viewer options ───────────────────────
        if self.state.panels.options {
            egui::SidePanel::left("options_panel")
                .default_width(240.0)
                .width_range(180.0..=400.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    options_panel::show(ui, &mut self.state);
                });
        }

        // ── Right panel: thumbnail composite ─────────────────
        if self.state.panels.thumbnail {
            egui::SidePanel::right("thumbnail_panel")
                .default_width(320.0)
                .width_range(220.0..=640.0)
                .resizable(true)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)),
                )
                .show(ctx, |ui| {
                    self.thumbnail.show(ui, &mut self.state);
                });
        }

        // ── Central panel: 3D viewport ───────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state);
            });

        // Persist settings if changed
        let version = self.state.settings_version();
        if version != self.last_saved_version {
            self.state.settings.save();
            self.last_saved_version = version;
        }

        let animating = self.state.session.options().auto_rotate && self.state.session.asset().is_some();
        if animating || self.state.session.interaction.activity.is_interacting() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(IDLE_REPAINT);
        }
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl {
            self.viewport.destroy(gl);
        }
        self.state.settings.save();
    }
}
