//! Viewer session: everything the running viewer mutates, in one place.
//!
//! The app controller owns a single [`ViewerSession`] and drives it once per
//! frame with [`ViewerSession::tick`]; gestures and menu commands go through
//! its methods so the camera, capture pipeline and composite canvas stay
//! consistent with each other.

use std::path::Path;
use std::time::{Duration, Instant};

use glam::Vec2;
use shared::ViewerOptions;

use crate::asset::SceneAsset;
use crate::capture::{CapturePipeline, RenderSurface, SceneLayers, SnapshotDecoder};
use crate::composite::CompositeCanvas;
use crate::export::{ExportError, ExportRaster};
use crate::framing::{self, FramingResult};
use crate::interaction::{DragButton, Effect, InteractionTracker, Surface};
use crate::loader::{self, LoadError, LoadedAsset};
use crate::state::AppSettings;
use crate::viewport::camera::OrbitCamera;
use crate::viewport::indicator::OrientationIndicator;

/// Message for the status bar
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    #[default]
    Empty,
    Loading(String),
    Loaded(String),
    Error(String),
    Info(String),
}

pub struct ViewerSession {
    asset: Option<SceneAsset>,
    asset_name: Option<String>,
    /// Bumped on every successful load
    model_generation: u64,
    framing: Option<FramingResult>,
    pub camera: OrbitCamera,
    pub indicator: OrientationIndicator,
    pub capture: CapturePipeline,
    pub decoder: SnapshotDecoder,
    pub canvas: CompositeCanvas,
    pub interaction: InteractionTracker,
    options: ViewerOptions,
    /// Last baked thumbnail
    pub thumbnail: Option<ExportRaster>,
    /// Bumped on every bake
    thumbnail_revision: u64,
    pub status: Status,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new(&AppSettings::default())
    }
}

impl ViewerSession {
    pub fn new(settings: &AppSettings) -> Self {
        let mut canvas = CompositeCanvas::new(settings.composite.size, settings.composite.size);
        canvas.set_background(settings.composite.background);
        canvas.set_guide_opacity(settings.composite.guide_opacity);
        canvas.set_guides_enabled(settings.options.grid);
        if let Some(path) = &settings.composite.guide_path {
            canvas.load_guide(path);
        }

        Self {
            asset: None,
            asset_name: None,
            model_generation: 0,
            framing: None,
            camera: OrbitCamera::new(),
            indicator: OrientationIndicator::new(settings.indicator.distance, settings.indicator.size),
            capture: CapturePipeline::new(settings.capture.throttle()),
            decoder: SnapshotDecoder::new(),
            canvas,
            interaction: InteractionTracker::default(),
            options: settings.options.clone(),
            thumbnail: None,
            thumbnail_revision: 0,
            status: Status::Empty,
        }
    }

    // ── Accessors ────────────────────────────────────────────

    pub fn asset(&self) -> Option<&SceneAsset> {
        self.asset.as_ref()
    }

    pub fn asset_name(&self) -> Option<&str> {
        self.asset_name.as_deref()
    }

    pub fn model_generation(&self) -> u64 {
        self.model_generation
    }

    pub fn framing(&self) -> Option<&FramingResult> {
        self.framing.as_ref()
    }

    pub fn thumbnail_revision(&self) -> u64 {
        self.thumbnail_revision
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    /// Scene layers implied by the current options
    pub fn scene_layers(&self) -> SceneLayers {
        SceneLayers {
            background: self.options.environment.background(),
            grid_visible: self.options.grid,
            helpers_visible: self.options.skeleton,
        }
    }

    // ── Loading ──────────────────────────────────────────────

    pub fn begin_load(&mut self, name: &str) {
        self.status = Status::Loading(name.to_string());
    }

    /// Attach a loaded model: frame it, fit the camera and arm live capture.
    /// The previous asset is dropped wholesale.
    pub fn set_content(&mut self, loaded: LoadedAsset) -> FramingResult {
        let LoadedAsset { name, mut asset } = loaded;
        let framing = framing::frame(&mut asset);
        self.camera.apply_framing(&framing);
        self.indicator.sync(self.camera.eye_position());

        self.asset = Some(asset);
        self.asset_name = Some(name.clone());
        self.framing = Some(framing);
        self.model_generation += 1;
        self.capture.arm();
        self.status = Status::Loaded(name);
        framing
    }

    /// Report a failed load. The current asset, if any, stays on screen.
    pub fn load_failed(&mut self, error: &LoadError) {
        tracing::warn!("Model load failed: {error}");
        self.status = Status::Error(error.to_string());
    }

    /// Load a model from disk and attach it
    pub fn open_path(&mut self, path: &Path) -> Result<FramingResult, LoadError> {
        self.begin_load(&path.display().to_string());
        match loader::load_path(path) {
            Ok(loaded) => Ok(self.set_content(loaded)),
            Err(e) => {
                self.load_failed(&e);
                Err(e)
            }
        }
    }

    // ── Options ──────────────────────────────────────────────

    pub fn set_options(&mut self, options: ViewerOptions) {
        self.canvas.set_guides_enabled(options.grid);
        self.options = options;
    }

    // ── Gestures ─────────────────────────────────────────────

    /// `pointer` is in surface pixels
    pub fn pointer_down(&mut self, surface: Surface, pointer: Vec2, button: DragButton) {
        let transform = self.canvas.transform();
        self.interaction.pointer_down(surface, pointer, button, &transform);
    }

    pub fn pointer_move(&mut self, surface: Surface, pointer: Vec2) {
        let transform = self.canvas.transform();
        let effect = self.interaction.pointer_move(surface, pointer, &transform);
        self.apply(effect);
    }

    /// Pointer released or left `surface`
    pub fn pointer_up(&mut self, surface: Surface, now: Instant) {
        self.interaction.pointer_up(surface, now);
    }

    pub fn wheel(&mut self, surface: Surface, delta: f32, now: Instant) {
        let transform = self.canvas.transform();
        let effect = self.interaction.wheel(surface, delta, &transform, now);
        self.apply(effect);
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => return,
            Effect::Orbit(d) => self.camera.rotate(d.x, d.y),
            Effect::Pan(d) => self.camera.pan(d.x, d.y),
            Effect::Dolly(amount) => self.camera.zoom(amount),
            Effect::Transform(t) => self.canvas.set_transform(t),
        }
        if effect.moves_camera() {
            self.capture.arm();
            self.canvas.mark_export_available();
        }
    }

    // ── Commands ─────────────────────────────────────────────

    /// Bake the composite into the current thumbnail
    pub fn use_snapshot(&mut self) -> Result<&ExportRaster, ExportError> {
        match self.canvas.bake_export() {
            Ok(raster) => {
                self.status = Status::Info(format!("{}x{}", raster.width, raster.height));
                self.thumbnail_revision += 1;
                Ok(self.thumbnail.insert(raster))
            }
            Err(e) => {
                self.status = Status::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Identity offset and scale on the thumbnail canvas
    pub fn reset_view(&mut self) {
        self.canvas.reset_view();
    }

    /// Back to the framed starting view
    pub fn reset_camera(&mut self) {
        self.camera = OrbitCamera::new();
        if let Some(framing) = &self.framing {
            self.camera.apply_framing(framing);
        }
    }

    // ── Frame loop ───────────────────────────────────────────

    /// One frame: advance timers and camera, render, maybe capture, and
    /// apply any finished decodes.
    pub fn tick<S: RenderSurface + ?Sized>(&mut self, surface: &mut S, now: Instant, dt: Duration) {
        self.interaction.activity.tick(now);

        if self.options.auto_rotate && self.asset.is_some() {
            self.camera.advance_auto_rotate(dt.as_secs_f32());
        }
        self.indicator.sync(self.camera.eye_position());

        surface.sync_scene(self.asset.as_ref(), self.model_generation);
        surface.apply_options(&self.options);
        surface.set_scene_layers(self.scene_layers());
        surface.set_camera_state(&self.camera.state());

        // Capture first so the frame left on the surface is the displayed one
        if let Some(snapshot) = self.capture.request_capture(surface, self.model_generation, now) {
            self.decoder.submit(snapshot);
        }
        surface.render_frame();
        self.apply_decoded();
    }

    /// Hand finished decodes to the canvas; returns how many were applied
    pub fn apply_decoded(&mut self) -> usize {
        let mut applied = 0;
        for decoded in self.decoder.poll() {
            if self.canvas.set_snapshot(decoded) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until one decode completes and apply it
    pub fn wait_for_snapshot(&mut self, timeout: Duration) -> bool {
        match self.decoder.wait(timeout) {
            Some(decoded) => self.canvas.set_snapshot(decoded),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SceneNode;
    use crate::viewport::mesh::cuboid;
    use glam::Vec3;

    fn loaded_box() -> LoadedAsset {
        let root = SceneNode::new("root").with_child(SceneNode::new("box").with_mesh(0));
        LoadedAsset {
            name: "box.glb".into(),
            asset: SceneAsset::new(root, vec![cuboid(Vec3::ZERO, Vec3::splat(2.0), [1.0; 3])]),
        }
    }

    #[test]
    fn set_content_arms_capture_and_bumps_generation() {
        let mut s = ViewerSession::default();
        assert!(!s.capture.is_live());
        s.set_content(loaded_box());
        assert!(s.capture.is_live());
        assert_eq!(s.model_generation(), 1);
        assert_eq!(s.status, Status::Loaded("box.glb".into()));
        assert_eq!(s.camera.near, s.framing().unwrap().camera_near);
    }

    #[test]
    fn failed_load_keeps_previous_asset() {
        let mut s = ViewerSession::default();
        s.set_content(loaded_box());
        let err = s.open_path(Path::new("/missing/model.glb")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(s.asset().is_some());
        assert_eq!(s.model_generation(), 1);
        assert!(matches!(s.status, Status::Error(_)));
    }

    #[test]
    fn viewport_drag_arms_capture() {
        let mut s = ViewerSession::default();
        let yaw = s.camera.yaw;
        s.pointer_down(Surface::Viewport, Vec2::ZERO, DragButton::Primary);
        s.pointer_move(Surface::Viewport, Vec2::new(20.0, 0.0));
        assert!(s.capture.is_live());
        assert!(s.camera.yaw > yaw);
    }

    #[test]
    fn canvas_drag_moves_transform_only() {
        let mut s = ViewerSession::default();
        s.pointer_down(Surface::Canvas, Vec2::new(5.0, 5.0), DragButton::Primary);
        s.pointer_move(Surface::Canvas, Vec2::new(15.0, 0.0));
        assert_eq!(s.canvas.transform().offset(), [10.0, -5.0]);
        assert!(!s.capture.is_live());
    }

    #[test]
    fn grid_option_toggles_guides() {
        let mut s = ViewerSession::default();
        let mut options = s.options().clone();
        options.grid = false;
        s.set_options(options);
        assert!(!s.scene_layers().grid_visible);
    }

    #[test]
    fn use_snapshot_without_capture_errors() {
        let mut s = ViewerSession::default();
        assert!(s.use_snapshot().is_err());
        assert!(s.thumbnail.is_none());
    }
}
