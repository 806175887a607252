//! Headless test harness: a [`ViewerSession`] driven against a CPU render
//! surface with a manual clock.

use std::time::{Duration, Instant};

use glam::{Mat4, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use shared::{Rgb, ViewerOptions};

use crate::asset::SceneAsset;
use crate::capture::{ClearMode, RenderSurface, SceneLayers};
use crate::framing::FramingResult;
use crate::interaction::{DragButton, Surface};
use crate::loader::{self, AssetMap, LoadError};
use crate::session::ViewerSession;
use crate::state::AppSettings;
use crate::viewport::bounds::Aabb;
use crate::viewport::camera::{project_point, CameraState};

/// Opaque clear color when the scene has no background
pub const DEFAULT_CLEAR: Rgb = [30, 30, 35];
pub const GRID_COLOR: Rgb = [90, 90, 90];
pub const MODEL_COLOR: Rgb = [200, 120, 40];

/// Software stand-in for the GL viewport. The model is drawn as the screen
/// rectangle covering its projected bounds; the grid as every eighth row of
/// the lower half.
pub struct HeadlessSurface {
    size: u32,
    layers: SceneLayers,
    clear: ClearMode,
    camera: CameraState,
    bounds: Option<Aabb>,
    generation: u64,
    options: ViewerOptions,
    frame: RgbaImage,
    /// Make `read_pixels` fail
    pub fail_readback: bool,
    /// Layers in effect for every rendered frame
    pub rendered_layers: Vec<SceneLayers>,
    /// Generations whose resources were released
    pub released: Vec<u64>,
}

impl HeadlessSurface {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            layers: SceneLayers {
                background: None,
                grid_visible: true,
                helpers_visible: false,
            },
            clear: ClearMode::Opaque,
            camera: CameraState {
                position: Vec3::new(0.0, 0.0, 10.0),
                target: Vec3::ZERO,
                near: 0.01,
                far: 1000.0,
                fov: 45.0_f32.to_radians(),
            },
            bounds: None,
            generation: 0,
            options: ViewerOptions::default(),
            frame: RgbaImage::new(size, size),
            fail_readback: false,
            rendered_layers: Vec::new(),
            released: Vec::new(),
        }
    }

    pub fn render_count(&self) -> usize {
        self.rendered_layers.len()
    }

    pub fn frame(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    fn model_rect(&self) -> Option<(Vec2, Vec2)> {
        let bounds = self.bounds?;
        let s = self.size as f32;
        let view = Mat4::look_at_rh(self.camera.position, self.camera.target, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(self.camera.fov, 1.0, self.camera.near, self.camera.far);
        let vp = proj * view;
        let mut lo = Vec2::splat(f32::MAX);
        let mut hi = Vec2::splat(f32::MIN);
        for corner in bounds.corners() {
            let p = project_point(vp, corner, s, s)?;
            lo = lo.min(p);
            hi = hi.max(p);
        }
        let (lo, hi) = (lo.max(Vec2::ZERO), hi.min(Vec2::splat(s - 1.0)));
        (lo.x <= hi.x && lo.y <= hi.y).then_some((lo, hi))
    }
}

impl RenderSurface for HeadlessSurface {
    fn sync_scene(&mut self, scene: Option<&SceneAsset>, generation: u64) {
        if generation == self.generation {
            return;
        }
        if self.bounds.is_some() {
            self.released.push(self.generation);
        }
        self.bounds = scene.map(SceneAsset::world_bounds).filter(|b| !b.is_empty());
        self.generation = generation;
    }

    fn apply_options(&mut self, options: &ViewerOptions) {
        self.options = options.clone();
    }

    fn is_ready(&self) -> bool {
        self.bounds.is_some() && self.size > 0
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.size, self.size)
    }

    fn scene_layers(&self) -> SceneLayers {
        self.layers
    }

    fn set_scene_layers(&mut self, layers: SceneLayers) {
        self.layers = layers;
    }

    fn clear_mode(&self) -> ClearMode {
        self.clear
    }

    fn set_clear_mode(&mut self, mode: ClearMode) {
        self.clear = mode;
    }

    fn camera_state(&self) -> CameraState {
        self.camera
    }

    fn set_camera_state(&mut self, state: &CameraState) {
        self.camera = *state;
    }

    fn render_frame(&mut self) {
        let clear = match self.clear {
            ClearMode::Transparent => Rgba([0, 0, 0, 0]),
            ClearMode::Opaque => {
                let [r, g, b] = self.layers.background.unwrap_or(DEFAULT_CLEAR);
                Rgba([r, g, b, 255])
            }
        };
        for p in self.frame.pixels_mut() {
            *p = clear;
        }

        if self.layers.grid_visible {
            let [r, g, b] = GRID_COLOR;
            for y in (self.size / 2..self.size).step_by(8) {
                for x in 0..self.size {
                    self.frame.put_pixel(x, y, Rgba([r, g, b, 255]));
                }
            }
        }

        if let Some((lo, hi)) = self.model_rect() {
            let [r, g, b] = MODEL_COLOR;
            for y in lo.y as u32..=hi.y as u32 {
                for x in lo.x as u32..=hi.x as u32 {
                    self.frame.put_pixel(x, y, Rgba([r, g, b, 255]));
                }
            }
        }

        self.rendered_layers.push(self.layers);
    }

    fn read_pixels(&mut self) -> Option<RgbaImage> {
        if self.fail_readback {
            return None;
        }
        Some(self.frame.clone())
    }
}

/// Headless viewer with a manually advanced clock
pub struct TestHarness {
    pub session: ViewerSession,
    pub surface: HeadlessSurface,
    now: Instant,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Default settings with a small surface and canvas for speed
    pub fn new() -> Self {
        let mut settings = AppSettings::default();
        settings.viewport.surface_size = 64;
        settings.composite.size = 64;
        Self::with_settings(&settings)
    }

    pub fn with_settings(settings: &AppSettings) -> Self {
        Self {
            session: ViewerSession::new(settings),
            surface: HeadlessSurface::new(settings.viewport.surface_size),
            now: Instant::now(),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    // ── Loading ───────────────────────────────────────────────

    pub fn load_asset(&mut self, name: &str, asset: SceneAsset) -> FramingResult {
        self.session.set_content(crate::fixtures::loaded(name, asset))
    }

    pub fn load_glb(&mut self, name: &str, bytes: &[u8]) -> Result<FramingResult, LoadError> {
        self.session.begin_load(name);
        match loader::load_bytes(bytes, name.to_string(), "", &AssetMap::new()) {
            Ok(loaded) => Ok(self.session.set_content(loaded)),
            Err(e) => {
                self.session.load_failed(&e);
                Err(e)
            }
        }
    }

    // ── Time ──────────────────────────────────────────────────

    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
    }

    /// Advance by `dt` and run one frame
    pub fn step(&mut self, dt: Duration) {
        self.advance(dt);
        self.session.tick(&mut self.surface, self.now, dt);
    }

    /// Run one frame without moving the clock
    pub fn tick(&mut self) {
        self.session.tick(&mut self.surface, self.now, Duration::ZERO);
    }

    /// Wait for every submitted capture to be decoded and applied
    pub fn settle(&mut self) {
        let target = self.session.capture.last_sequence();
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.session.canvas.applied_sequence() < target && Instant::now() < deadline {
            self.session.wait_for_snapshot(Duration::from_millis(50));
        }
    }

    // ── Gestures ──────────────────────────────────────────────

    /// Full press-move-release gesture
    pub fn drag(&mut self, surface: Surface, from: Vec2, to: Vec2) {
        self.session.pointer_down(surface, from, DragButton::Primary);
        self.session.pointer_move(surface, to);
        self.session.pointer_up(surface, self.now);
    }

    pub fn wheel(&mut self, surface: Surface, delta: f32) {
        self.session.wheel(surface, delta, self.now);
    }
}
