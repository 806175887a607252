//! Composite canvas: the 2D surface where the latest capture is positioned
//! over optional alignment guides and a solid background, and from which the
//! export raster is baked.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use shared::{CompositeTransform, Rgb};

use crate::capture::{encode_png, DecodedSnapshot};
use crate::export::{ExportError, ExportRaster};

pub const DEFAULT_CANVAS_SIZE: u32 = 600;
pub const DEFAULT_GUIDE_OPACITY: f32 = 0.4;
/// Canonical background behind the snapshot in the interactive view
pub const DEFAULT_BACKGROUND: Rgb = [191, 191, 191];

/// Where the snapshot lands on the surface, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit `image_w`×`image_h` inside the surface preserving aspect, apply the
/// user scale, center it and displace it by the user offset.
pub fn draw_rect(
    surface_w: u32,
    surface_h: u32,
    image_w: u32,
    image_h: u32,
    transform: &CompositeTransform,
) -> DrawRect {
    let (sw, sh) = (surface_w as f32, surface_h as f32);
    let (iw, ih) = (image_w.max(1) as f32, image_h.max(1) as f32);
    let base_scale = (sw / iw).min(sh / ih);
    let scale = base_scale * transform.scale;
    let width = iw * scale;
    let height = ih * scale;
    DrawRect {
        x: (sw - width) / 2.0 + transform.offset_x,
        y: (sh - height) / 2.0 + transform.offset_y,
        width,
        height,
    }
}

/// Resized snapshot kept between renders while only the offset changes
struct ScaledSnapshot {
    sequence: u64,
    width: u32,
    height: u32,
    image: RgbaImage,
}

pub struct CompositeCanvas {
    surface: RgbaImage,
    snapshot: Option<DecodedSnapshot>,
    transform: CompositeTransform,
    /// Guide image, already resized to the surface and faded
    guide: Option<RgbaImage>,
    guide_opacity: f32,
    guides_enabled: bool,
    background: Rgb,
    last_rect: Option<DrawRect>,
    /// Set when the user has moved the model since the last bake
    export_available: bool,
    /// Bumped on every render so the UI knows to re-upload the texture
    revision: u64,
    scaled: Option<ScaledSnapshot>,
}

impl Default for CompositeCanvas {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)
    }
}

impl CompositeCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            surface: RgbaImage::new(width.max(1), height.max(1)),
            snapshot: None,
            transform: CompositeTransform::IDENTITY,
            guide: None,
            guide_opacity: DEFAULT_GUIDE_OPACITY,
            guides_enabled: true,
            background: DEFAULT_BACKGROUND,
            last_rect: None,
            export_available: false,
            revision: 0,
            scaled: None,
        };
        canvas.render_interactive();
        canvas
    }

    // ── Accessors ────────────────────────────────────────────

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn size(&self) -> (u32, u32) {
        self.surface.dimensions()
    }

    pub fn transform(&self) -> CompositeTransform {
        self.transform
    }

    pub fn snapshot(&self) -> Option<&DecodedSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn applied_sequence(&self) -> u64 {
        self.snapshot.as_ref().map_or(0, |s| s.sequence)
    }

    pub fn last_draw_rect(&self) -> Option<DrawRect> {
        self.last_rect
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_guide(&self) -> bool {
        self.guide.is_some()
    }

    pub fn export_available(&self) -> bool {
        self.export_available && self.snapshot.is_some()
    }

    pub fn mark_export_available(&mut self) {
        self.export_available = true;
    }

    // ── Mutation ─────────────────────────────────────────────

    /// Apply a decoded snapshot. Completions older than the applied one are
    /// discarded and `false` is returned. A snapshot of a different model
    /// resets the transform.
    pub fn set_snapshot(&mut self, decoded: DecodedSnapshot) -> bool {
        if let Some(current) = &self.snapshot {
            if decoded.sequence <= current.sequence {
                tracing::trace!(
                    "Discarding stale snapshot #{} (applied #{})",
                    decoded.sequence,
                    current.sequence
                );
                return false;
            }
            if decoded.model_generation != current.model_generation {
                self.transform = CompositeTransform::IDENTITY;
            }
        }
        self.snapshot = Some(decoded);
        self.render_interactive();
        true
    }

    /// Scale outside `[0.3, 3.0]` is clamped
    pub fn set_transform(&mut self, transform: CompositeTransform) {
        let clamped = transform.clamped();
        if clamped == self.transform {
            return;
        }
        self.transform = clamped;
        self.render_interactive();
    }

    /// Back to identity offset and scale
    pub fn reset_view(&mut self) {
        self.set_transform(CompositeTransform::IDENTITY);
    }

    pub fn set_guides_enabled(&mut self, enabled: bool) {
        if self.guides_enabled != enabled {
            self.guides_enabled = enabled;
            self.render_interactive();
        }
    }

    pub fn set_background(&mut self, color: Rgb) {
        if self.background != color {
            self.background = color;
            self.render_interactive();
        }
    }

    pub fn set_guide_opacity(&mut self, opacity: f32) {
        self.guide_opacity = opacity.clamp(0.0, 1.0);
    }

    /// Install (or remove) the alignment guide image
    pub fn set_guide(&mut self, guide: Option<RgbaImage>) {
        let (w, h) = self.size();
        self.guide = guide.map(|img| {
            let mut resized = imageops::resize(&img, w, h, FilterType::Triangle);
            fade(&mut resized, self.guide_opacity);
            resized
        });
        self.render_interactive();
    }

    /// Load the guide from disk. A missing or unreadable file leaves the
    /// canvas without a guide layer.
    pub fn load_guide(&mut self, path: &Path) -> bool {
        match image::open(path) {
            Ok(img) => {
                self.set_guide(Some(img.to_rgba8()));
                tracing::info!("Loaded guide image {}", path.display());
                true
            }
            Err(e) => {
                tracing::warn!("Guide image {} unavailable: {e}", path.display());
                self.set_guide(None);
                false
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────

    /// Redraw the interactive view: background on, guides when enabled
    pub fn render_interactive(&mut self) {
        self.render_composite(self.guides_enabled, true);
    }

    /// Recompose the surface from scratch
    pub fn render_composite(&mut self, include_guides: bool, include_background: bool) {
        let fill = if include_background {
            let [r, g, b] = self.background;
            Rgba([r, g, b, 255])
        } else {
            Rgba([0, 0, 0, 0])
        };
        for p in self.surface.pixels_mut() {
            *p = fill;
        }

        if include_guides {
            if let Some(guide) = &self.guide {
                imageops::overlay(&mut self.surface, guide, 0, 0);
            }
        }

        self.last_rect = None;
        if let Some(snapshot) = &self.snapshot {
            let (sw, sh) = self.surface.dimensions();
            let (iw, ih) = snapshot.image.dimensions();
            let rect = draw_rect(sw, sh, iw, ih, &self.transform);
            let w = rect.width.round().max(1.0) as u32;
            let h = rect.height.round().max(1.0) as u32;

            let cached = self
                .scaled
                .as_ref()
                .is_some_and(|s| s.sequence == snapshot.sequence && s.width == w && s.height == h);
            if !cached {
                let image = if (w, h) == (iw, ih) {
                    snapshot.image.clone()
                } else {
                    imageops::resize(&snapshot.image, w, h, FilterType::Triangle)
                };
                self.scaled = Some(ScaledSnapshot {
                    sequence: snapshot.sequence,
                    width: w,
                    height: h,
                    image,
                });
            }
            if let Some(scaled) = &self.scaled {
                imageops::overlay(
                    &mut self.surface,
                    &scaled.image,
                    rect.x.round() as i64,
                    rect.y.round() as i64,
                );
            }
            self.last_rect = Some(rect);
        }

        self.revision += 1;
    }

    /// Render without guides and background, encode the surface, then put the
    /// interactive view back. From the caller's side nothing changes.
    pub fn bake_export(&mut self) -> Result<ExportRaster, ExportError> {
        if self.snapshot.is_none() {
            return Err(ExportError::NoSnapshot);
        }
        self.render_composite(false, false);
        let encoded = encode_png(&self.surface);
        let (width, height) = self.surface.dimensions();
        self.render_interactive();

        let raster = ExportRaster::new(encoded?, width, height);
        self.export_available = false;
        tracing::info!("Baked thumbnail {width}x{height} ({} bytes)", raster.png.len());
        Ok(raster)
    }
}

/// Multiply alpha by `opacity`
fn fade(image: &mut RgbaImage, opacity: f32) {
    for p in image.pixels_mut() {
        p.0[3] = (p.0[3] as f32 * opacity).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_snapshot(seq: u64, generation: u64, size: u32) -> DecodedSnapshot {
        DecodedSnapshot {
            sequence: seq,
            model_generation: generation,
            image: RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255])),
        }
    }

    #[test]
    fn draw_rect_matches_reference_layout() {
        let t = CompositeTransform::new(10.0, -5.0, 2.0);
        let r = draw_rect(600, 600, 100, 100, &t);
        assert_eq!(r, DrawRect { x: -290.0, y: -305.0, width: 1200.0, height: 1200.0 });
    }

    #[test]
    fn baked_export_uses_reference_layout() {
        let mut c = CompositeCanvas::new(600, 600);
        c.set_snapshot(solid_snapshot(1, 1, 100));
        c.set_transform(CompositeTransform::new(10.0, -5.0, 2.0));
        let raster = c.bake_export().unwrap();

        assert_eq!((raster.width, raster.height), (600, 600));
        assert_eq!(
            c.last_draw_rect(),
            Some(DrawRect { x: -290.0, y: -305.0, width: 1200.0, height: 1200.0 })
        );
    }

    #[test]
    fn draw_rect_preserves_aspect() {
        let r = draw_rect(600, 600, 200, 100, &CompositeTransform::IDENTITY);
        assert_eq!(r.width, 600.0);
        assert_eq!(r.height, 300.0);
        assert_eq!(r.y, 150.0);
    }

    #[test]
    fn stale_snapshot_is_discarded() {
        let mut c = CompositeCanvas::new(50, 50);
        assert!(c.set_snapshot(solid_snapshot(5, 1, 10)));
        assert!(!c.set_snapshot(solid_snapshot(3, 1, 10)));
        assert_eq!(c.applied_sequence(), 5);
    }

    #[test]
    fn new_model_resets_transform() {
        let mut c = CompositeCanvas::new(50, 50);
        c.set_snapshot(solid_snapshot(1, 1, 10));
        c.set_transform(CompositeTransform::new(4.0, 4.0, 2.0));
        c.set_snapshot(solid_snapshot(2, 1, 10));
        assert_eq!(c.transform().scale, 2.0);
        c.set_snapshot(solid_snapshot(3, 2, 10));
        assert!(c.transform().is_identity());
    }

    #[test]
    fn set_transform_clamps() {
        let mut c = CompositeCanvas::new(10, 10);
        c.set_transform(CompositeTransform { offset_x: 0.0, offset_y: 0.0, scale: 9.0 });
        assert_eq!(c.transform().scale, shared::MAX_SCALE);
    }

    #[test]
    fn background_fills_interactive_view_only() {
        let mut c = CompositeCanvas::new(20, 20);
        c.set_snapshot(solid_snapshot(1, 1, 10));
        c.set_transform(CompositeTransform::new(0.0, 0.0, 0.5));
        assert_eq!(c.surface().get_pixel(0, 0).0, [191, 191, 191, 255]);
        assert_eq!(c.surface().get_pixel(10, 10).0, [255, 0, 0, 255]);

        c.render_composite(false, false);
        assert_eq!(c.surface().get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn bake_without_snapshot_fails() {
        let mut c = CompositeCanvas::new(10, 10);
        assert!(matches!(c.bake_export(), Err(ExportError::NoSnapshot)));
    }

    #[test]
    fn guide_is_faded_and_optional() {
        let mut c = CompositeCanvas::new(8, 8);
        c.set_guide(Some(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]))));
        assert!(c.has_guide());
        let with_guide = c.surface().get_pixel(0, 0).0;
        assert_ne!(with_guide, [191, 191, 191, 255]);

        c.set_guides_enabled(false);
        assert_eq!(c.surface().get_pixel(0, 0).0, [191, 191, 191, 255]);
    }

    #[test]
    fn missing_guide_degrades() {
        let mut c = CompositeCanvas::new(8, 8);
        assert!(!c.load_guide(Path::new("/nonexistent/guide.png")));
        assert!(!c.has_guide());
        assert_eq!(c.surface().get_pixel(0, 0).0, [191, 191, 191, 255]);
    }
}
