//! Capture pipeline: throttled transparent-background renders of the
//! viewport, read back as PNG snapshots.
//!
//! The save → strip → render → read back → restore sequence runs inside a
//! single call so no other tick can observe the stripped scene. Decoding the
//! PNG into a drawable bitmap is the only asynchronous step and happens on
//! the [`SnapshotDecoder`] worker.

use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;
use shared::{Rgb, ViewerOptions};

use crate::asset::SceneAsset;
use crate::viewport::camera::CameraState;

/// Default minimum spacing between captures
pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(100);

/// How the render surface is cleared before drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClearMode {
    #[default]
    Opaque,
    /// Clear color alpha is 0
    Transparent,
}

/// Scene elements a capture strips and restores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneLayers {
    /// Scene background; `None` shows the clear color
    pub background: Option<Rgb>,
    pub grid_visible: bool,
    /// Skeleton and other helper overlays drawn in the scene
    pub helpers_visible: bool,
}

impl SceneLayers {
    /// Everything stripped, as used during a capture
    pub const BARE: SceneLayers = SceneLayers {
        background: None,
        grid_visible: false,
        helpers_visible: false,
    };
}

/// A persistent square render target that the viewport draws into.
///
/// Every `render_frame` overwrites the surface; callers wanting a stable
/// copy read it back right away.
pub trait RenderSurface {
    /// Replace the displayed model when `generation` changed, releasing the
    /// previous model's resources first
    fn sync_scene(&mut self, scene: Option<&SceneAsset>, generation: u64);
    /// Lighting, exposure and display toggles
    fn apply_options(&mut self, options: &ViewerOptions);
    /// False until there is a model and a non-zero surface
    fn is_ready(&self) -> bool;
    fn surface_size(&self) -> (u32, u32);
    fn scene_layers(&self) -> SceneLayers;
    fn set_scene_layers(&mut self, layers: SceneLayers);
    fn clear_mode(&self) -> ClearMode;
    fn set_clear_mode(&mut self, mode: ClearMode);
    fn camera_state(&self) -> CameraState;
    fn set_camera_state(&mut self, state: &CameraState);
    fn render_frame(&mut self);
    /// Straight-alpha RGBA, top row first
    fn read_pixels(&mut self) -> Option<RgbaImage>;
}

/// One transparent render, encoded as PNG
#[derive(Debug, Clone)]
pub struct CaptureSnapshot {
    /// Increases with every executed capture
    pub sequence: u64,
    /// Generation of the model that was on screen
    pub model_generation: u64,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// A snapshot decoded into a drawable bitmap
#[derive(Debug, Clone)]
pub struct DecodedSnapshot {
    pub sequence: u64,
    pub model_generation: u64,
    pub image: RgbaImage,
}

/// Throttled, gated capture of a [`RenderSurface`]
pub struct CapturePipeline {
    throttle: Duration,
    last_capture: Option<Instant>,
    /// Armed by the first user interaction or successful load
    live: bool,
    next_sequence: u64,
}

impl Default for CapturePipeline {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE)
    }
}

impl CapturePipeline {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            last_capture: None,
            live: false,
            next_sequence: 1,
        }
    }

    pub fn set_throttle(&mut self, throttle: Duration) {
        self.throttle = throttle;
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Enable live updating
    pub fn arm(&mut self) {
        if !self.live {
            tracing::debug!("Live capture armed");
        }
        self.live = true;
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Sequence number of the most recent executed capture (0 if none)
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Capture a transparent frame if live, ready and outside the throttle
    /// window. Requests that arrive too early are dropped, never queued.
    pub fn request_capture<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        model_generation: u64,
        now: Instant,
    ) -> Option<CaptureSnapshot> {
        if !self.live {
            return None;
        }
        if let Some(last) = self.last_capture {
            if now.saturating_duration_since(last) < self.throttle {
                return None;
            }
        }
        if !surface.is_ready() {
            return None;
        }
        let (w, h) = surface.surface_size();
        if w == 0 || h == 0 {
            return None;
        }

        self.last_capture = Some(now);
        let pixels = capture_transparent_frame(surface)?;
        let png = match encode_png(&pixels) {
            Ok(png) => png,
            Err(e) => {
                tracing::debug!("Capture encode failed: {e}");
                return None;
            }
        };

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        tracing::trace!("Captured snapshot #{sequence} ({}x{})", pixels.width(), pixels.height());

        Some(CaptureSnapshot {
            sequence,
            model_generation,
            width: pixels.width(),
            height: pixels.height(),
            png,
        })
    }
}

/// Render `surface` once with background, grid and helpers stripped and a
/// transparent clear, read it back, then restore the previous state.
/// Restoration happens even when read-back fails.
pub fn capture_transparent_frame<S: RenderSurface + ?Sized>(surface: &mut S) -> Option<RgbaImage> {
    let saved_layers = surface.scene_layers();
    let saved_clear = surface.clear_mode();

    surface.set_scene_layers(SceneLayers::BARE);
    surface.set_clear_mode(ClearMode::Transparent);
    surface.render_frame();
    let pixels = surface.read_pixels();

    surface.set_scene_layers(saved_layers);
    surface.set_clear_mode(saved_clear);
    pixels
}

/// Encode RGBA pixels to PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());
    pixels.write_to(&mut buf, image::ImageFormat::Png)?;
    Ok(buf.into_inner())
}

/// Decode a snapshot synchronously
pub fn decode_snapshot(snapshot: &CaptureSnapshot) -> Result<DecodedSnapshot, image::ImageError> {
    let image = image::load_from_memory_with_format(&snapshot.png, image::ImageFormat::Png)?.to_rgba8();
    Ok(DecodedSnapshot {
        sequence: snapshot.sequence,
        model_generation: snapshot.model_generation,
        image,
    })
}

/// Background PNG decoder. Completions are collected with [`SnapshotDecoder::poll`]
/// on the UI thread; ordering between completions is not guaranteed.
pub struct SnapshotDecoder {
    jobs: Option<Sender<CaptureSnapshot>>,
    results: Receiver<DecodedSnapshot>,
    /// Used to decode inline when the worker could not be started
    inline: Sender<DecodedSnapshot>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Default for SnapshotDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotDecoder {
    pub fn new() -> Self {
        let (job_tx, job_rx) = mpsc::channel::<CaptureSnapshot>();
        let (result_tx, result_rx) = mpsc::channel();
        let inline = result_tx.clone();

        let worker = thread::Builder::new()
            .name("snapshot-decoder".into())
            .spawn(move || {
                for snapshot in job_rx {
                    match decode_snapshot(&snapshot) {
                        Ok(decoded) => {
                            if result_tx.send(decoded).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::debug!("Snapshot #{} decode failed: {e}", snapshot.sequence),
                    }
                }
            })
            .map_err(|e| tracing::error!("Failed to start snapshot decoder: {e}"))
            .ok();

        Self {
            jobs: Some(job_tx),
            results: result_rx,
            inline,
            worker,
        }
    }

    /// Queue a snapshot for decoding
    pub fn submit(&self, snapshot: CaptureSnapshot) {
        if self.worker.is_none() {
            if let Ok(decoded) = decode_snapshot(&snapshot) {
                let _ = self.inline.send(decoded);
            }
            return;
        }
        if let Some(jobs) = &self.jobs {
            let _ = jobs.send(snapshot);
        }
    }

    /// All completions since the last poll
    pub fn poll(&self) -> Vec<DecodedSnapshot> {
        self.results.try_iter().collect()
    }

    /// Wait up to `timeout` for the next completion
    pub fn wait(&self, timeout: Duration) -> Option<DecodedSnapshot> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for SnapshotDecoder {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(seq: u64) -> CaptureSnapshot {
        let img = RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 0]));
        CaptureSnapshot {
            sequence: seq,
            model_generation: 1,
            width: 4,
            height: 2,
            png: encode_png(&img).unwrap(),
        }
    }

    #[test]
    fn png_keeps_alpha() {
        let decoded = decode_snapshot(&snapshot(1)).unwrap();
        assert_eq!(decoded.image.dimensions(), (4, 2));
        assert_eq!(decoded.image.get_pixel(0, 0).0, [10, 20, 30, 0]);
    }

    #[test]
    fn decoder_worker_delivers() {
        let decoder = SnapshotDecoder::new();
        decoder.submit(snapshot(7));
        let done = decoder.wait(Duration::from_secs(5)).expect("decode completion");
        assert_eq!(done.sequence, 7);
        assert!(decoder.poll().is_empty());
    }

    #[test]
    fn corrupt_png_is_dropped() {
        let decoder = SnapshotDecoder::new();
        let mut bad = snapshot(1);
        bad.png.truncate(8);
        decoder.submit(bad);
        decoder.submit(snapshot(2));
        let done = decoder.wait(Duration::from_secs(5)).expect("second decode");
        assert_eq!(done.sequence, 2);
    }

    #[test]
    fn pipeline_starts_disarmed() {
        let p = CapturePipeline::default();
        assert!(!p.is_live());
        assert_eq!(p.last_sequence(), 0);
        assert_eq!(p.throttle(), DEFAULT_THROTTLE);
    }
}
