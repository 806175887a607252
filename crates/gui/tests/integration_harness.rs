//! End-to-end tests for the headless viewer: load, frame, capture, compose
//! and bake, driven through `TestHarness` with a manual clock.

use std::time::Duration;

use glam::Vec2;
use image::Rgba;
use modelshot_gui_lib::capture::{ClearMode, RenderSurface, SceneLayers};
use modelshot_gui_lib::composite::DrawRect;
use modelshot_gui_lib::fixtures::{offset_pair, reference_box, reference_box_glb, skinned_chain};
use modelshot_gui_lib::harness::{TestHarness, MODEL_COLOR};
use modelshot_gui_lib::interaction::{DragButton, Surface};
use modelshot_gui_lib::session::Status;
use shared::{CompositeTransform, MAX_SCALE, MIN_SCALE};

const FRAME: Duration = Duration::from_millis(16);

fn loaded_harness() -> TestHarness {
    let mut h = TestHarness::new();
    h.load_glb("box.glb", &reference_box_glb()).unwrap();
    h.tick();
    h.settle();
    h
}

#[test]
fn test_load_frames_reference_box() {
    let mut h = TestHarness::new();
    let framing = h.load_glb("box.glb", &reference_box_glb()).unwrap();

    assert!((framing.scale - 1.25).abs() < 1e-5);
    assert_eq!(h.session.status, Status::Loaded("box.glb".into()));
    assert_eq!(h.session.model_generation(), 1);

    let bounds = h.session.asset().unwrap().world_bounds();
    assert!(bounds.min.y.abs() < 1e-4);
    assert!(bounds.center().x.abs() < 1e-4);
    assert!(bounds.center().z.abs() < 1e-4);
    assert!((bounds.max_dimension() - 5.0).abs() < 1e-3);
    assert_eq!(h.session.camera.near, framing.camera_near);
}

#[test]
fn test_first_tick_captures_and_applies_snapshot() {
    let h = loaded_harness();
    assert_eq!(h.session.capture.last_sequence(), 1);
    assert_eq!(h.session.canvas.applied_sequence(), 1);

    let snapshot = h.session.canvas.snapshot().unwrap();
    assert_eq!(snapshot.model_generation, 1);
    assert_eq!(snapshot.image.dimensions(), (64, 64));
}

#[test]
fn test_snapshot_is_transparent_outside_model() {
    let h = loaded_harness();
    let image = &h.session.canvas.snapshot().unwrap().image;
    let [r, g, b] = MODEL_COLOR;

    // Only model pixels survive: no background, no grid
    for p in image.pixels() {
        assert!(
            p.0[3] == 0 || *p == Rgba([r, g, b, 255]),
            "unexpected pixel {p:?}"
        );
    }
    assert_eq!(*image.get_pixel(32, 32), Rgba([r, g, b, 255]));
}

#[test]
fn test_displayed_frame_is_opaque_after_capture() {
    let mut h = TestHarness::new();
    h.load_asset("box", reference_box());
    h.tick();

    // Capture pass plus the displayed frame
    assert_eq!(h.surface.render_count(), 2);
    assert!(h.surface.frame().pixels().all(|p| p.0[3] == 255));

    // Throttled tick renders the display frame only
    h.tick();
    assert_eq!(h.surface.render_count(), 3);
}

#[test]
fn test_snapshot_fills_matching_canvas() {
    let h = loaded_harness();
    assert_eq!(
        h.session.canvas.last_draw_rect(),
        Some(DrawRect {
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 64.0,
        })
    );
}

#[test]
fn test_nothing_captured_before_load() {
    let mut h = TestHarness::new();
    for _ in 0..5 {
        h.step(Duration::from_millis(200));
    }
    assert_eq!(h.session.capture.last_sequence(), 0);
    assert!(h.session.canvas.snapshot().is_none());
}

#[test]
fn test_throttle_collapses_burst() {
    let mut h = loaded_harness();

    // Many frames and gestures inside one throttle window
    for i in 0..5 {
        h.drag(Surface::Viewport, Vec2::ZERO, Vec2::new(4.0 + i as f32, 0.0));
        h.step(Duration::from_millis(10));
    }
    assert_eq!(h.session.capture.last_sequence(), 1);

    // Past the window a single new capture runs
    h.advance(Duration::from_millis(100));
    h.tick();
    h.tick();
    assert_eq!(h.session.capture.last_sequence(), 2);
}

#[test]
fn test_spaced_requests_each_capture() {
    let mut h = loaded_harness();
    for _ in 0..3 {
        h.step(Duration::from_millis(120));
    }
    assert_eq!(h.session.capture.last_sequence(), 4);
    h.settle();
    assert_eq!(h.session.canvas.applied_sequence(), 4);
}

#[test]
fn test_capture_restores_layers_with_grid_on() {
    let mut h = loaded_harness();
    let expected = h.session.scene_layers();
    assert!(expected.grid_visible);
    assert!(expected.background.is_some());

    h.step(Duration::from_millis(150));
    assert_eq!(h.surface.scene_layers(), expected);
    assert_eq!(h.surface.clear_mode(), ClearMode::Opaque);
    // The bare pass happened, and the displayed frame came after it
    assert!(h.surface.rendered_layers.contains(&SceneLayers::BARE));
    assert_eq!(h.surface.rendered_layers.last(), Some(&expected));
}

#[test]
fn test_capture_restores_layers_with_grid_off() {
    let mut h = TestHarness::new();
    let mut options = h.session.options().clone();
    options.grid = false;
    h.session.set_options(options);
    h.load_asset("box", reference_box());
    h.tick();

    let layers = h.surface.scene_layers();
    assert!(!layers.grid_visible);
    assert_eq!(layers, h.session.scene_layers());
    assert_eq!(h.surface.clear_mode(), ClearMode::Opaque);
    assert_eq!(h.session.capture.last_sequence(), 1);
}

#[test]
fn test_failed_readback_still_restores() {
    let mut h = TestHarness::new();
    h.surface.fail_readback = true;
    h.load_asset("box", reference_box());
    h.tick();

    assert_eq!(h.session.capture.last_sequence(), 0);
    assert_eq!(h.surface.scene_layers(), h.session.scene_layers());
    assert_eq!(h.surface.clear_mode(), ClearMode::Opaque);
}

#[test]
fn test_viewport_drag_rearms_and_marks_export() {
    let mut h = loaded_harness();
    let yaw = h.session.camera.yaw;
    assert!(!h.session.canvas.export_available());

    h.drag(Surface::Viewport, Vec2::new(10.0, 10.0), Vec2::new(40.0, 10.0));
    assert!(h.session.camera.yaw > yaw);
    assert!(h.session.canvas.export_available());

    h.step(Duration::from_millis(150));
    h.settle();
    assert_eq!(h.session.canvas.applied_sequence(), 2);
}

#[test]
fn test_canvas_offset_round_trip() {
    let mut h = loaded_harness();
    let a = Vec2::new(12.0, 20.0);
    let b = Vec2::new(47.5, -3.25);

    h.session.pointer_down(Surface::Canvas, a, DragButton::Primary);
    h.session.pointer_move(Surface::Canvas, b);
    assert_eq!(h.session.canvas.transform().offset(), [35.5, -23.25]);
    h.session.pointer_move(Surface::Canvas, a);
    h.session.pointer_up(Surface::Canvas, h.now());

    assert_eq!(h.session.canvas.transform(), CompositeTransform::IDENTITY);
}

#[test]
fn test_canvas_scale_stays_clamped() {
    let mut h = loaded_harness();
    for _ in 0..200 {
        h.wheel(Surface::Canvas, 120.0);
    }
    assert_eq!(h.session.canvas.transform().scale, MAX_SCALE);

    for _ in 0..400 {
        h.wheel(Surface::Canvas, -3.0);
    }
    assert_eq!(h.session.canvas.transform().scale, MIN_SCALE);

    // Mixed sequences never escape the range
    for i in 0..300 {
        h.wheel(Surface::Canvas, if i % 3 == 0 { -1.0 } else { 1.0 });
        let s = h.session.canvas.transform().scale;
        assert!((MIN_SCALE..=MAX_SCALE).contains(&s));
    }
}

#[test]
fn test_canvas_gestures_do_not_capture() {
    let mut h = loaded_harness();
    h.drag(Surface::Canvas, Vec2::ZERO, Vec2::new(5.0, 5.0));
    h.wheel(Surface::Canvas, 1.0);
    assert!(!h.session.canvas.export_available());
    h.step(Duration::from_millis(150));
    // Live capture keeps running once armed, gestures add nothing extra
    assert_eq!(h.session.capture.last_sequence(), 2);
}

#[test]
fn test_bake_leaves_interactive_view_untouched() {
    let mut h = loaded_harness();
    h.drag(Surface::Canvas, Vec2::ZERO, Vec2::new(6.0, -4.0));
    h.wheel(Surface::Canvas, 1.0);

    let before = h.session.canvas.surface().clone();
    let transform = h.session.canvas.transform();
    let sequence = h.session.canvas.applied_sequence();

    let raster = h.session.use_snapshot().unwrap().clone();

    assert_eq!(h.session.canvas.surface(), &before);
    assert_eq!(h.session.canvas.transform(), transform);
    assert_eq!(h.session.canvas.applied_sequence(), sequence);
    assert_eq!((raster.width, raster.height), (64, 64));
    assert_eq!(h.session.thumbnail_revision(), 1);

    // Export is bare: no canvas background
    let exported = raster.decode().unwrap();
    assert!(exported.pixels().any(|p| p.0[3] == 0));
    assert!(before.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn test_bake_clears_export_hint() {
    let mut h = loaded_harness();
    h.drag(Surface::Viewport, Vec2::ZERO, Vec2::new(20.0, 0.0));
    assert!(h.session.canvas.export_available());
    h.session.use_snapshot().unwrap();
    assert!(!h.session.canvas.export_available());
}

#[test]
fn test_reload_resets_transform_and_releases_old_model() {
    let mut h = loaded_harness();
    h.drag(Surface::Canvas, Vec2::ZERO, Vec2::new(9.0, 9.0));
    assert!(!h.session.canvas.transform().is_identity());

    h.load_asset("pair", offset_pair());
    h.advance(Duration::from_millis(150));
    h.tick();
    h.settle();

    assert_eq!(h.surface.released, vec![1]);
    let snapshot = h.session.canvas.snapshot().unwrap();
    assert_eq!(snapshot.model_generation, 2);
    assert!(h.session.canvas.transform().is_identity());
}

#[test]
fn test_failed_load_keeps_current_model() {
    let mut h = loaded_harness();
    assert!(h.load_glb("broken.glb", b"glTF but not really").is_err());
    assert!(matches!(h.session.status, Status::Error(_)));
    assert_eq!(h.session.model_generation(), 1);

    h.step(Duration::from_millis(150));
    assert!(h.surface.released.is_empty());
}

#[test]
fn test_auto_rotate_advances_yaw_and_recaptures() {
    let mut h = loaded_harness();
    let mut options = h.session.options().clone();
    options.auto_rotate = true;
    h.session.set_options(options);

    let yaw = h.session.camera.yaw;
    h.step(Duration::from_millis(500));
    assert!(h.session.camera.yaw > yaw);
    assert_eq!(h.surface.camera_state().position, h.session.camera.eye_position());
}

#[test]
fn test_interaction_activity_cools_down() {
    let mut h = loaded_harness();
    h.session.pointer_down(Surface::Viewport, Vec2::ZERO, DragButton::Primary);
    assert!(h.session.interaction.activity.is_interacting());
    h.session.pointer_up(Surface::Viewport, h.now());

    h.step(Duration::from_millis(100));
    assert!(h.session.interaction.activity.is_interacting());
    for _ in 0..20 {
        h.step(FRAME);
    }
    assert!(!h.session.interaction.activity.is_interacting());
}

#[test]
fn test_skeleton_is_stripped_from_capture() {
    let mut h = TestHarness::new();
    let mut options = h.session.options().clone();
    options.skeleton = true;
    h.session.set_options(options);

    let asset = skinned_chain();
    // base -> mid -> tip
    assert_eq!(asset.skeleton_lines().vertex_count(), 4);
    h.load_asset("chain", asset);
    h.tick();

    let shown = h.session.scene_layers();
    assert!(shown.helpers_visible);
    assert_eq!(h.surface.rendered_layers, vec![SceneLayers::BARE, shown]);
}

#[test]
fn test_options_reach_surface() {
    let mut h = loaded_harness();
    let mut options = h.session.options().clone();
    options.wireframe = true;
    options.exposure = 2.0;
    h.session.set_options(options.clone());
    h.tick();
    assert_eq!(h.surface.options(), &options);
}
