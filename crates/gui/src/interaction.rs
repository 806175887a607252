//! Pointer and wheel gestures on the 3D viewport and the composite canvas.
//!
//! The tracker turns raw gestures into [`Effect`]s; the session applies them
//! to the camera or the canvas. Interaction activity is a single
//! reference-counted state machine shared by both surfaces.

use std::time::{Duration, Instant};

use glam::Vec2;
use shared::CompositeTransform;

/// Composite scale change per wheel tick
pub const WHEEL_STEP: f32 = 0.025;
/// Time the "interacting" affordance lingers after the last gesture ends
pub const ACTIVITY_COOLDOWN: Duration = Duration::from_millis(250);
/// Orbit degrees per pixel of viewport drag
pub const ORBIT_SENSITIVITY: f32 = 0.5;
/// Dolly fraction per point of viewport scroll
pub const DOLLY_SENSITIVITY: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Viewport,
    Canvas,
}

impl Surface {
    fn index(self) -> usize {
        match self {
            Surface::Viewport => 0,
            Surface::Canvas => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragButton {
    #[default]
    Primary,
    /// Pans the viewport camera instead of orbiting
    Secondary,
}

/// Maps on-screen positions to surface pixels when the displayed size of a
/// surface differs from its backing resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMapping {
    pub display_size: Vec2,
    pub backing_size: Vec2,
}

impl SurfaceMapping {
    pub fn new(display_size: Vec2, backing_width: u32, backing_height: u32) -> Self {
        Self {
            display_size,
            backing_size: Vec2::new(backing_width as f32, backing_height as f32),
        }
    }

    /// One-to-one mapping
    pub fn identity(width: u32, height: u32) -> Self {
        let size = Vec2::new(width as f32, height as f32);
        Self {
            display_size: size,
            backing_size: size,
        }
    }

    /// Backing pixels per displayed unit
    pub fn ratio(&self) -> Vec2 {
        if self.display_size.x <= 0.0 || self.display_size.y <= 0.0 {
            return Vec2::ONE;
        }
        self.backing_size / self.display_size
    }

    /// `local` is relative to the surface's top-left corner on screen
    pub fn to_surface(&self, local: Vec2) -> Vec2 {
        local * self.ratio()
    }
}

/// Anchor-based drag: `anchor = pointer - offset` on down,
/// `offset = pointer - anchor` on move.
#[derive(Debug, Clone, Copy, Default)]
pub struct DragTracker {
    anchor: Option<Vec2>,
}

impl DragTracker {
    pub fn begin(&mut self, pointer: Vec2, offset: Vec2) {
        self.anchor = Some(pointer - offset);
    }

    /// New offset while dragging, `None` otherwise
    pub fn update(&self, pointer: Vec2) -> Option<Vec2> {
        self.anchor.map(|anchor| pointer - anchor)
    }

    pub fn end(&mut self) {
        self.anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Step the composite scale by `ticks` wheel notches (positive enlarges).
pub fn apply_wheel(transform: CompositeTransform, ticks: f32) -> CompositeTransform {
    transform.zoomed_by(ticks * WHEEL_STEP)
}

/// Interaction activity, used only for UI affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Idle,
    Active,
    Cooling { until: Instant },
}

/// Reference-counted activity across both surfaces: the state only leaves
/// `Active` once no surface has a gesture in progress, and a gesture on one
/// surface never clears another's.
#[derive(Debug, Clone)]
pub struct ActivityTracker {
    state: ActivityState,
    held: [bool; 2],
    cooldown: Duration,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new(ACTIVITY_COOLDOWN)
    }
}

impl ActivityTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: ActivityState::Idle,
            held: [false; 2],
            cooldown,
        }
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn active_count(&self) -> usize {
        self.held.iter().filter(|h| **h).count()
    }

    /// A gesture started on `surface`. Repeated begins are not double-counted.
    pub fn begin(&mut self, surface: Surface) {
        self.held[surface.index()] = true;
        self.state = ActivityState::Active;
    }

    /// The gesture on `surface` ended
    pub fn end(&mut self, surface: Surface, now: Instant) {
        if !self.held[surface.index()] {
            return;
        }
        self.held[surface.index()] = false;
        self.settle(now);
    }

    /// Instant gesture such as a wheel tick
    pub fn pulse(&mut self, now: Instant) {
        self.state = ActivityState::Active;
        self.settle(now);
    }

    /// Advance the cooldown timer
    pub fn tick(&mut self, now: Instant) {
        if let ActivityState::Cooling { until } = self.state {
            if now >= until {
                self.state = ActivityState::Idle;
            }
        }
    }

    pub fn is_interacting(&self) -> bool {
        self.state != ActivityState::Idle
    }

    fn settle(&mut self, now: Instant) {
        if self.active_count() == 0 {
            self.state = ActivityState::Cooling {
                until: now + self.cooldown,
            };
        }
    }
}

/// Mutation requested by a gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    None,
    /// Orbit by (yaw, pitch) degrees
    Orbit(Vec2),
    /// Pan the orbit target by surface pixels
    Pan(Vec2),
    /// Dolly fraction, positive moves toward the target
    Dolly(f32),
    /// New composite transform
    Transform(CompositeTransform),
}

impl Effect {
    /// Whether the effect moves the 3D camera
    pub fn moves_camera(&self) -> bool {
        matches!(self, Effect::Orbit(_) | Effect::Pan(_) | Effect::Dolly(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct ViewportDrag {
    button: DragButton,
    tracker: DragTracker,
    /// Offset reported by the previous move
    last: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionTracker {
    viewport: Option<ViewportDrag>,
    canvas: DragTracker,
    pub activity: ActivityTracker,
}

impl InteractionTracker {
    pub fn pointer_down(
        &mut self,
        surface: Surface,
        pointer: Vec2,
        button: DragButton,
        canvas_transform: &CompositeTransform,
    ) {
        match surface {
            Surface::Viewport => {
                let mut tracker = DragTracker::default();
                tracker.begin(pointer, Vec2::ZERO);
                self.viewport = Some(ViewportDrag {
                    button,
                    tracker,
                    last: Vec2::ZERO,
                });
            }
            Surface::Canvas => {
                let offset = canvas_transform.offset();
                self.canvas.begin(pointer, Vec2::new(offset[0], offset[1]));
            }
        }
        self.activity.begin(surface);
    }

    pub fn pointer_move(
        &mut self,
        surface: Surface,
        pointer: Vec2,
        canvas_transform: &CompositeTransform,
    ) -> Effect {
        match surface {
            Surface::Viewport => {
                let Some(drag) = &mut self.viewport else {
                    return Effect::None;
                };
                let Some(offset) = drag.tracker.update(pointer) else {
                    return Effect::None;
                };
                let delta = offset - drag.last;
                drag.last = offset;
                if delta == Vec2::ZERO {
                    return Effect::None;
                }
                match drag.button {
                    DragButton::Primary => Effect::Orbit(delta * ORBIT_SENSITIVITY),
                    DragButton::Secondary => Effect::Pan(delta),
                }
            }
            Surface::Canvas => match self.canvas.update(pointer) {
                Some(offset) => Effect::Transform(canvas_transform.with_offset(offset.x, offset.y)),
                None => Effect::None,
            },
        }
    }

    /// Pointer released or left the surface
    pub fn pointer_up(&mut self, surface: Surface, now: Instant) {
        match surface {
            Surface::Viewport => self.viewport = None,
            Surface::Canvas => self.canvas.end(),
        }
        self.activity.end(surface, now);
    }

    /// `delta` is the scroll amount; on the canvas only its sign counts and
    /// each event is one wheel tick.
    pub fn wheel(
        &mut self,
        surface: Surface,
        delta: f32,
        canvas_transform: &CompositeTransform,
        now: Instant,
    ) -> Effect {
        if delta == 0.0 || !delta.is_finite() {
            return Effect::None;
        }
        self.activity.pulse(now);
        match surface {
            Surface::Viewport => Effect::Dolly(delta * DOLLY_SENSITIVITY),
            Surface::Canvas => Effect::Transform(apply_wheel(*canvas_transform, delta.signum())),
        }
    }

    pub fn is_dragging(&self, surface: Surface) -> bool {
        match surface {
            Surface::Viewport => self.viewport.is_some(),
            Surface::Canvas => self.canvas.is_dragging(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_corrects_for_backing_scale() {
        let m = SurfaceMapping::new(Vec2::new(300.0, 300.0), 600, 600);
        assert_eq!(m.ratio(), Vec2::splat(2.0));
        assert_eq!(m.to_surface(Vec2::new(10.0, 20.0)), Vec2::new(20.0, 40.0));
    }

    #[test]
    fn degenerate_mapping_is_identity() {
        let m = SurfaceMapping::new(Vec2::ZERO, 600, 600);
        assert_eq!(m.ratio(), Vec2::ONE);
    }

    #[test]
    fn drag_keeps_grab_point() {
        let mut d = DragTracker::default();
        d.begin(Vec2::new(100.0, 100.0), Vec2::new(30.0, -10.0));
        assert_eq!(d.update(Vec2::new(110.0, 95.0)), Some(Vec2::new(40.0, -15.0)));
        d.end();
        assert_eq!(d.update(Vec2::ZERO), None);
    }

    #[test]
    fn canvas_wheel_steps_and_clamps() {
        let mut t = CompositeTransform::IDENTITY;
        t = apply_wheel(t, 1.0);
        assert!((t.scale - 1.025).abs() < 1e-6);
        for _ in 0..500 {
            t = apply_wheel(t, 1.0);
        }
        assert_eq!(t.scale, shared::MAX_SCALE);
        for _ in 0..500 {
            t = apply_wheel(t, -1.0);
        }
        assert_eq!(t.scale, shared::MIN_SCALE);
    }

    #[test]
    fn viewport_drag_orbits_by_delta() {
        let mut it = InteractionTracker::default();
        let t = CompositeTransform::IDENTITY;
        it.pointer_down(Surface::Viewport, Vec2::new(10.0, 10.0), DragButton::Primary, &t);
        assert_eq!(
            it.pointer_move(Surface::Viewport, Vec2::new(14.0, 10.0), &t),
            Effect::Orbit(Vec2::new(2.0, 0.0))
        );
        assert_eq!(
            it.pointer_move(Surface::Viewport, Vec2::new(16.0, 12.0), &t),
            Effect::Orbit(Vec2::new(1.0, 1.0))
        );
    }

    #[test]
    fn secondary_drag_pans() {
        let mut it = InteractionTracker::default();
        let t = CompositeTransform::IDENTITY;
        it.pointer_down(Surface::Viewport, Vec2::ZERO, DragButton::Secondary, &t);
        assert_eq!(
            it.pointer_move(Surface::Viewport, Vec2::new(3.0, 4.0), &t),
            Effect::Pan(Vec2::new(3.0, 4.0))
        );
    }

    #[test]
    fn move_without_down_does_nothing() {
        let mut it = InteractionTracker::default();
        let t = CompositeTransform::IDENTITY;
        assert_eq!(it.pointer_move(Surface::Canvas, Vec2::ONE, &t), Effect::None);
        assert_eq!(it.pointer_move(Surface::Viewport, Vec2::ONE, &t), Effect::None);
    }

    #[test]
    fn activity_waits_for_all_surfaces() {
        let now = Instant::now();
        let mut a = ActivityTracker::default();
        a.begin(Surface::Viewport);
        a.begin(Surface::Canvas);
        a.end(Surface::Viewport, now);
        assert_eq!(a.state(), ActivityState::Active);

        a.end(Surface::Canvas, now);
        assert!(matches!(a.state(), ActivityState::Cooling { .. }));
        a.tick(now + ACTIVITY_COOLDOWN / 2);
        assert!(a.is_interacting());
        a.tick(now + ACTIVITY_COOLDOWN);
        assert_eq!(a.state(), ActivityState::Idle);
    }

    #[test]
    fn new_gesture_cancels_cooldown() {
        let now = Instant::now();
        let mut a = ActivityTracker::default();
        a.pulse(now);
        a.begin(Surface::Canvas);
        a.tick(now + ACTIVITY_COOLDOWN * 2);
        assert_eq!(a.state(), ActivityState::Active);
    }

    #[test]
    fn wheel_pulse_while_dragging_stays_active() {
        let now = Instant::now();
        let mut a = ActivityTracker::default();
        a.begin(Surface::Viewport);
        a.pulse(now);
        assert_eq!(a.state(), ActivityState::Active);
    }

    #[test]
    fn repeated_end_is_ignored() {
        let now = Instant::now();
        let mut a = ActivityTracker::default();
        a.begin(Surface::Canvas);
        a.end(Surface::Canvas, now);
        a.end(Surface::Canvas, now);
        assert_eq!(a.active_count(), 0);
    }
}
