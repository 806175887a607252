use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::framing::FramingResult;

/// Pitch limit, just short of straight up/down
const PITCH_LIMIT: f32 = 1.5;

/// Snapshot of camera placement, exchanged with render surfaces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub near: f32,
    pub far: f32,
    /// Vertical field of view (radians)
    pub fov: f32,
}

/// Orbit camera for the 3D viewport
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle (radians)
    pub yaw: f32,
    /// Vertical rotation angle (radians)
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
    /// Camera target point
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Auto-rotate speed (radians per second)
    pub auto_rotate_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            yaw: 0.6,
            pitch: 0.4,
            distance: 10.0,
            target: Vec3::ZERO,
            fov: 45.0_f32.to_radians(),
            near: 0.01,
            far: 1000.0,
            min_distance: 0.05,
            max_distance: 100.0,
            auto_rotate_speed: 0.5,
        }
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx.to_radians();
        self.pitch = (self.pitch + dy.to_radians()).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Dolly toward (positive) or away from (negative) the target
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 - delta)).clamp(self.min_distance, self.max_distance);
    }

    /// Pan in screen space; deltas are scaled by distance so the target
    /// tracks the pointer at any zoom level
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let right = self.right_vector();
        let up = self.up_vector();
        let scale = self.distance * 0.002;
        self.target += (-right * dx + up * dy) * scale;
    }

    /// Advance auto-rotation by `dt` seconds
    pub fn advance_auto_rotate(&mut self, dt: f32) {
        self.yaw += self.auto_rotate_speed * dt;
    }

    /// Apply clip planes, distance bounds and target from a framing pass
    pub fn apply_framing(&mut self, framing: &FramingResult) {
        self.near = framing.camera_near;
        self.far = framing.camera_far;
        self.max_distance = framing.max_distance;
        self.min_distance = framing.camera_near * 2.0;
        self.target = framing.orbit_target;
        self.distance = (framing.size * 1.2).clamp(self.min_distance, self.max_distance);
    }

    /// Camera position in world space
    pub fn eye_position(&self) -> Vec3 {
        let cy = self.yaw.cos();
        let sy = self.yaw.sin();
        let cp = self.pitch.cos();
        let sp = self.pitch.sin();

        self.target
            + Vec3::new(
                self.distance * cp * sy,
                self.distance * sp,
                self.distance * cp * cy,
            )
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.eye_position(),
            target: self.target,
            near: self.near,
            far: self.far,
            fov: self.fov,
        }
    }

    /// Adopt a camera state; yaw, pitch and distance are recovered from
    /// the position relative to the target
    pub fn set_state(&mut self, state: &CameraState) {
        self.target = state.target;
        self.near = state.near;
        self.far = state.far;
        self.fov = state.fov;

        let offset = state.position - state.target;
        let distance = offset.length();
        if distance > f32::EPSILON {
            self.distance = distance;
            self.pitch = (offset.y / distance).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
            self.yaw = offset.x.atan2(offset.z);
        }
    }

    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    fn right_vector(&self) -> Vec3 {
        let fwd = (self.target - self.eye_position()).normalize_or_zero();
        fwd.cross(Vec3::Y).normalize_or_zero()
    }

    fn up_vector(&self) -> Vec3 {
        let fwd = (self.target - self.eye_position()).normalize_or_zero();
        let right = self.right_vector();
        right.cross(fwd).normalize_or_zero()
    }

    /// Project a 3D point to pixel coordinates on a `width`×`height` surface
    /// (origin top-left)
    pub fn project(&self, point: Vec3, width: f32, height: f32) -> Option<Vec2> {
        project_point(self.view_projection(width / height), point, width, height)
    }
}

/// Project through `view_proj` into pixel coordinates (origin top-left)
pub fn project_point(view_proj: Mat4, point: Vec3, width: f32, height: f32) -> Option<Vec2> {
    let p = view_proj * Vec4::new(point.x, point.y, point.z, 1.0);
    if p.w <= 0.0 {
        return None;
    }
    let ndc = p.truncate() / p.w;
    Some(Vec2::new(
        (ndc.x + 1.0) * 0.5 * width,
        (1.0 - ndc.y) * 0.5 * height,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_respects_bounds() {
        let mut cam = OrbitCamera::new();
        for _ in 0..200 {
            cam.zoom(0.5);
        }
        assert_eq!(cam.distance, cam.min_distance);
        for _ in 0..200 {
            cam.zoom(-0.5);
        }
        assert_eq!(cam.distance, cam.max_distance);
    }

    #[test]
    fn state_roundtrip() {
        let mut cam = OrbitCamera::new();
        cam.target = Vec3::new(0.0, 2.0, 0.0);
        let state = cam.state();

        let mut other = OrbitCamera::new();
        other.yaw = -2.0;
        other.distance = 3.0;
        other.set_state(&state);

        assert!((other.eye_position() - state.position).length() < 1e-4);
        assert!((other.distance - cam.distance).abs() < 1e-4);
    }

    #[test]
    fn target_projects_to_center() {
        let cam = OrbitCamera::new();
        let p = cam.project(cam.target, 600.0, 600.0).unwrap();
        assert!((p.x - 300.0).abs() < 1e-2);
        assert!((p.y - 300.0).abs() < 1e-2);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = OrbitCamera::new();
        cam.rotate(0.0, 10_000.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
    }
}
