//! Orientation indicator: a miniature axes scene that mirrors the main
//! camera's viewing direction at a fixed distance.

use glam::{Mat4, Vec3};

use super::mesh::{self, LineMeshData};

pub const DEFAULT_DISTANCE: f32 = 4.0;
pub const DEFAULT_SIZE: u32 = 120;

/// Length of each indicator axis in world units
const AXIS_LENGTH: f32 = 1.0;

pub struct OrientationIndicator {
    /// Camera distance from origin, independent of main-camera zoom
    distance: f32,
    /// Overlay surface edge in pixels
    size: u32,
    direction: Vec3,
}

impl Default for OrientationIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE, DEFAULT_SIZE)
    }
}

impl OrientationIndicator {
    pub fn new(distance: f32, size: u32) -> Self {
        Self {
            distance,
            size,
            direction: Vec3::Z,
        }
    }

    /// Follow the main camera. Only the direction of `main_camera_position`
    /// matters; a zero vector keeps the previous direction.
    pub fn sync(&mut self, main_camera_position: Vec3) {
        let dir = main_camera_position.normalize_or_zero();
        if dir != Vec3::ZERO {
            self.direction = dir;
        }
    }

    pub fn camera_position(&self) -> Vec3 {
        self.direction * self.distance
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn view_matrix(&self) -> Mat4 {
        // Looking straight down makes Y degenerate as an up vector
        let up = if self.direction.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_at_rh(self.camera_position(), Vec3::ZERO, up)
    }

    /// Square overlay, so aspect is always 1
    pub fn view_projection(&self) -> Mat4 {
        let proj = Mat4::perspective_rh_gl(50.0_f32.to_radians(), 1.0, 0.1, self.distance * 4.0);
        proj * self.view_matrix()
    }

    /// Three colored axis segments from the origin
    pub fn axes(&self) -> LineMeshData {
        mesh::axes(AXIS_LENGTH)
    }

    /// Axis label anchor points in world space
    pub fn label_positions(&self) -> [(Vec3, &'static str); 3] {
        let tip = AXIS_LENGTH * 1.15;
        [(Vec3::X * tip, "X"), (Vec3::Y * tip, "Y"), (Vec3::Z * tip, "Z")]
    }
}
