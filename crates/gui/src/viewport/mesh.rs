use glam::{Mat4, Vec3};

use super::bounds::Aabb;

/// Floats per vertex in [`MeshData::vertices`]
pub const MESH_STRIDE: usize = 9;
/// Floats per vertex in [`LineMeshData::vertices`]
pub const LINE_STRIDE: usize = 7;

/// How a mesh's indices are assembled on the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    #[default]
    Triangles,
    Lines,
    Points,
}

/// CPU-side mesh data: interleaved [pos.x, pos.y, pos.z, norm.x, norm.y, norm.z, r, g, b]
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    /// 9 floats per vertex: position(3) + normal(3) + color(3)
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    pub mode: PrimitiveMode,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / MESH_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices
            .chunks_exact(MESH_STRIDE)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
    }

    /// Local-space bounds of all vertices
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions())
    }

    /// Append another mesh, rebasing its indices.
    /// Meshes with a different primitive mode are rejected.
    pub fn append(&mut self, other: &MeshData) -> bool {
        if !self.is_empty() && self.mode != other.mode {
            return false;
        }
        if self.is_empty() {
            self.mode = other.mode;
        }
        let base = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
        true
    }
}

/// Lines mesh: interleaved [pos.x, pos.y, pos.z, r, g, b, a]
#[derive(Debug, Clone, Default)]
pub struct LineMeshData {
    /// 7 floats per vertex: position(3) + color(4)
    pub vertices: Vec<f32>,
}

impl LineMeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / LINE_STRIDE
    }

    pub fn push_segment(&mut self, a: Vec3, b: Vec3, color: [f32; 4]) {
        push_line_vert(&mut self.vertices, a.x, a.y, a.z, color);
        push_line_vert(&mut self.vertices, b.x, b.y, b.z, color);
    }
}

/// Axis-aligned box between `min` and `max`, used for fixtures and placeholders
pub fn cuboid(min: Vec3, max: Vec3, color: [f32; 3]) -> MeshData {
    let (lo, hi) = (min, max);

    let faces: [([Vec3; 4], Vec3); 6] = [
        // Front (+Z)
        ([Vec3::new(lo.x, lo.y, hi.z), Vec3::new(hi.x, lo.y, hi.z), Vec3::new(hi.x, hi.y, hi.z), Vec3::new(lo.x, hi.y, hi.z)], Vec3::Z),
        // Back (-Z)
        ([Vec3::new(hi.x, lo.y, lo.z), Vec3::new(lo.x, lo.y, lo.z), Vec3::new(lo.x, hi.y, lo.z), Vec3::new(hi.x, hi.y, lo.z)], Vec3::NEG_Z),
        // Right (+X)
        ([Vec3::new(hi.x, lo.y, hi.z), Vec3::new(hi.x, lo.y, lo.z), Vec3::new(hi.x, hi.y, lo.z), Vec3::new(hi.x, hi.y, hi.z)], Vec3::X),
        // Left (-X)
        ([Vec3::new(lo.x, lo.y, lo.z), Vec3::new(lo.x, lo.y, hi.z), Vec3::new(lo.x, hi.y, hi.z), Vec3::new(lo.x, hi.y, lo.z)], Vec3::NEG_X),
        // Top (+Y)
        ([Vec3::new(lo.x, hi.y, hi.z), Vec3::new(hi.x, hi.y, hi.z), Vec3::new(hi.x, hi.y, lo.z), Vec3::new(lo.x, hi.y, lo.z)], Vec3::Y),
        // Bottom (-Y)
        ([Vec3::new(lo.x, lo.y, lo.z), Vec3::new(hi.x, lo.y, lo.z), Vec3::new(hi.x, lo.y, hi.z), Vec3::new(lo.x, lo.y, hi.z)], Vec3::NEG_Y),
    ];

    let mut vertices = Vec::with_capacity(24 * MESH_STRIDE);
    let mut indices = Vec::with_capacity(36);

    for (quad, normal) in &faces {
        let base = (vertices.len() / MESH_STRIDE) as u32;
        for v in quad {
            push_vert(&mut vertices, v.x, v.y, v.z, *normal, color);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    MeshData {
        vertices,
        indices,
        mode: PrimitiveMode::Triangles,
    }
}

// ── Grid and axes ────────────────────────────────────────────

pub fn grid(range: i32, cell_size: f32, opacity: f32) -> LineMeshData {
    let mut vertices = Vec::new();
    let grid_color = [0.35_f32, 0.35, 0.35, opacity];
    let center_color = [0.55_f32, 0.55, 0.55, opacity];

    let extent = range as f32 * cell_size;

    for i in -range..=range {
        let f = i as f32 * cell_size;
        let color = if i == 0 { center_color } else { grid_color };
        // Line along Z
        push_line_vert(&mut vertices, f, 0.0, -extent, color);
        push_line_vert(&mut vertices, f, 0.0, extent, color);
        // Line along X
        push_line_vert(&mut vertices, -extent, 0.0, f, color);
        push_line_vert(&mut vertices, extent, 0.0, f, color);
    }

    LineMeshData { vertices }
}

/// Axis colors shared by the orientation indicator and labels
pub const AXIS_X_COLOR: [f32; 4] = [0.9, 0.2, 0.2, 1.0];
pub const AXIS_Y_COLOR: [f32; 4] = [0.2, 0.8, 0.2, 1.0];
pub const AXIS_Z_COLOR: [f32; 4] = [0.2, 0.3, 0.9, 1.0];

pub fn axes(length: f32) -> LineMeshData {
    let mut lines = LineMeshData::default();
    lines.push_segment(Vec3::ZERO, Vec3::X * length, AXIS_X_COLOR);
    lines.push_segment(Vec3::ZERO, Vec3::Y * length, AXIS_Y_COLOR);
    lines.push_segment(Vec3::ZERO, Vec3::Z * length, AXIS_Z_COLOR);
    lines
}

/// Transform a mesh's positions and normals by `matrix`
pub fn transformed(mesh: &MeshData, matrix: Mat4) -> MeshData {
    let normal_matrix = matrix.inverse().transpose();
    let mut out = mesh.clone();
    for v in out.vertices.chunks_exact_mut(MESH_STRIDE) {
        let p = matrix.transform_point3(Vec3::new(v[0], v[1], v[2]));
        let n = normal_matrix
            .transform_vector3(Vec3::new(v[3], v[4], v[5]))
            .normalize_or_zero();
        v[..6].copy_from_slice(&[p.x, p.y, p.z, n.x, n.y, n.z]);
    }
    out
}

// ── Helpers ──────────────────────────────────────────────────

pub(crate) fn push_vert(v: &mut Vec<f32>, px: f32, py: f32, pz: f32, n: Vec3, c: [f32; 3]) {
    v.extend_from_slice(&[px, py, pz, n.x, n.y, n.z, c[0], c[1], c[2]]);
}

fn push_line_vert(v: &mut Vec<f32>, px: f32, py: f32, pz: f32, c: [f32; 4]) {
    v.extend_from_slice(&[px, py, pz, c[0], c[1], c[2], c[3]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_bounds_match_corners() {
        let mesh = cuboid(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 4.0, 1.0), [1.0; 3]);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices.len(), 36);
        let b = mesh.bounds();
        assert_eq!(b.min, Vec3::new(-2.0, 0.0, -1.0));
        assert_eq!(b.max, Vec3::new(2.0, 4.0, 1.0));
    }

    #[test]
    fn append_rebases_indices() {
        let mut a = cuboid(Vec3::ZERO, Vec3::ONE, [1.0; 3]);
        let b = cuboid(Vec3::ONE, Vec3::splat(2.0), [1.0; 3]);
        assert!(a.append(&b));
        assert_eq!(a.vertex_count(), 48);
        assert_eq!(*a.indices.iter().max().unwrap(), 47);
    }

    #[test]
    fn append_rejects_mixed_modes() {
        let mut a = cuboid(Vec3::ZERO, Vec3::ONE, [1.0; 3]);
        let points = MeshData {
            vertices: vec![0.0; MESH_STRIDE],
            indices: vec![0],
            mode: PrimitiveMode::Points,
        };
        assert!(!a.append(&points));
    }

    #[test]
    fn grid_has_two_lines_per_step() {
        let g = grid(5, 1.0, 0.6);
        assert_eq!(g.vertex_count(), 11 * 4);
    }
}
