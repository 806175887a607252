//! Asset framing: scale a loaded asset to a canonical size and stand it on
//! the ground plane, centered on the origin.

use glam::Vec3;

use crate::asset::SceneAsset;

/// Reference grid unit
pub const GRID_UNIT: f32 = 10.0;
/// Largest dimension of a framed asset: half a grid unit
pub const TARGET_SIZE: f32 = GRID_UNIT * 0.5;

/// Relative tolerance below which the asset counts as already framed
const SIZE_TOLERANCE: f32 = 1e-4;

/// Outcome of [`frame`]. `scale` and the offsets describe the root's
/// resulting transform, so framing an unchanged asset twice reports the same
/// values both times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramingResult {
    /// Uniform root scale after framing
    pub scale: f32,
    /// Root translation on X/Z after framing
    pub center_offset: Vec3,
    /// Root translation on Y after framing
    pub ground_offset: f32,
    /// Diagonal of the framed bounds (or the fallback for degenerate assets)
    pub size: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    /// Orbit distance upper bound
    pub max_distance: f32,
    /// Vertical center of the framed asset
    pub orbit_target: Vec3,
}

/// Frame `asset` in place. Never fails: empty or zero-volume assets skip the
/// rescale and fall back to [`TARGET_SIZE`] for clip-plane derivation.
pub fn frame(asset: &mut SceneAsset) -> FramingResult {
    let mut bounds = asset.world_bounds();

    if !bounds.is_empty() {
        let max_dim = bounds.max_dimension();
        if max_dim > f32::EPSILON
            && max_dim.is_finite()
            && ((max_dim - TARGET_SIZE) / TARGET_SIZE).abs() > SIZE_TOLERANCE
        {
            asset.root.scale *= TARGET_SIZE / max_dim;
            bounds = asset.world_bounds();
        }

        let center = bounds.center();
        asset.root.translation -= Vec3::new(center.x, bounds.min.y, center.z);
        bounds = asset.world_bounds();
    }

    let diagonal = bounds.diagonal();
    let size = if diagonal > f32::EPSILON && diagonal.is_finite() {
        diagonal
    } else {
        TARGET_SIZE
    };

    let height = if bounds.is_empty() { 0.0 } else { bounds.max.y - bounds.min.y };
    let translation = asset.root.translation;

    tracing::debug!("Framed asset: scale {:.3}, size {:.3}", asset.root.scale.x, size);

    FramingResult {
        scale: asset.root.scale.x,
        center_offset: Vec3::new(translation.x, 0.0, translation.z),
        ground_offset: translation.y,
        size,
        camera_near: size / 100.0,
        camera_far: size * 100.0,
        max_distance: size * 10.0,
        orbit_target: Vec3::new(0.0, height * 0.5, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SceneNode;
    use crate::viewport::mesh::{cuboid, MeshData, PrimitiveMode, MESH_STRIDE};

    fn box_asset(min: Vec3, max: Vec3) -> SceneAsset {
        let root = SceneNode::new("root").with_child(SceneNode::new("box").with_mesh(0));
        SceneAsset::new(root, vec![cuboid(min, max, [0.8; 3])])
    }

    #[test]
    fn reference_box_scales_to_target() {
        let mut asset = box_asset(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 4.0, 1.0));
        let r = frame(&mut asset);

        assert!((r.scale - 1.25).abs() < 1e-6);
        let b = asset.world_bounds();
        assert!(b.min.y.abs() < 1e-5);
        assert!(b.center().x.abs() < 1e-5);
        assert!(b.center().z.abs() < 1e-5);
        assert!((b.max_dimension() - TARGET_SIZE).abs() < 1e-4);
    }

    #[test]
    fn clip_planes_follow_diagonal() {
        let mut asset = box_asset(Vec3::ZERO, Vec3::splat(5.0));
        let r = frame(&mut asset);
        let diag = (75.0_f32).sqrt();
        assert!((r.size - diag).abs() < 1e-4);
        assert!((r.camera_near - diag / 100.0).abs() < 1e-5);
        assert!((r.camera_far - diag * 100.0).abs() < 1e-2);
        assert!((r.max_distance - diag * 10.0).abs() < 1e-3);
        assert!((r.orbit_target.y - 2.5).abs() < 1e-5);
    }

    #[test]
    fn offset_asset_is_recentered() {
        let mut asset = box_asset(Vec3::new(10.0, -3.0, 7.0), Vec3::new(12.0, -1.0, 9.0));
        frame(&mut asset);
        let b = asset.world_bounds();
        assert!(b.min.y.abs() < 1e-4);
        assert!(b.center().x.abs() < 1e-4);
        assert!(b.center().z.abs() < 1e-4);
    }

    #[test]
    fn empty_asset_does_not_divide_by_zero() {
        let mut asset = SceneAsset::new(SceneNode::new("root"), Vec::new());
        let r = frame(&mut asset);
        assert_eq!(r.scale, 1.0);
        assert_eq!(r.size, TARGET_SIZE);
        assert!(r.camera_near > 0.0);
        assert!(r.camera_near.is_finite() && r.camera_far.is_finite());
    }

    #[test]
    fn single_point_skips_rescale() {
        let mut vertices = vec![0.0; MESH_STRIDE];
        vertices[1] = 3.0;
        let point = MeshData {
            vertices,
            indices: vec![0],
            mode: PrimitiveMode::Points,
        };
        let root = SceneNode::new("root").with_mesh(0);
        let mut asset = SceneAsset::new(root, vec![point]);
        let r = frame(&mut asset);
        assert_eq!(r.scale, 1.0);
        assert!((r.ground_offset + 3.0).abs() < 1e-6);
        assert_eq!(r.size, TARGET_SIZE);
    }
}
