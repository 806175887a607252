//! Loaded scene graph: node hierarchy, meshes, skins and animation clips.

use glam::{Mat4, Quat, Vec3};

use crate::viewport::bounds::Aabb;
use crate::viewport::mesh::{self, LineMeshData, MeshData};

const BONE_COLOR: [f32; 4] = [0.2, 0.9, 1.0, 1.0];

/// A node in the scene hierarchy with a decomposed local transform
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Index of the source node in the asset file; `None` for synthetic nodes
    pub source_index: Option<usize>,
    pub name: String,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Index into [`SceneAsset::meshes`]
    pub mesh: Option<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            source_index: None,
            name: name.into(),
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Named animation clip; playback is not driven by the viewer
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    /// Clip length in seconds
    pub duration: f32,
}

/// A loaded model: root node plus the resources its nodes refer to
#[derive(Debug, Clone)]
pub struct SceneAsset {
    pub root: SceneNode,
    pub meshes: Vec<MeshData>,
    pub animations: Vec<AnimationClip>,
    /// Joint source-node indices per skin
    pub skins: Vec<Vec<usize>>,
}

impl SceneAsset {
    pub fn new(root: SceneNode, meshes: Vec<MeshData>) -> Self {
        Self {
            root,
            meshes,
            animations: Vec::new(),
            skins: Vec::new(),
        }
    }

    /// Depth-first walk with freshly computed world matrices.
    /// The callback receives the node, its world matrix and its parent's world matrix.
    pub fn visit(&self, mut f: impl FnMut(&SceneNode, Mat4, Option<(&SceneNode, Mat4)>)) {
        fn walk(
            node: &SceneNode,
            parent: Option<(&SceneNode, Mat4)>,
            f: &mut dyn FnMut(&SceneNode, Mat4, Option<(&SceneNode, Mat4)>),
        ) {
            let parent_world = parent.map(|(_, m)| m).unwrap_or(Mat4::IDENTITY);
            let world = parent_world * node.local_matrix();
            f(node, world, parent);
            for child in &node.children {
                walk(child, Some((node, world)), f);
            }
        }
        walk(&self.root, None, &mut f);
    }

    /// World-space bounds of every mesh instance
    pub fn world_bounds(&self) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        self.visit(|node, world, _| {
            if let Some(mesh) = node.mesh.and_then(|i| self.meshes.get(i)) {
                bounds = bounds.union(mesh.bounds().transformed(world));
            }
        });
        bounds
    }

    /// Mesh instances baked into world space, ready for upload
    pub fn world_meshes(&self) -> Vec<MeshData> {
        let mut out = Vec::new();
        self.visit(|node, world, _| {
            if let Some(m) = node.mesh.and_then(|i| self.meshes.get(i)) {
                if !m.is_empty() {
                    out.push(mesh::transformed(m, world));
                }
            }
        });
        out
    }

    /// Bone segments between each skinned joint and its parent joint
    pub fn skeleton_lines(&self) -> LineMeshData {
        let mut lines = LineMeshData::default();
        if self.skins.is_empty() {
            return lines;
        }
        let is_joint = |node: &SceneNode| {
            node.source_index
                .is_some_and(|i| self.skins.iter().any(|skin| skin.contains(&i)))
        };
        self.visit(|node, world, parent| {
            if let Some((parent_node, parent_world)) = parent {
                if is_joint(node) && is_joint(parent_node) {
                    lines.push_segment(
                        parent_world.transform_point3(Vec3::ZERO),
                        world.transform_point3(Vec3::ZERO),
                        BONE_COLOR,
                    );
                }
            }
        });
        lines
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.visit(|_, _, _| n += 1);
        n
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(MeshData::vertex_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::mesh::cuboid;

    fn unit_box() -> MeshData {
        cuboid(Vec3::splat(-0.5), Vec3::splat(0.5), [1.0; 3])
    }

    #[test]
    fn world_bounds_follow_nested_transforms() {
        let mut child = SceneNode::new("child").with_mesh(0);
        child.translation = Vec3::new(1.0, 0.0, 0.0);
        let mut root = SceneNode::new("root").with_child(child);
        root.scale = Vec3::splat(2.0);

        let asset = SceneAsset::new(root, vec![unit_box()]);
        let b = asset.world_bounds();
        assert_eq!(b.min, Vec3::new(1.0, -1.0, -1.0));
        assert_eq!(b.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn no_meshes_gives_empty_bounds() {
        let asset = SceneAsset::new(SceneNode::new("root"), Vec::new());
        assert!(asset.world_bounds().is_empty());
        assert!(asset.world_meshes().is_empty());
    }

    #[test]
    fn skeleton_connects_joint_chain() {
        let mut tip = SceneNode::new("tip");
        tip.source_index = Some(2);
        tip.translation = Vec3::Y;
        let mut base = SceneNode::new("base").with_child(tip);
        base.source_index = Some(1);
        let root = SceneNode::new("root").with_child(base);

        let mut asset = SceneAsset::new(root, Vec::new());
        asset.skins = vec![vec![1, 2]];
        let lines = asset.skeleton_lines();
        assert_eq!(lines.vertex_count(), 2);
        assert_eq!(asset.node_count(), 3);
    }
}
