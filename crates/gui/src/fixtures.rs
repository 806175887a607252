//! Factory functions for creating test data.
//!
//! Synthetic scene assets plus an in-memory glTF writer, so loader tests can
//! round-trip real GLB/glTF bytes without checked-in model files.

use glam::Vec3;

use crate::asset::{SceneAsset, SceneNode};
use crate::loader::LoadedAsset;
use crate::viewport::mesh::{cuboid, MeshData, PrimitiveMode, MESH_STRIDE};

/// GLB magic number: "glTF"
const GLB_MAGIC: u32 = 0x46546C67;
const GLB_VERSION: u32 = 2;
const CHUNK_TYPE_JSON: u32 = 0x4E4F534A;
const CHUNK_TYPE_BIN: u32 = 0x004E4942;

/// glTF component types
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

/// glTF buffer view targets
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Duration of the fixture animation clip, in seconds
pub const FIXTURE_CLIP_DURATION: f32 = 1.5;

// ── Scene assets ────────────────────────────────────────────────

/// Asset with a single box mesh spanning `min..max`
pub fn box_asset(min: Vec3, max: Vec3) -> SceneAsset {
    let root = SceneNode::new("root").with_child(SceneNode::new("box").with_mesh(0));
    SceneAsset::new(root, vec![cuboid(min, max, [0.8, 0.5, 0.2])])
}

/// The 4×4×2 box standing on the ground at `[-2,0,-1]..[2,4,1]`
pub fn reference_box() -> SceneAsset {
    box_asset(Vec3::new(-2.0, 0.0, -1.0), Vec3::new(2.0, 4.0, 1.0))
}

/// Wrap an asset as if it had just been loaded
pub fn loaded(name: &str, asset: SceneAsset) -> LoadedAsset {
    LoadedAsset {
        name: name.to_string(),
        asset,
    }
}

/// Two boxes side by side, offset from the origin
pub fn offset_pair() -> SceneAsset {
    let mut left = SceneNode::new("left").with_mesh(0);
    left.translation = Vec3::new(20.0, 3.0, -7.0);
    let mut right = SceneNode::new("right").with_mesh(0);
    right.translation = Vec3::new(23.0, 3.0, -7.0);
    let root = SceneNode::new("root").with_child(left).with_child(right);
    SceneAsset::new(root, vec![cuboid(Vec3::ZERO, Vec3::ONE, [0.3, 0.6, 0.9])])
}

/// A three-joint chain with a skin over its joints
pub fn skinned_chain() -> SceneAsset {
    let mut tip = SceneNode::new("tip");
    tip.source_index = Some(3);
    tip.translation = Vec3::Y;
    let mut mid = SceneNode::new("mid").with_child(tip);
    mid.source_index = Some(2);
    mid.translation = Vec3::Y;
    let mut base = SceneNode::new("base").with_child(mid);
    base.source_index = Some(1);
    let body = SceneNode::new("body").with_mesh(0);
    let root = SceneNode::new("root").with_child(base).with_child(body);

    let mut asset = SceneAsset::new(
        root,
        vec![cuboid(Vec3::new(-0.2, 0.0, -0.2), Vec3::new(0.2, 2.0, 0.2), [0.7; 3])],
    );
    asset.skins = vec![vec![1, 2, 3]];
    asset
}

/// Point primitive mesh with one vertex per entry of `points`
pub fn point_cloud(points: &[Vec3]) -> MeshData {
    let mut vertices = Vec::with_capacity(points.len() * MESH_STRIDE);
    for p in points {
        vertices.extend_from_slice(&[p.x, p.y, p.z, 0.0, 1.0, 0.0, 1.0, 1.0, 1.0]);
    }
    MeshData {
        vertices,
        indices: (0..points.len() as u32).collect(),
        mode: PrimitiveMode::Points,
    }
}

// ── glTF writer ─────────────────────────────────────────────────

/// One mesh per node. The base color of each mesh is taken from its first
/// vertex color and written as the material's `baseColorFactor`.
pub struct GltfFixture {
    pub meshes: Vec<(String, MeshData)>,
    /// Adds an animation clip of [`FIXTURE_CLIP_DURATION`] on the first node
    pub with_animation: bool,
}

impl GltfFixture {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            with_animation: false,
        }
    }

    pub fn mesh(mut self, name: &str, mesh: MeshData) -> Self {
        self.meshes.push((name.to_string(), mesh));
        self
    }

    pub fn animated(mut self) -> Self {
        self.with_animation = true;
        self
    }

    /// Binary glTF with the buffer embedded
    pub fn to_glb(&self) -> Vec<u8> {
        let (json, bin) = self.document(None);
        assemble_glb(json, bin)
    }

    /// `.gltf` JSON referencing an external buffer at `buffer_uri`, plus the
    /// buffer bytes
    pub fn to_gltf(&self, buffer_uri: &str) -> (String, Vec<u8>) {
        let (json, bin) = self.document(Some(buffer_uri));
        (serde_json::to_string(&json).unwrap_or_default(), bin)
    }

    fn document(&self, buffer_uri: Option<&str>) -> (serde_json::Value, Vec<u8>) {
        let mut bin: Vec<u8> = Vec::new();
        let mut accessors = Vec::new();
        let mut buffer_views = Vec::new();
        let mut meshes = Vec::new();
        let mut materials = Vec::new();
        let mut nodes = Vec::new();

        for (i, (name, mesh)) in self.meshes.iter().enumerate() {
            let count = mesh.vertex_count();
            let mut positions = Vec::with_capacity(count * 3);
            let mut normals = Vec::with_capacity(count * 3);
            let mut min = [f32::MAX; 3];
            let mut max = [f32::MIN; 3];
            for v in mesh.vertices.chunks_exact(MESH_STRIDE) {
                positions.extend_from_slice(&v[0..3]);
                normals.extend_from_slice(&v[3..6]);
                for k in 0..3 {
                    min[k] = min[k].min(v[k]);
                    max[k] = max[k].max(v[k]);
                }
            }
            let color = mesh
                .vertices
                .get(6..9)
                .map(|c| [c[0], c[1], c[2], 1.0])
                .unwrap_or([1.0; 4]);

            let pos_view = push_view(&mut bin, &mut buffer_views, &floats_to_bytes(&positions), Some(ARRAY_BUFFER));
            let norm_view = push_view(&mut bin, &mut buffer_views, &floats_to_bytes(&normals), Some(ARRAY_BUFFER));
            let idx_view = push_view(&mut bin, &mut buffer_views, &u32s_to_bytes(&mesh.indices), Some(ELEMENT_ARRAY_BUFFER));

            let pos_acc = accessors.len();
            accessors.push(serde_json::json!({
                "bufferView": pos_view, "componentType": FLOAT, "count": count,
                "type": "VEC3", "min": min, "max": max
            }));
            accessors.push(serde_json::json!({
                "bufferView": norm_view, "componentType": FLOAT, "count": count, "type": "VEC3"
            }));
            accessors.push(serde_json::json!({
                "bufferView": idx_view, "componentType": UNSIGNED_INT,
                "count": mesh.indices.len(), "type": "SCALAR"
            }));

            let mode = match mesh.mode {
                PrimitiveMode::Points => 0,
                PrimitiveMode::Lines => 1,
                PrimitiveMode::Triangles => 4,
            };
            meshes.push(serde_json::json!({
                "name": name,
                "primitives": [{
                    "attributes": { "POSITION": pos_acc, "NORMAL": pos_acc + 1 },
                    "indices": pos_acc + 2,
                    "material": i,
                    "mode": mode
                }]
            }));
            materials.push(serde_json::json!({
                "name": format!("{name}-material"),
                "pbrMetallicRoughness": { "baseColorFactor": color }
            }));
            nodes.push(serde_json::json!({ "name": name, "mesh": i }));
        }

        let mut animations = Vec::new();
        if self.with_animation && !nodes.is_empty() {
            let times = [0.0_f32, FIXTURE_CLIP_DURATION];
            let rotations = [0.0_f32, 0.0, 0.0, 1.0, 0.0, 0.7071068, 0.0, 0.7071068];
            let time_view = push_view(&mut bin, &mut buffer_views, &floats_to_bytes(&times), None);
            let rot_view = push_view(&mut bin, &mut buffer_views, &floats_to_bytes(&rotations), None);
            let time_acc = accessors.len();
            accessors.push(serde_json::json!({
                "bufferView": time_view, "componentType": FLOAT, "count": 2, "type": "SCALAR",
                "min": [0.0], "max": [FIXTURE_CLIP_DURATION]
            }));
            accessors.push(serde_json::json!({
                "bufferView": rot_view, "componentType": FLOAT, "count": 2, "type": "VEC4"
            }));
            animations.push(serde_json::json!({
                "name": "spin",
                "samplers": [{ "input": time_acc, "output": time_acc + 1, "interpolation": "LINEAR" }],
                "channels": [{ "sampler": 0, "target": { "node": 0, "path": "rotation" } }]
            }));
        }

        let mut buffer = serde_json::json!({ "byteLength": bin.len() });
        if let Some(uri) = buffer_uri {
            buffer["uri"] = serde_json::json!(uri);
        }

        let node_indices: Vec<usize> = (0..nodes.len()).collect();
        let mut json = serde_json::json!({
            "asset": { "version": "2.0", "generator": "modelshot fixtures" },
            "scene": 0,
            "scenes": [{ "name": "Scene", "nodes": node_indices }],
            "nodes": nodes,
            "meshes": meshes,
            "materials": materials,
            "accessors": accessors,
            "bufferViews": buffer_views,
            "buffers": [buffer]
        });
        if !animations.is_empty() {
            json["animations"] = serde_json::json!(animations);
        }
        (json, bin)
    }
}

impl Default for GltfFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// GLB holding the reference box
pub fn reference_box_glb() -> Vec<u8> {
    let asset = reference_box();
    GltfFixture::new().mesh("box", asset.meshes[0].clone()).to_glb()
}

/// Append `data` 4-byte aligned and record a buffer view; returns its index
fn push_view(bin: &mut Vec<u8>, views: &mut Vec<serde_json::Value>, data: &[u8], target: Option<u32>) -> usize {
    let offset = bin.len();
    bin.extend_from_slice(data);
    while bin.len() % 4 != 0 {
        bin.push(0);
    }
    let mut view = serde_json::json!({ "buffer": 0, "byteOffset": offset, "byteLength": data.len() });
    if let Some(target) = target {
        view["target"] = serde_json::json!(target);
    }
    views.push(view);
    views.len() - 1
}

fn assemble_glb(json: serde_json::Value, mut bin: Vec<u8>) -> Vec<u8> {
    let mut json_bytes = serde_json::to_string(&json).unwrap_or_default().into_bytes();
    // JSON chunk pads with spaces, BIN chunk with zeros
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json_bytes.len() as u32 + 8 + bin.len() as u32;
    let mut glb = Vec::with_capacity(total as usize);
    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total.to_le_bytes());

    glb.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    glb.extend_from_slice(&json_bytes);

    glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
    glb.extend_from_slice(&bin);
    glb
}

fn floats_to_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn u32s_to_bytes(data: &[u32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}
