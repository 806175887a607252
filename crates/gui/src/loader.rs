//! GLTF/GLB loading into a [`SceneAsset`].
//!
//! Sub-resource URIs are normalized (percent-decoded, base prefix and `./`
//! stripped) and looked up in an in-memory [`AssetMap`] first, so a model
//! dropped in together with its `.bin` files loads without touching disk.
//! Misses fall through to `data:` URIs and then to files under the root
//! directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use glam::{Quat, Vec3};
use gltf::mesh::util::ReadIndices;
use gltf::mesh::Mode;
use percent_encoding::percent_decode_str;

use crate::asset::{AnimationClip, SceneAsset, SceneNode};
use crate::viewport::mesh::{push_vert, MeshData, PrimitiveMode};

/// Normalized relative path → file contents
pub type AssetMap = HashMap<String, Vec<u8>>;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid glTF: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("buffer {index} ({uri}) could not be resolved")]
    MissingBuffer { index: usize, uri: String },
    #[error("buffer {index} holds {actual} bytes, expected {expected}")]
    TruncatedBuffer { index: usize, actual: usize, expected: usize },
    #[error("GLB binary chunk is missing")]
    MissingBinChunk,
    #[error("malformed data URI in buffer {0}")]
    InvalidDataUri(usize),
    #[error("file contains no scene")]
    NoScene,
}

/// A successfully loaded model
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    /// Display name, usually the file name
    pub name: String,
    pub asset: SceneAsset,
}

/// Load the model at `url`. `root_path` is both the prefix stripped from
/// sub-resource URIs and the directory misses are resolved against.
pub fn load(url: &str, root_path: &str, asset_map: &AssetMap) -> Result<LoadedAsset, LoadError> {
    let key = normalize_uri(url, root_path);
    let root_dir = Path::new(root_path);
    let bytes = match asset_map.get(&key) {
        Some(bytes) => bytes.clone(),
        None => {
            let path = root_dir.join(&key);
            std::fs::read(&path).map_err(|source| LoadError::Io { path, source })?
        }
    };
    let name = key.rsplit('/').next().unwrap_or(&key).to_string();
    load_bytes(&bytes, name, root_path, asset_map)
}

/// Load a model file from disk; sub-resources resolve next to it
pub fn load_path(path: &Path) -> Result<LoadedAsset, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root = path.parent().map(|p| p.to_string_lossy().into_owned()).unwrap_or_default();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_bytes(&bytes, name, &root, &AssetMap::new())
}

/// Parse GLB or glTF JSON bytes
pub fn load_bytes(
    bytes: &[u8],
    name: String,
    root_path: &str,
    asset_map: &AssetMap,
) -> Result<LoadedAsset, LoadError> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let buffers = resolve_buffers(&gltf, root_path, asset_map)?;
    let asset = build_asset(&gltf.document, &buffers)?;
    tracing::info!(
        "Loaded {name}: {} nodes, {} meshes, {} animations",
        asset.node_count(),
        asset.meshes.len(),
        asset.animations.len()
    );
    Ok(LoadedAsset { name, asset })
}

/// Percent-decode, strip `base` and a leading `./`
pub fn normalize_uri(uri: &str, base: &str) -> String {
    let decoded = percent_decode_str(uri).decode_utf8_lossy();
    let mut path: &str = &decoded;
    let base = base.trim_end_matches('/');
    if !base.is_empty() {
        if let Some(rest) = path.strip_prefix(base) {
            if rest.is_empty() || rest.starts_with('/') {
                path = rest.trim_start_matches('/');
            }
        }
    }
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.to_string()
}

fn resolve_buffers(
    gltf: &gltf::Gltf,
    root_path: &str,
    asset_map: &AssetMap,
) -> Result<Vec<Vec<u8>>, LoadError> {
    let mut out = Vec::new();
    for buffer in gltf.document.buffers() {
        let index = buffer.index();
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf.blob.clone().ok_or(LoadError::MissingBinChunk)?,
            gltf::buffer::Source::Uri(uri) => resolve_uri(index, uri, root_path, asset_map)?,
        };
        if data.len() < buffer.length() {
            return Err(LoadError::TruncatedBuffer {
                index,
                actual: data.len(),
                expected: buffer.length(),
            });
        }
        out.push(data);
    }
    Ok(out)
}

fn resolve_uri(index: usize, uri: &str, root_path: &str, asset_map: &AssetMap) -> Result<Vec<u8>, LoadError> {
    if let Some(data) = uri.strip_prefix("data:") {
        return decode_data_uri(data).ok_or(LoadError::InvalidDataUri(index));
    }

    let key = normalize_uri(uri, root_path);
    if let Some(bytes) = asset_map.get(&key) {
        tracing::debug!("Buffer {index} resolved from asset map: {key}");
        return Ok(bytes.clone());
    }

    let path = Path::new(root_path).join(&key);
    std::fs::read(&path).map_err(|e| {
        tracing::warn!("Buffer {index} not found at {}: {e}", path.display());
        LoadError::MissingBuffer {
            index,
            uri: uri.to_string(),
        }
    })
}

/// Body of a `data:` URI (after the scheme)
fn decode_data_uri(data: &str) -> Option<Vec<u8>> {
    let (header, payload) = data.split_once(',')?;
    if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD.decode(payload).ok()
    } else {
        Some(percent_decode_str(payload).collect())
    }
}

// ── Scene construction ───────────────────────────────────────

fn build_asset(doc: &gltf::Document, buffers: &[Vec<u8>]) -> Result<SceneAsset, LoadError> {
    let scene = doc.default_scene().or_else(|| doc.scenes().next()).ok_or(LoadError::NoScene)?;

    let mut meshes = Vec::new();
    // glTF mesh index → our mesh indices (one per primitive mode)
    let mut mesh_map: Vec<Vec<usize>> = Vec::new();
    for mesh in doc.meshes() {
        let mut by_mode: Vec<MeshData> = Vec::new();
        for prim in mesh.primitives() {
            let Some(data) = read_primitive(&prim, buffers) else {
                continue;
            };
            match by_mode.iter_mut().find(|m| m.mode == data.mode) {
                Some(existing) => {
                    existing.append(&data);
                }
                None => by_mode.push(data),
            }
        }
        let start = meshes.len();
        meshes.extend(by_mode);
        mesh_map.push((start..meshes.len()).collect());
    }

    let mut root = SceneNode::new(scene.name().unwrap_or("scene"));
    for node in scene.nodes() {
        root.children.push(convert_node(&node, &mesh_map));
    }

    let mut asset = SceneAsset::new(root, meshes);
    asset.skins = doc
        .skins()
        .map(|skin| skin.joints().map(|j| j.index()).collect())
        .collect();
    asset.animations = doc.animations().map(|a| read_animation(&a, buffers)).collect();
    Ok(asset)
}

fn convert_node(node: &gltf::Node, mesh_map: &[Vec<usize>]) -> SceneNode {
    let (t, r, s) = node.transform().decomposed();
    let mut out = SceneNode::new(node.name().unwrap_or_default());
    out.source_index = Some(node.index());
    out.translation = Vec3::from(t);
    out.rotation = Quat::from_array(r);
    out.scale = Vec3::from(s);

    if let Some(parts) = node.mesh().and_then(|m| mesh_map.get(m.index())) {
        let mut parts = parts.iter();
        out.mesh = parts.next().copied();
        // Extra primitive modes hang off synthetic children
        for &extra in parts {
            out.children.push(SceneNode::new(format!("{}#{extra}", out.name)).with_mesh(extra));
        }
    }

    for child in node.children() {
        out.children.push(convert_node(&child, mesh_map));
    }
    out
}

fn read_primitive(prim: &gltf::Primitive, buffers: &[Vec<u8>]) -> Option<MeshData> {
    let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }

    let raw: Vec<u32> = match reader.read_indices() {
        Some(ReadIndices::U8(it)) => it.map(u32::from).collect(),
        Some(ReadIndices::U16(it)) => it.map(u32::from).collect(),
        Some(ReadIndices::U32(it)) => it.collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let (mode, indices) = match prim.mode() {
        Mode::Triangles => (PrimitiveMode::Triangles, raw),
        Mode::TriangleStrip => (PrimitiveMode::Triangles, strip_to_list(&raw)),
        Mode::TriangleFan => (PrimitiveMode::Triangles, fan_to_list(&raw)),
        Mode::Lines => (PrimitiveMode::Lines, raw),
        Mode::LineStrip => (PrimitiveMode::Lines, line_strip_to_list(&raw, false)),
        Mode::LineLoop => (PrimitiveMode::Lines, line_strip_to_list(&raw, true)),
        Mode::Points => (PrimitiveMode::Points, raw),
    };
    let indices = drop_out_of_range(indices, mode, positions.len() as u32);

    let normals: Vec<Vec3> = match reader.read_normals() {
        Some(it) => it.map(Vec3::from).collect(),
        None if mode == PrimitiveMode::Triangles => face_normals(&positions, &indices),
        None => vec![Vec3::Y; positions.len()],
    };

    let factor = prim.material().pbr_metallic_roughness().base_color_factor();
    let colors: Vec<[f32; 3]> = match reader.read_colors(0) {
        Some(c) => c
            .into_rgb_f32()
            .map(|c| [c[0] * factor[0], c[1] * factor[1], c[2] * factor[2]])
            .collect(),
        None => vec![[factor[0], factor[1], factor[2]]; positions.len()],
    };

    let mut vertices = Vec::with_capacity(positions.len() * 9);
    for (i, p) in positions.iter().enumerate() {
        let n = normals.get(i).copied().unwrap_or(Vec3::Y);
        let c = colors.get(i).copied().unwrap_or([1.0; 3]);
        push_vert(&mut vertices, p[0], p[1], p[2], n, c);
    }

    Some(MeshData { vertices, indices, mode })
}

fn read_animation(anim: &gltf::Animation, buffers: &[Vec<u8>]) -> AnimationClip {
    let duration = anim
        .channels()
        .filter_map(|ch| {
            ch.reader(|b| buffers.get(b.index()).map(|d| d.as_slice()))
                .read_inputs()
                .map(|times| times.fold(0.0_f32, f32::max))
        })
        .fold(0.0_f32, f32::max);
    AnimationClip {
        name: anim.name().map(str::to_string).unwrap_or_else(|| format!("animation {}", anim.index())),
        duration,
    }
}

/// Drop every whole triangle, line or point that references a missing vertex
fn drop_out_of_range(indices: Vec<u32>, mode: PrimitiveMode, count: u32) -> Vec<u32> {
    let group = match mode {
        PrimitiveMode::Triangles => 3,
        PrimitiveMode::Lines => 2,
        PrimitiveMode::Points => 1,
    };
    if indices.iter().all(|&i| i < count) && indices.len() % group == 0 {
        return indices;
    }
    indices
        .chunks_exact(group)
        .filter(|g| g.iter().all(|&i| i < count))
        .flatten()
        .copied()
        .collect()
}

fn strip_to_list(idx: &[u32]) -> Vec<u32> {
    let mut out = Vec::new();
    for i in 2..idx.len() {
        if i % 2 == 0 {
            out.extend_from_slice(&[idx[i - 2], idx[i - 1], idx[i]]);
        } else {
            out.extend_from_slice(&[idx[i - 1], idx[i - 2], idx[i]]);
        }
    }
    out
}

fn fan_to_list(idx: &[u32]) -> Vec<u32> {
    let mut out = Vec::new();
    for i in 2..idx.len() {
        out.extend_from_slice(&[idx[0], idx[i - 1], idx[i]]);
    }
    out
}

fn line_strip_to_list(idx: &[u32], closed: bool) -> Vec<u32> {
    let mut out: Vec<u32> = idx.windows(2).flat_map(|w| [w[0], w[1]]).collect();
    if closed && idx.len() > 2 {
        out.extend_from_slice(&[idx[idx.len() - 1], idx[0]]);
    }
    out
}

/// Area-weighted vertex normals for meshes that ship without them
fn face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (Vec3::from(positions[a]), Vec3::from(positions[b]), Vec3::from(positions[c]));
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO { Vec3::Y } else { n }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_prefix_and_dot() {
        assert_eq!(normalize_uri("models/./a%20b.bin", "models"), "a b.bin");
        assert_eq!(normalize_uri("./tex/wood.png", ""), "tex/wood.png");
        assert_eq!(normalize_uri("other/x.bin", "models/"), "other/x.bin");
        assert_eq!(normalize_uri("models_lod/a.bin", "models"), "models_lod/a.bin");
        assert_eq!(normalize_uri("models/a.bin", "models/"), "a.bin");
    }

    #[test]
    fn data_uri_base64_and_plain() {
        assert_eq!(decode_data_uri("application/octet-stream;base64,AQID"), Some(vec![1, 2, 3]));
        assert_eq!(decode_data_uri("text/plain,a%20b"), Some(b"a b".to_vec()));
        assert_eq!(decode_data_uri("no-comma"), None);
    }

    #[test]
    fn strip_and_fan_conversion() {
        assert_eq!(strip_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 2, 1, 3]);
        assert_eq!(fan_to_list(&[0, 1, 2, 3]), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(line_strip_to_list(&[0, 1, 2], true), vec![0, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn bad_index_drops_only_its_own_group() {
        let tris = drop_out_of_range(vec![0, 1, 2, 0, 99, 1, 3, 4, 5], PrimitiveMode::Triangles, 6);
        assert_eq!(tris, vec![0, 1, 2, 3, 4, 5]);

        // Strip is expanded first, so only the triangles touching 9 go away
        let strip = drop_out_of_range(strip_to_list(&[0, 1, 2, 9, 3]), PrimitiveMode::Triangles, 4);
        assert_eq!(strip, vec![0, 1, 2]);
        let strip = drop_out_of_range(strip_to_list(&[0, 1, 2, 3, 9]), PrimitiveMode::Triangles, 4);
        assert_eq!(strip, vec![0, 1, 2, 2, 1, 3]);

        let lines = drop_out_of_range(vec![0, 1, 7, 2, 2, 3, 4], PrimitiveMode::Lines, 4);
        assert_eq!(lines, vec![0, 1, 2, 3]);
    }

    #[test]
    fn generated_normals_face_outward() {
        let p = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let n = face_normals(&p, &[0, 1, 2]);
        assert_eq!(n[0], Vec3::Z);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = load_bytes(b"not a model", "x".into(), "", &AssetMap::new()).unwrap_err();
        assert!(matches!(err, LoadError::Gltf(_)));
    }

    #[test]
    fn missing_file_reports_io() {
        let err = load_path(Path::new("/definitely/missing.glb")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
