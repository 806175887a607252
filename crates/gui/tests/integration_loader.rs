//! Integration tests for model loading.
//!
//! Tests end-to-end: glTF/GLB bytes -> loader -> SceneAsset -> framing.

use base64::Engine;
use glam::Vec3;
use modelshot_gui_lib::fixtures::*;
use modelshot_gui_lib::framing;
use modelshot_gui_lib::loader::{self, AssetMap, LoadError};
use modelshot_gui_lib::viewport::mesh::{cuboid, PrimitiveMode};

fn two_mesh_fixture() -> GltfFixture {
    GltfFixture::new()
        .mesh("base", cuboid(Vec3::ZERO, Vec3::new(2.0, 1.0, 2.0), [0.2, 0.4, 0.6]))
        .mesh("top", cuboid(Vec3::new(0.5, 1.0, 0.5), Vec3::new(1.5, 3.0, 1.5), [0.9, 0.1, 0.1]))
}

#[test]
fn test_glb_end_to_end() {
    let loaded = loader::load_bytes(&reference_box_glb(), "box.glb".into(), "", &AssetMap::new()).unwrap();

    assert_eq!(loaded.name, "box.glb");
    let asset = &loaded.asset;
    assert_eq!(asset.meshes.len(), 1);
    assert_eq!(asset.vertex_count(), 24);
    assert_eq!(asset.meshes[0].mode, PrimitiveMode::Triangles);

    let bounds = asset.world_bounds();
    assert!((bounds.min - Vec3::new(-2.0, 0.0, -1.0)).length() < 1e-5);
    assert!((bounds.max - Vec3::new(2.0, 4.0, 1.0)).length() < 1e-5);
}

#[test]
fn test_material_color_reaches_vertices() {
    let loaded = loader::load_bytes(&reference_box_glb(), "box.glb".into(), "", &AssetMap::new()).unwrap();
    let color = &loaded.asset.meshes[0].vertices[6..9];
    for (got, want) in color.iter().zip([0.8, 0.5, 0.2]) {
        assert!((got - want).abs() < 1e-5, "color {color:?}");
    }
}

#[test]
fn test_gltf_with_percent_encoded_buffer_uri() {
    let (json, bin) = two_mesh_fixture().to_gltf("./parts%20bin/scene%20data.bin");

    let mut map = AssetMap::new();
    map.insert("scene.gltf".into(), json.into_bytes());
    map.insert("parts bin/scene data.bin".into(), bin);

    let loaded = loader::load("models/scene.gltf", "models", &map).unwrap();
    assert_eq!(loaded.name, "scene.gltf");
    assert_eq!(loaded.asset.meshes.len(), 2);
    assert_eq!(loaded.asset.node_count(), 3);
}

#[test]
fn test_gltf_with_data_uri_buffer() {
    let fixture = two_mesh_fixture();
    let (_, bin) = fixture.to_gltf("placeholder.bin");
    let uri = format!(
        "data:application/octet-stream;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bin)
    );
    let (json, _) = fixture.to_gltf(&uri);

    let loaded = loader::load_bytes(json.as_bytes(), "inline.gltf".into(), "", &AssetMap::new()).unwrap();
    assert_eq!(loaded.asset.meshes.len(), 2);
}

#[test]
fn test_missing_buffer_is_reported() {
    let (json, _) = two_mesh_fixture().to_gltf("absent.bin");
    let err = loader::load_bytes(
        json.as_bytes(),
        "scene.gltf".into(),
        "/nonexistent/modelshot-loader-test",
        &AssetMap::new(),
    )
    .unwrap_err();

    match err {
        LoadError::MissingBuffer { index, uri } => {
            assert_eq!(index, 0);
            assert_eq!(uri, "absent.bin");
        }
        other => panic!("expected MissingBuffer, got {other:?}"),
    }
}

#[test]
fn test_short_buffer_is_reported() {
    let (json, mut bin) = two_mesh_fixture().to_gltf("data.bin");
    let expected = bin.len();
    bin.truncate(expected / 2);

    let mut map = AssetMap::new();
    map.insert("data.bin".into(), bin);
    let err = loader::load_bytes(json.as_bytes(), "scene.gltf".into(), "", &map).unwrap_err();
    assert!(
        matches!(err, LoadError::TruncatedBuffer { index: 0, expected: e, .. } if e == expected),
        "got {err:?}"
    );
}

#[test]
fn test_document_without_scene() {
    let err = loader::load_bytes(br#"{"asset":{"version":"2.0"}}"#, "empty.gltf".into(), "", &AssetMap::new())
        .unwrap_err();
    assert!(matches!(err, LoadError::NoScene), "got {err:?}");
}

#[test]
fn test_garbage_is_rejected() {
    let err = loader::load_bytes(b"definitely not a model", "junk.glb".into(), "", &AssetMap::new()).unwrap_err();
    assert!(matches!(err, LoadError::Gltf(_)), "got {err:?}");
}

#[test]
fn test_animation_durations_are_listed() {
    let glb = GltfFixture::new()
        .mesh("box", reference_box().meshes[0].clone())
        .animated()
        .to_glb();
    let loaded = loader::load_bytes(&glb, "spin.glb".into(), "", &AssetMap::new()).unwrap();

    let clips = &loaded.asset.animations;
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].name, "spin");
    assert!((clips[0].duration - FIXTURE_CLIP_DURATION).abs() < 1e-6);
}

#[test]
fn test_point_primitives_survive() {
    let points = [Vec3::ZERO, Vec3::new(1.0, 2.0, 0.0), Vec3::new(-1.0, 0.5, 3.0)];
    let glb = GltfFixture::new().mesh("cloud", point_cloud(&points)).to_glb();
    let loaded = loader::load_bytes(&glb, "cloud.glb".into(), "", &AssetMap::new()).unwrap();

    assert_eq!(loaded.asset.meshes.len(), 1);
    assert_eq!(loaded.asset.meshes[0].mode, PrimitiveMode::Points);
    assert_eq!(loaded.asset.vertex_count(), 3);
}

#[test]
fn test_loaded_box_frames_to_reference_scale() {
    let mut loaded = loader::load_bytes(&reference_box_glb(), "box.glb".into(), "", &AssetMap::new()).unwrap();
    let first = framing::frame(&mut loaded.asset);
    assert!((first.scale - 1.25).abs() < 1e-5);

    // Framing is idempotent on an already framed asset
    let second = framing::frame(&mut loaded.asset);
    assert_eq!(first.scale, second.scale);
    assert!((first.size - second.size).abs() < 1e-5);
    assert!((first.ground_offset - second.ground_offset).abs() < 1e-5);
    assert!((first.center_offset - second.center_offset).length() < 1e-5);
}

#[test]
fn test_load_path_resolves_buffers_next_to_file() {
    let dir = std::env::temp_dir().join(format!("modelshot-loader-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let (json, bin) = two_mesh_fixture().to_gltf("scene.bin");
    std::fs::write(dir.join("scene.gltf"), json).unwrap();
    std::fs::write(dir.join("scene.bin"), bin).unwrap();

    let result = loader::load_path(&dir.join("scene.gltf"));
    std::fs::remove_dir_all(&dir).ok();

    let loaded = result.unwrap();
    assert_eq!(loaded.name, "scene.gltf");
    assert_eq!(loaded.asset.meshes.len(), 2);
}

#[test]
fn test_load_path_missing_file() {
    let err = loader::load_path(std::path::Path::new("/nonexistent/modelshot/model.glb")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }), "got {err:?}");
}

#[test]
fn test_triangle_with_missing_vertex_is_dropped_whole() {
    let mut vertices = Vec::new();
    for i in 0..6 {
        let x = i as f32;
        vertices.extend_from_slice(&[x, (i % 2) as f32, 0.0, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5]);
    }
    let mesh = modelshot_gui_lib::viewport::mesh::MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 99, 1, 3, 4, 5],
        mode: PrimitiveMode::Triangles,
    };
    let glb = GltfFixture::new().mesh("broken", mesh).to_glb();
    let loaded = loader::load_bytes(&glb, "broken.glb".into(), "", &AssetMap::new()).unwrap();

    assert_eq!(loaded.asset.meshes[0].indices, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(loaded.asset.vertex_count(), 6);
}
