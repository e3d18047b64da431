use std::path::Path;

use anyhow::Context;
use glam::Vec3;

use crate::color::Color;
use crate::error::{CustomizerError, Result};
use crate::material::{Material, StandardMaterial};
use crate::model::Model;
use crate::scene_graph::Scene;

pub const PLACEHOLDER_NAME: &str = "Placeholder";
pub const PLACEHOLDER_SIZE: Vec3 = Vec3::new(0.1, 0.05, 0.02);

fn import(path: &Path) -> anyhow::Result<Scene> {
    let (document, buffers, _images) = gltf::import(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("No scenes in gltf")?;

    let mut scene = Scene::new();
    scene.spawn_gltf_scene(&buffers, &gltf_scene)?;
    Ok(scene)
}

pub fn load_gltf(path: impl AsRef<Path>) -> Result<Scene> {
    let path = path.as_ref();
    match import(path) {
        Ok(scene) => {
            log::info!(
                "Loaded {} ({} nodes, {} meshes)",
                path.display(),
                scene.objects.len(),
                scene.models.len()
            );
            Ok(scene)
        }
        Err(err) => {
            log::error!("Error loading {}: {:#}", path.display(), err);
            Err(CustomizerError::AssetLoad(format!("{:#}", err)))
        }
    }
}

/// A single small box painted flat in `color`, shown in place of a model that
/// failed to load.
pub fn placeholder_scene(color: Color) -> Scene {
    let mut scene = Scene::new();
    scene.add_mesh(
        PLACEHOLDER_NAME,
        Model::cuboid(PLACEHOLDER_NAME, PLACEHOLDER_SIZE),
        Material::Standard(StandardMaterial {
            name: "Basic".to_string(),
            color,
            emissive: color,
            ..Default::default()
        }),
        None,
    );
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_asset_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_gltf(dir.path().join("glasses4.glb"));
        assert!(matches!(result, Err(CustomizerError::AssetLoad(_))));
    }

    #[test]
    fn test_garbage_file_is_asset_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.glb");
        std::fs::write(&path, b"definitely not gltf").unwrap();
        assert!(matches!(load_gltf(&path), Err(CustomizerError::AssetLoad(_))));
    }

    #[test]
    fn test_loads_minimal_gltf() {
        // One triangle, embedded as a base64 buffer
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.5];
        let bytes: Vec<u8> = positions.iter().flat_map(|v| v.to_le_bytes()).collect();
        let data = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &bytes);

        let gltf = format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "nodes": [0] }}],
  "nodes": [{{ "name": "Root", "children": [1] }}, {{ "name": "Frame", "mesh": 0, "scale": [2, 1, 1] }}],
  "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }} }}] }}],
  "accessors": [{{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0.5] }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{ "byteLength": 36, "uri": "data:application/octet-stream;base64,{}" }}]
}}"#,
            data
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triangle.gltf");
        std::fs::write(&path, gltf).unwrap();

        let scene = load_gltf(&path).unwrap();
        let frame = scene.get_object_by_name("Frame").unwrap();
        let object = scene.get_object(frame).unwrap();
        assert!(object.is_renderable());
        assert_eq!(object.transform.scale(), Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(object.parent(&scene).unwrap().name, "Root");

        let bounds = scene.bounding_box().unwrap();
        assert!(bounds.size().abs_diff_eq(Vec3::new(2.0, 1.0, 0.5), 1e-5));
    }

    #[test]
    fn test_placeholder_is_single_box() {
        let scene = placeholder_scene(Color::WHITE);
        assert_eq!(scene.objects.len(), 1);
        let bounds = scene.bounding_box().unwrap();
        assert!(bounds.size().abs_diff_eq(PLACEHOLDER_SIZE, 1e-6));
    }
}
