use std::io::Cursor;

use custom_glasses::camera::Camera;
use custom_glasses::material::{Material, StandardMaterial};
use custom_glasses::model::Model;
use custom_glasses::rendering::{OffscreenSurface, RenderConfig};
use custom_glasses::scene_graph::{Object3D, Scene};
use custom_glasses::{
    CapturedImage, Color, ComponentKind, Customizer, CustomizerConfig, CustomizerError,
    RenderSurface, ViewName,
};
use glam::Vec3;

/// Hands back a PNG tinted by the camera position, so each pose gives a
/// distinct frame without a GPU.
#[derive(Default)]
struct TintSurface {
    attached: bool,
    camera: Option<Camera>,
}

impl RenderSurface for TintSurface {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    fn render(&mut self, _scene: &Scene) -> custom_glasses::Result<()> {
        Ok(())
    }

    fn read_pixels(&mut self) -> custom_glasses::Result<CapturedImage> {
        let eye = self.camera.map(|camera| camera.eye).unwrap_or_default();
        let tint = |v: f32| (128.0 + v * 10.0).clamp(0.0, 255.0) as u8;
        let frame = image::RgbaImage::from_pixel(
            12,
            9,
            image::Rgba([tint(eye.x), tint(eye.y), tint(eye.z), 255]),
        );

        let mut bytes = Vec::new();
        frame.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(CapturedImage(bytes))
    }
}

fn glasses() -> Scene {
    let mut scene = Scene::new();
    let root = scene.add_child(Object3D::group("Sketchfab_model"), None);
    let material = Material::Standard(StandardMaterial::default());

    scene.add_mesh(
        "Frame",
        Model::cuboid("Frame", Vec3::new(14.0, 5.0, 1.0)),
        material.clone(),
        Some(root),
    );
    scene.add_mesh(
        "Object_4",
        Model::cuboid("Object_4", Vec3::new(12.0, 4.0, 0.2)),
        material.clone(),
        Some(root),
    );
    let temple = scene.add_mesh(
        "Temple",
        Model::cuboid("Temple", Vec3::new(0.5, 0.5, 12.0)),
        material,
        Some(root),
    );
    scene.set_object_translation(temple, Vec3::new(6.5, 0.0, -6.0));
    scene
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}

#[test]
fn test_edit_capture_export() {
    let mut customizer = Customizer::new(CustomizerConfig::default());
    customizer.load(&glasses()).unwrap();

    let kinds: Vec<ComponentKind> = customizer.components().iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ComponentKind::Standard,
            ComponentKind::Optical,
            ComponentKind::Standard
        ]
    );

    customizer.select("Temple");
    customizer.set_transform(1.0, 1.0, 2.0);
    customizer.select("Frame");
    customizer.set_color(Color::from_hex("#8B0000").unwrap());
    customizer.select("Temple");
    assert_eq!(customizer.edit_values().scale, Vec3::new(1.0, 1.0, 2.0));
    assert_eq!(customizer.edit_values().color, Color::WHITE);

    let mut surface = TintSurface {
        attached: true,
        ..Default::default()
    };
    let views = customizer.capture_all(&mut surface).unwrap();

    assert!(views.is_complete());
    let order: Vec<ViewName> = views.iter().map(|(name, _)| name).collect();
    assert_eq!(order, ViewName::ALL.to_vec());
    assert_ne!(views.get(ViewName::Front), views.get(ViewName::Left));

    let dir = tempfile::tempdir().unwrap();
    let path = customizer.export(&views, dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "custom-glasses.pdf");

    let pdf = std::fs::read(&path).unwrap();
    assert_eq!(count(&pdf, b"/Type /Page /Parent"), 6);
    assert_eq!(count(&pdf, b"/Subtype /Image"), 6);
}

#[test]
fn test_detached_surface_blocks_export() {
    let mut customizer = Customizer::new(CustomizerConfig::default());
    customizer.load(&glasses()).unwrap();

    let mut surface = TintSurface::default();
    let views = customizer.capture_all(&mut surface).unwrap();
    assert!(views.iter().all(|(_, image)| image.is_empty()));

    let dir = tempfile::tempdir().unwrap();
    let result = customizer.export(&views, dir.path());
    assert!(matches!(result, Err(CustomizerError::RenderSurfaceNotReady)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_gpu_capture_shows_the_model() {
    let mut surface = match OffscreenSurface::new(RenderConfig::default()) {
        Ok(surface) => surface,
        Err(err) => {
            eprintln!("Skipping GPU capture: {}", err);
            return;
        }
    };
    surface.attach(64, 48);

    for target_width in [5.0, 200.0] {
        let config = CustomizerConfig {
            target_width,
            ..Default::default()
        };
        let mut customizer = Customizer::new(config);
        customizer.load(&glasses()).unwrap();
        for id in ["Frame", "Temple"] {
            customizer.select(id);
            customizer.set_color(Color::from_hex("#202020").unwrap());
        }

        let views = customizer.capture_all(&mut surface).unwrap();
        assert!(views.is_complete());

        let front = image::load_from_memory(views.get(ViewName::Front).bytes())
            .unwrap()
            .to_rgba8();
        let drawn = front
            .pixels()
            .filter(|pixel| pixel.0 != [255, 255, 255, 255])
            .count();
        assert!(drawn > 0, "front view is blank at width {}", target_width);
    }
}
