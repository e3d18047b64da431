use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use glam::Vec3;

use crate::camera::Camera;
use crate::error::Result;
use crate::scene_graph::Scene;

/// Target width the pose positions below are expressed for.
const REFERENCE_WIDTH: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    Front,
    Back,
    Left,
    Right,
    TopFront,
    TopBack,
}

impl ViewName {
    /// Capture and page order.
    pub const ALL: [ViewName; 6] = [
        ViewName::Front,
        ViewName::Back,
        ViewName::Left,
        ViewName::Right,
        ViewName::TopFront,
        ViewName::TopBack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewName::Front => "front",
            ViewName::Back => "back",
            ViewName::Left => "left",
            ViewName::Right => "right",
            ViewName::TopFront => "topFront",
            ViewName::TopBack => "topBack",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn reference_position(&self) -> Vec3 {
        match self {
            ViewName::Front => Vec3::new(0.0, 4.0, 0.0),
            ViewName::Back => Vec3::new(0.0, -4.0, 0.0),
            ViewName::Left => Vec3::new(-7.0, 0.0, 0.0),
            ViewName::Right => Vec3::new(7.0, 0.0, 0.0),
            ViewName::TopFront => Vec3::new(0.0, 0.0, 4.0),
            ViewName::TopBack => Vec3::new(0.0, 0.0, -4.0),
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewPose {
    pub name: ViewName,
    pub position: Vec3,
    pub look_at: Vec3,
}

impl ViewPose {
    /// The six capture poses, scaled to a model normalized to `target_width`.
    pub fn standard(target_width: f32) -> [ViewPose; 6] {
        let scale = target_width / REFERENCE_WIDTH;
        ViewName::ALL.map(|name| ViewPose {
            name,
            position: name.reference_position() * scale,
            look_at: Vec3::ZERO,
        })
    }
}

/// Encoded PNG bytes of one rendered frame. Empty when nothing was captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedImage(pub Vec<u8>);

impl CapturedImage {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// `data:` URL form, or an empty string for an empty image.
    pub fn data_url(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("data:image/png;base64,{}", STANDARD.encode(&self.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSet {
    images: [CapturedImage; 6],
}

impl ViewSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: ViewName) -> &CapturedImage {
        &self.images[name.index()]
    }

    fn insert(&mut self, name: ViewName, image: CapturedImage) {
        self.images[name.index()] = image;
    }

    /// Entries in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (ViewName, &CapturedImage)> {
        ViewName::ALL.iter().map(move |name| (*name, self.get(*name)))
    }

    /// True when every view holds an image.
    pub fn is_complete(&self) -> bool {
        self.images.iter().all(|image| !image.is_empty())
    }
}

/// Something that can draw a scene from a camera and hand back the frame.
pub trait RenderSurface {
    /// False until the surface has somewhere to draw.
    fn is_attached(&self) -> bool;
    fn set_camera(&mut self, camera: Camera);
    fn render(&mut self, scene: &Scene) -> Result<()>;
    fn read_pixels(&mut self) -> Result<CapturedImage>;
}

/// Renders `scene` once per pose, in order, on the single shared surface.
///
/// A detached surface yields an all-empty set. Any render or read-back error
/// fails the whole capture. The surface camera is left at the last pose.
pub fn capture_all<S: RenderSurface + ?Sized>(
    surface: &mut S,
    scene: &Scene,
    poses: &[ViewPose; 6],
    fov_y_degrees: f32,
) -> Result<ViewSet> {
    let mut views = ViewSet::empty();

    if !surface.is_attached() {
        log::warn!("Render surface not attached, skipping capture");
        return Ok(views);
    }

    let bounds = scene.bounding_box();
    for pose in poses {
        let camera = Camera::look_at(pose.position, pose.look_at, fov_y_degrees);
        surface.set_camera(match &bounds {
            Some(bounds) => camera.fit_depth(bounds),
            None => camera,
        });
        surface.render(scene)?;
        let image = surface.read_pixels()?;
        log::debug!("Captured {} view ({} bytes)", pose.name, image.0.len());
        views.insert(pose.name, image);
    }

    log::info!("Captured {} views", poses.len());
    Ok(views)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::CustomizerError;
    use crate::normalize::normalize;
    use crate::registry::tests::glasses_scene;
    use glam::Vec2;
    use std::io::Cursor;

    /// Records every call and hands back a small PNG per frame, tinted by
    /// the frame number so consecutive views differ.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub attached: bool,
        pub fail_on_render: Option<usize>,
        pub calls: Vec<String>,
        pub cameras: Vec<Camera>,
        renders: usize,
    }

    impl RecordingSurface {
        pub fn attached() -> Self {
            Self {
                attached: true,
                ..Default::default()
            }
        }
    }

    impl RenderSurface for RecordingSurface {
        fn is_attached(&self) -> bool {
            self.attached
        }

        fn set_camera(&mut self, camera: Camera) {
            self.calls.push("camera".to_string());
            self.cameras.push(camera);
        }

        fn render(&mut self, _scene: &Scene) -> Result<()> {
            self.calls.push("render".to_string());
            self.renders += 1;
            if self.fail_on_render == Some(self.renders) {
                return Err(CustomizerError::RenderSurfaceNotReady);
            }
            Ok(())
        }

        fn read_pixels(&mut self) -> Result<CapturedImage> {
            self.calls.push("read".to_string());
            let shade = (self.renders * 40 % 256) as u8;
            let frame = image::RgbaImage::from_pixel(4, 3, image::Rgba([shade, 0, 0, 255]));

            let mut bytes = Vec::new();
            frame.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
            Ok(CapturedImage(bytes))
        }
    }

    #[test]
    fn test_captures_six_views_in_order() {
        let mut surface = RecordingSurface::attached();
        let views = capture_all(&mut surface, &Scene::new(), &ViewPose::standard(5.0), 50.0)
            .unwrap();

        assert!(views.is_complete());
        let names: Vec<&str> = views.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            vec!["front", "back", "left", "right", "topFront", "topBack"]
        );
        assert_eq!(surface.cameras[2].eye, Vec3::new(-7.0, 0.0, 0.0));
        assert_ne!(views.get(ViewName::Front), views.get(ViewName::Back));

        // camera, render, read for each pose, never interleaved
        let expected: Vec<String> = (0..6)
            .flat_map(|_| ["camera", "render", "read"])
            .map(String::from)
            .collect();
        assert_eq!(surface.calls, expected);
    }

    #[test]
    fn test_detached_surface_yields_empty_views() {
        let mut surface = RecordingSurface::default();
        let views = capture_all(&mut surface, &Scene::new(), &ViewPose::standard(5.0), 50.0)
            .unwrap();

        assert!(!views.is_complete());
        assert!(views.iter().all(|(_, image)| image.is_empty()));
        assert!(surface.calls.is_empty());
    }

    #[test]
    fn test_render_failure_fails_whole_capture() {
        let mut surface = RecordingSurface {
            fail_on_render: Some(3),
            ..RecordingSurface::attached()
        };
        let result = capture_all(&mut surface, &Scene::new(), &ViewPose::standard(5.0), 50.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_poses_scale_with_target_width() {
        let poses = ViewPose::standard(10.0);
        assert_eq!(poses[0].position, Vec3::new(0.0, 8.0, 0.0));
        assert_eq!(poses[3].position, Vec3::new(14.0, 0.0, 0.0));
        assert!(poses.iter().all(|pose| pose.look_at == Vec3::ZERO));
    }

    #[test]
    fn test_model_stays_inside_clip_range_for_any_target_width() {
        for target_width in [0.05, 5.0, 200.0] {
            let scene = normalize(&glasses_scene(), target_width).unwrap();
            let bounds = scene.bounding_box().unwrap();

            let mut surface = RecordingSurface::attached();
            capture_all(&mut surface, &scene, &ViewPose::standard(target_width), 50.0).unwrap();

            for camera in &surface.cameras {
                let vp = camera.get_vp_matrix(Vec2::new(64.0, 48.0));
                for corner in bounds.corners() {
                    let depth = vp.project_point3(corner).z;
                    assert!(
                        (0.0..=1.0).contains(&depth),
                        "width {} from {:?}: depth {}",
                        target_width,
                        camera.eye,
                        depth
                    );
                }
            }
        }
    }

    #[test]
    fn test_data_url() {
        assert_eq!(CapturedImage::default().data_url(), "");
        assert_eq!(
            CapturedImage(b"abc".to_vec()).data_url(),
            "data:image/png;base64,YWJj"
        );
    }
}
