use glam::{Mat4, Vec2, Vec3};

use crate::math::AABB;

/// Default clip range as fractions of the eye-to-target distance.
const NEAR_RATIO: f32 = 0.01;
const FAR_RATIO: f32 = 10.0;
const MIN_NEAR: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Camera at `eye` facing `target`. Y is up unless the view runs along the
    /// Y axis, in which case -Z is used so the basis stays well defined.
    pub fn look_at(eye: Vec3, target: Vec3, fov_y_degrees: f32) -> Self {
        let forward = (target - eye).normalize_or_zero();
        let up = if forward.dot(Vec3::Y).abs() > 0.999 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        };

        let distance = eye.distance(target);
        let near = (distance * NEAR_RATIO).max(MIN_NEAR);

        Self {
            eye,
            target,
            up,
            fov_y_degrees,
            near,
            far: (distance * FAR_RATIO).max(near * 2.0),
        }
    }

    /// Sets the clip range so nothing inside `bounds` is cut off by the near
    /// or far plane, whatever the scale of the scene.
    pub fn fit_depth(mut self, bounds: &AABB) -> Self {
        let radius = bounds.size().length() / 2.0;
        let depth = (bounds.center() - self.eye).dot(self.view_direction());
        let far = (depth + radius) * 1.05;
        if far <= MIN_NEAR || !far.is_finite() {
            return self;
        }

        self.far = far;
        self.near = ((depth - radius) * 0.95).max(far * MIN_NEAR);
        self
    }

    /// Frames `bounds` from +Z so the whole object fits the vertical field of
    /// view, with one unit of margin.
    pub fn framing(bounds: &AABB, fov_y_degrees: f32) -> Self {
        let radius = bounds.max_dimension() / 2.0;
        let half_fov = fov_y_degrees.to_radians() / 2.0;
        let distance = radius / half_fov.tan() + 1.0;

        Self::look_at(Vec3::new(0.0, 0.0, distance), Vec3::ZERO, fov_y_degrees).fit_depth(bounds)
    }

    pub fn view_direction(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn get_vp_matrix(&self, resolution: Vec2) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            resolution.x / resolution.y,
            self.near,
            self.far,
        );
        projection * view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 4.0, 0.0), Vec3::ZERO, 50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_view_has_valid_basis() {
        let camera = Camera::look_at(Vec3::new(0.0, 4.0, 0.0), Vec3::ZERO, 50.0);
        let vp = camera.get_vp_matrix(Vec2::new(800.0, 600.0));
        assert!(vp.is_finite());

        // The origin projects to the middle of the screen
        let clip = vp * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn test_framing_distance() {
        let bounds = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let camera = Camera::framing(&bounds, 90.0);
        // radius 1, tan(45deg) = 1
        assert!((camera.eye.z - 2.0).abs() < 1e-5);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    fn depth_range(camera: &Camera, bounds: &AABB) -> (f32, f32) {
        let vp = camera.get_vp_matrix(Vec2::new(800.0, 600.0));
        bounds
            .corners()
            .iter()
            .map(|corner| vp.project_point3(*corner).z)
            .fold((f32::MAX, f32::MIN), |(lo, hi), z| (lo.min(z), hi.max(z)))
    }

    #[test]
    fn test_fit_depth_keeps_large_and_small_scenes_in_range() {
        for width in [0.05, 5.0, 200.0, 5000.0] {
            let half = Vec3::new(width, width * 0.4, width * 0.8) / 2.0;
            let bounds = AABB::new(-half, half);
            let eye = Vec3::new(0.0, width * 0.8, 0.0);

            let camera = Camera::look_at(eye, Vec3::ZERO, 50.0).fit_depth(&bounds);
            assert!(camera.near > 0.0 && camera.near < camera.far);

            let (near, far) = depth_range(&camera, &bounds);
            assert!(near >= 0.0, "width {} clipped at near plane: {}", width, near);
            assert!(far <= 1.0, "width {} clipped at far plane: {}", width, far);
        }
    }

    #[test]
    fn test_clip_range_follows_eye_distance() {
        let close = Camera::look_at(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO, 50.0);
        let far = Camera::look_at(Vec3::new(0.0, 0.0, 1000.0), Vec3::ZERO, 50.0);

        assert!(close.far > 1.0);
        assert!(far.far > 1000.0);
        assert!(far.near > close.near);
    }
}
