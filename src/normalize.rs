use crate::error::{CustomizerError, Result};
use crate::math::AABB;
use crate::scene_graph::Scene;

/// Name of the group node inserted above the source roots.
pub const NORMALIZED_ROOT: &str = "Normalized";

const MIN_VOLUME: f32 = 1e-12;

fn checked_bounds(scene: &Scene) -> Result<AABB> {
    let bounds = scene.bounding_box();
    match bounds {
        Some(bounds) if bounds.volume() > MIN_VOLUME => Ok(bounds),
        _ => {
            let size = bounds.map(|b| b.size()).unwrap_or_default();
            Err(CustomizerError::DegenerateModel {
                width: size.x,
                height: size.y,
                depth: size.z,
            })
        }
    }
}

/// Returns a copy of `scene` uniformly scaled by the factor `scale_for`
/// derives from its bounds, then re-centered on the origin. The input scene is
/// left untouched.
fn normalize_with(scene: &Scene, scale_for: impl FnOnce(&AABB) -> f32) -> Result<Scene> {
    let bounds = checked_bounds(scene)?;
    let factor = scale_for(&bounds);

    let mut normalized = scene.clone();
    let root = normalized.wrap_roots(NORMALIZED_ROOT);
    normalized.set_object_scale(root, glam::Vec3::splat(factor));

    // Centering uses the post-scale box
    let scaled = checked_bounds(&normalized)?;
    normalized.set_object_translation(root, -scaled.center());

    log::debug!(
        "Normalized scene: scale factor {:.4}, offset {:?}",
        factor,
        -scaled.center()
    );

    Ok(normalized)
}

/// Scales the model so its bounding-box width equals `target_width`.
pub fn normalize(scene: &Scene, target_width: f32) -> Result<Scene> {
    normalize_with(scene, |bounds| target_width / bounds.size().x)
}

/// Thumbnail variant: the largest dimension drives the factor, clamped to
/// `[min_scale, max_scale]`.
pub fn normalize_thumbnail(scene: &Scene, min_scale: f32, max_scale: f32) -> Result<Scene> {
    normalize_with(scene, |bounds| {
        (1.0 / bounds.max_dimension()).clamp(min_scale, max_scale)
    })
}
