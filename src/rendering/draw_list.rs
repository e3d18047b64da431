use glam::Mat4;

use crate::camera::Camera;
use crate::material::Material;
use crate::model::Model;
use crate::scene_graph::Scene;

pub struct DrawItem<'a> {
    pub model: &'a Model,
    pub material: &'a Material,
    pub world: Mat4,
    /// Distance of the bounds center along the view direction
    pub view_depth: f32,
}

impl DrawItem<'_> {
    pub fn is_transparent(&self) -> bool {
        self.material.is_transparent()
    }
}

/// Renderable nodes for one frame. Opaque parts come first in traversal order,
/// then translucent parts from the farthest to the nearest so each blends over
/// what lies behind it.
pub fn draw_list<'a>(scene: &'a Scene, camera: &Camera) -> Vec<DrawItem<'a>> {
    let direction = camera.view_direction();

    let (mut transparent, opaque): (Vec<DrawItem>, Vec<DrawItem>) = scene
        .traverse()
        .into_iter()
        .filter_map(|id| {
            let object = scene.get_object(id)?;
            if !object.is_renderable() {
                return None;
            }

            let model = scene.get_model(object.model_id?)?;
            let world = scene.world_matrix(id);
            let center = model.bounding_box.transformed(&world).center();

            Some(DrawItem {
                model,
                material: object.material.as_ref()?,
                world,
                view_depth: (center - camera.eye).dot(direction),
            })
        })
        .partition(DrawItem::is_transparent);

    transparent.sort_by(|a, b| b.view_depth.total_cmp(&a.view_depth));

    opaque.into_iter().chain(transparent).collect()
}
