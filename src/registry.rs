use std::collections::HashSet;

use glam::Vec3;

use crate::color::Color;
use crate::material::Material;
use crate::material_policy;
use crate::scene_graph::{ObjectId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Opaque, tintable part
    Standard,
    /// Glass-like, translucent part
    Optical,
}

impl ComponentKind {
    pub fn classify(name: &str, lens_id: &str) -> Self {
        if name == lens_id {
            ComponentKind::Optical
        } else {
            ComponentKind::Standard
        }
    }
}

/// Canonical state of one editable part. The scene node it points at is a
/// projection of this record.
#[derive(Debug, Clone)]
pub struct Component {
    id: String,
    kind: ComponentKind,
    node: ObjectId,
    transform: Vec3,
    original_transform: Vec3,
    color: Color,
    material: Material,
    original_material: Material,
}

impl Component {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn node(&self) -> ObjectId {
        self.node
    }

    /// Width, height and depth scale factors.
    pub fn transform(&self) -> Vec3 {
        self.transform
    }

    pub fn original_transform(&self) -> Vec3 {
        self.original_transform
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn original_material(&self) -> &Material {
        &self.original_material
    }

    pub(crate) fn set_transform(&mut self, transform: Vec3) {
        self.transform = transform;
    }

    /// Updates the color and rebuilds the material for it.
    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
        self.material = material_policy::materialize(self);
    }

    /// Writes this record onto its scene node. Applying the same record twice
    /// leaves the node unchanged.
    pub fn project(&self, scene: &mut Scene) {
        scene.set_object_scale(self.node, self.transform);
        scene.set_object_material(self.node, self.material.clone());
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: Vec<Component>,
}

impl ComponentRegistry {
    /// Collects every renderable leaf of `scene` in traversal order.
    pub fn build(scene: &Scene, lens_id: &str) -> Self {
        let mut taken = HashSet::new();
        let mut components = Vec::new();

        for node in scene.traverse() {
            let Some(object) = scene.get_object(node) else {
                continue;
            };
            if !object.is_renderable() {
                continue;
            }

            let kind = ComponentKind::classify(&object.name, lens_id);
            let transform = object.transform.scale();
            let original_material = object.material.clone().unwrap_or_default();

            let mut component = Component {
                id: unique_id(&object.name, &mut taken),
                kind,
                node,
                transform,
                original_transform: transform,
                color: Color::WHITE,
                material: original_material.clone(),
                original_material,
            };

            if kind == ComponentKind::Optical {
                component.material = material_policy::materialize(&component);
            }

            components.push(component);
        }

        log::info!("Component registry ready: {} components", components.len());

        Self { components }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|c| c.id())
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn get_index(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub(crate) fn get_index_mut(&mut self, index: usize) -> Option<&mut Component> {
        self.components.get_mut(index)
    }

    /// Re-syncs every node of `scene` from the registry.
    pub fn project(&self, scene: &mut Scene) {
        for component in &self.components {
            component.project(scene);
        }
    }
}

fn unique_id(name: &str, taken: &mut HashSet<String>) -> String {
    let base = if name.is_empty() { "Component" } else { name };
    let mut id = base.to_string();
    let mut suffix = 2;
    while taken.contains(&id) {
        id = format!("{}_{}", base, suffix);
        suffix += 1;
    }
    taken.insert(id.clone());
    id
}
