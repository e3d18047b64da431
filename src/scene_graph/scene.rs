use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::HashMap;

use crate::error::Result;
use crate::material::Material;
use crate::math::AABB;
use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{NodeKind, Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    /// Adds `object` under `parent`, or as a root when `parent` is `None`.
    pub fn add_child(&mut self, object: Object3D, parent: Option<ObjectId>) -> ObjectId {
        let object_id = self.add_object(object);
        if parent.is_some() {
            self.set_object_parent(object_id, parent);
        }
        object_id
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    pub fn get_model(&self, id: SceneModelId) -> Option<&Model> {
        self.models.get(id).map(|scene_model| &scene_model.model)
    }

    /// Adds a mesh node together with its geometry.
    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        model: Model,
        material: Material,
        parent: Option<ObjectId>,
    ) -> ObjectId {
        let model_id = self.add_model(SceneModel::new(model));
        self.add_child(Object3D::mesh(name, model_id, material), parent)
    }

    pub fn spawn_gltf_scene(
        &mut self,
        buffers: Buffers,
        scene: &gltf::Scene,
    ) -> Result<Option<ObjectId>> {
        let mut gltf_mesh_to_model = HashMap::new();
        let mut last_object_id = None;

        for node in scene.nodes() {
            last_object_id = Some(self.spawn_gltf_node(
                buffers,
                &node,
                None,
                &mut gltf_mesh_to_model,
            )?);
        }

        Ok(last_object_id)
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
        gltf_mesh_to_model: &mut HashMap<usize, SceneModelId>,
    ) -> Result<ObjectId> {
        let mut object = Object3D::default();
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        object.name = node_name.clone();
        let (translation, rotation, scale) = node.transform().decomposed();

        object.transform.set_transform(
            translation.into(),
            Quat::from_array(rotation),
            scale.into(),
        );

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(mesh_name, mesh.clone(), buffers)?;
                    let model_id = self.add_model(SceneModel::new(model));
                    gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            let material = mesh
                .primitives()
                .next()
                .map(|primitive| Material::from_gltf(&primitive.material()))
                .unwrap_or_default();

            object.kind = NodeKind::Mesh;
            object.model_id = Some(model_id);
            object.material = Some(material);
        } else if node.camera().is_some() {
            object.kind = NodeKind::Camera;
        } else if node.light().is_some() {
            object.kind = NodeKind::Light;
        }

        let object_id = self.add_child(object, parent);

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id), gltf_mesh_to_model)?;
        }

        Ok(object_id)
    }

    pub fn roots(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id)
    }

    /// Pre-order depth-first walk starting at each root, in insertion order.
    pub fn traverse(&self) -> Vec<ObjectId> {
        let mut order = Vec::with_capacity(self.objects.len());
        let mut stack: Vec<ObjectId> = self.roots().collect();
        stack.reverse();

        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(object) = self.objects.get(id) {
                stack.extend(object.child_ids.iter().rev().copied());
            }
        }

        order
    }

    pub fn world_matrix(&self, object_id: ObjectId) -> Mat4 {
        match self.objects.get(object_id) {
            Some(object) => {
                let parent_world = object
                    .parent_id
                    .map(|parent_id| self.world_matrix(parent_id))
                    .unwrap_or(Mat4::IDENTITY);
                parent_world * object.transform.local_matrix()
            }
            None => Mat4::IDENTITY,
        }
    }

    /// World-space bounds of one renderable node.
    pub fn object_bounds(&self, object_id: ObjectId) -> Option<AABB> {
        let object = self.objects.get(object_id)?;
        if !object.is_renderable() {
            return None;
        }
        let model = self.get_model(object.model_id?)?;
        Some(model.bounding_box.transformed(&self.world_matrix(object_id)))
    }

    /// World-space bounds of every renderable node, `None` for an empty scene.
    pub fn bounding_box(&self) -> Option<AABB> {
        self.objects
            .iter()
            .filter_map(|(id, _)| self.object_bounds(id))
            .reduce(|a, b| a.union(&b))
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        // Remove from old parent's children list
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        // Set new parent and add to new parent's children list
        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }
    }

    /// Moves every current root under a new root group and returns its id.
    pub fn wrap_roots(&mut self, name: impl Into<String>) -> ObjectId {
        let old_roots: Vec<ObjectId> = self.roots().collect();
        let wrapper = self.add_object(Object3D::group(name));
        for root in old_roots {
            self.set_object_parent(root, Some(wrapper));
        }
        wrapper
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
    }

    pub fn set_object_scale(&mut self, object_id: ObjectId, scale: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale(scale);
        }
    }

    pub fn set_object_material(&mut self, object_id: ObjectId, material: Material) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.material = Some(material);
        }
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.objects.get(object_id).map(|object| &object.transform)
    }

    /// A standalone scene holding only `object_id`, placed at its world
    /// transform.
    pub fn isolate(&self, object_id: ObjectId) -> Option<Scene> {
        let object = self.objects.get(object_id)?;
        let model = self.get_model(object.model_id?)?.clone();

        let mut isolated = Scene::new();
        let material = object.material.clone().unwrap_or_default();
        let id = isolated.add_mesh(object.name.clone(), model, material, None);
        if let Some(copy) = isolated.get_object_mut(id) {
            copy.transform = Transform::from_matrix(&self.world_matrix(object_id));
        }
        Some(isolated)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy. Ids are remapped so the copy never refers back into the source
/// arenas.
impl Clone for Scene {
    fn clone(&self) -> Self {
        let mut models = Arena::with_capacity(self.models.len());
        let model_ids: Vec<SceneModelId> = self
            .models
            .iter()
            .map(|(_, model)| models.alloc(model.clone()))
            .collect();

        let mut objects = Arena::with_capacity(self.objects.len());
        let object_ids: Vec<ObjectId> = self
            .objects
            .iter()
            .map(|(_, object)| objects.alloc(object.clone()))
            .collect();

        for (_, object) in objects.iter_mut() {
            object.parent_id = object.parent_id.map(|id| object_ids[id.index()]);
            object.model_id = object.model_id.map(|id| model_ids[id.index()]);
            for child_id in object.child_ids.iter_mut() {
                *child_id = object_ids[child_id.index()];
            }
        }

        Scene { objects, models }
    }
}
