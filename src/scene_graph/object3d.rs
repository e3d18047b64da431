use id_arena::Id;

use crate::material::Material;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// What a node is, decided once when the node enters the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Mesh,
    Light,
    Camera,
}

#[derive(Debug, Clone)]
pub struct Object3D {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub material: Option<Material>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn mesh(name: impl Into<String>, model_id: SceneModelId, material: Material) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Mesh,
            model_id: Some(model_id),
            material: Some(material),
            ..Default::default()
        }
    }

    /// Meshes are the only renderable leaves.
    pub fn is_renderable(&self) -> bool {
        self.kind == NodeKind::Mesh && self.model_id.is_some()
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Object3D> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_object(*id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: NodeKind::Group,
            transform: Transform::default(),
            model_id: None,
            material: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
