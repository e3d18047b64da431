use glam::Vec3;
use gltf::buffer;

use crate::error::{CustomizerError, Result};
use crate::math::AABB;

#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub index: usize,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ModelPrimitive {
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.positions.get(tri[0] as usize)?,
                *self.positions.get(tri[1] as usize)?,
                *self.positions.get(tri[2] as usize)?,
            ])
        })
    }
}

/// Triangle geometry of a single mesh, in the mesh's local space.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    pub bounding_box: AABB,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn new(name: impl Into<String>, primitives: Vec<ModelPrimitive>) -> Result<Model> {
        let name = name.into();
        let bounding_box = AABB::from_points(
            primitives
                .iter()
                .flat_map(|primitive| primitive.positions.iter().copied()),
        )
        .ok_or_else(|| CustomizerError::AssetLoad(format!("Mesh without vertices: {}", name)))?;

        Ok(Model {
            name,
            primitives,
            bounding_box,
        })
    }

    pub fn from_gltf(name: impl Into<String>, mesh: gltf::Mesh, buffers: Buffers) -> Result<Model> {
        let name = name.into();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(CustomizerError::AssetLoad(format!(
                    "Unsupported primitive mode in {}: {:?}",
                    name,
                    primitive.mode()
                )));
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let positions = reader
                .read_positions()
                .ok_or_else(|| {
                    CustomizerError::AssetLoad(format!("Primitive without positions in {}", name))
                })?
                .map(Vec3::from)
                .collect::<Vec<Vec3>>();

            // Non-indexed primitives draw their vertices in order
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..positions.len() as u32).collect(),
            };

            primitives.push(ModelPrimitive {
                index: primitive.index(),
                positions,
                indices,
            });
        }

        if primitives.is_empty() {
            return Err(CustomizerError::AssetLoad(format!(
                "Mesh without primitives: {}",
                name
            )));
        }

        Model::new(name, primitives)
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(name: impl Into<String>, size: Vec3) -> Model {
        let h = size * 0.5;
        let positions = vec![
            Vec3::new(-h.x, -h.y, -h.z),
            Vec3::new(h.x, -h.y, -h.z),
            Vec3::new(h.x, h.y, -h.z),
            Vec3::new(-h.x, h.y, -h.z),
            Vec3::new(-h.x, -h.y, h.z),
            Vec3::new(h.x, -h.y, h.z),
            Vec3::new(h.x, h.y, h.z),
            Vec3::new(-h.x, h.y, h.z),
        ];

        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // back
            4, 5, 6, 4, 6, 7, // front
            0, 1, 5, 0, 5, 4, // bottom
            3, 7, 6, 3, 6, 2, // top
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];

        Model {
            name: name.into(),
            primitives: vec![ModelPrimitive {
                index: 0,
                positions,
                indices,
            }],
            bounding_box: AABB::new(-h, h),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.indices.len() / 3).sum()
    }
}
