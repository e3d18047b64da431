use crate::material::{Material, PhysicalMaterial, StandardMaterial};
use crate::registry::{Component, ComponentKind};

pub const OPTICAL_OPACITY: f32 = 0.9;
pub const OPTICAL_TRANSMISSION: f32 = 0.2;
pub const OPTICAL_METALNESS: f32 = 0.0;
pub const OPTICAL_ROUGHNESS: f32 = 0.1;
pub const OPTICAL_CLEARCOAT: f32 = 1.0;
pub const OPTICAL_CLEARCOAT_ROUGHNESS: f32 = 0.1;

/// Builds a fresh material for `component` from its kind and current color.
///
/// Both variants are reconstructed on every call; nothing is mutated in place,
/// so a material handed to the scene never changes behind its back. Standard
/// parts keep the surface parameters of the material the asset shipped with.
pub fn materialize(component: &Component) -> Material {
    match component.kind() {
        ComponentKind::Standard => Material::Standard(standard(component)),
        ComponentKind::Optical => Material::Physical(optical(component)),
    }
}

fn standard(component: &Component) -> StandardMaterial {
    let base = match component.original_material() {
        Material::Standard(original) => original.clone(),
        Material::Physical(original) => StandardMaterial {
            metalness: original.metalness,
            roughness: original.roughness,
            ..Default::default()
        },
    };

    StandardMaterial {
        color: component.color(),
        emissive: component.color(),
        ..base
    }
}

fn optical(component: &Component) -> PhysicalMaterial {
    PhysicalMaterial {
        color: component.color(),
        emissive: component.color(),
        metalness: OPTICAL_METALNESS,
        roughness: OPTICAL_ROUGHNESS,
        opacity: OPTICAL_OPACITY,
        transparent: true,
        transmission: OPTICAL_TRANSMISSION,
        clearcoat: OPTICAL_CLEARCOAT,
        clearcoat_roughness: OPTICAL_CLEARCOAT_ROUGHNESS,
    }
}
