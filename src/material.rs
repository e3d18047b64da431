use crate::color::Color;

/// Lit, opaque metallic-roughness material.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub name: String,
    /// Base color (albedo)
    pub color: Color,
    pub emissive: Color,
    /// Metalness factor (0.0 = dielectric, 1.0 = metal)
    pub metalness: f32,
    /// Roughness factor (0.0 = smooth/mirror, 1.0 = rough)
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::WHITE,
            emissive: Color::BLACK,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
        }
    }
}

/// Translucent material with transmission and a clearcoat layer.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalMaterial {
    pub color: Color,
    pub emissive: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
    /// Fraction of light passing through the surface
    pub transmission: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            emissive: Color::BLACK,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
            transparent: false,
            transmission: 0.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Standard(StandardMaterial),
    Physical(PhysicalMaterial),
}

impl Material {
    pub fn from_gltf(material: &gltf::Material) -> Self {
        let pbr = material.pbr_metallic_roughness();
        let base_color = pbr.base_color_factor();
        let [er, eg, eb] = material.emissive_factor();

        Material::Standard(StandardMaterial {
            name: material.name().unwrap_or("Unnamed material").to_string(),
            color: Color::from_rgba_factor(base_color),
            emissive: Color::new(er, eg, eb),
            metalness: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            opacity: base_color[3],
            transparent: material.alpha_mode() == gltf::material::AlphaMode::Blend,
        })
    }

    pub fn color(&self) -> Color {
        match self {
            Material::Standard(m) => m.color,
            Material::Physical(m) => m.color,
        }
    }

    pub fn emissive(&self) -> Color {
        match self {
            Material::Standard(m) => m.emissive,
            Material::Physical(m) => m.emissive,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Material::Standard(m) => m.opacity,
            Material::Physical(m) => m.opacity,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Material::Standard(m) => m.transparent,
            Material::Physical(m) => m.transparent,
        }
    }

    /// Standard materials never transmit light.
    pub fn transmission(&self) -> f32 {
        match self {
            Material::Standard(_) => 0.0,
            Material::Physical(m) => m.transmission,
        }
    }

    pub fn is_physical(&self) -> bool {
        matches!(self, Material::Physical(_))
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Standard(StandardMaterial::default())
    }
}
