use crate::color::Color;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub background: Color,
    /// Light every surface receives regardless of orientation
    pub ambient: f32,
    /// Weight of a material's emissive color in the final shade
    pub emissive_weight: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            ambient: 0.5,
            emissive_weight: 0.25,
        }
    }
}
