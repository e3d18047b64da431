use std::path::Path;

use serde::Deserialize;

use crate::color::Color;
use crate::customizer::Customizer;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct DesignEdit {
    pub component: String,
    #[serde(default)]
    pub color: Option<Color>,
    /// Width, height and depth scale factors
    #[serde(default)]
    pub scale: Option<[f32; 3]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Design {
    #[serde(default, rename = "edit")]
    pub edits: Vec<DesignEdit>,
}

impl Design {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Selects each edit's component and applies its values. Edits naming an
    /// unknown component are skipped.
    pub fn apply(&self, customizer: &mut Customizer) {
        for edit in &self.edits {
            if customizer.select(&edit.component).is_none() {
                log::warn!("Design names unknown component {:?}", edit.component);
                continue;
            }
            if let Some([width, height, depth]) = edit.scale {
                customizer.set_transform(width, height, depth);
            }
            if let Some(color) = edit.color {
                customizer.set_color(color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomizerConfig;
    use crate::registry::tests::glasses_scene;
    use glam::Vec3;

    #[test]
    fn test_parse_and_apply() {
        let design: Design = toml::from_str(
            r##"
            [[edit]]
            component = "Temple"
            scale = [1.0, 1.0, 1.4]

            [[edit]]
            component = "Frame"
            color = "#1E90FF"

            [[edit]]
            component = "Bridge"
            color = "#000000"
            "##,
        )
        .unwrap();
        assert_eq!(design.edits.len(), 3);

        let mut customizer = Customizer::new(CustomizerConfig::default());
        customizer.load(&glasses_scene()).unwrap();
        design.apply(&mut customizer);

        let temple = customizer.components().iter().find(|c| c.id() == "Temple").unwrap();
        assert_eq!(temple.transform(), Vec3::new(1.0, 1.0, 1.4));
        let frame = customizer.components().iter().find(|c| c.id() == "Frame").unwrap();
        assert_eq!(frame.color().to_hex(), "#1E90FF");
        assert_eq!(customizer.active().unwrap().id(), "Frame");
    }

    #[test]
    fn test_bad_color_is_rejected() {
        let result: std::result::Result<Design, _> = toml::from_str(
            r#"
            [[edit]]
            component = "Frame"
            color = "blue"
            "#,
        );
        assert!(result.is_err());
    }
}
