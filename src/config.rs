use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizerConfig {
    /// Width the normalized model's bounding box is scaled to
    #[serde(default = "default_target_width")]
    pub target_width: f32,
    /// Node name of the lens part, which gets the optical material
    #[serde(default = "default_lens_id")]
    pub lens_id: String,
    /// File name of the exported preview document
    #[serde(default = "default_document_name")]
    pub document_name: String,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub thumbnail: ThumbnailConfig,
}

impl Default for CustomizerConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_width(),
            lens_id: default_lens_id(),
            document_name: default_document_name(),
            capture: CaptureConfig::default(),
            thumbnail: ThumbnailConfig::default(),
        }
    }
}

impl CustomizerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: CustomizerConfig = toml::from_str(&content)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_capture_width")]
    pub width: u32,
    #[serde(default = "default_capture_height")]
    pub height: u32,
    #[serde(default = "default_capture_fov")]
    pub fov_degrees: f32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: default_capture_width(),
            height: default_capture_height(),
            fov_degrees: default_capture_fov(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumbnail_min_scale")]
    pub min_scale: f32,
    #[serde(default = "default_thumbnail_max_scale")]
    pub max_scale: f32,
    #[serde(default = "default_thumbnail_fov")]
    pub fov_degrees: f32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            min_scale: default_thumbnail_min_scale(),
            max_scale: default_thumbnail_max_scale(),
            fov_degrees: default_thumbnail_fov(),
        }
    }
}

fn default_target_width() -> f32 {
    5.0
}

fn default_lens_id() -> String {
    "Object_4".to_string()
}

fn default_document_name() -> String {
    "custom-glasses.pdf".to_string()
}

fn default_capture_width() -> u32 {
    800
}

fn default_capture_height() -> u32 {
    600
}

fn default_capture_fov() -> f32 {
    50.0
}

fn default_thumbnail_min_scale() -> f32 {
    0.5
}

fn default_thumbnail_max_scale() -> f32 {
    3.0
}

fn default_thumbnail_fov() -> f32 {
    40.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CustomizerConfig = toml::from_str(
            r#"
            lens_id = "Lens"

            [capture]
            width = 320
            "#,
        )
        .unwrap();

        assert_eq!(config.lens_id, "Lens");
        assert_eq!(config.target_width, 5.0);
        assert_eq!(config.document_name, "custom-glasses.pdf");
        assert_eq!(config.capture.width, 320);
        assert_eq!(config.capture.height, 600);
        assert_eq!(config.thumbnail.max_scale, 3.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customizer.toml");
        std::fs::write(&path, "target_width = 2.5\n").unwrap();

        let config = CustomizerConfig::load(&path).unwrap();
        assert_eq!(config.target_width, 2.5);
        assert_eq!(config.lens_id, "Object_4");
    }
}
