use std::path::{Path, PathBuf};

use crate::capture::{self, CapturedImage, RenderSurface, ViewPose, ViewSet};
use crate::camera::Camera;
use crate::color::Color;
use crate::config::CustomizerConfig;
use crate::document;
use crate::error::{CustomizerError, Result};
use crate::normalize;
use crate::registry::{Component, ComponentRegistry};
use crate::scene_graph::Scene;
use crate::store::{ComponentStore, EditValues};

pub struct Customizer {
    config: CustomizerConfig,
    scene: Option<Scene>,
    store: ComponentStore,
    loading: bool,
    load_error: Option<String>,
}

impl Customizer {
    pub fn new(config: CustomizerConfig) -> Self {
        Self {
            config,
            scene: None,
            store: ComponentStore::default(),
            loading: true,
            load_error: None,
        }
    }

    pub fn config(&self) -> &CustomizerConfig {
        &self.config
    }

    /// Normalizes `raw`, rebuilds the component registry from scratch and
    /// resets the edit values. A degenerate model leaves the session without
    /// a scene and with the failure recorded in `load_error`.
    pub fn load(&mut self, raw: &Scene) -> Result<()> {
        self.loading = true;
        self.scene = None;
        self.store = ComponentStore::default();

        let result = normalize::normalize(raw, self.config.target_width);
        self.loading = false;

        let mut scene = match result {
            Ok(scene) => scene,
            Err(err) => {
                log::error!("Failed to process model: {}", err);
                self.load_error = Some(err.to_string());
                return Err(err);
            }
        };

        let registry = ComponentRegistry::build(&scene, &self.config.lens_id);
        registry.project(&mut scene);

        self.store = ComponentStore::new(registry);
        self.store.reset();
        self.scene = Some(scene);
        self.load_error = None;
        Ok(())
    }

    /// Loads the result of an asset import. When the import or the model
    /// processing fails the session shows a placeholder box and keeps the
    /// message for display.
    pub fn load_or_placeholder(&mut self, raw: Result<Scene>) -> Result<()> {
        let error = match raw.and_then(|scene| self.load(&scene)) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        log::warn!("Showing placeholder: {}", error);
        let placeholder = crate::asset::placeholder_scene(self.store.edit_values().color);
        self.load(&placeholder)?;
        self.load_error = Some(error.to_string());
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn components(&self) -> &[Component] {
        self.store.components()
    }

    pub fn active(&self) -> Option<&Component> {
        self.store.active()
    }

    pub fn edit_values(&self) -> &EditValues {
        self.store.edit_values()
    }

    pub fn select(&mut self, id: &str) -> Option<&Component> {
        self.store.select(id)
    }

    pub fn set_transform(&mut self, width: f32, height: f32, depth: f32) {
        if let (Some(component), Some(scene)) = (
            self.store.set_transform(width, height, depth),
            self.scene.as_mut(),
        ) {
            component.project(scene);
        }
    }

    pub fn set_color(&mut self, color: Color) {
        if let (Some(component), Some(scene)) =
            (self.store.set_color(color), self.scene.as_mut())
        {
            component.project(scene);
        }
    }

    pub fn reset(&mut self) {
        self.store.reset();
    }

    /// Captures the six fixed views. Without a loaded scene or an attached
    /// surface every view comes back empty.
    pub fn capture_all<S: RenderSurface + ?Sized>(&self, surface: &mut S) -> Result<ViewSet> {
        let Some(scene) = self.scene.as_ref() else {
            log::warn!("No scene loaded, skipping capture");
            return Ok(ViewSet::empty());
        };

        capture::capture_all(
            surface,
            scene,
            &ViewPose::standard(self.config.target_width),
            self.config.capture.fov_degrees,
        )
    }

    /// Renders one component on its own, thumbnail-normalized and framed.
    pub fn capture_thumbnail<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        id: &str,
    ) -> Result<CapturedImage> {
        if !surface.is_attached() {
            return Err(CustomizerError::RenderSurfaceNotReady);
        }

        let thumbnail = self.thumbnail_scene(id)?;
        let bounds = thumbnail
            .bounding_box()
            .ok_or(CustomizerError::DegenerateModel {
                width: 0.0,
                height: 0.0,
                depth: 0.0,
            })?;

        surface.set_camera(Camera::framing(&bounds, self.config.thumbnail.fov_degrees));
        surface.render(&thumbnail)?;
        surface.read_pixels()
    }

    fn thumbnail_scene(&self, id: &str) -> Result<Scene> {
        let component = self
            .store
            .registry()
            .get(id)
            .ok_or_else(|| CustomizerError::UnknownComponent(id.to_string()))?;
        let isolated = self
            .scene
            .as_ref()
            .and_then(|scene| scene.isolate(component.node()))
            .ok_or_else(|| CustomizerError::UnknownComponent(id.to_string()))?;

        normalize::normalize_thumbnail(
            &isolated,
            self.config.thumbnail.min_scale,
            self.config.thumbnail.max_scale,
        )
    }

    /// Writes the preview document for `views` into `dir`.
    pub fn export(&self, views: &ViewSet, dir: impl AsRef<Path>) -> Result<PathBuf> {
        document::export(views, dir, &self.config.document_name)
    }
}
