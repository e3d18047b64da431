use glam::Vec3;

use crate::color::Color;
use crate::registry::{Component, ComponentRegistry};

/// Values the editing controls currently show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditValues {
    pub color: Color,
    /// Width, height and depth scale factors
    pub scale: Vec3,
    /// Mirrors the depth scale of a temple part; 1.0 for everything else
    pub temple_length: f32,
}

impl Default for EditValues {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            scale: Vec3::ONE,
            temple_length: 1.0,
        }
    }
}

fn has_length(id: &str) -> bool {
    id.to_lowercase().contains("temple")
}

#[derive(Debug, Clone, Default)]
pub struct ComponentStore {
    registry: ComponentRegistry,
    active: Option<usize>,
    edit: EditValues,
}

impl ComponentStore {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            active: None,
            edit: EditValues::default(),
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn components(&self) -> &[Component] {
        self.registry.components()
    }

    pub fn active(&self) -> Option<&Component> {
        self.active.and_then(|index| self.registry.get_index(index))
    }

    pub fn edit_values(&self) -> &EditValues {
        &self.edit
    }

    /// Makes `id` the active component and loads its own transform and color
    /// into the edit values. An unknown id leaves the store as it was.
    pub fn select(&mut self, id: &str) -> Option<&Component> {
        let Some(index) = self.registry.position(id) else {
            log::debug!("Ignoring selection of unknown component {:?}", id);
            return None;
        };

        self.active = Some(index);
        let component = self.registry.get_index(index)?;
        let scale = component.transform();
        self.edit = EditValues {
            color: component.color(),
            scale,
            temple_length: if has_length(component.id()) {
                scale.z
            } else {
                1.0
            },
        };

        log::debug!("Selected component {}", component.id());
        Some(component)
    }

    /// Returns the edited component, `None` when nothing is active.
    pub fn set_transform(&mut self, width: f32, height: f32, depth: f32) -> Option<&Component> {
        let scale = Vec3::new(width, height, depth);
        self.edit.scale = scale;

        let component = self.registry.get_index_mut(self.active?)?;
        component.set_transform(scale);
        if has_length(component.id()) {
            self.edit.temple_length = depth;
        }
        Some(&*component)
    }

    /// Recolors the active component only. Returns it, `None` when nothing is
    /// active.
    pub fn set_color(&mut self, color: Color) -> Option<&Component> {
        self.edit.color = color;

        let component = self.registry.get_index_mut(self.active?)?;
        component.set_color(color);
        Some(&*component)
    }

    /// Restores the edit values to white and unit scale. Component records,
    /// including optical materials, are left alone.
    pub fn reset(&mut self) {
        self.edit = EditValues::default();
    }
}
