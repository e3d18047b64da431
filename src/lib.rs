//! Interactive eyewear customization core: decomposes a 3D glasses model into
//! editable components, keeps their size and color in sync with the scene,
//! and exports a six-view preview document.

pub mod asset;
pub mod camera;
pub mod capture;
pub mod color;
pub mod config;
pub mod customizer;
pub mod design;
pub mod document;
pub mod error;
pub mod material;
pub mod material_policy;
pub mod math;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod rendering;
pub mod scene_graph;
pub mod store;

pub use capture::{CapturedImage, RenderSurface, ViewName, ViewSet};
pub use color::Color;
pub use config::CustomizerConfig;
pub use customizer::Customizer;
pub use error::{CustomizerError, Result};
pub use registry::{Component, ComponentKind};
