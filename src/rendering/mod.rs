pub mod config;
pub mod draw_list;
pub mod offscreen;

pub use config::RenderConfig;
pub use offscreen::OffscreenSurface;
