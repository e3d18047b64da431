use thiserror::Error;

#[derive(Error, Debug)]
pub enum CustomizerError {
    #[error("Model has a degenerate bounding box ({width} x {height} x {depth})")]
    DegenerateModel { width: f32, height: f32, depth: f32 },
    #[error("Failed to load asset: {0}")]
    AssetLoad(String),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Render surface is not attached")]
    RenderSurfaceNotReady,
    #[error("Render device error: {0}")]
    RenderDevice(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CustomizerError>;
