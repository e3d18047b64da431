use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use custom_glasses::asset;
use custom_glasses::design::Design;
use custom_glasses::rendering::{OffscreenSurface, RenderConfig};
use custom_glasses::{Customizer, CustomizerConfig};

/// Render a glasses model from six angles and export the preview PDF
#[derive(Parser, Debug)]
#[command(name = "custom-glasses")]
#[command(version)]
struct Args {
    /// glTF or GLB model to load
    model: PathBuf,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Design file with per-component edits
    #[arg(short, long)]
    design: Option<PathBuf>,

    /// Directory the document is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CustomizerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CustomizerConfig::default(),
    };

    let mut customizer = Customizer::new(config);
    customizer.load_or_placeholder(asset::load_gltf(&args.model))?;
    if let Some(error) = customizer.load_error() {
        eprintln!("Warning: {}", error);
    }

    for component in customizer.components() {
        log::info!("{} ({:?})", component.id(), component.kind());
    }

    if let Some(path) = &args.design {
        let design = Design::load(path)
            .with_context(|| format!("Failed to load design {}", path.display()))?;
        design.apply(&mut customizer);
    }

    let capture = &customizer.config().capture;
    let mut surface = OffscreenSurface::new(RenderConfig::default())?;
    surface.attach(capture.width, capture.height);

    let views = customizer.capture_all(&mut surface)?;
    let path = customizer.export(&views, &args.output)?;

    println!("{}", path.display());

    Ok(())
}
