use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use gcodeviewer::{init_logging, Model, OptionPatch, PixmapSurface, Renderer, ViewerConfig};
use tracing::info;

/// Render one layer of a prepared toolpath model to a PNG image.
#[derive(Parser, Debug)]
#[command(author, version, long_version = LONG_VERSION, about)]
struct Cli {
    /// Model file (JSON, as produced by the reader)
    model: PathBuf,

    /// Layer to render
    #[arg(short, long, default_value_t = 0)]
    layer: usize,

    /// First command of a partial render
    #[arg(long, requires = "to")]
    from: Option<usize>,

    /// Last command of a partial render
    #[arg(long, requires = "from")]
    to: Option<usize>,

    /// Frame the model instead of the whole bed
    #[arg(long)]
    zoom_to_model: bool,

    /// Output image
    #[arg(short, long, default_value = "layer.png")]
    out: PathBuf,

    /// Configuration file (JSON or TOML); defaults to the platform config dir
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let config = ViewerConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load viewer configuration")?;

    let content = std::fs::read_to_string(&cli.model)
        .with_context(|| format!("Failed to read {}", cli.model.display()))?;
    let model: Model = serde_json::from_str(&content)
        .with_context(|| format!("Invalid model file {}", cli.model.display()))?;
    let num_layers = model.layers.len();
    if num_layers > 0 && cli.layer >= num_layers {
        bail!("Layer {} out of range (model has {} layers)", cli.layer, num_layers);
    }

    let (width, height) = config.canvas.device_size();
    let surface = PixmapSurface::new(width, height, config.render.bg_color_off_grid)?;
    let mut renderer = Renderer::new(surface, config.render);
    if cli.zoom_to_model {
        renderer.set_option(OptionPatch {
            zoom_in_on_model: Some(true),
            ..OptionPatch::default()
        });
    }

    renderer.do_render(model, cli.layer);
    if let (Some(from), Some(to)) = (cli.from, cli.to) {
        renderer.render(cli.layer, from, to);
    }

    let stats = renderer.stats();
    renderer
        .surface()
        .save(&cli.out)
        .with_context(|| format!("Failed to write {}", cli.out.display()))?;
    info!(
        "Rendered layer {} of {} to {} ({} redraws)",
        cli.layer,
        num_layers,
        cli.out.display(),
        stats.redraws
    );

    Ok(())
}
