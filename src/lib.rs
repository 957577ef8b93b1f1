//! # GCodeViewer
//!
//! A layered toolpath viewer for sliced G-code models:
//! - Per-layer model with optional deflate compression of large jobs
//! - Viewport fitting, pan, zoom and axis inversion over a 2D affine transform
//! - Bed grid, ghost layers, progress ranges and tool-head markers
//! - Headless raster output through tiny-skia
//!
//! ## Architecture
//!
//! 1. **gcodeviewer-core** - Errors, constants, hook aliases
//! 2. **gcodeviewer-renderer** - Model, reader and the viewport renderer
//! 3. **gcodeviewer-settings** - Configuration files (JSON/TOML)
//! 4. **gcodeviewer** - Command line front end

pub use gcodeviewer_core::{Error, ModelError, RenderError, Result};

pub use gcodeviewer_renderer::{
    Command, Layer, Model, ModelInfo, ModelReader, OptionPatch, PixmapSurface, RenderOptions,
    RenderStats, Renderer,
};

pub use gcodeviewer_settings::{CanvasSettings, SettingsError, ViewerConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, so piped image output stays clean
/// - RUST_LOG environment variable support (defaults to `info`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
