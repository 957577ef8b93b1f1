//! 2D toolpath viewport
//!
//! This module provides:
//! - Transform tracking with screen-to-model mapping (transform)
//! - Lazy layer decompression with a sliding window (layer_cache)
//! - Arc-aware layer bounds (bounds)
//! - Bed fit, layout modes, pan and zoom (viewport)
//! - Batched command drawing (command_renderer) and bed grid (grid)
//! - Option merging and change classification (options)
//! - Drawing backends: recording and tiny-skia raster (surface, pixmap)

pub mod arc;
pub mod bounds;
pub mod color;
pub mod command_renderer;
pub mod grid;
pub mod layer_cache;
pub mod options;
pub mod pixmap;
pub mod renderer;
pub mod surface;
pub mod transform;
pub mod viewport;

pub use arc::{arc_strategy, ArcStrategy, BezierArc, NativeArc};
pub use bounds::{layer_bounds, LayerBounds};
pub use color::{Color, ColorRole, ToolPalette};
pub use command_renderer::{draw_commands, LayerPass, PassSummary};
pub use grid::{draw_bed, draw_bounding_boxes};
pub use layer_cache::LayerCache;
pub use options::{
    AxisInversion, BedGeometry, LayoutModeChange, OptionChanges, OptionEffect, OptionPatch,
    ReaderOptions, RenderOptions, RendererHooks,
};
pub use pixmap::PixmapSurface;
pub use renderer::{RenderStats, Renderer};
pub use surface::{DrawOp, DrawSurface, LineCap, LineJoin, RecordingSurface, StrokeStyle};
pub use transform::{Transform2D, TransformTracker};
pub use viewport::ViewportController;
