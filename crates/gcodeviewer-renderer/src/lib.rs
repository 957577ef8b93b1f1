//! # GCodeViewer Renderer
//!
//! Layered toolpath viewport for gcodeviewer.
//! Includes the per-layer command model, reader-side model preparation and
//! the viewport renderer with its drawing backends.

pub mod model;
pub mod reader;
pub mod visualizer;

pub use model::{
    decode_blob, ArcParams, ArcWinding, Axes3, Command, Layer, Model, ModelInfo, PrintedBox,
    Retract, SpeedStats,
};
pub use reader::{CommandPosition, LayerMeta, ModelReader};
pub use visualizer::{
    AxisInversion, BedGeometry, Color, DrawOp, DrawSurface, LayerBounds, LayoutModeChange,
    OptionChanges, OptionEffect, OptionPatch, PixmapSurface, ReaderOptions, RecordingSurface,
    RenderOptions, RenderStats, Renderer, RendererHooks, StrokeStyle, Transform2D,
    TransformTracker,
};
