//! Viewer-wide constants.

/// Pixels left free around the bed when fitting it into the canvas.
pub const CANVAS_MARGIN_PX: f64 = 10.0;

/// Spacing of bed grid lines in model units (mm).
pub const GRID_STEP_MM: f64 = 10.0;

/// Every n-th grid line is drawn thicker.
pub const GRID_MAJOR_EVERY: usize = 5;

/// Radius of the circle marking the bed origin.
pub const ORIGIN_MARKER_RADIUS: f64 = 2.0;

/// Base of the exponential wheel zoom (`ZOOM_BASE ^ clicks`).
pub const ZOOM_BASE: f64 = 1.1;

/// Zoom "clicks" applied per wheel notch.
pub const ZOOM_WHEEL_DELTA: f64 = 0.4;

/// Opacity of ghost (preview) layers.
pub const GHOST_ALPHA: f32 = 0.3;

/// Shade step applied per tool index when deriving tool colors.
pub const TOOL_SHADE_STEP: f32 = 0.15;

/// Zoom-to-model never frames less than this many extrusion widths.
pub const MIN_ZOOM_SPAN_EXTRUSION_WIDTHS: f64 = 50.0;

/// Absolute lower bound for the zoom-to-model span, guards a zero extrusion width.
pub const MIN_ZOOM_SPAN_MM: f64 = 1e-3;

/// Arcs with a radius below this are drawn as straight segments.
pub const MIN_ARC_RADIUS: f64 = 1e-3;

/// Line-width factor in effect before the first viewport reset.
pub const INITIAL_LINE_WIDTH_FACTOR: f64 = 1.0 / 2.8;

/// Dash pattern used for bounding-box overlays.
pub const BOUNDING_BOX_DASH: [f64; 2] = [2.0, 5.0];

/// Default bed size in mm.
pub const DEFAULT_BED_SIZE_MM: f64 = 200.0;

/// Default headless canvas size in pixels.
pub const DEFAULT_CANVAS_WIDTH_PX: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT_PX: u32 = 800;
