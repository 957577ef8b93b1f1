//! Render options, partial option updates and callback hooks.

use super::color::Color;
use super::transform::Transform2D;
use gcodeviewer_core::constants::DEFAULT_BED_SIZE_MM;
use gcodeviewer_core::{Hook, VetoHook};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Work surface geometry in model units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BedGeometry {
    /// Width of a rectangular bed.
    pub x: f64,
    /// Depth of a rectangular bed.
    pub y: f64,
    /// Radius of a circular bed.
    pub r: f64,
    pub circular: bool,
    pub centered_origin: bool,
}

impl Default for BedGeometry {
    fn default() -> Self {
        Self {
            x: DEFAULT_BED_SIZE_MM,
            y: DEFAULT_BED_SIZE_MM,
            r: DEFAULT_BED_SIZE_MM / 2.0,
            circular: false,
            centered_origin: false,
        }
    }
}

impl BedGeometry {
    pub fn rectangular(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn circular(r: f64) -> Self {
        Self {
            r,
            circular: true,
            ..Self::default()
        }
    }

    /// Width and depth covered by the bed.
    pub fn extent(&self) -> DVec2 {
        if self.circular {
            DVec2::splat(self.r * 2.0)
        } else {
            DVec2::new(self.x, self.y)
        }
    }

    /// Whether the origin sits in the middle of the bed.
    pub fn origin_is_centered(&self) -> bool {
        self.circular || self.centered_origin
    }

    /// Center of the bed in model coordinates.
    pub fn center(&self) -> DVec2 {
        if self.origin_is_centered() {
            DVec2::ZERO
        } else {
            DVec2::new(self.x / 2.0, self.y / 2.0)
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisInversion {
    pub x: bool,
    pub y: bool,
}

impl AxisInversion {
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

/// Everything that controls how a layer is drawn.
///
/// Marker sizes and the extrusion width are in device pixels at a pixel
/// ratio of 1 and are multiplied by `pixel_ratio` when drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub color_grid: Color,
    pub bg_color_grid: Color,
    pub bg_color_off_grid: Color,
    /// Extrusion color per tool.
    pub color_line: Vec<Color>,
    pub color_move: Color,
    pub color_retract: Color,
    pub color_restart: Color,
    pub color_head: Color,
    pub color_segment_start: Color,
    pub color_debug_arc: Color,
    pub color_full_size: Color,
    pub color_bounding_box: Color,
    pub color_layer_bounding_box: Color,

    pub show_moves: bool,
    pub show_retracts: bool,
    #[serde(alias = "show_head_spot")]
    pub show_head: bool,
    pub show_segment_starts: bool,
    pub show_debug_arcs: bool,
    pub show_next_layer: bool,
    pub show_current_layer: bool,
    pub show_previous_layer: bool,
    pub show_bounding_box: bool,
    pub show_layer_bounding_box: bool,
    pub show_full_size: bool,

    pub extrusion_width: f64,
    pub size_retract_spot: f64,
    pub size_head_spot: f64,
    pub size_segment_start: f64,
    pub pixel_ratio: f64,

    /// Draw arcs as quadratic curves instead of native arcs.
    pub chrome_arc_fix: bool,

    /// Move the current layer to the bed center.
    pub move_model: bool,
    /// Center the current layer on the canvas.
    pub center_viewport: bool,
    /// Center and zoom so the current layer fills the canvas.
    pub zoom_in_on_model: bool,
    pub invert_axes: AxisInversion,
    pub bed: BedGeometry,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color_grid: Color::rgb(0xbb, 0xbb, 0xbb),
            bg_color_grid: Color::WHITE,
            bg_color_off_grid: Color::rgb(0xee, 0xee, 0xee),
            color_line: vec![
                Color::rgb(0x00, 0x00, 0x00),
                Color::rgb(0x33, 0x33, 0xcc),
                Color::rgb(0xcc, 0x33, 0x33),
                Color::rgb(0x33, 0xcc, 0x33),
                Color::rgb(0xcc, 0x33, 0xcc),
            ],
            color_move: Color::rgb(0x00, 0xff, 0x00),
            color_retract: Color::rgb(0xff, 0x00, 0x00),
            color_restart: Color::rgb(0x00, 0x00, 0xff),
            color_head: Color::rgb(0x00, 0xff, 0x00),
            color_segment_start: Color::rgb(0x66, 0x66, 0x66),
            color_debug_arc: Color::rgb(0xff, 0x00, 0x00),
            color_full_size: Color::rgb(0x00, 0x00, 0xff),
            color_bounding_box: Color::rgb(0xff, 0x00, 0x00),
            color_layer_bounding_box: Color::rgb(0x00, 0xff, 0x00),
            show_moves: true,
            show_retracts: true,
            show_head: false,
            show_segment_starts: false,
            show_debug_arcs: false,
            show_next_layer: false,
            show_current_layer: false,
            show_previous_layer: false,
            show_bounding_box: false,
            show_layer_bounding_box: false,
            show_full_size: false,
            extrusion_width: 1.0,
            size_retract_spot: 2.0,
            size_head_spot: 2.0,
            size_segment_start: 2.0,
            pixel_ratio: 1.0,
            chrome_arc_fix: false,
            move_model: true,
            center_viewport: false,
            zoom_in_on_model: false,
            invert_axes: AxisInversion::default(),
            bed: BedGeometry::default(),
        }
    }
}

impl RenderOptions {
    /// Whether any neighbouring-layer preview is enabled.
    pub fn shows_ghost_layers(&self) -> bool {
        self.show_next_layer || self.show_current_layer || self.show_previous_layer
    }

    pub fn effective_extrusion_width(&self) -> f64 {
        self.extrusion_width * self.pixel_ratio
    }
}

/// Callbacks installed on a renderer.
#[derive(Default)]
pub struct RendererHooks {
    /// Called with the new transform whenever the view changed before a redraw.
    pub on_viewport_change: Option<Hook<Transform2D>>,
    /// Return `false` to refuse starting a drag at the given model point.
    pub on_drag_start: Option<VetoHook<DVec2>>,
    /// Return `false` to ignore a drag step to the given model point.
    pub on_drag: Option<VetoHook<DVec2>>,
    pub on_drag_stop: Option<Hook<DVec2>>,
    /// Told about options the renderer switched off on its own.
    pub on_internal_option_change: Option<Hook<LayoutModeChange>>,
}

impl fmt::Debug for RendererHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererHooks")
            .field("on_viewport_change", &self.on_viewport_change.is_some())
            .field("on_drag_start", &self.on_drag_start.is_some())
            .field("on_drag", &self.on_drag.is_some())
            .field("on_drag_stop", &self.on_drag_stop.is_some())
            .field(
                "on_internal_option_change",
                &self.on_internal_option_change.is_some(),
            )
            .finish()
    }
}

/// Auto-layout options that were changed by user interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutModeChange {
    pub move_model: Option<bool>,
    pub center_viewport: Option<bool>,
    pub zoom_in_on_model: Option<bool>,
}

/// What has to happen after options changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OptionEffect {
    /// Draw again with the current viewport.
    Redraw,
    /// Re-run the layout modes from the start of the layer.
    Refresh,
    /// Recompute the bed fit before refreshing.
    Reset,
}

/// Outcome of merging an [`OptionPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionChanges {
    pub changed: Vec<&'static str>,
    pub effect: Option<OptionEffect>,
}

impl OptionChanges {
    fn record(&mut self, key: &'static str, effect: OptionEffect) {
        self.changed.push(key);
        self.effect = self.effect.max(Some(effect));
    }

    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    pub fn needs_reset(&self) -> bool {
        self.effect == Some(OptionEffect::Reset)
    }

    pub fn needs_refresh(&self) -> bool {
        self.effect >= Some(OptionEffect::Refresh)
    }
}

macro_rules! option_patch {
    ($($field:ident: $ty:ty => $effect:ident),* $(,)?) => {
        /// A partial update of [`RenderOptions`] plus optional hooks.
        ///
        /// Deserializes from a partial JSON/TOML object; unknown keys are ignored.
        #[derive(Default, Serialize, Deserialize)]
        #[serde(default)]
        pub struct OptionPatch {
            $(
                #[serde(skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
            #[serde(skip)]
            pub hooks: RendererHooks,
        }

        impl OptionPatch {
            pub fn new() -> Self {
                Self::default()
            }

            $(
                pub fn $field(mut self, value: $ty) -> Self {
                    self.$field = Some(value);
                    self
                }
            )*
        }

        impl fmt::Debug for OptionPatch {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut s = f.debug_struct("OptionPatch");
                $(
                    if let Some(value) = &self.$field {
                        s.field(stringify!($field), value);
                    }
                )*
                s.field("hooks", &self.hooks).finish()
            }
        }

        impl RenderOptions {
            /// Apply every value of `patch` that differs from the current one.
            pub fn merge(&mut self, patch: &mut OptionPatch) -> OptionChanges {
                let mut changes = OptionChanges::default();
                $(
                    if let Some(value) = patch.$field.take() {
                        if self.$field != value {
                            self.$field = value;
                            changes.record(stringify!($field), OptionEffect::$effect);
                        }
                    }
                )*
                changes
            }
        }
    };
}

option_patch! {
    color_grid: Color => Redraw,
    bg_color_grid: Color => Redraw,
    bg_color_off_grid: Color => Redraw,
    color_line: Vec<Color> => Redraw,
    color_move: Color => Redraw,
    color_retract: Color => Redraw,
    color_restart: Color => Redraw,
    color_head: Color => Redraw,
    color_segment_start: Color => Redraw,
    color_debug_arc: Color => Redraw,
    color_full_size: Color => Redraw,
    color_bounding_box: Color => Redraw,
    color_layer_bounding_box: Color => Redraw,
    show_moves: bool => Redraw,
    show_retracts: bool => Redraw,
    show_head: bool => Redraw,
    show_segment_starts: bool => Redraw,
    show_debug_arcs: bool => Redraw,
    show_next_layer: bool => Redraw,
    show_current_layer: bool => Redraw,
    show_previous_layer: bool => Redraw,
    show_bounding_box: bool => Redraw,
    show_layer_bounding_box: bool => Redraw,
    show_full_size: bool => Redraw,
    extrusion_width: f64 => Redraw,
    size_retract_spot: f64 => Redraw,
    size_head_spot: f64 => Redraw,
    size_segment_start: f64 => Redraw,
    pixel_ratio: f64 => Redraw,
    chrome_arc_fix: bool => Refresh,
    move_model: bool => Refresh,
    center_viewport: bool => Refresh,
    zoom_in_on_model: bool => Refresh,
    invert_axes: AxisInversion => Reset,
    bed: BedGeometry => Reset,
}

impl OptionPatch {
    /// Move the hooks set in this patch into `hooks`.
    ///
    /// Installing a hook always counts as a change; a new viewport hook
    /// forces a reset so that it observes the fitted transform.
    pub fn merge_hooks(&mut self, hooks: &mut RendererHooks, changes: &mut OptionChanges) {
        let patch = std::mem::take(&mut self.hooks);
        if let Some(hook) = patch.on_viewport_change {
            hooks.on_viewport_change = Some(hook);
            changes.record("on_viewport_change", OptionEffect::Reset);
        }
        if let Some(hook) = patch.on_drag_start {
            hooks.on_drag_start = Some(hook);
            changes.record("on_drag_start", OptionEffect::Redraw);
        }
        if let Some(hook) = patch.on_drag {
            hooks.on_drag = Some(hook);
            changes.record("on_drag", OptionEffect::Redraw);
        }
        if let Some(hook) = patch.on_drag_stop {
            hooks.on_drag_stop = Some(hook);
            changes.record("on_drag_stop", OptionEffect::Redraw);
        }
        if let Some(hook) = patch.on_internal_option_change {
            hooks.on_internal_option_change = Some(hook);
            changes.record("on_internal_option_change", OptionEffect::Redraw);
        }
    }
}

/// Options of the reader-side model preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Drop layers that contain no extrusion.
    pub purge_empty_layers: bool,
    pub force_compression: bool,
    pub always_compress: bool,
    /// Models larger than this many bytes are stored compressed.
    pub compression_size_threshold: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            purge_empty_layers: true,
            force_compression: false,
            always_compress: false,
            compression_size_threshold: 200 * 1024 * 1024,
        }
    }
}
