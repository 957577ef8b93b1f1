//! Toolpath viewport renderer
//!
//! Owns the drawing surface, the options, the tracked transform, the viewport
//! state and the layer cache of one viewport. Each viewport gets its own
//! [`Renderer`]; nothing is shared between instances.

use super::arc::arc_strategy;
use super::bounds::{layer_bounds, LayerBounds};
use super::command_renderer::{draw_commands, LayerPass, PassSummary};
use super::grid::{draw_bed, draw_bounding_boxes};
use super::layer_cache::LayerCache;
use super::options::{
    LayoutModeChange, OptionChanges, OptionEffect, OptionPatch, RenderOptions, RendererHooks,
};
use super::surface::DrawSurface;
use super::transform::{Transform2D, TransformTracker};
use super::viewport::ViewportController;
use crate::model::{Command, Model, ModelInfo};
use gcodeviewer_core::constants::ZOOM_WHEEL_DELTA;
use glam::DVec2;
use tracing::{debug, trace};

/// Counters describing the work a renderer has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    /// Number of bed fits (`reset_viewport`).
    pub resets: usize,
    /// Number of full redraws of the canvas.
    pub redraws: usize,
    /// What the last pass over the current layer drew.
    pub last_pass: Option<PassSummary>,
}

/// Draws a layered toolpath model onto a [`DrawSurface`] and owns the viewport around it.
pub struct Renderer<S: DrawSurface> {
    surface: S,
    options: RenderOptions,
    hooks: RendererHooks,
    tracker: TransformTracker,
    viewport: ViewportController,
    cache: LayerCache,
    model_info: Option<ModelInfo>,
    model_loaded: bool,
    initialized: bool,
    current_layer: usize,
    range: (usize, usize),
    stats: RenderStats,
}

impl<S: DrawSurface> Renderer<S> {
    pub fn new(surface: S, options: RenderOptions) -> Self {
        Self {
            surface,
            options,
            hooks: RendererHooks::default(),
            tracker: TransformTracker::new(),
            viewport: ViewportController::new(),
            cache: LayerCache::new(),
            model_info: None,
            model_loaded: false,
            initialized: false,
            current_layer: 0,
            range: (0, 0),
            stats: RenderStats::default(),
        }
    }

    fn canvas(&self) -> DVec2 {
        self.surface.size()
    }

    /// Fit the bed on first use. Later calls do nothing.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.reset_viewport();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Map the bed into the canvas and clear pan, zoom and inversion.
    pub fn reset_viewport(&mut self) {
        let canvas = self.canvas();
        self.viewport
            .reset_viewport(&mut self.tracker, &self.options, canvas);
        self.stats.resets += 1;
    }

    /// Replace the active model and render `layer` from its first command.
    ///
    /// The model's own [`ModelInfo`] is used when present, otherwise it is
    /// computed from the layers.
    pub fn do_render(&mut self, model: Model, layer: usize) {
        let Model { layers, info } = model;
        self.model_info = info.or_else(|| ModelInfo::analyze(&layers));
        self.cache.replace(layers);
        self.model_loaded = true;
        self.init();

        let to = self.cache.layer_len(layer).unwrap_or(1);
        self.viewport
            .apply_inversion(&mut self.tracker, &self.options);
        self.render(layer, 0, to);
    }

    /// Draw commands `from..=to` of `layer` on top of the grid and ghost layers.
    ///
    /// Used for progress-synchronised partial rendering. The layout modes
    /// follow `layer`, so a job moving up keeps the active layer framed.
    pub fn render(&mut self, layer: usize, from: usize, to: usize) {
        self.init();
        self.current_layer = layer;
        self.range = (from, to);
        self.rerender();
    }

    /// Re-apply axis inversion and render the current (or given) layer in full.
    pub fn refresh(&mut self, layer: Option<usize>) {
        let layer = layer.unwrap_or(self.current_layer);
        self.init();
        let to = self.cache.layer_len(layer).unwrap_or(1);
        self.viewport
            .apply_inversion(&mut self.tracker, &self.options);
        self.render(layer, 0, to);
    }

    /// Empty the model and cache and draw only the bed.
    pub fn clear(&mut self) {
        self.viewport.forget_layout();
        self.do_render(Model::default(), 0);
    }

    /// Merge a partial option update.
    ///
    /// Equal values are ignored. Bed geometry and axis inversion refit the
    /// bed, layout modes re-run the layout, anything else only redraws. At
    /// most one of each happens per call.
    pub fn set_option(&mut self, mut patch: OptionPatch) -> OptionChanges {
        let mut changes = self.options.merge(&mut patch);
        patch.merge_hooks(&mut self.hooks, &mut changes);
        if !changes.is_dirty() {
            return changes;
        }
        debug!("Options changed: {:?} ({:?})", changes.changed, changes.effect);
        if changes.changed.contains(&"on_viewport_change") {
            self.tracker.forget_reported();
        }

        if self.initialized {
            match changes.effect {
                Some(OptionEffect::Reset) => {
                    self.reset_viewport();
                    self.refresh(None);
                }
                Some(OptionEffect::Refresh) => self.refresh(None),
                _ => self.rerender(),
            }
        }
        changes
    }

    fn apply_layout(&mut self, layer: usize) {
        let canvas = self.canvas();
        let bounds = self.layer_bounds(layer);
        self.viewport
            .apply_offsets(&mut self.tracker, &self.options, bounds, canvas);
        self.viewport
            .apply_zoom(&mut self.tracker, &self.options, bounds, canvas);
    }

    fn notify_if_viewport_changed(&mut self) {
        if !self.tracker.take_changed() {
            return;
        }
        if let Some(hook) = self.hooks.on_viewport_change.as_mut() {
            hook(self.tracker.get_transform());
        }
    }

    fn notify_internal_change(&mut self, change: LayoutModeChange) {
        if let Some(hook) = self.hooks.on_internal_option_change.as_mut() {
            hook(change);
        }
    }

    fn rerender(&mut self) {
        let layer = self.current_layer;
        let len = self.cache.len();
        debug!(
            "Rerendering layer {} of {} with {} segments",
            layer,
            len,
            self.layer_num_segments(layer)
        );

        self.apply_layout(layer);
        self.notify_if_viewport_changed();
        self.surface.clear();
        self.stats.redraws += 1;

        let lwf = self.viewport.line_width_factor();
        self.tracker.save();
        self.tracker.translate_by(self.viewport.offset_bed());
        let bed_transform = self.tracker.get_transform();
        self.tracker.restore();
        draw_bed(&mut self.surface, &self.options, &bed_transform, lwf);

        let current_bounds = if self.options.show_layer_bounding_box {
            self.layer_bounds(layer)
        } else {
            None
        };
        draw_bounding_boxes(
            &mut self.surface,
            &self.options,
            &self.tracker.get_transform(),
            lwf,
            self.model_info.as_ref(),
            current_bounds,
        );

        if len == 0 {
            return;
        }
        if layer >= len {
            debug!("Got request to render non-existent layer {}", layer);
            return;
        }

        if self.options.show_next_layer && layer + 1 < len {
            self.draw_full_layer(layer + 1);
        }
        if self.options.show_current_layer {
            self.draw_full_layer(layer);
        }
        if self.options.show_previous_layer && layer > 0 {
            self.draw_full_layer(layer - 1);
        }
        let (from, to) = self.range;
        self.stats.last_pass = self.draw_layer(layer, from, to, false);

        self.cache
            .clean_cache(layer, self.options.show_previous_layer);
    }

    fn draw_full_layer(&mut self, index: usize) {
        let to = self.cache.layer_len(index).unwrap_or(1);
        self.draw_layer(index, 0, to, true);
    }

    fn draw_layer(
        &mut self,
        index: usize,
        from: usize,
        to: usize,
        ghost: bool,
    ) -> Option<PassSummary> {
        trace!(
            "Drawing layer {} from {} to {} (current: {})",
            index,
            from,
            to,
            !ghost
        );
        let start = self.start_point(index, from)?;
        let commands = self.cache.get_layer(index)?;
        let pass = LayerPass {
            options: &self.options,
            transform: self.tracker.get_transform(),
            line_width_factor: self.viewport.line_width_factor(),
            arcs: arc_strategy(self.options.chrome_arc_fix),
            ghost,
        };
        Some(draw_commands(
            &mut self.surface,
            &pass,
            commands,
            from,
            to,
            start,
        ))
    }

    /// Pen position before command `from` of layer `index`.
    ///
    /// Tried in order: the explicit start of the first command, the target of
    /// the command before `from`, the last known position of the previous
    /// layer, the origin. Returns `None` for missing or empty layers.
    fn start_point(&mut self, index: usize, from: usize) -> Option<DVec2> {
        let (explicit, in_layer) = {
            let commands = self.cache.get_layer(index)?;
            if commands.is_empty() {
                return None;
            }
            let explicit = commands.first().and_then(Command::start);
            let in_layer = from
                .checked_sub(1)
                .and_then(|i| commands.get(i))
                .map(|c| (c.x, c.y));
            (explicit, in_layer)
        };
        if explicit.is_some() {
            return explicit;
        }

        let (x, y) = match in_layer {
            Some(xy) => xy,
            None => index
                .checked_sub(1)
                .and_then(|previous| self.cache.get_layer(previous))
                .map_or((None, None), last_known_position),
        };
        Some(DVec2::new(x.unwrap_or(0.0), y.unwrap_or(0.0)))
    }

    /// Press at device-independent pixel `(x, y)`. Returns whether a drag started.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        let screen = DVec2::new(x, y) * self.options.pixel_ratio;
        self.viewport.set_pointer(screen);
        let point = self.tracker.transformed_point(screen.x, screen.y);
        let allowed = self
            .hooks
            .on_drag_start
            .as_mut()
            .map_or(true, |hook| hook(point));
        if allowed {
            self.viewport.begin_drag(point);
        }
        allowed
    }

    /// Pointer moved. While dragging, pans the view and turns off every
    /// layout mode. Returns whether the view moved.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        let screen = DVec2::new(x, y) * self.options.pixel_ratio;
        self.viewport.set_pointer(screen);
        if !self.viewport.is_dragging() {
            return false;
        }

        let point = self.tracker.transformed_point(screen.x, screen.y);
        if let Some(hook) = self.hooks.on_drag.as_mut() {
            if !hook(point) {
                return false;
            }
        }

        self.viewport.pan(&mut self.tracker, point);
        self.viewport.forget_layout();
        self.options.move_model = false;
        self.options.center_viewport = false;
        self.options.zoom_in_on_model = false;
        self.rerender();

        self.notify_internal_change(LayoutModeChange {
            move_model: Some(false),
            center_viewport: Some(false),
            zoom_in_on_model: Some(false),
        });
        true
    }

    /// Release at `(x, y)`, ending any drag.
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        self.viewport.end_drag();
        let screen = DVec2::new(x, y) * self.options.pixel_ratio;
        let point = self.tracker.transformed_point(screen.x, screen.y);
        if let Some(hook) = self.hooks.on_drag_stop.as_mut() {
            hook(point);
        }
    }

    /// Zoom around the last pointer position. Positive `delta` zooms in.
    pub fn wheel(&mut self, delta: f64) {
        let clicks = if delta > 0.0 {
            ZOOM_WHEEL_DELTA
        } else if delta < 0.0 {
            -ZOOM_WHEEL_DELTA
        } else {
            return;
        };
        let canvas = self.canvas();
        self.viewport
            .zoom_at_pointer(&mut self.tracker, canvas, clicks);
        self.viewport.forget_zoom();
        self.options.zoom_in_on_model = false;
        self.rerender();

        self.notify_internal_change(LayoutModeChange {
            zoom_in_on_model: Some(false),
            ..LayoutModeChange::default()
        });
    }

    /// Z height of a layer, from the first command that knows its start height.
    pub fn get_z(&mut self, layer: usize) -> Option<f64> {
        self.cache
            .get_layer(layer)?
            .iter()
            .find_map(|cmd| cmd.prev_z)
    }

    /// Number of layers, 1 before any model was loaded.
    pub fn model_num_layers(&self) -> usize {
        if self.model_loaded {
            self.cache.len()
        } else {
            1
        }
    }

    /// Number of commands in `layer`, 1 when the layer does not exist.
    pub fn layer_num_segments(&mut self, layer: usize) -> usize {
        if !self.model_loaded {
            return 1;
        }
        self.cache.layer_len(layer).unwrap_or(1)
    }

    pub fn get_layer(&mut self, layer: usize) -> Option<&[Command]> {
        self.cache.get_layer(layer)
    }

    pub fn layer_bounds(&mut self, layer: usize) -> Option<LayerBounds> {
        self.cache.get_layer(layer).and_then(layer_bounds)
    }

    pub fn transform(&self) -> Transform2D {
        self.tracker.get_transform()
    }

    /// Model point under the device pixel `(x, y)`.
    pub fn transformed_point(&self, x: f64, y: f64) -> DVec2 {
        self.tracker.transformed_point(x, y)
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn current_layer(&self) -> usize {
        self.current_layer
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Indices of decoded layers currently held by the cache.
    pub fn cached_layers(&self) -> Vec<usize> {
        self.cache.cached_indices()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// Last known x and y of a layer, searched independently from the end.
fn last_known_position(commands: &[Command]) -> (Option<f64>, Option<f64>) {
    let x = commands.iter().rev().find_map(|c| c.x);
    let y = commands.iter().rev().find_map(|c| c.y);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Layer;
    use crate::visualizer::surface::{DrawOp, RecordingSurface};
    use gcodeviewer_core::types::{shared, shared_vec};

    fn square_layer() -> Vec<Command> {
        vec![
            Command::line((0.0, 0.0), (10.0, 0.0), true).with_z(0.2, 0.2),
            Command::line((10.0, 0.0), (10.0, 10.0), true),
            Command::line((10.0, 10.0), (0.0, 10.0), false),
        ]
    }

    fn renderer(layers: usize) -> Renderer<RecordingSurface> {
        let mut renderer =
            Renderer::new(RecordingSurface::new(800, 600), RenderOptions::default());
        let model = Model::new((0..layers).map(|_| Layer::from(square_layer())).collect());
        renderer.do_render(model, 0);
        renderer
    }

    fn extrusion_strokes(surface: &RecordingSurface, color: crate::visualizer::Color) -> usize {
        surface
            .last_frame()
            .iter()
            .filter(|op| matches!(op, DrawOp::Stroke { style, .. } if style.color == color))
            .count()
    }

    #[test]
    fn test_do_render_draws_layer() {
        let renderer = renderer(2);
        let stats = renderer.stats();
        assert_eq!(stats.resets, 1);
        assert_eq!(stats.redraws, 1);
        let pass = stats.last_pass.unwrap();
        assert_eq!(pass.segments, 3);
        assert_eq!(pass.end, DVec2::new(0.0, 10.0));
        assert!(renderer.model_info().is_some());
        assert_eq!(renderer.surface().count(|op| *op == DrawOp::Clear), 1);
    }

    #[test]
    fn test_queries_before_and_after_load() {
        let mut empty = Renderer::new(RecordingSurface::new(100, 100), RenderOptions::default());
        assert_eq!(empty.model_num_layers(), 1);
        assert_eq!(empty.layer_num_segments(5), 1);
        assert_eq!(empty.get_z(0), None);

        let mut renderer = renderer(3);
        assert_eq!(renderer.model_num_layers(), 3);
        assert_eq!(renderer.layer_num_segments(0), 3);
        assert_eq!(renderer.layer_num_segments(9), 1);
        assert_eq!(renderer.get_z(1), Some(0.2));
        assert_eq!(renderer.get_z(7), None);
    }

    #[test]
    fn test_clear_renders_only_bed() {
        let mut renderer = renderer(2);
        renderer.clear();
        assert_eq!(renderer.model_num_layers(), 0);
        assert!(renderer.model_info().is_none());
        let black = renderer.options().color_line[0];
        assert_eq!(extrusion_strokes(renderer.surface(), black), 0);
        assert_eq!(renderer.surface().count(|op| *op == DrawOp::Clear), 2);
        assert!(!renderer.surface().last_frame().is_empty());
    }

    #[test]
    fn test_equal_option_is_noop() {
        let mut renderer = renderer(1);
        let before = renderer.stats();
        let changes = renderer.set_option(OptionPatch::new().show_moves(true));
        assert!(!changes.is_dirty());
        assert_eq!(renderer.stats(), before);
    }

    #[test]
    fn test_bed_change_resets_once() {
        let mut renderer = renderer(1);
        let before = renderer.stats();
        let changes = renderer.set_option(
            OptionPatch::new()
                .bed(crate::visualizer::BedGeometry::rectangular(300.0, 300.0))
                .show_head(true),
        );
        assert!(changes.needs_reset());
        let after = renderer.stats();
        assert_eq!(after.resets, before.resets + 1);
        assert_eq!(after.redraws, before.redraws + 1);
    }

    #[test]
    fn test_redraw_only_option() {
        let mut renderer = renderer(1);
        let before = renderer.stats();
        renderer.set_option(OptionPatch::new().show_moves(false));
        let after = renderer.stats();
        assert_eq!(after.resets, before.resets);
        assert_eq!(after.redraws, before.redraws + 1);
        assert_eq!(after.last_pass.unwrap().segments, 2);
    }

    #[test]
    fn test_option_before_init_does_not_draw() {
        let mut renderer = Renderer::new(RecordingSurface::new(100, 100), RenderOptions::default());
        renderer.set_option(OptionPatch::new().show_moves(false));
        assert!(!renderer.is_initialized());
        assert!(renderer.surface().ops().is_empty());
    }

    #[test]
    fn test_drag_clears_layout_modes() {
        let mut renderer = renderer(1);
        let seen = shared_vec();
        let sink = seen.clone();
        let mut patch = OptionPatch::new().center_viewport(true);
        patch.hooks.on_internal_option_change = Some(Box::new(move |change| sink.borrow_mut().push(change)));
        renderer.set_option(patch);
        assert!(renderer.options().center_viewport);

        assert!(!renderer.pointer_move(10.0, 10.0));
        assert!(renderer.pointer_down(100.0, 100.0));
        let anchor = renderer.transformed_point(100.0, 100.0);
        assert!(renderer.pointer_move(150.0, 120.0));

        assert!(!renderer.options().center_viewport);
        assert!(!renderer.options().move_model);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].center_viewport, Some(false));
        // the grabbed point follows the pointer
        let moved = renderer.transformed_point(150.0, 120.0);
        assert!((moved - anchor).length() < 1e-9);

        renderer.pointer_up(150.0, 120.0);
        assert!(!renderer.viewport().is_dragging());
    }

    #[test]
    fn test_drag_veto() {
        let mut renderer = renderer(1);
        let mut patch = OptionPatch::new();
        patch.hooks.on_drag_start = Some(Box::new(|_| false));
        renderer.set_option(patch);
        assert!(!renderer.pointer_down(10.0, 10.0));
        let before = renderer.transform();
        assert!(!renderer.pointer_move(50.0, 50.0));
        assert_eq!(renderer.transform(), before);
    }

    #[test]
    fn test_wheel_zooms_at_pointer() {
        let mut renderer = renderer(1);
        renderer.pointer_move(200.0, 300.0);
        let anchor = renderer.transformed_point(200.0, 300.0);
        let scale = renderer.transform().a();
        renderer.wheel(1.0);
        assert!(renderer.transform().a() > scale);
        let after = renderer.transformed_point(200.0, 300.0);
        assert!((after - anchor).length() < 1e-9);
        assert!(!renderer.options().zoom_in_on_model);

        let before = renderer.transform();
        renderer.wheel(0.0);
        assert_eq!(renderer.transform(), before);
    }

    #[test]
    fn test_viewport_hook_fires_on_change_only() {
        let mut renderer = renderer(1);
        let calls = shared(0usize);
        let counter = calls.clone();
        let mut patch = OptionPatch::new();
        patch.hooks.on_viewport_change = Some(Box::new(move |_| *counter.borrow_mut() += 1));
        renderer.set_option(patch);
        assert_eq!(*calls.borrow(), 1);

        renderer.render(0, 0, 1);
        assert_eq!(*calls.borrow(), 1);

        renderer.wheel(-1.0);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_start_falls_back_to_previous_layer() {
        let first = vec![Command::line((0.0, 0.0), (5.0, 7.0), true)];
        let second = vec![Command {
            x: Some(9.0),
            y: Some(9.0),
            extrude: true,
            ..Command::default()
        }];
        let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
        renderer.do_render(Model::new(vec![first.into(), second.into()]), 1);
        let frame = renderer.surface().last_frame();
        assert!(frame.contains(&DrawOp::MoveTo(DVec2::new(5.0, 7.0))));
    }

    #[test]
    fn test_non_existent_layer_draws_bed_only() {
        let mut renderer = renderer(1);
        renderer.render(5, 0, 3);
        assert_eq!(renderer.stats().redraws, 2);
        let black = renderer.options().color_line[0];
        assert_eq!(extrusion_strokes(renderer.surface(), black), 0);
    }

    #[test]
    fn test_cache_window() {
        let layers: Vec<Layer> = (0..6)
            .map(|_| Layer::compress(&square_layer()).unwrap())
            .collect();
        let mut renderer = Renderer::new(RecordingSurface::new(400, 400), RenderOptions::default());
        renderer.do_render(Model::new(layers), 3);
        assert_eq!(renderer.cached_layers(), vec![3]);

        renderer.set_option(OptionPatch::new().show_previous_layer(true).show_next_layer(true));
        assert_eq!(renderer.cached_layers(), vec![2, 3, 4]);

        renderer.set_option(OptionPatch::new().show_previous_layer(false));
        renderer.render(4, 0, 3);
        assert!(renderer.cached_layers().iter().all(|i| *i == 4 || *i == 5));
    }
}
