//! Viewport state machine: bed fit, layout modes, zoom and axis inversion.
//!
//! All operations act on a [`TransformTracker`]; the controller only keeps
//! the state needed to undo what it applied on a previous pass.

use super::bounds::LayerBounds;
use super::options::{AxisInversion, RenderOptions};
use super::transform::TransformTracker;
use gcodeviewer_core::constants::{
    CANVAS_MARGIN_PX, INITIAL_LINE_WIDTH_FACTOR, MIN_ZOOM_SPAN_EXTRUSION_WIDTHS, MIN_ZOOM_SPAN_MM,
    ZOOM_BASE,
};
use glam::DVec2;
use tracing::{debug, trace, warn};

/// An axis flip applied around a pivot in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AppliedInversion {
    axes: AxisInversion,
    pivot: DVec2,
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    offset_model: DVec2,
    offset_bed: DVec2,
    scale: DVec2,
    inversion: Option<AppliedInversion>,
    line_width_factor: f64,
    drag_start: Option<DVec2>,
    pointer: Option<DVec2>,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewportController {
    pub fn new() -> Self {
        Self {
            offset_model: DVec2::ZERO,
            offset_bed: DVec2::ZERO,
            scale: DVec2::ONE,
            inversion: None,
            line_width_factor: INITIAL_LINE_WIDTH_FACTOR,
            drag_start: None,
            pointer: None,
        }
    }

    /// Model units per device pixel at the bed fit; stroke widths scale with it.
    pub fn line_width_factor(&self) -> f64 {
        self.line_width_factor
    }

    pub fn offset_model(&self) -> DVec2 {
        self.offset_model
    }

    pub fn offset_bed(&self) -> DVec2 {
        self.offset_bed
    }

    pub fn zoom(&self) -> DVec2 {
        self.scale
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Fit the bed into the canvas with Y pointing up.
    ///
    /// Circular and centered-origin beds are centered; other beds are
    /// anchored at their lower left corner with the bed centered in the
    /// remaining space. Clears every offset, zoom and inversion.
    pub fn reset_viewport(
        &mut self,
        tracker: &mut TransformTracker,
        options: &RenderOptions,
        canvas: DVec2,
    ) {
        tracker.reset();
        tracker.scale(1.0, -1.0);

        let bed = options.bed.extent();
        let usable = canvas - DVec2::splat(CANVAS_MARGIN_PX);
        let mut ratio = (usable.x / bed.x).min(usable.y / bed.y);
        if !ratio.is_finite() || ratio <= 0.0 {
            warn!(
                "Cannot fit bed {:?} into canvas {:?}, using ratio 1",
                bed, canvas
            );
            ratio = 1.0;
        }

        let translation = if options.bed.origin_is_centered() {
            canvas / 2.0
        } else {
            DVec2::new(
                (canvas.x - bed.x * ratio) / 2.0,
                bed.y * ratio + (canvas.y - bed.y * ratio) / 2.0,
            )
        };
        tracker.translate(translation.x, -translation.y);
        tracker.scale(ratio, ratio);

        self.line_width_factor = 1.0 / ratio;
        self.offset_model = DVec2::ZERO;
        self.offset_bed = DVec2::ZERO;
        self.scale = DVec2::ONE;
        self.inversion = None;

        debug!(
            "Viewport reset: canvas {}x{}, bed {}x{}, ratio {:.4}",
            canvas.x, canvas.y, bed.x, bed.y, ratio
        );
    }

    /// Position the model according to the active layout mode.
    ///
    /// Center and zoom modes put the layer centroid at the canvas center;
    /// move-to-bed-center moves the model to the bed center and the bed by
    /// the opposite amount. Only the difference to the previously applied
    /// model offset is translated, so repeated passes over the same layer
    /// leave the transform untouched.
    pub fn apply_offsets(
        &mut self,
        tracker: &mut TransformTracker,
        options: &RenderOptions,
        bounds: Option<LayerBounds>,
        canvas: DVec2,
    ) {
        let previous = self.offset_model;

        if options.center_viewport || options.zoom_in_on_model {
            // canvas center as it was before the previous offset
            let canvas_center =
                tracker.transformed_point(canvas.x / 2.0, canvas.y / 2.0) + previous;
            self.offset_model = bounds.map_or(DVec2::ZERO, |b| canvas_center - b.center());
            self.offset_bed = DVec2::ZERO;
        } else if options.move_model {
            if let Some(b) = bounds {
                self.offset_model = options.bed.center() - b.center();
                self.offset_bed = -self.offset_model;
            }
        } else {
            self.offset_model = DVec2::ZERO;
            self.offset_bed = DVec2::ZERO;
        }

        trace!(
            "Offsets: model {:?}, bed {:?}",
            self.offset_model,
            self.offset_bed
        );
        if self.offset_model.abs_diff_eq(previous, 1e-9) {
            self.offset_model = previous;
        } else {
            tracker.translate_by(self.offset_model - previous);
        }
    }

    /// Scale around the canvas center so the layer fills the canvas.
    ///
    /// The previously applied zoom is undone before a different one is
    /// applied, so zooms never compound. Spans are clamped to a minimum so
    /// single points and degenerate layers do not produce an infinite zoom.
    pub fn apply_zoom(
        &mut self,
        tracker: &mut TransformTracker,
        options: &RenderOptions,
        bounds: Option<LayerBounds>,
        canvas: DVec2,
    ) {
        let target = if options.zoom_in_on_model {
            bounds.and_then(|b| self.zoom_factor(tracker, options, b, canvas))
        } else {
            None
        };
        let factor = target.unwrap_or(DVec2::ONE);
        if factor.abs_diff_eq(self.scale, 1e-12) {
            return;
        }

        let pivot = tracker.transformed_point(canvas.x / 2.0, canvas.y / 2.0);
        tracker.translate_by(pivot);
        tracker.scale(factor.x / self.scale.x, factor.y / self.scale.y);
        tracker.translate_by(-pivot);
        self.scale = factor;

        if let Some(b) = bounds.filter(|_| target.is_some()) {
            debug!(
                "Zoomed to layer: span {:.2}x{:.2}, scale {:?}",
                b.width(),
                b.height(),
                factor
            );
        }
    }

    /// Scale relative to the unzoomed transform that fits `bounds` into the canvas.
    fn zoom_factor(
        &self,
        tracker: &TransformTracker,
        options: &RenderOptions,
        bounds: LayerBounds,
        canvas: DVec2,
    ) -> Option<DVec2> {
        let min_span = (options.effective_extrusion_width() * MIN_ZOOM_SPAN_EXTRUSION_WIDTHS)
            .max(MIN_ZOOM_SPAN_MM);
        let span = DVec2::new(bounds.width().max(min_span), bounds.height().max(min_span));
        let usable = canvas - DVec2::splat(CANVAS_MARGIN_PX);
        let target = (usable.x / span.x).min(usable.y / span.y);

        let t = tracker.get_transform();
        let base = DVec2::new(t.a() / self.scale.x, t.d() / self.scale.y);
        if base.x == 0.0 || base.y == 0.0 || !target.is_finite() || target <= 0.0 {
            return None;
        }
        // Ratios against the current magnitudes keep inverted axes inverted.
        Some(DVec2::new(target / base.x.abs(), target / base.y.abs()))
    }

    /// Flip the configured axes about the bed center, undoing the previous flip.
    pub fn apply_inversion(&mut self, tracker: &mut TransformTracker, options: &RenderOptions) {
        if let Some(applied) = self.inversion.take() {
            let (sign, shift) = Self::flip(&applied);
            tracker.scale(sign.x, sign.y);
            tracker.translate_by(-shift);
        }

        if options.invert_axes.any() {
            let applied = AppliedInversion {
                axes: options.invert_axes,
                pivot: options.bed.center(),
            };
            let (sign, shift) = Self::flip(&applied);
            tracker.translate_by(shift);
            tracker.scale(sign.x, sign.y);
            self.inversion = Some(applied);
        }
    }

    fn flip(applied: &AppliedInversion) -> (DVec2, DVec2) {
        let sign = DVec2::new(
            if applied.axes.x { -1.0 } else { 1.0 },
            if applied.axes.y { -1.0 } else { 1.0 },
        );
        let shift = DVec2::new(
            if applied.axes.x { 2.0 * applied.pivot.x } else { 0.0 },
            if applied.axes.y { 2.0 * applied.pivot.y } else { 0.0 },
        );
        (sign, shift)
    }

    /// Keep the current zoom as part of the view instead of undoing it later.
    pub fn forget_zoom(&mut self) {
        self.scale = DVec2::ONE;
    }

    /// Keep offsets and zoom as part of the view; used when the user takes over.
    pub fn forget_layout(&mut self) {
        self.offset_model = DVec2::ZERO;
        self.offset_bed = DVec2::ZERO;
        self.scale = DVec2::ONE;
    }

    /// Last known pointer position in device pixels, defaulting to the canvas center.
    pub fn pointer(&self, canvas: DVec2) -> DVec2 {
        self.pointer.unwrap_or(canvas / 2.0)
    }

    pub fn set_pointer(&mut self, screen: DVec2) {
        self.pointer = Some(screen);
    }

    pub fn begin_drag(&mut self, model_point: DVec2) {
        self.drag_start = Some(model_point);
    }

    pub fn drag_start(&self) -> Option<DVec2> {
        self.drag_start
    }

    pub fn end_drag(&mut self) -> Option<DVec2> {
        self.drag_start.take()
    }

    /// Translate so the drag start point lies under `model_point` again.
    pub fn pan(&mut self, tracker: &mut TransformTracker, model_point: DVec2) {
        if let Some(start) = self.drag_start {
            tracker.translate_by(model_point - start);
        }
    }

    /// Zoom by `ZOOM_BASE ^ clicks` around the model point under the pointer.
    pub fn zoom_at_pointer(&mut self, tracker: &mut TransformTracker, canvas: DVec2, clicks: f64) {
        let screen = self.pointer(canvas);
        let anchor = tracker.transformed_point(screen.x, screen.y);
        let factor = ZOOM_BASE.powf(clicks);
        tracker.translate_by(anchor);
        tracker.scale(factor, factor);
        tracker.translate_by(-anchor);
        trace!("Wheel zoom by {:.4} at {:?}", factor, anchor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::options::BedGeometry;

    const CANVAS: DVec2 = DVec2::new(800.0, 600.0);

    fn fitted(options: &RenderOptions) -> (ViewportController, TransformTracker) {
        let mut vp = ViewportController::new();
        let mut tracker = TransformTracker::new();
        vp.reset_viewport(&mut tracker, options, CANVAS);
        (vp, tracker)
    }

    fn square(min: f64, max: f64) -> LayerBounds {
        LayerBounds {
            min_x: min,
            max_x: max,
            min_y: min,
            max_y: max,
        }
    }

    #[test]
    fn test_reset_flips_y() {
        let (vp, tracker) = fitted(&RenderOptions::default());
        let low = tracker.to_screen(DVec2::new(0.0, 0.0));
        let high = tracker.to_screen(DVec2::new(0.0, 100.0));
        assert!(high.y < low.y);
        // 200mm bed in 590px usable height
        assert!((vp.line_width_factor() - 200.0 / 590.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_anchors_rectangular_bed() {
        let (_, tracker) = fitted(&RenderOptions::default());
        let ratio = 590.0 / 200.0;
        let origin = tracker.to_screen(DVec2::ZERO);
        assert!((origin.x - (800.0 - 200.0 * ratio) / 2.0).abs() < 1e-9);
        assert!((origin.y - (200.0 * ratio + (600.0 - 200.0 * ratio) / 2.0)).abs() < 1e-9);
        let far = tracker.to_screen(DVec2::new(200.0, 200.0));
        assert!((far.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_centers_circular_bed() {
        let options = RenderOptions {
            bed: BedGeometry::circular(100.0),
            ..RenderOptions::default()
        };
        let (_, tracker) = fitted(&options);
        assert!(tracker.to_screen(DVec2::ZERO).abs_diff_eq(CANVAS / 2.0, 1e-9));
    }

    #[test]
    fn test_degenerate_bed_does_not_poison_transform() {
        let options = RenderOptions {
            bed: BedGeometry::rectangular(0.0, 0.0),
            ..RenderOptions::default()
        };
        let (vp, tracker) = fitted(&options);
        assert!(tracker.get_transform().is_finite());
        assert_eq!(vp.line_width_factor(), 1.0);
    }

    #[test]
    fn test_center_viewport_puts_layer_in_middle() {
        let options = RenderOptions {
            center_viewport: true,
            move_model: false,
            ..RenderOptions::default()
        };
        let (mut vp, mut tracker) = fitted(&options);
        let bounds = square(150.0, 170.0);
        vp.apply_offsets(&mut tracker, &options, Some(bounds), CANVAS);
        let screen = tracker.to_screen(bounds.center());
        assert!(screen.abs_diff_eq(CANVAS / 2.0, 1e-9));

        // running again does not accumulate
        vp.apply_offsets(&mut tracker, &options, Some(bounds), CANVAS);
        assert!(tracker.to_screen(bounds.center()).abs_diff_eq(CANVAS / 2.0, 1e-9));
        assert_eq!(vp.offset_bed(), DVec2::ZERO);
    }

    #[test]
    fn test_move_model_moves_bed_opposite() {
        let options = RenderOptions::default();
        let (mut vp, mut tracker) = fitted(&options);
        let bounds = square(10.0, 30.0);
        vp.apply_offsets(&mut tracker, &options, Some(bounds), CANVAS);
        assert_eq!(vp.offset_model(), DVec2::new(80.0, 80.0));
        assert_eq!(vp.offset_bed(), DVec2::new(-80.0, -80.0));
    }

    #[test]
    fn test_no_layout_mode_clears_offsets() {
        let mut options = RenderOptions::default();
        let (mut vp, mut tracker) = fitted(&options);
        let before = tracker.get_transform();
        vp.apply_offsets(&mut tracker, &options, Some(square(10.0, 30.0)), CANVAS);
        options.move_model = false;
        vp.apply_offsets(&mut tracker, &options, Some(square(10.0, 30.0)), CANVAS);
        assert_eq!(vp.offset_model(), DVec2::ZERO);
        assert!(tracker.get_transform().abs_diff_eq(&before, 1e-9));
    }

    #[test]
    fn test_zoom_fits_layer_and_does_not_compound() {
        let options = RenderOptions {
            zoom_in_on_model: true,
            move_model: false,
            ..RenderOptions::default()
        };
        let (mut vp, mut tracker) = fitted(&options);
        let bounds = square(0.0, 100.0);
        vp.apply_offsets(&mut tracker, &options, Some(bounds), CANVAS);
        vp.apply_zoom(&mut tracker, &options, Some(bounds), CANVAS);
        let t = tracker.get_transform();
        assert!((t.a() - 5.9).abs() < 1e-9);
        assert!((t.d() + 5.9).abs() < 1e-9);

        vp.apply_offsets(&mut tracker, &options, Some(bounds), CANVAS);
        vp.apply_zoom(&mut tracker, &options, Some(bounds), CANVAS);
        assert!((tracker.get_transform().a() - 5.9).abs() < 1e-9);
        assert!(tracker
            .to_screen(bounds.center())
            .abs_diff_eq(CANVAS / 2.0, 1e-6));
    }

    #[test]
    fn test_zoom_on_single_point_is_clamped() {
        let options = RenderOptions {
            zoom_in_on_model: true,
            ..RenderOptions::default()
        };
        let (mut vp, mut tracker) = fitted(&options);
        vp.apply_zoom(&mut tracker, &options, Some(square(5.0, 5.0)), CANVAS);
        let t = tracker.get_transform();
        assert!(t.is_finite());
        // 50 extrusion widths of 1mm across 590px
        assert!((t.a() - 590.0 / 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_undone_when_mode_off() {
        let mut options = RenderOptions {
            zoom_in_on_model: true,
            ..RenderOptions::default()
        };
        let (mut vp, mut tracker) = fitted(&options);
        let before = tracker.get_transform();
        vp.apply_zoom(&mut tracker, &options, Some(square(0.0, 10.0)), CANVAS);
        options.zoom_in_on_model = false;
        vp.apply_zoom(&mut tracker, &options, Some(square(0.0, 10.0)), CANVAS);
        assert!(tracker.get_transform().abs_diff_eq(&before, 1e-9));
    }

    #[test]
    fn test_inversion_toggles_cleanly() {
        let mut options = RenderOptions::default();
        let (mut vp, mut tracker) = fitted(&options);
        let before = tracker.get_transform();
        let corner = tracker.to_screen(DVec2::ZERO);

        options.invert_axes = AxisInversion { x: true, y: false };
        vp.apply_inversion(&mut tracker, &options);
        vp.apply_inversion(&mut tracker, &options);
        // origin now drawn where the far x edge of the bed was
        let flipped = tracker.to_screen(DVec2::ZERO);
        let far = before.apply(DVec2::new(200.0, 0.0));
        assert!(flipped.abs_diff_eq(far, 1e-9));
        assert!((flipped.y - corner.y).abs() < 1e-9);

        options.invert_axes = AxisInversion::default();
        vp.apply_inversion(&mut tracker, &options);
        assert!(tracker.get_transform().abs_diff_eq(&before, 1e-9));
    }

    #[test]
    fn test_wheel_keeps_anchor_fixed() {
        let (mut vp, mut tracker) = fitted(&RenderOptions::default());
        let screen = DVec2::new(321.0, 123.0);
        vp.set_pointer(screen);
        let anchor = tracker.transformed_point(screen.x, screen.y);
        vp.zoom_at_pointer(&mut tracker, CANVAS, 0.4);
        assert!(tracker.to_screen(anchor).abs_diff_eq(screen, 1e-9));
        assert!(tracker.get_transform().a() > 590.0 / 200.0);
    }

    #[test]
    fn test_pan_moves_start_under_pointer() {
        let (mut vp, mut tracker) = fitted(&RenderOptions::default());
        let start = tracker.transformed_point(100.0, 100.0);
        vp.begin_drag(start);
        let now = tracker.transformed_point(150.0, 80.0);
        vp.pan(&mut tracker, now);
        assert!(tracker.to_screen(start).abs_diff_eq(DVec2::new(150.0, 80.0), 1e-9));
        assert_eq!(vp.end_drag(), Some(start));
        assert!(!vp.is_dragging());
    }
}
