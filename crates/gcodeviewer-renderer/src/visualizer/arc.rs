//! Arc emission strategies.
//!
//! Some canvas backends draw arcs with visible artifacts at high zoom. The
//! Bézier strategy sidesteps native arcs by emitting quadratic curves.

use super::surface::DrawSurface;
use crate::model::ArcWinding;
use glam::DVec2;
use lyon::geom::{point, vector, Angle, Arc, QuadraticBezierSegment};
use std::f64::consts::TAU;

const FULL_SWEEP_EPSILON: f64 = 1e-9;

/// Signed sweep from `start_angle` to `end_angle` in the given direction.
///
/// A difference of a full turn or more is a full circle; otherwise the
/// sweep is normalized into `(-TAU, TAU)`.
pub fn signed_sweep(start_angle: f64, end_angle: f64, winding: ArcWinding) -> f64 {
    match winding {
        ArcWinding::CounterClockwise => {
            let delta = end_angle - start_angle;
            if delta >= TAU - FULL_SWEEP_EPSILON {
                TAU
            } else {
                delta.rem_euclid(TAU)
            }
        }
        ArcWinding::Clockwise => {
            let delta = start_angle - end_angle;
            if delta >= TAU - FULL_SWEEP_EPSILON {
                -TAU
            } else {
                -delta.rem_euclid(TAU)
            }
        }
    }
}

/// Approximate an arc with quadratic Bézier segments.
pub fn for_each_quadratic(
    center: DVec2,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    winding: ArcWinding,
    mut segment: impl FnMut(DVec2, DVec2),
) {
    let arc = Arc {
        center: point(center.x, center.y),
        radii: vector(radius, radius),
        start_angle: Angle::radians(start_angle),
        sweep_angle: Angle::radians(signed_sweep(start_angle, end_angle, winding)),
        x_rotation: Angle::radians(0.0),
    };
    arc.for_each_quadratic_bezier(&mut |quad: &QuadraticBezierSegment<f64>| {
        segment(
            DVec2::new(quad.ctrl.x, quad.ctrl.y),
            DVec2::new(quad.to.x, quad.to.y),
        );
    });
}

/// Point on a circle at `angle`.
pub fn point_on_circle(center: DVec2, radius: f64, angle: f64) -> DVec2 {
    center + DVec2::new(angle.cos(), angle.sin()) * radius
}

/// How arcs reach the surface.
pub trait ArcStrategy {
    fn draw_arc(
        &self,
        surface: &mut dyn DrawSurface,
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    );
}

/// Uses the surface's own arc primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeArc;

impl ArcStrategy for NativeArc {
    fn draw_arc(
        &self,
        surface: &mut dyn DrawSurface,
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    ) {
        surface.arc(center, radius, start_angle, end_angle, winding);
    }
}

/// Emits a line to the arc start followed by quadratic curves.
#[derive(Debug, Clone, Copy, Default)]
pub struct BezierArc;

impl ArcStrategy for BezierArc {
    fn draw_arc(
        &self,
        surface: &mut dyn DrawSurface,
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    ) {
        surface.line_to(point_on_circle(center, radius, start_angle));
        for_each_quadratic(center, radius, start_angle, end_angle, winding, |ctrl, to| {
            surface.quad_to(ctrl, to)
        });
    }
}

/// Pick the arc strategy for the `chrome_arc_fix` option.
pub fn arc_strategy(bezier: bool) -> &'static dyn ArcStrategy {
    if bezier {
        &BezierArc
    } else {
        &NativeArc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::surface::{DrawOp, RecordingSurface};
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_signed_sweep() {
        assert!((signed_sweep(0.0, FRAC_PI_2, ArcWinding::CounterClockwise) - FRAC_PI_2).abs() < 1e-12);
        assert!((signed_sweep(0.0, FRAC_PI_2, ArcWinding::Clockwise) + 3.0 * FRAC_PI_2).abs() < 1e-12);
        assert_eq!(signed_sweep(0.0, TAU, ArcWinding::CounterClockwise), TAU);
        assert_eq!(signed_sweep(PI, -PI, ArcWinding::Clockwise), -TAU);
        assert_eq!(signed_sweep(1.0, 1.0, ArcWinding::Clockwise), 0.0);
    }

    #[test]
    fn test_bezier_arc_ends_on_circle() {
        let mut surface = RecordingSurface::new(100, 100);
        BezierArc.draw_arc(
            &mut surface,
            DVec2::ZERO,
            10.0,
            0.0,
            PI,
            ArcWinding::CounterClockwise,
        );
        let ops = surface.ops();
        assert_eq!(ops[0], DrawOp::LineTo(DVec2::new(10.0, 0.0)));
        assert!(ops.len() > 2);
        for op in &ops[1..] {
            match op {
                DrawOp::QuadTo { to, .. } => assert!((to.length() - 10.0).abs() < 1e-6),
                other => panic!("unexpected op {other:?}"),
            }
        }
        match ops.last() {
            Some(DrawOp::QuadTo { to, .. }) => {
                assert!(to.abs_diff_eq(DVec2::new(-10.0, 0.0), 1e-6))
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_native_arc_passes_through() {
        let mut surface = RecordingSurface::new(100, 100);
        arc_strategy(false).draw_arc(&mut surface, DVec2::ONE, 2.0, 0.0, 1.0, ArcWinding::Clockwise);
        assert_eq!(surface.ops().len(), 1);
        assert!(matches!(surface.ops()[0], DrawOp::Arc { radius, .. } if radius == 2.0));
    }
}
