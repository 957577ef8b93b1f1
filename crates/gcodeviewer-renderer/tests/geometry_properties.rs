//! Property tests for the transform tracker and layer bounds

use gcodeviewer_renderer::visualizer::arc::{point_on_circle, signed_sweep};
use gcodeviewer_renderer::visualizer::layer_bounds;
use gcodeviewer_renderer::{ArcWinding, Command, TransformTracker};
use glam::DVec2;
use proptest::prelude::*;

fn angle_of(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}

#[derive(Debug, Clone)]
enum Op {
    Translate(f64, f64),
    Scale(f64, f64),
    Rotate(f64),
    SaveRestore,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-1000.0..1000.0, -1000.0..1000.0).prop_map(|(x, y)| Op::Translate(x, y)),
        (0.25..4.0, 0.25..4.0, any::<bool>()).prop_map(|(x, y, flip): (f64, f64, bool)| {
            Op::Scale(x, if flip { -y } else { y })
        }),
        (-3.2..3.2).prop_map(Op::Rotate),
        Just(Op::SaveRestore),
    ]
}

#[derive(Debug, Clone)]
enum Segment {
    Line(f64, f64),
    Arc {
        center: (f64, f64),
        radius: f64,
        end_angle: f64,
        clockwise: bool,
    },
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        (-200.0..200.0, -200.0..200.0).prop_map(|(x, y)| Segment::Line(x, y)),
        (
            (-20.0..20.0, -20.0..20.0),
            0.5..50.0,
            -3.2..3.2,
            any::<bool>()
        )
            .prop_map(|(center, radius, end_angle, clockwise)| Segment::Arc {
                center,
                radius,
                end_angle,
                clockwise,
            }),
    ]
}

proptest! {
    #[test]
    fn test_transformed_point_recovers_model_point(
        ops in prop::collection::vec(op(), 0..8),
        x in -500.0..500.0f64,
        y in -500.0..500.0f64,
    ) {
        let mut tracker = TransformTracker::new();
        for op in &ops {
            match *op {
                Op::Translate(dx, dy) => tracker.translate(dx, dy),
                Op::Scale(sx, sy) => tracker.scale(sx, sy),
                Op::Rotate(r) => tracker.rotate(r),
                Op::SaveRestore => {
                    tracker.save();
                    tracker.translate(13.0, -7.0);
                    tracker.restore();
                }
            }
        }

        let model = DVec2::new(x, y);
        let screen = tracker.to_screen(model);
        let back = tracker.transformed_point(screen.x, screen.y);
        let tolerance = 1e-6 * (1.0 + model.length() + screen.length());
        prop_assert!(back.abs_diff_eq(model, tolerance), "{:?} != {:?}", back, model);
        prop_assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_bounds_contain_every_drawn_point(
        start in (-100.0..100.0f64, -100.0..100.0f64),
        segments in prop::collection::vec(segment(), 1..12),
    ) {
        let mut pen = DVec2::new(start.0, start.1);
        let mut commands = Vec::new();
        let mut samples = vec![pen];

        for segment in &segments {
            match *segment {
                Segment::Line(x, y) => {
                    commands.push(Command::line((pen.x, pen.y), (x, y), true));
                    pen = DVec2::new(x, y);
                    samples.push(pen);
                }
                Segment::Arc { center, radius, end_angle, clockwise } => {
                    // re-seat the pen on a circle around an offset center
                    let center = pen + DVec2::new(center.0, center.1);
                    let start_angle = angle_of(pen - center);
                    let on_circle = point_on_circle(center, radius, start_angle);
                    commands.push(Command::line((pen.x, pen.y), (on_circle.x, on_circle.y), true));
                    samples.push(on_circle);

                    let end = point_on_circle(center, radius, end_angle);
                    let winding = if clockwise {
                        ArcWinding::Clockwise
                    } else {
                        ArcWinding::CounterClockwise
                    };
                    let offset = center - on_circle;
                    commands.push(Command::arc(
                        (on_circle.x, on_circle.y),
                        (end.x, end.y),
                        (offset.x, offset.y),
                        winding,
                        true,
                    ));

                    let arc_start = angle_of(on_circle - center);
                    let arc_end = angle_of(end - center);
                    let sweep = signed_sweep(arc_start, arc_end, winding);
                    for step in 0..=32 {
                        let angle = arc_start + sweep * step as f64 / 32.0;
                        samples.push(point_on_circle(center, radius, angle));
                    }
                    pen = end;
                }
            }
        }

        let bounds = layer_bounds(&commands).expect("extruding layer has bounds");
        for point in samples {
            prop_assert!(
                point.x >= bounds.min_x - 1e-6
                    && point.x <= bounds.max_x + 1e-6
                    && point.y >= bounds.min_y - 1e-6
                    && point.y <= bounds.max_y + 1e-6,
                "{:?} outside {:?}",
                point,
                bounds
            );
        }
    }
}
