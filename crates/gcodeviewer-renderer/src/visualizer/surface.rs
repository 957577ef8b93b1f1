//! Drawing surface abstraction.
//!
//! The renderer issues canvas-style path commands in model coordinates and
//! hands the current [`Transform2D`] to every stroke or fill. A path stays
//! current until the next [`DrawSurface::begin_path`], so it can be stroked
//! and then filled.

use super::color::Color;
use super::transform::Transform2D;
use crate::model::ArcWinding;
use glam::DVec2;
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Round,
    Miter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Round,
    Butt,
}

/// How a path is stroked. `width` is in model units.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub dash: Option<[f64; 2]>,
    pub join: LineJoin,
    pub cap: LineCap,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: None,
            join: LineJoin::Round,
            cap: LineCap::Round,
        }
    }

    pub fn dashed(mut self, dash: [f64; 2]) -> Self {
        self.dash = Some(dash);
        self
    }

    pub fn mitered(mut self) -> Self {
        self.join = LineJoin::Miter;
        self.cap = LineCap::Butt;
        self
    }
}

/// A canvas-like 2D drawing target.
pub trait DrawSurface {
    /// Size of the surface in device pixels.
    fn size(&self) -> DVec2;

    /// Wipe the whole surface, ignoring any transform.
    fn clear(&mut self);

    fn begin_path(&mut self);

    fn move_to(&mut self, point: DVec2);

    fn line_to(&mut self, point: DVec2);

    fn quad_to(&mut self, control: DVec2, to: DVec2);

    /// Append a circular arc. Angles are in radians in model space; the arc
    /// is joined to the current point with a straight line.
    fn arc(
        &mut self,
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    );

    fn close_path(&mut self);

    fn rect(&mut self, origin: DVec2, size: DVec2) {
        self.move_to(origin);
        self.line_to(origin + DVec2::new(size.x, 0.0));
        self.line_to(origin + size);
        self.line_to(origin + DVec2::new(0.0, size.y));
        self.close_path();
    }

    fn circle(&mut self, center: DVec2, radius: f64) {
        self.move_to(center + DVec2::new(radius, 0.0));
        self.arc(center, radius, 0.0, TAU, ArcWinding::CounterClockwise);
        self.close_path();
    }

    fn stroke(&mut self, style: &StrokeStyle, transform: &Transform2D);

    fn fill(&mut self, color: Color, transform: &Transform2D);
}

/// A recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    BeginPath,
    MoveTo(DVec2),
    LineTo(DVec2),
    QuadTo {
        control: DVec2,
        to: DVec2,
    },
    Arc {
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    },
    ClosePath,
    Stroke {
        style: StrokeStyle,
        transform: Transform2D,
    },
    Fill {
        color: Color,
        transform: Transform2D,
    },
}

/// Surface that records every operation instead of rasterizing.
///
/// Used for headless inspection of what the renderer drew.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: DVec2,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: DVec2::new(width as f64, height as f64),
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Operations issued after the most recent clear.
    pub fn last_frame(&self) -> &[DrawOp] {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == DrawOp::Clear)
            .map_or(0, |i| i + 1);
        &self.ops[start..]
    }

    /// Stroke styles of the most recent frame, in order.
    pub fn frame_strokes(&self) -> Vec<&StrokeStyle> {
        self.last_frame()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Stroke { style, .. } => Some(style),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }
}

impl DrawSurface for RecordingSurface {
    fn size(&self) -> DVec2 {
        self.size
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, point: DVec2) {
        self.ops.push(DrawOp::MoveTo(point));
    }

    fn line_to(&mut self, point: DVec2) {
        self.ops.push(DrawOp::LineTo(point));
    }

    fn quad_to(&mut self, control: DVec2, to: DVec2) {
        self.ops.push(DrawOp::QuadTo { control, to });
    }

    fn arc(
        &mut self,
        center: DVec2,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        winding: ArcWinding,
    ) {
        self.ops.push(DrawOp::Arc {
            center,
            radius,
            start_angle,
            end_angle,
            winding,
        });
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn stroke(&mut self, style: &StrokeStyle, transform: &Transform2D) {
        self.ops.push(DrawOp::Stroke {
            style: style.clone(),
            transform: *transform,
        });
    }

    fn fill(&mut self, color: Color, transform: &Transform2D) {
        self.ops.push(DrawOp::Fill {
            color,
            transform: *transform,
        });
    }
}
