//! Draws a range of layer commands onto a surface.
//!
//! Consecutive segments with the same stroke style share one path so that a
//! layer costs a handful of stroke calls rather than one per segment.

use super::arc::ArcStrategy;
use super::color::{Color, ColorRole, ToolPalette};
use super::options::RenderOptions;
use super::surface::{DrawSurface, StrokeStyle};
use super::transform::Transform2D;
use crate::model::{ArcParams, ArcWinding, Command, Retract};
use gcodeviewer_core::constants::{GHOST_ALPHA, MIN_ARC_RADIUS};
use glam::DVec2;
use std::f64::consts::TAU;
use tracing::trace;

/// Everything a layer pass needs besides the commands.
pub struct LayerPass<'a> {
    pub options: &'a RenderOptions,
    pub transform: Transform2D,
    pub line_width_factor: f64,
    pub arcs: &'a dyn ArcStrategy,
    /// Drawn as a preview of a neighbouring layer.
    pub ghost: bool,
}

/// What a pass drew.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    /// Pen position after the last command.
    pub end: DVec2,
    pub segments: usize,
    pub strokes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathKind {
    Fill,
    Move,
    Extrude,
    DebugArc,
}

/// Tracks the open path and its style.
struct Batch {
    kind: PathKind,
    style: Option<StrokeStyle>,
    pen: Option<DVec2>,
    drawn: bool,
    strokes: usize,
}

impl Batch {
    fn new() -> Self {
        Self {
            kind: PathKind::Fill,
            style: None,
            pen: None,
            drawn: false,
            strokes: 0,
        }
    }

    /// Start a new path when the kind or style changes. Fill paths are never shared.
    fn switch(
        &mut self,
        surface: &mut dyn DrawSurface,
        transform: &Transform2D,
        kind: PathKind,
        style: Option<StrokeStyle>,
        at: DVec2,
    ) {
        if kind == self.kind && kind != PathKind::Fill && style == self.style {
            return;
        }
        self.flush(surface, transform);
        self.drawn = false;
        self.kind = kind;
        self.style = style;
        surface.begin_path();
        if kind == PathKind::Fill {
            self.pen = None;
        } else {
            surface.move_to(at);
            self.pen = Some(at);
        }
    }

    fn flush(&mut self, surface: &mut dyn DrawSurface, transform: &Transform2D) {
        if self.kind == PathKind::Fill || !self.drawn {
            return;
        }
        if let Some(style) = &self.style {
            surface.stroke(style, transform);
            self.strokes += 1;
        }
        self.drawn = false;
    }

    /// Make sure the open path continues from `from`.
    fn continue_from(&mut self, surface: &mut dyn DrawSurface, from: DVec2) {
        if self.pen != Some(from) {
            surface.move_to(from);
        }
    }

    fn line(&mut self, surface: &mut dyn DrawSurface, from: DVec2, to: DVec2) {
        self.continue_from(surface, from);
        surface.line_to(to);
        self.pen = Some(to);
        self.drawn = true;
    }

    fn arc(&mut self, surface: &mut dyn DrawSurface, arcs: &dyn ArcStrategy, arc: &ArcParams) {
        if !arc.radius.is_finite() || arc.radius < MIN_ARC_RADIUS {
            self.line(surface, arc.start, arc.end);
            return;
        }
        self.continue_from(surface, arc.start);
        let end_angle = if arc.is_full_circle() {
            match arc.winding {
                ArcWinding::Clockwise => arc.start_angle - TAU,
                ArcWinding::CounterClockwise => arc.start_angle + TAU,
            }
        } else {
            arc.end_angle
        };
        arcs.draw_arc(
            surface,
            arc.center,
            arc.radius,
            arc.start_angle,
            end_angle,
            arc.winding,
        );
        self.pen = Some(arc.end);
        self.drawn = true;
    }
}

/// Draw commands `from..=to` of a layer, starting the pen at `start`.
pub fn draw_commands(
    surface: &mut dyn DrawSurface,
    pass: &LayerPass<'_>,
    commands: &[Command],
    from: usize,
    to: usize,
    start: DVec2,
) -> PassSummary {
    let options = pass.options;
    let lwf = pass.line_width_factor;
    let transform = &pass.transform;
    let ghost = pass.ghost;
    let alpha = if ghost && options.shows_ghost_layers() {
        GHOST_ALPHA
    } else {
        1.0
    };
    let mut palette = ToolPalette::new(
        &options.color_line,
        options.color_move,
        options.color_retract,
        options.color_restart,
        options.color_segment_start,
        options.color_head,
        alpha,
    );

    let ratio = options.pixel_ratio;
    let retract_size = options.size_retract_spot * ratio * lwf * 2.0;
    let segment_start_size = options.size_segment_start * ratio * lwf * 2.0;
    let extrusion_width = options.effective_extrusion_width() * lwf;
    let show_markers = !ghost;

    let mut batch = Batch::new();
    let mut prev = start;
    let mut tool = 0;
    let mut segments = 0;

    let end = to.min(commands.len().saturating_sub(1));
    let range = if from <= end && !commands.is_empty() {
        &commands[from..=end]
    } else {
        &commands[..0]
    };
    trace!(
        "Drawing {} commands ({}..={}), ghost={}",
        range.len(),
        from,
        to,
        ghost
    );

    for cmd in range {
        if let Some(start) = cmd.start() {
            prev = start;
        }
        let next = cmd.end_from(prev);
        tool = cmd.tool;

        if !cmd.extrude && !cmd.no_move {
            if cmd.retract == Retract::Retracting && options.show_retracts && show_markers {
                batch.switch(surface, transform, PathKind::Fill, None, prev);
                let color = palette.color(ColorRole::Retract, tool);
                draw_triangle(surface, transform, prev, retract_size, true, color, lwf);
            }

            let style = StrokeStyle::new(palette.color(ColorRole::Move, tool), lwf);
            batch.switch(surface, transform, PathKind::Move, Some(style), prev);
            if options.show_moves && !ghost {
                match cmd.arc_params(prev) {
                    Some(arc) => batch.arc(surface, pass.arcs, &arc),
                    None => batch.line(surface, prev, next),
                }
                segments += 1;
            }
        } else if cmd.extrude {
            if cmd.retract == Retract::None {
                let style =
                    StrokeStyle::new(palette.color(ColorRole::Extrusion, tool), extrusion_width);
                batch.switch(surface, transform, PathKind::Extrude, Some(style.clone()), prev);
                match cmd.arc_params(prev) {
                    Some(arc) => {
                        if options.show_debug_arcs && show_markers {
                            let debug = StrokeStyle::new(options.color_debug_arc, extrusion_width);
                            batch.switch(surface, transform, PathKind::DebugArc, Some(debug), prev);
                            draw_debug_arc(surface, &mut batch, pass.arcs, &arc);
                            batch.switch(surface, transform, PathKind::Extrude, Some(style), prev);
                        }
                        batch.arc(surface, pass.arcs, &arc);
                    }
                    None => batch.line(surface, prev, next),
                }
                segments += 1;
            } else if options.show_retracts && show_markers {
                batch.switch(surface, transform, PathKind::Fill, None, prev);
                let color = palette.color(ColorRole::Restart, tool);
                draw_triangle(surface, transform, prev, retract_size, false, color, lwf);
            }

            if options.show_segment_starts && show_markers {
                batch.switch(surface, transform, PathKind::Fill, None, next);
                let color = palette.color(ColorRole::SegmentStart, tool);
                draw_cross(surface, transform, next, segment_start_size, color, lwf);
            }
        }

        prev = next;
    }

    batch.flush(surface, transform);

    if options.show_head && !ghost {
        let radius = options.size_head_spot * ratio * lwf + lwf / 2.0;
        surface.begin_path();
        surface.circle(prev, radius);
        surface.fill(palette.color(ColorRole::Head, tool), transform);
    }

    PassSummary {
        end: prev,
        segments,
        strokes: batch.strokes,
    }
}

/// Filled triangle centered on `center`; pointing up for retractions.
fn draw_triangle(
    surface: &mut dyn DrawSurface,
    transform: &Transform2D,
    center: DVec2,
    length: f64,
    up: bool,
    color: Color,
    lwf: f64,
) {
    let h = (0.75 * length * length).sqrt() / 2.0;
    let (base_y, tip_y) = if up {
        (center.y - h, center.y + h)
    } else {
        (center.y + h, center.y - h)
    };
    let a = DVec2::new(center.x - length / 2.0, base_y);
    let b = DVec2::new(center.x + length / 2.0, base_y);
    let c = DVec2::new(center.x, tip_y);

    surface.begin_path();
    surface.move_to(a);
    surface.line_to(b);
    surface.line_to(c);
    surface.close_path();
    surface.stroke(&StrokeStyle::new(color, lwf).mitered(), transform);
    surface.fill(color, transform);
}

fn draw_cross(
    surface: &mut dyn DrawSurface,
    transform: &Transform2D,
    center: DVec2,
    size: f64,
    color: Color,
    lwf: f64,
) {
    let half = size / 2.0;
    surface.begin_path();
    surface.move_to(center + DVec2::new(-half, -half));
    surface.line_to(center + DVec2::new(half, half));
    surface.move_to(center + DVec2::new(-half, half));
    surface.line_to(center + DVec2::new(half, -half));
    surface.stroke(&StrokeStyle::new(color, lwf), transform);
}

/// Construction lines of an arc: center to both ends, the chord, then the arc.
fn draw_debug_arc(
    surface: &mut dyn DrawSurface,
    batch: &mut Batch,
    arcs: &dyn ArcStrategy,
    arc: &ArcParams,
) {
    batch.line(surface, arc.center, arc.start);
    batch.line(surface, arc.center, arc.end);
    batch.line(surface, arc.start, arc.end);
    batch.arc(surface, arcs, arc);
}
