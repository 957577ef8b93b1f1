//! Bed grid and bounding-box overlays.

use super::bounds::LayerBounds;
use super::color::Color;
use super::options::{BedGeometry, RenderOptions};
use super::surface::{DrawSurface, StrokeStyle};
use super::transform::Transform2D;
use crate::model::ModelInfo;
use gcodeviewer_core::constants::{
    BOUNDING_BOX_DASH, GRID_MAJOR_EVERY, GRID_STEP_MM, ORIGIN_MARKER_RADIUS,
};
use glam::DVec2;

const MAX_GRID_LINES: usize = 10_000;

/// Grid line offsets from the origin up to `max`, at most `MAX_GRID_LINES`.
fn grid_steps(max: f64) -> impl Iterator<Item = (usize, f64)> {
    (0..MAX_GRID_LINES)
        .map(|i| (i, i as f64 * GRID_STEP_MM))
        .take_while(move |(_, v)| *v <= max)
}

fn grid_width(index: usize, lwf: f64) -> f64 {
    if index % GRID_MAJOR_EVERY == 0 {
        1.5 * lwf
    } else {
        lwf
    }
}

/// Draw the bed: background, outline, origin axes and grid lines.
pub fn draw_bed(
    surface: &mut dyn DrawSurface,
    options: &RenderOptions,
    transform: &Transform2D,
    lwf: f64,
) {
    if options.bed.circular {
        draw_circular_bed(surface, options, transform, lwf);
    } else {
        draw_rectangular_bed(surface, options, transform, lwf);
    }
}

fn draw_origin(surface: &mut dyn DrawSurface, color: Color, transform: &Transform2D, lwf: f64) {
    surface.begin_path();
    surface.circle(DVec2::ZERO, ORIGIN_MARKER_RADIUS);
    surface.stroke(&StrokeStyle::new(color, 2.0 * lwf), transform);
}

fn draw_rectangular_bed(
    surface: &mut dyn DrawSurface,
    options: &RenderOptions,
    transform: &Transform2D,
    lwf: f64,
) {
    let BedGeometry { x: width, y: depth, .. } = options.bed;
    let (min, max) = if options.bed.centered_origin {
        (
            DVec2::new(-width / 2.0, -depth / 2.0),
            DVec2::new(width / 2.0, depth / 2.0),
        )
    } else {
        (DVec2::ZERO, DVec2::new(width, depth))
    };
    let outline = StrokeStyle::new(options.color_grid, 2.0 * lwf);

    surface.begin_path();
    surface.rect(min, max - min);
    surface.move_to(DVec2::new(min.x, 0.0));
    surface.line_to(DVec2::new(max.x, 0.0));
    surface.move_to(DVec2::new(0.0, min.y));
    surface.line_to(DVec2::new(0.0, max.y));
    surface.fill(options.bg_color_grid, transform);
    surface.stroke(&outline, transform);

    draw_origin(surface, options.color_grid, transform, lwf);

    let mirrored = options.bed.centered_origin;
    for (index, x) in grid_steps(max.x) {
        surface.begin_path();
        surface.move_to(DVec2::new(x, min.y));
        surface.line_to(DVec2::new(x, max.y));
        if mirrored {
            surface.move_to(DVec2::new(-x, min.y));
            surface.line_to(DVec2::new(-x, max.y));
        }
        surface.stroke(
            &StrokeStyle::new(options.color_grid, grid_width(index, lwf)),
            transform,
        );
    }
    for (index, y) in grid_steps(max.y) {
        surface.begin_path();
        surface.move_to(DVec2::new(min.x, y));
        surface.line_to(DVec2::new(max.x, y));
        if mirrored {
            surface.move_to(DVec2::new(min.x, -y));
            surface.line_to(DVec2::new(max.x, -y));
        }
        surface.stroke(
            &StrokeStyle::new(options.color_grid, grid_width(index, lwf)),
            transform,
        );
    }
}

fn draw_circular_bed(
    surface: &mut dyn DrawSurface,
    options: &RenderOptions,
    transform: &Transform2D,
    lwf: f64,
) {
    let r = options.bed.r;

    surface.begin_path();
    surface.circle(DVec2::ZERO, r);
    surface.move_to(DVec2::new(-r, 0.0));
    surface.line_to(DVec2::new(r, 0.0));
    surface.move_to(DVec2::new(0.0, r));
    surface.line_to(DVec2::new(0.0, -r));
    surface.fill(options.bg_color_grid, transform);
    surface.stroke(&StrokeStyle::new(options.color_grid, 2.0 * lwf), transform);

    draw_origin(surface, options.color_grid, transform, lwf);

    // Chords in all four directions, clipped to the circle.
    surface.begin_path();
    for (_, x) in grid_steps(r) {
        let y = (r * r - x * x).max(0.0).sqrt();
        surface.move_to(DVec2::new(x, -y));
        surface.line_to(DVec2::new(x, y));
        surface.move_to(DVec2::new(y, -x));
        surface.line_to(DVec2::new(-y, -x));
        surface.move_to(DVec2::new(-x, -y));
        surface.line_to(DVec2::new(-x, y));
        surface.move_to(DVec2::new(y, x));
        surface.line_to(DVec2::new(-y, x));
    }
    surface.stroke(&StrokeStyle::new(options.color_grid, lwf), transform);
}

fn draw_dashed_box(
    surface: &mut dyn DrawSurface,
    transform: &Transform2D,
    min: DVec2,
    size: DVec2,
    color: Color,
    lwf: f64,
) {
    surface.begin_path();
    surface.rect(min, size);
    surface.stroke(
        &StrokeStyle::new(color, lwf).dashed(BOUNDING_BOX_DASH),
        transform,
    );
}

/// Dashed overlays for the full model extent, the printed extent and the current layer.
pub fn draw_bounding_boxes(
    surface: &mut dyn DrawSurface,
    options: &RenderOptions,
    transform: &Transform2D,
    lwf: f64,
    info: Option<&ModelInfo>,
    layer: Option<LayerBounds>,
) {
    let Some(info) = info else {
        return;
    };

    if options.show_full_size {
        draw_dashed_box(
            surface,
            transform,
            DVec2::new(info.min.x, info.min.y),
            DVec2::new(info.model_size.x, info.model_size.y),
            options.color_full_size,
            lwf,
        );
    }

    if options.show_bounding_box && info.bounding_box.is_valid() {
        let b = &info.bounding_box;
        draw_dashed_box(
            surface,
            transform,
            DVec2::new(b.min_x, b.min_y),
            DVec2::new(b.max_x - b.min_x, b.max_y - b.min_y),
            options.color_bounding_box,
            lwf,
        );
    }

    if options.show_layer_bounding_box {
        if let Some(b) = layer {
            draw_dashed_box(
                surface,
                transform,
                DVec2::new(b.min_x, b.min_y),
                DVec2::new(b.width(), b.height()),
                options.color_layer_bounding_box,
                lwf,
            );
        }
    }
}
