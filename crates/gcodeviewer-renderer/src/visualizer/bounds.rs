//! Planar bounds of the printed part of a layer.

use crate::model::{ArcWinding, Command};
use glam::DVec2;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const ANGLE_EPSILON: f64 = 1e-12;

/// Axis-aligned bounds of a layer in model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl LayerBounds {
    fn at(point: DVec2) -> Self {
        Self {
            min_x: point.x,
            max_x: point.x,
            min_y: point.y,
            max_y: point.y,
        }
    }

    fn include_x(&mut self, x: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
    }

    fn include_y(&mut self, y: f64) {
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn include(&mut self, point: DVec2) {
        self.include_x(point.x);
        self.include_y(point.y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, point: DVec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}

/// A command contributes to the bounds when it extrudes and moves in X or Y.
fn factors_in(cmd: &Command) -> bool {
    cmd.extrude && cmd.has_planar_target()
}

/// Compute the bounds of every extruding command of a layer.
///
/// Returns `None` when nothing in the layer extrudes. Arcs contribute their
/// cardinal extremes (center ± radius) for every cardinal angle they sweep.
pub fn layer_bounds(commands: &[Command]) -> Option<LayerBounds> {
    let first = commands.iter().position(factors_in)?;
    let seed = &commands[first];
    let seed_point = DVec2::new(
        seed.prev_x.or(seed.x).unwrap_or(0.0),
        seed.prev_y.or(seed.y).unwrap_or(0.0),
    );
    let mut bounds = LayerBounds::at(seed_point);

    for cmd in commands[first..].iter().filter(|c| factors_in(c)) {
        if let Some(x) = cmd.prev_x {
            bounds.include_x(x);
        }
        if let Some(y) = cmd.prev_y {
            bounds.include_y(y);
        }
        if let Some(x) = cmd.x {
            bounds.include_x(x);
        }
        if let Some(y) = cmd.y {
            bounds.include_y(y);
        }

        let Some(start) = cmd.start() else {
            continue;
        };
        let Some(arc) = cmd.arc_params(start) else {
            continue;
        };
        if !arc.radius.is_finite() || arc.radius <= 0.0 {
            continue;
        }
        for (cardinal, extreme) in [
            (0.0, DVec2::new(arc.radius, 0.0)),
            (FRAC_PI_2, DVec2::new(0.0, arc.radius)),
            (PI, DVec2::new(-arc.radius, 0.0)),
            (PI + FRAC_PI_2, DVec2::new(0.0, -arc.radius)),
        ] {
            if arc_sweeps_through(arc.start_angle, arc.end_angle, arc.winding, cardinal) {
                bounds.include(arc.center + extreme);
            }
        }
    }

    Some(bounds)
}

/// Whether an arc from `start` to `end` traversed with `winding` passes
/// through `angle`. Coinciding start and end angles denote a full circle.
pub fn arc_sweeps_through(start: f64, end: f64, winding: ArcWinding, angle: f64) -> bool {
    // Counter-clockwise from start to end covers the same set as clockwise from end to start.
    let (from, to) = match winding {
        ArcWinding::Clockwise => (start, end),
        ArcWinding::CounterClockwise => (end, start),
    };
    let sweep = (from - to).rem_euclid(TAU);
    if sweep < ANGLE_EPSILON {
        return true;
    }
    (from - angle).rem_euclid(TAU) <= sweep + ANGLE_EPSILON
}
