//! Per-layer movement commands as produced by the G-code analysis stage.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Direction an arc is traversed in model space (Y up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArcWinding {
    /// Decreasing angle (G2).
    Clockwise,
    /// Increasing angle (G3).
    CounterClockwise,
}

impl ArcWinding {
    /// Map the signed arc direction of a command. Negative is clockwise.
    pub fn from_direction(direction: i32) -> Option<Self> {
        match direction {
            0 => None,
            d if d < 0 => Some(Self::Clockwise),
            _ => Some(Self::CounterClockwise),
        }
    }
}

/// Retraction state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Retract {
    /// Filament is pulled back (`-1`).
    Retracting,
    /// Plain move (`0`).
    #[default]
    None,
    /// Filament is pushed back after a retraction (`1`).
    Restarting,
}

impl TryFrom<i8> for Retract {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Retracting),
            0 => Ok(Self::None),
            1 => Ok(Self::Restarting),
            other => Err(format!("invalid retract value {other}, expected -1, 0 or 1")),
        }
    }
}

impl From<Retract> for i8 {
    fn from(value: Retract) -> Self {
        match value {
            Retract::Retracting => -1,
            Retract::None => 0,
            Retract::Restarting => 1,
        }
    }
}

/// A single movement command within a layer.
///
/// `x`/`y` are absent when the command does not move on that axis. The
/// `prev_*` fields carry the position the command starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Command {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_z: Option<f64>,
    pub extrude: bool,
    pub retract: Retract,
    pub tool: usize,
    /// Arc direction: negative for clockwise, positive for counter-clockwise, 0 for lines.
    pub direction: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub i: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub j: Option<f64>,
    /// Set for commands that do not move the head at all.
    pub no_move: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcode_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extrusion: Option<f64>,
}

/// Geometry of an arc command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    pub start: DVec2,
    pub end: DVec2,
    pub center: DVec2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub winding: ArcWinding,
}

impl ArcParams {
    /// Whether start and end coincide, i.e. the arc is a full circle.
    pub fn is_full_circle(&self) -> bool {
        self.start.abs_diff_eq(self.end, 1e-9)
    }
}

impl Command {
    /// Straight segment from `from` to `to`.
    pub fn line(from: (f64, f64), to: (f64, f64), extrude: bool) -> Self {
        Self {
            x: Some(to.0),
            y: Some(to.1),
            prev_x: Some(from.0),
            prev_y: Some(from.1),
            extrude,
            ..Self::default()
        }
    }

    /// Arc from `from` to `to` around `from + center_offset`.
    pub fn arc(
        from: (f64, f64),
        to: (f64, f64),
        center_offset: (f64, f64),
        winding: ArcWinding,
        extrude: bool,
    ) -> Self {
        Self {
            direction: match winding {
                ArcWinding::Clockwise => -1,
                ArcWinding::CounterClockwise => 1,
            },
            i: Some(center_offset.0),
            j: Some(center_offset.1),
            ..Self::line(from, to, extrude)
        }
    }

    pub fn with_tool(mut self, tool: usize) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_retract(mut self, retract: Retract) -> Self {
        self.retract = retract;
        self
    }

    pub fn with_z(mut self, prev_z: f64, z: f64) -> Self {
        self.prev_z = Some(prev_z);
        self.z = Some(z);
        self
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(percentage);
        self
    }

    /// Whether the command names a target on at least one planar axis.
    pub fn has_planar_target(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    /// Start position, when both previous coordinates are known.
    pub fn start(&self) -> Option<DVec2> {
        Some(DVec2::new(self.prev_x?, self.prev_y?))
    }

    /// Target position, with absent axes taken from `from`.
    pub fn end_from(&self, from: DVec2) -> DVec2 {
        DVec2::new(
            self.x.filter(|v| !v.is_nan()).unwrap_or(from.x),
            self.y.filter(|v| !v.is_nan()).unwrap_or(from.y),
        )
    }

    pub fn winding(&self) -> Option<ArcWinding> {
        ArcWinding::from_direction(self.direction)
    }

    /// Arc geometry for a command starting at `from`.
    ///
    /// Returns `None` for straight moves. Missing `i`/`j` offsets count as 0.
    pub fn arc_params(&self, from: DVec2) -> Option<ArcParams> {
        let winding = self.winding()?;
        let offset = DVec2::new(self.i.unwrap_or(0.0), self.j.unwrap_or(0.0));
        let end = self.end_from(from);
        let center = from + offset;
        let radius = offset.length();
        let start_angle = (from.y - center.y).atan2(from.x - center.x);
        let end_angle = (end.y - center.y).atan2(end.x - center.x);
        Some(ArcParams {
            start: from,
            end,
            center,
            radius,
            start_angle,
            end_angle,
            winding,
        })
    }
}
