//! RGBA colors with hex (de)serialization and per-tool shading.

use gcodeviewer_core::constants::TOOL_SHADE_STEP;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Lighten (positive `amount`) towards white or darken (negative) towards black.
    pub fn shade(self, amount: f32) -> Self {
        let amount = amount.clamp(-1.0, 1.0);
        let channel = |c: u8| -> u8 {
            let c = c as f32;
            let shaded = if amount >= 0.0 {
                c + (255.0 - c) * amount
            } else {
                c * (1.0 + amount)
            };
            shaded.round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }

    /// Replace the opacity; `alpha` is in `0.0..=1.0`.
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    pub fn alpha(&self) -> f32 {
        self.a as f32 / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("color {s:?} must start with '#'"))?;
        let byte = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| format!("color {s:?}: {e}"))
        };
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|e| format!("color {s:?}: {e}"))
        };
        if !hex.is_ascii() {
            return Err(format!("color {s:?} is not hex"));
        }
        match hex.len() {
            3 => Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            n => Err(format!("color {s:?} has {n} hex digits, expected 3, 6 or 8")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

/// Which option color a stroke is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    Extrusion,
    Move,
    Retract,
    Restart,
    SegmentStart,
    Head,
}

/// Per-pass cache of tool colors.
///
/// Tool `t` uses `palette[t]` (falling back to the first entry), shaded by
/// `t * TOOL_SHADE_STEP`, with the pass alpha applied. Built once per layer
/// pass so that ghost and regular passes never share entries.
#[derive(Debug)]
pub struct ToolPalette<'a> {
    extrusion: &'a [Color],
    fixed: [(ColorRole, Color); 5],
    alpha: f32,
    cache: HashMap<(ColorRole, usize), Color>,
}

impl<'a> ToolPalette<'a> {
    pub fn new(
        extrusion: &'a [Color],
        move_color: Color,
        retract: Color,
        restart: Color,
        segment_start: Color,
        head: Color,
        alpha: f32,
    ) -> Self {
        Self {
            extrusion,
            fixed: [
                (ColorRole::Move, move_color),
                (ColorRole::Retract, retract),
                (ColorRole::Restart, restart),
                (ColorRole::SegmentStart, segment_start),
                (ColorRole::Head, head),
            ],
            alpha,
            cache: HashMap::new(),
        }
    }

    fn base(&self, role: ColorRole, tool: usize) -> Color {
        match role {
            ColorRole::Extrusion => self
                .extrusion
                .get(tool)
                .or_else(|| self.extrusion.first())
                .copied()
                .unwrap_or(Color::BLACK),
            _ => self
                .fixed
                .iter()
                .find(|(r, _)| *r == role)
                .map(|(_, c)| *c)
                .unwrap_or(Color::BLACK),
        }
    }

    pub fn color(&mut self, role: ColorRole, tool: usize) -> Color {
        if let Some(color) = self.cache.get(&(role, tool)) {
            return *color;
        }
        let color = self
            .base(role, tool)
            .shade(tool as f32 * TOOL_SHADE_STEP)
            .with_alpha(self.alpha);
        self.cache.insert((role, tool), color);
        color
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
