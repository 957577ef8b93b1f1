//! Aggregate model information used by overlays and readers.

use super::command::{Command, Retract};
use super::layer::Layer;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A point or extent on the three machine axes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Box covering everything that was printed (extrusions only).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintedBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for PrintedBox {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }
}

impl PrintedBox {
    fn update(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        if let Some(x) = x {
            self.min_x = self.min_x.min(x);
            self.max_x = self.max_x.max(x);
        }
        if let Some(y) = y {
            self.min_y = self.min_y.min(y);
            self.max_y = self.max_y.max(y);
        }
        if let Some(z) = z {
            self.min_z = self.min_z.min(z);
            self.max_z = self.max_z.max(z);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}

/// Distinct feed rates seen per move kind, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedStats {
    pub extrude: Vec<f64>,
    pub retract: Vec<f64>,
    #[serde(rename = "move")]
    pub travel: Vec<f64>,
}

impl SpeedStats {
    fn record(&mut self, cmd: &Command) {
        let Some(speed) = cmd.speed else {
            return;
        };
        let bucket = if cmd.retract != Retract::None {
            &mut self.retract
        } else if cmd.extrude {
            &mut self.extrude
        } else {
            &mut self.travel
        };
        if let Err(pos) = bucket.binary_search_by(|v| v.total_cmp(&speed)) {
            bucket.insert(pos, speed);
        }
    }
}

/// Aggregate information about a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelInfo {
    /// Minimum over every commanded position.
    pub min: Axes3,
    /// Maximum over every commanded position.
    pub max: Axes3,
    /// `max - min`.
    pub model_size: Axes3,
    /// Extent of extrusions only.
    pub bounding_box: PrintedBox,
    /// Total extrusion amount (sum of positive per-command extrusion).
    pub total_filament: f64,
    pub filament_by_layer: Vec<f64>,
    pub speeds: SpeedStats,
    pub speeds_by_layer: Vec<SpeedStats>,
}

impl ModelInfo {
    /// Walk every layer and compute aggregate information.
    ///
    /// Compressed layers are decoded transiently; undecodable layers are
    /// logged and contribute nothing. Returns `None` when no command carries
    /// a planar position.
    pub fn analyze(layers: &[Layer]) -> Option<Self> {
        let mut positions = PrintedBox::default();
        let mut info = ModelInfo::default();

        for (index, layer) in layers.iter().enumerate() {
            let decoded;
            let commands: &[Command] = match layer {
                Layer::Raw(commands) => commands.as_slice(),
                Layer::Compressed(_) => match layer.decode() {
                    Ok(commands) => {
                        decoded = commands;
                        decoded.as_slice()
                    }
                    Err(e) => {
                        warn!("Skipping layer {} during analysis: {}", index, e);
                        &[]
                    }
                },
            };

            let mut layer_filament = 0.0;
            let mut layer_speeds = SpeedStats::default();
            for cmd in commands {
                positions.update(cmd.prev_x, cmd.prev_y, cmd.prev_z);
                positions.update(cmd.x, cmd.y, cmd.z);
                if cmd.extrude && cmd.has_planar_target() {
                    info.bounding_box.update(cmd.prev_x, cmd.prev_y, cmd.prev_z);
                    info.bounding_box.update(cmd.x, cmd.y, cmd.z);
                }
                if let Some(amount) = cmd.extrusion.filter(|e| *e > 0.0) {
                    layer_filament += amount;
                }
                layer_speeds.record(cmd);
                info.speeds.record(cmd);
            }
            info.total_filament += layer_filament;
            info.filament_by_layer.push(layer_filament);
            info.speeds_by_layer.push(layer_speeds);
        }

        if !positions.is_valid() {
            return None;
        }
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };
        info.min = Axes3 {
            x: positions.min_x,
            y: positions.min_y,
            z: finite_or_zero(positions.min_z),
        };
        info.max = Axes3 {
            x: positions.max_x,
            y: positions.max_y,
            z: finite_or_zero(positions.max_z),
        };
        info.model_size = Axes3 {
            x: info.max.x - info.min.x,
            y: info.max.y - info.min.y,
            z: info.max.z - info.min.z,
        };
        Some(info)
    }
}

/// A complete model as handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ModelInfo>,
}

impl Model {
    pub fn new(layers: Vec<Layer>) -> Self {
        Self { layers, info: None }
    }

    pub fn with_info(mut self, info: ModelInfo) -> Self {
        self.info = Some(info);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_square() {
        let layer = Layer::Raw(vec![
            Command::line((0.0, 0.0), (20.0, 0.0), false),
            Command::line((20.0, 0.0), (20.0, 10.0), true),
            Command::line((20.0, 10.0), (5.0, 10.0), true),
        ]);
        let info = ModelInfo::analyze(&[layer]).unwrap();
        assert_eq!(info.min.x, 0.0);
        assert_eq!(info.max.x, 20.0);
        assert_eq!(info.model_size.y, 10.0);
        assert_eq!(info.bounding_box.min_x, 5.0);
        assert_eq!(info.bounding_box.max_x, 20.0);
        assert_eq!(info.bounding_box.min_y, 0.0);
    }

    #[test]
    fn test_analyze_speeds_and_filament() {
        let mut a = Command::line((0.0, 0.0), (1.0, 0.0), true);
        a.speed = Some(1200.0);
        a.extrusion = Some(0.5);
        let mut b = Command::line((1.0, 0.0), (2.0, 0.0), true);
        b.speed = Some(1200.0);
        b.extrusion = Some(0.25);
        let mut c = Command::line((2.0, 0.0), (3.0, 0.0), false);
        c.speed = Some(6000.0);

        let info = ModelInfo::analyze(&[Layer::Raw(vec![a, b, c])]).unwrap();
        assert_eq!(info.speeds.extrude, vec![1200.0]);
        assert_eq!(info.speeds.travel, vec![6000.0]);
        assert!((info.total_filament - 0.75).abs() < 1e-12);
        assert_eq!(info.filament_by_layer.len(), 1);
    }

    #[test]
    fn test_analyze_empty() {
        assert!(ModelInfo::analyze(&[]).is_none());
        assert!(ModelInfo::analyze(&[Layer::default()]).is_none());
    }

    #[test]
    fn test_model_json() {
        let model: Model =
            serde_json::from_str(r#"{"layers": [[{"x": 1.0, "y": 1.0, "prevX": 0.0, "prevY": 0.0}]]}"#)
                .unwrap();
        assert_eq!(model.layers.len(), 1);
        assert!(model.info.is_none());
    }
}
