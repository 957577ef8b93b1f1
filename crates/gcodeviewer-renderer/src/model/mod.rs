//! Toolpath model: commands, layers and aggregate info.

mod command;
mod info;
mod layer;

pub use command::{ArcParams, ArcWinding, Command, Retract};
pub use info::{Axes3, Model, ModelInfo, PrintedBox, SpeedStats};
pub use layer::{decode_blob, Layer};
