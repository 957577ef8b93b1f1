//! GCodeViewer Settings Crate
//!
//! Loads and saves viewer configuration (canvas, render and reader options)
//! as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{CanvasSettings, ConfigFormat, ViewerConfig};
pub use error::{SettingsError, SettingsResult};
