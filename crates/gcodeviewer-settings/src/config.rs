//! Viewer configuration
//!
//! Groups everything a headless viewer needs besides the model:
//! - Canvas settings (size in pixels, pixel ratio)
//! - Render options (colors, visibility, layout modes, bed)
//! - Reader options (empty-layer purge, compression)
//!
//! Viewport state (pan, zoom) is never stored.

use crate::error::{SettingsError, SettingsResult};
use gcodeviewer_renderer::{ReaderOptions, RenderOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_DIR_NAME: &str = "gcodeviewer";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Format named by the file extension.
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
    /// Device pixels per CSS pixel
    pub pixel_ratio: f64,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            pixel_ratio: 1.0,
        }
    }
}

impl CanvasSettings {
    /// Surface size in device pixels.
    pub fn device_size(&self) -> (u32, u32) {
        let scale = |v: u32| (v as f64 * self.pixel_ratio).round().max(1.0) as u32;
        (scale(self.width), scale(self.height))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub canvas: CanvasSettings,
    pub render: RenderOptions,
    pub reader: ReaderOptions,
}

impl ViewerConfig {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;

        let mut config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };
        // the canvas section owns the pixel ratio
        config.render.pixel_ratio = config.canvas.pixel_ratio;

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = ConfigFormat::from_path(path)?;

        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Load `path`, or the default location when `None`. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Platform config location, e.g. `~/.config/gcodeviewer/config.toml`.
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no platform config directory".to_string())
        })?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(SettingsError::invalid("canvas", "dimensions must be > 0"));
        }
        if !positive(self.canvas.pixel_ratio) {
            return Err(SettingsError::invalid("canvas.pixel_ratio", "must be > 0"));
        }

        let render = &self.render;
        if !positive(render.extrusion_width) {
            return Err(SettingsError::invalid("render.extrusion_width", "must be > 0"));
        }
        if render.color_line.is_empty() {
            return Err(SettingsError::invalid(
                "render.color_line",
                "needs at least one color",
            ));
        }

        let bed = &render.bed;
        if bed.circular {
            if !positive(bed.r) {
                return Err(SettingsError::invalid("render.bed.r", "must be > 0"));
            }
        } else if !positive(bed.x) || !positive(bed.y) {
            return Err(SettingsError::invalid("render.bed", "dimensions must be > 0"));
        }

        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcodeviewer_renderer::{BedGeometry, Color};

    #[test]
    fn test_default_config_is_valid() {
        let config = ViewerConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.canvas.device_size(), (800, 800));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ViewerConfig::new();
        config.canvas.width = 0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::new();
        config.render.bed = BedGeometry::rectangular(0.0, 200.0);
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::new();
        config.render.bed = BedGeometry::circular(-1.0);
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::new();
        config.render.extrusion_width = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a/b.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("b.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(matches!(
            ConfigFormat::from_path(Path::new("b.yaml")),
            Err(SettingsError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_round_trip_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ViewerConfig::new();
        config.canvas.width = 640;
        config.render.show_head = true;
        config.render.color_move = Color::rgb(0x12, 0x34, 0x56);
        config.render.bed = BedGeometry::circular(110.0);
        config.reader.purge_empty_layers = false;

        for name in ["viewer.json", "nested/viewer.toml"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            let loaded = ViewerConfig::load_from_file(&path).unwrap();
            assert_eq!(loaded, config, "{name}");
        }
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(
            &path,
            "[canvas]\npixel_ratio = 2.0\n\n[render]\nshow_head_spot = true\ncolor_move = \"#ff8800\"\n",
        )
        .unwrap();

        let config = ViewerConfig::load_from_file(&path).unwrap();
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.render.pixel_ratio, 2.0);
        assert!(config.render.show_head);
        assert_eq!(config.render.color_move, Color::rgb(0xff, 0x88, 0x00));
        assert!(config.reader.purge_empty_layers);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ViewerConfig::load_or_default(Some(&missing)),
            Err(SettingsError::IoError(_))
        ));
    }
}
