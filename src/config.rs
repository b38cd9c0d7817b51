//! Configuration parsing and management for trailmap

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, TrailmapError};

/// Canvas dimensions in pixels. The trail target and camera frustum are both
/// derived from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasSize,
    pub displacement: DisplacementConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            displacement: DisplacementConfig::default(),
        }
    }
}

/// Settings for the downstream displacement compositing pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementConfig {
    pub enabled: bool,
    /// UV offset applied per unit of trail intensity.
    pub strength: f32,
}

impl Default for DisplacementConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strength: 0.05,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TrailmapError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e)))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> Result<Self, TrailmapError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, TrailmapError> {
        let paths = [
            PathBuf::from("trailmap.toml"),
            PathBuf::from("config/trailmap.toml"),
        ];

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), TrailmapError> {
        if self.canvas.width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "canvas.width".to_string(),
                message: "Canvas width must be greater than 0".to_string(),
            }
            .into());
        }

        if self.canvas.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "canvas.height".to_string(),
                message: "Canvas height must be greater than 0".to_string(),
            }
            .into());
        }

        if !self.displacement.strength.is_finite() || self.displacement.strength < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "displacement.strength".to_string(),
                message: "Displacement strength must be finite and non-negative".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.canvas.width, 1280);
        assert_eq!(config.canvas.height, 720);
        assert!(!config.displacement.enabled);
        assert_eq!(config.displacement.strength, 0.05);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [canvas]
            width = 1920
            height = 1080

            [displacement]
            enabled = true
            strength = 0.1
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.canvas.width, 1920);
        assert_eq!(config.canvas.height, 1080);
        assert!(config.displacement.enabled);
        assert_eq!(config.displacement.strength, 0.1);
    }

    #[test]
    fn test_rejects_zero_canvas() {
        let mut config = Config::default();
        config.canvas.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.canvas.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_strength() {
        let mut config = Config::default();
        config.displacement.strength = f32::NAN;
        assert!(config.validate().is_err());

        config.displacement.strength = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aspect() {
        let size = CanvasSize::new(1600, 800);
        assert_eq!(size.aspect(), 2.0);
    }
}
