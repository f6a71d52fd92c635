use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for a conversion run
///
/// Built once at startup, validated, and then only ever borrowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Still image settings
    pub image: ImageConfig,

    /// Video-to-animation settings
    pub animation: AnimationConfig,

    /// Batch driver settings
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.message().to_string(),
            })?;
        Ok(config)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;
        Ok(content)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.image.validate()?;
        self.animation.validate()?;
        self.batch.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Still image configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Resize ceiling in pixels; wider images are scaled down to this width
    pub max_width: u32,

    /// Lossy encode quality for JPEG and WebP (0-100)
    pub quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: 1200,
            quality: 90,
        }
    }
}

impl ImageConfig {
    fn validate(&self) -> Result<()> {
        if self.max_width == 0 {
            return Err(invalid("image.max_width", self.max_width).into());
        }

        if self.quality > 100 {
            return Err(invalid("image.quality", self.quality).into());
        }

        Ok(())
    }
}

/// Video-to-animation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Resize ceiling in pixels for the animation
    pub target_width: u32,

    /// Output frame rate; sources are never sped up past their own rate
    pub fps: f64,

    /// Trim clips to this many seconds; unset keeps the full clip
    pub max_duration: Option<f64>,

    /// Number of repeats, 0 loops forever
    pub loop_count: u16,

    /// Maximum colors in the animation palette (2-256)
    pub palette_size: u16,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            target_width: 640,
            fps: 10.0,
            max_duration: None,
            loop_count: 0,
            palette_size: 256,
        }
    }
}

impl AnimationConfig {
    /// GIF frame delays are counted in hundredths of a second.
    pub const MAX_FPS: f64 = 100.0;

    fn validate(&self) -> Result<()> {
        if self.target_width == 0 {
            return Err(invalid("animation.target_width", self.target_width).into());
        }

        if !(self.fps > 0.0 && self.fps <= Self::MAX_FPS) {
            return Err(invalid("animation.fps", self.fps).into());
        }

        if let Some(max_duration) = self.max_duration {
            if !(max_duration > 0.0 && max_duration.is_finite()) {
                return Err(invalid("animation.max_duration", max_duration).into());
            }
        }

        if !(2..=256).contains(&self.palette_size) {
            return Err(invalid("animation.palette_size", self.palette_size).into());
        }

        Ok(())
    }
}

/// Batch driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of assets converted in parallel
    pub workers: usize,

    /// Report dot-files as skipped instead of converting them
    pub skip_hidden: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            skip_hidden: true,
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(invalid("batch.workers", self.workers).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use tempfile::tempdir;

    fn invalid_key(config: &Config) -> String {
        match config.validate() {
            Err(ConvertError::Config(ConfigError::InvalidValue { key, .. })) => key,
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.image.max_width, 1200);
        assert_eq!(config.image.quality, 90);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("gallery.toml");

        let mut original_config = Config::default();
        original_config.animation.max_duration = Some(4.5);
        original_config.animation.loop_count = 3;

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[image]\nmax_width = 800\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.image.max_width, 800);
        assert_eq!(config.image.quality, 90);
        assert_eq!(config.animation, AnimationConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = Config::from_file(dir.path().join("nope.toml"));
        assert!(matches!(
            result,
            Err(ConvertError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("broken.toml");
        std::fs::write(&file_path, "[image\nmax_width = ").unwrap();

        let result = Config::from_file(&file_path);
        assert!(matches!(
            result,
            Err(ConvertError::Config(ConfigError::ParseFailed { .. }))
        ));
    }

    #[test]
    fn test_invalid_quality() {
        let mut config = Config::default();
        config.image.quality = 101;
        assert_eq!(invalid_key(&config), "image.quality");
    }

    #[test]
    fn test_invalid_palette_size() {
        let mut config = Config::default();
        config.animation.palette_size = 1;
        assert_eq!(invalid_key(&config), "animation.palette_size");

        config.animation.palette_size = 257;
        assert_eq!(invalid_key(&config), "animation.palette_size");

        config.animation.palette_size = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.animation.fps = 0.0;
        assert_eq!(invalid_key(&config), "animation.fps");

        config.animation.fps = f64::NAN;
        assert_eq!(invalid_key(&config), "animation.fps");

        config.animation.fps = 120.0;
        assert_eq!(invalid_key(&config), "animation.fps");
    }

    #[test]
    fn test_invalid_max_duration() {
        let mut config = Config::default();
        config.animation.max_duration = Some(0.0);
        assert_eq!(invalid_key(&config), "animation.max_duration");

        config.animation.max_duration = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_workers() {
        let mut config = Config::default();
        config.batch.workers = 0;
        assert_eq!(invalid_key(&config), "batch.workers");
    }
}
