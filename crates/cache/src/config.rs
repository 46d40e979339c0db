//! Render cache configuration
//!
//! Tile size and eviction distance can be set programmatically, loaded from
//! a TOML file, or overridden through environment variables.

use pdf_viewer_render::DEFAULT_TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Default distance, in device pixels, past which offscreen pages are evicted
pub const DEFAULT_EVICTION_DISTANCE: f64 = 4096.0;

/// Configuration for the render cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum tile edge in device pixels
    pub tile_max_size: u32,

    /// Offscreen pages farther than this from the viewport are released
    pub eviction_distance: f64,

    /// Render pages that fit in one tile into a single bitmap
    pub whole_page_fast_path: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tile_max_size: DEFAULT_TILE_SIZE,
            eviction_distance: DEFAULT_EVICTION_DISTANCE,
            whole_page_fast_path: true,
        }
    }
}

impl CacheConfig {
    /// Sets the maximum tile edge in pixels.
    pub fn with_tile_max_size(mut self, pixels: u32) -> Self {
        self.tile_max_size = pixels;
        self
    }

    /// Sets the eviction distance in pixels.
    pub fn with_eviction_distance(mut self, pixels: f64) -> Self {
        self.eviction_distance = pixels;
        self
    }

    /// Enables or disables the single-bitmap path for small pages.
    pub fn with_whole_page_fast_path(mut self, enabled: bool) -> Self {
        self.whole_page_fast_path = enabled;
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    /// Returns an error for a zero tile size or a negative/non-finite distance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_max_size == 0 {
            return Err(ConfigError::InvalidValue("tile_max_size".to_string()));
        }
        if !self.eviction_distance.is_finite() || self.eviction_distance < 0.0 {
            return Err(ConfigError::InvalidValue("eviction_distance".to_string()));
        }
        Ok(())
    }

    /// Loads configuration from environment variables, starting from defaults.
    ///
    /// Environment variables:
    /// - `PDF_VIEWER_TILE_SIZE`: maximum tile edge in pixels (default: 1600)
    /// - `PDF_VIEWER_EVICTION_DISTANCE`: eviction distance in pixels (default: 4096)
    /// - `PDF_VIEWER_WHOLE_PAGE`: `true`/`false` for the single-bitmap path
    ///
    /// # Errors
    /// Returns an error if any environment variable contains an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Applies environment overrides on top of this configuration.
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("PDF_VIEWER_TILE_SIZE") {
            self.tile_max_size = val
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue("PDF_VIEWER_TILE_SIZE".to_string()))?;
        }

        if let Ok(val) = std::env::var("PDF_VIEWER_EVICTION_DISTANCE") {
            self.eviction_distance = val
                .trim()
                .parse::<f64>()
                .map_err(|_| {
                    ConfigError::InvalidValue("PDF_VIEWER_EVICTION_DISTANCE".to_string())
                })?;
        }

        if let Ok(val) = std::env::var("PDF_VIEWER_WHOLE_PAGE") {
            self.whole_page_fast_path = val
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue("PDF_VIEWER_WHOLE_PAGE".to_string()))?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format (every key optional):
    /// ```toml
    /// tile_max_size = 1600
    /// eviction_distance = 4096.0
    /// whole_page_fast_path = true
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml()?)?;
        Ok(())
    }

    /// Converts configuration to TOML format.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid value for a configuration parameter
    #[error("Invalid value for configuration key: {0}")]
    InvalidValue(String),

    /// I/O error reading or writing configuration file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
