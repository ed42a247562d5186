//! Configuration management for cardqr.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scan::FacingMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "cardqr";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "cardqr.db";

/// Largest accepted nominal QR edge in pixels.
pub const MAX_QR_SIZE: u32 = 4096;

/// Largest accepted raster supersampling factor.
pub const MAX_RASTER_SCALE: u32 = 16;

/// Accepted QR error correction levels.
const ERROR_CORRECTION_LEVELS: &[&str] = &["L", "M", "Q", "H"];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `CARDQR_`, `__` between sections)
/// 2. TOML config file at `~/.config/cardqr/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// QR export configuration.
    pub export: ExportConfig,
    /// Scanner configuration.
    pub scan: ScanConfig,
    /// Profile configuration.
    pub profile: ProfileConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/cardqr/cardqr.db`
    pub database_path: Option<PathBuf>,
}

/// QR export configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory exported files are written to.
    /// Defaults to the current working directory.
    pub output_dir: Option<PathBuf>,
    /// Nominal edge length of the rendered QR code in pixels.
    pub qr_size: u32,
    /// Surround the code with the standard quiet zone.
    pub include_margin: bool,
    /// Error correction level: one of L, M, Q, H.
    pub error_correction: String,
    /// Supersampling factor for raster export.
    pub raster_scale: u32,
    /// Upper bound on raster export in milliseconds.
    pub raster_timeout_ms: u64,
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Frames polled per second.
    pub fps: u32,
    /// Edge length of the centered scan box in pixels.
    pub qrbox: u32,
    /// Preferred camera.
    pub facing_mode: FacingMode,
}

/// Profile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Soft size limit for photos; larger files are accepted with a warning.
    pub photo_max_bytes: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            qr_size: 256,
            include_margin: true,
            error_correction: "M".to_string(),
            raster_scale: 2,
            raster_timeout_ms: 5_000,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            qrbox: 250,
            facing_mode: FacingMode::Environment,
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            photo_max_bytes: 1_048_576, // 1MB
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("CARDQR_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("qr_size", u64::from(self.export.qr_size)),
            ("raster_scale", u64::from(self.export.raster_scale)),
            ("raster_timeout_ms", self.export.raster_timeout_ms),
            ("fps", u64::from(self.scan.fps)),
        ];
        for (name, value) in nonzero {
            if value == 0 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be greater than 0"),
                });
            }
        }

        let bounded = [
            ("qr_size", self.export.qr_size, MAX_QR_SIZE),
            ("raster_scale", self.export.raster_scale, MAX_RASTER_SCALE),
        ];
        for (name, value, max) in bounded {
            if value > max {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be at most {max}, got {value}"),
                });
            }
        }

        if !ERROR_CORRECTION_LEVELS.contains(&self.export.error_correction.as_str()) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "invalid error_correction level: {} (expected one of L, M, Q, H)",
                    self.export.error_correction
                ),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.export
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the raster export timeout as a Duration.
    #[must_use]
    pub fn raster_timeout(&self) -> Duration {
        Duration::from_millis(self.export.raster_timeout_ms)
    }

    /// Get the interval between scanned frames.
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(1_000 / u64::from(self.scan.fps.max(1)))
    }
}
