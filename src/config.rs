//! Configuration module.
//!
//! Handles loading, validating, and merging `instacrops.toml`. Stock defaults
//! are overridden by whatever the user file specifies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [output]
//! width = 1920              # Target size for automatic mode
//! height = 1080
//!
//! [compression]
//! max_bytes = 2097152       # Output ceiling (2 MiB)
//! initial_quality = 95      # First JPEG quality tried (1-100)
//! quality_floor = 50        # Never step to or below this quality
//! quality_step = 10         # Quality decrement per retry
//!
//! [state]
//! # counter_dir = "/var/lib/instacrops"  # Counter location; unset uses $XDG_STATE_HOME/instacrops
//! ```
//!
//! Config files are sparse; override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{CompressionParams, Dimensions, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `instacrops.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Target dimensions for automatic mode.
    pub output: OutputConfig,
    /// Byte budget and quality ladder.
    pub compression: CompressionConfig,
    /// Persisted state location.
    pub state: StateConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.width == 0 || self.output.height == 0 {
            return Err(ConfigError::Validation(
                "output.width and output.height must be non-zero".into(),
            ));
        }
        let c = &self.compression;
        if c.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "compression.max_bytes must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&c.initial_quality) {
            return Err(ConfigError::Validation(
                "compression.initial_quality must be 1-100".into(),
            ));
        }
        if c.quality_floor >= c.initial_quality {
            return Err(ConfigError::Validation(
                "compression.quality_floor must be below initial_quality".into(),
            ));
        }
        if c.quality_step == 0 {
            return Err(ConfigError::Validation(
                "compression.quality_step must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Default output target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl OutputConfig {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Compression loop settings, qualities in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub max_bytes: u64,
    pub initial_quality: u32,
    pub quality_floor: u32,
    pub quality_step: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        let params = CompressionParams::default();
        Self {
            max_bytes: params.max_bytes,
            initial_quality: params.initial_quality.value(),
            quality_floor: params.quality_floor.value(),
            quality_step: params.quality_step,
        }
    }
}

impl CompressionConfig {
    pub fn params(&self) -> CompressionParams {
        CompressionParams {
            max_bytes: self.max_bytes,
            initial_quality: Quality::new(self.initial_quality),
            quality_floor: Quality(self.quality_floor),
            quality_step: self.quality_step,
        }
    }
}

/// Location of persisted state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    /// Directory holding the conversion counter. When absent, the platform
    /// state directory is used (see [`default_state_dir`]).
    pub counter_dir: Option<PathBuf>,
}

/// `$XDG_STATE_HOME/instacrops`, falling back to `~/.local/state/instacrops`,
/// then to the current directory.
pub fn default_state_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_STATE_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join("instacrops");
    }
    match std::env::var_os("HOME").filter(|d| !d.is_empty()) {
        Some(home) => PathBuf::from(home).join(".local/state/instacrops"),
        None => PathBuf::from("."),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// A missing file yields the stock defaults. A file that exists but does not
/// parse, has unknown keys, or fails validation is an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `instacrops.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# InstaCrops Configuration
# ========================
# Every key is optional. Remove what you don't change.

[output]
# Target size for automatic mode. Automatic cropping is always 16:9, so a
# target with a different ratio stretches the picture.
width = 1920
height = 1080

[compression]
# Output ceiling in bytes (2 MiB).
max_bytes = 2097152
# First JPEG quality tried, in percent.
initial_quality = 95
# The loop never steps to or below this quality; the last encoding is kept
# even if it is still over max_bytes.
quality_floor = 50
# How much quality drops per retry.
quality_step = 10

[state]
# Directory for the persisted conversion counter.
# Defaults to $XDG_STATE_HOME/instacrops or ~/.local/state/instacrops.
# counter_dir = "/var/lib/instacrops"
"##
}
