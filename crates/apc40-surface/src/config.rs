//! Driver configuration schema and loader
//!
//! The device constants (status bytes, controller ids, grid notes) are fixed
//! and live in [`crate::address`]. What's configurable is the driver policy:
//! which port to look for, how fast and how far the knobs move, and the ring
//! styles and button velocity to use.
//!
//! Configuration is stored as YAML.
//! Default location: ~/.config/apc40/apc40.yaml

use crate::button::DEFAULT_ON_VELOCITY;
use crate::knob::LedRingMode;
use crate::oscillation::{DEFAULT_RESEED_RANGE, DEFAULT_STEP};
use crate::surface::SurfaceOptions;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port name substring used to find the device
pub const DEFAULT_PORT_MATCH: &str = "APC40";

/// Default animation tick interval
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Root driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Port name substring to match (case-insensitive)
    pub port_match: String,

    /// Milliseconds between animation ticks
    pub tick_interval_ms: u64,

    /// Saturating delta applied to each knob per tick
    pub step: u32,

    /// Lowest reseed position
    pub reseed_min: u8,

    /// Highest reseed position
    pub reseed_max: u8,

    /// Track (0-7) the knob animation runs on
    pub animated_track: usize,

    /// Ring style for the device control knobs
    pub device_ring_mode: LedRingMode,

    /// Ring style for the track control knobs
    pub track_ring_mode: LedRingMode,

    /// Note On velocity for lighting buttons
    pub button_on_velocity: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        let options = SurfaceOptions::default();
        Self {
            port_match: DEFAULT_PORT_MATCH.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            step: DEFAULT_STEP,
            reseed_min: *DEFAULT_RESEED_RANGE.start(),
            reseed_max: *DEFAULT_RESEED_RANGE.end(),
            animated_track: options.animated_track,
            device_ring_mode: options.device_ring_mode,
            track_ring_mode: options.track_ring_mode,
            button_on_velocity: DEFAULT_ON_VELOCITY,
        }
    }
}

impl DriverConfig {
    /// Surface policy derived from this config
    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            animated_track: self.animated_track,
            step: self.step,
            device_ring_mode: self.device_ring_mode,
            track_ring_mode: self.track_ring_mode,
            button_on_velocity: self.button_on_velocity,
        }
    }

    pub fn reseed_range(&self) -> RangeInclusive<u8> {
        self.reseed_min..=self.reseed_max
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Get the default driver config file path
///
/// Returns: ~/.config/apc40/apc40.yaml (platform config dir)
pub fn default_driver_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("apc40")
        .join("apc40.yaml")
}

/// Load driver configuration from a YAML file
///
/// If the file doesn't exist, returns the defaults.
/// If the file exists but is invalid, logs a warning and returns the defaults.
pub fn load_driver_config(path: &Path) -> DriverConfig {
    log::info!("load_driver_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_driver_config: Config file doesn't exist, using defaults");
        return DriverConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<DriverConfig>(&contents) {
            Ok(config) => {
                log::info!(
                    "load_driver_config: port_match '{}', step {}, every {} ms",
                    config.port_match,
                    config.step,
                    config.tick_interval_ms
                );
                config
            }
            Err(e) => {
                log::warn!("load_driver_config: Failed to parse config: {}", e);
                DriverConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_driver_config: Failed to read config file: {}", e);
            DriverConfig::default()
        }
    }
}

/// Save driver configuration to a YAML file
///
/// Creates parent directories if they don't exist.
pub fn save_driver_config(config: &DriverConfig, path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    log::info!("save_driver_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize driver config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write driver config file: {:?}", path))?;

    log::info!("save_driver_config: Config saved successfully");
    Ok(())
}
