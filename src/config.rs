//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! All timing windows and tolerances used by the judgment engine live here so
//! that nothing in the engine is hard-coded. The wheel lane compares degrees
//! rather than percent, and its tolerance is the pedal tolerance scaled by
//! `wheel_tolerance_scale`; the ratio is configurable but is deliberately not
//! part of the difficulty presets.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub judgment: JudgmentConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
}

/// Judgment window and tolerance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JudgmentConfig {
    /// Value tolerance for pedal lanes, in percent units.
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Wheel-lane tolerance as a multiple of `tolerance`, in degree units.
    #[serde(default = "default_wheel_tolerance_scale")]
    pub wheel_tolerance_scale: f32,

    /// Half-width of the hit window for continuous lanes, in seconds.
    #[serde(default = "default_hit_window_s")]
    pub hit_window_s: f32,

    /// How far past its scheduled time a continuous target may drift
    /// before it is marked missed, in seconds.
    #[serde(default = "default_miss_grace_s")]
    pub miss_grace_s: f32,

    /// Half-width of the hit window (and miss grace) for shift lanes.
    #[serde(default = "default_shift_window_s")]
    pub shift_window_s: f32,

    /// Minimum pedal input before a hit test is attempted at all.
    #[serde(default = "default_activity_threshold")]
    pub activity_threshold: f32,
}

/// Input aggregation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// Physical values below this magnitude yield to the keyboard fallback.
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
}

/// Session loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Length of a generated training run, in seconds.
    #[serde(default = "default_run_duration_s")]
    pub run_duration_s: f32,
}

/// Difficulty parameters for the sequence generator
///
/// Smaller values produce faster, harder runs.
#[derive(Debug, Deserialize, Clone)]
pub struct DifficultyConfig {
    #[serde(default = "default_min_duration_s")]
    pub min_duration_s: f32,

    #[serde(default = "default_max_duration_s")]
    pub max_duration_s: f32,

    #[serde(default = "default_min_spacing_s")]
    pub min_spacing_s: f32,

    #[serde(default = "default_max_spacing_s")]
    pub max_spacing_s: f32,
}

// Default value functions
fn default_tolerance() -> f32 { 5.0 }
fn default_wheel_tolerance_scale() -> f32 { 2.0 }
fn default_hit_window_s() -> f32 { 0.15 }
fn default_miss_grace_s() -> f32 { 0.2 }
fn default_shift_window_s() -> f32 { 0.25 }
fn default_activity_threshold() -> f32 { 0.05 }

fn default_deadzone() -> f32 { 0.1 }

fn default_tick_rate_hz() -> u32 { 60 }
fn default_run_duration_s() -> f32 { 60.0 }

fn default_min_duration_s() -> f32 { 0.5 }
fn default_max_duration_s() -> f32 { 1.5 }
fn default_min_spacing_s() -> f32 { 1.0 }
fn default_max_spacing_s() -> f32 { 3.0 }

impl Default for JudgmentConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            wheel_tolerance_scale: default_wheel_tolerance_scale(),
            hit_window_s: default_hit_window_s(),
            miss_grace_s: default_miss_grace_s(),
            shift_window_s: default_shift_window_s(),
            activity_threshold: default_activity_threshold(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            run_duration_s: default_run_duration_s(),
        }
    }
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            min_duration_s: default_min_duration_s(),
            max_duration_s: default_max_duration_s(),
            min_spacing_s: default_min_spacing_s(),
            max_spacing_s: default_max_spacing_s(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            judgment: JudgmentConfig::default(),
            input: InputConfig::default(),
            session: SessionConfig::default(),
            difficulty: DifficultyConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.judgment.tolerance <= 0.0 || self.judgment.tolerance > 50.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("tolerance must be between 0 and 50 percent")
            ));
        }

        if self.judgment.wheel_tolerance_scale <= 0.0 || self.judgment.wheel_tolerance_scale > 10.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("wheel_tolerance_scale must be between 0 and 10")
            ));
        }

        if self.judgment.hit_window_s <= 0.0 || self.judgment.hit_window_s > 1.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("hit_window_s must be between 0 and 1 second")
            ));
        }

        // A target must outlive its hit window, otherwise it can be missed
        // while still hittable.
        if self.judgment.miss_grace_s < self.judgment.hit_window_s {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("miss_grace_s must be at least hit_window_s")
            ));
        }

        if self.judgment.shift_window_s <= 0.0 || self.judgment.shift_window_s > 1.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("shift_window_s must be between 0 and 1 second")
            ));
        }

        if self.judgment.activity_threshold < 0.0 || self.judgment.activity_threshold >= 1.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("activity_threshold must be between 0.0 and 1.0")
            ));
        }

        if self.input.deadzone < 0.0 || self.input.deadzone > 0.25 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("deadzone must be between 0.0 and 0.25")
            ));
        }

        if self.session.tick_rate_hz < 10 || self.session.tick_rate_hz > 500 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("tick_rate_hz must be between 10 and 500")
            ));
        }

        if self.session.run_duration_s < 5.0 || self.session.run_duration_s > 3600.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("run_duration_s must be between 5 and 3600 seconds")
            ));
        }

        if self.difficulty.min_duration_s <= 0.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("min_duration_s must be greater than 0")
            ));
        }

        if self.difficulty.max_duration_s < self.difficulty.min_duration_s {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("max_duration_s must be at least min_duration_s")
            ));
        }

        if self.difficulty.min_spacing_s <= 0.0 {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("min_spacing_s must be greater than 0")
            ));
        }

        if self.difficulty.max_spacing_s < self.difficulty.min_spacing_s {
            return Err(crate::error::TrainerError::Config(
                toml::de::Error::custom("max_spacing_s must be at least min_spacing_s")
            ));
        }

        Ok(())
    }
}
