//! Replay configuration
//!
//! Every field has a default, so a config document only needs the values it
//! overrides. Reading the document from disk is left to the binaries.

use crate::densify::DEFAULT_DENSIFIED_POINTS;
use crate::geometry::DEFAULT_TRACK_WIDTH;
use crate::playback::{DEFAULT_SCRUB_STEP, MIN_SPEED};
use crate::viewport::Viewport;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Full track width in world units
    pub track_width: f64,
    /// Points per densified boundary curve
    pub densified_points: usize,
    pub viewport: Viewport,
    /// Frames moved per step forward/back
    pub scrub_step: i64,
    pub initial_speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            track_width: DEFAULT_TRACK_WIDTH,
            densified_points: DEFAULT_DENSIFIED_POINTS,
            viewport: Viewport::default(),
            scrub_step: DEFAULT_SCRUB_STEP,
            initial_speed: 1.0,
        }
    }
}

impl ReplayConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.track_width.is_finite() && self.track_width > 0.0) {
            return Err(ConfigError::Invalid {
                field: "track_width",
                reason: format!("must be positive, got {}", self.track_width),
            });
        }
        if self.densified_points < 2 {
            return Err(ConfigError::Invalid {
                field: "densified_points",
                reason: format!("must be at least 2, got {}", self.densified_points),
            });
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "viewport",
                reason: format!(
                    "size must be positive, got {}x{}",
                    self.viewport.width, self.viewport.height
                ),
            });
        }
        if !(0.0..0.5).contains(&self.viewport.padding) {
            return Err(ConfigError::Invalid {
                field: "viewport.padding",
                reason: format!("must be in [0, 0.5), got {}", self.viewport.padding),
            });
        }
        if self.scrub_step < 1 {
            return Err(ConfigError::Invalid {
                field: "scrub_step",
                reason: format!("must be at least 1, got {}", self.scrub_step),
            });
        }
        if !(self.initial_speed.is_finite() && self.initial_speed >= MIN_SPEED) {
            return Err(ConfigError::Invalid {
                field: "initial_speed",
                reason: format!("must be at least {MIN_SPEED}, got {}", self.initial_speed),
            });
        }
        Ok(())
    }
}
