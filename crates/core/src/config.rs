//! Packing engine configuration.

use crate::geometry::OrientationMode;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default minimum fraction of a footprint that must rest on material.
pub const DEFAULT_SUPPORT_THRESHOLD: f64 = 0.75;

/// Length tolerance used for fit and coincidence tests.
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Common configuration for the packing engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Minimum supported fraction of an item's footprint (0.0 - 1.0).
    pub support_threshold: f64,

    /// Which axis assignments are tried for each item.
    pub orientation: OrientationMode,

    /// Scan a coarse grid of anchors inside each free rectangle in addition
    /// to the corner anchors.
    pub grid_scan: bool,

    /// Lower bound for the grid scan step.
    pub min_grid_step: f64,

    /// Length tolerance for fit and elevation comparisons.
    pub epsilon: f64,

    /// Residual rectangles with an area at or below this are discarded.
    pub area_epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            support_threshold: DEFAULT_SUPPORT_THRESHOLD,
            orientation: OrientationMode::default(),
            grid_scan: true,
            min_grid_step: 2.0,
            epsilon: DEFAULT_EPSILON,
            area_epsilon: DEFAULT_EPSILON,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the support threshold.
    pub fn with_support_threshold(mut self, threshold: f64) -> Self {
        self.support_threshold = threshold;
        self
    }

    /// Sets the orientation mode.
    pub fn with_orientation(mut self, mode: OrientationMode) -> Self {
        self.orientation = mode;
        self
    }

    /// Enables or disables the anchor grid scan.
    pub fn with_grid_scan(mut self, enabled: bool) -> Self {
        self.grid_scan = enabled;
        self
    }

    /// Sets the minimum grid scan step.
    pub fn with_min_grid_step(mut self, step: f64) -> Self {
        self.min_grid_step = step;
        self
    }

    /// Sets the length tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.support_threshold)?;

        if !(self.min_grid_step.is_finite() && self.min_grid_step > 0.0) {
            return Err(Error::ConfigError(format!(
                "Minimum grid step must be positive, got {}",
                self.min_grid_step
            )));
        }

        if !(self.epsilon.is_finite() && self.epsilon >= 0.0)
            || !(self.area_epsilon.is_finite() && self.area_epsilon >= 0.0)
        {
            return Err(Error::ConfigError(
                "Tolerances must be finite and non-negative".into(),
            ));
        }

        Ok(())
    }
}

/// Checks that a support threshold lies in [0, 1].
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(Error::ConfigError(format!(
            "Support threshold must be within [0, 1], got {}",
            threshold
        )))
    }
}
