//! Run configuration
//!
//! Every tunable of a saliency run lives in [`SaliencyConfig`]. It is read
//! from JSON with missing keys falling back to their defaults, and is checked
//! with [`SaliencyConfig::validate`] before any log is parsed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SaliencyError;
use crate::fixation::ThresholdPolicy;
use crate::types::{LogLayout, TimeWindow};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaliencyConfig {
    /// Window start on the video timeline (seconds)
    pub start: f64,
    /// Window length (seconds)
    pub seconds_to_consider: f64,
    /// Output width in pixels, 0 to use the clip's resolution
    pub output_frame_width: u32,
    /// Output height in pixels, 0 to use the clip's resolution
    pub output_frame_height: u32,
    /// Process gaze logs instead of head rotation logs
    pub gaze_logs: bool,
    /// Minimum mean tracker confidence of a gaze sample pair
    pub confidence_threshold: f64,
    /// Derive the velocity threshold from each log's distribution
    pub dynamic_velocity_threshold: bool,
    /// Percentage of fastest velocities ignored by the dynamic threshold
    pub dynamic_thresh_discard_percent: f64,
    /// Static I-VT threshold (deg/s)
    pub velocity_threshold_ivt: f64,
    /// Vertical Gaussian sigma in degrees of the 360° frame
    pub sigma_in_degs: f64,
    pub max_fixations_per_centroid: usize,
    pub output_fixation_maps: bool,
    pub output_saliency_maps: bool,
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            seconds_to_consider: 1.0,
            output_frame_width: 0,
            output_frame_height: 0,
            gaze_logs: false,
            confidence_threshold: 0.6,
            dynamic_velocity_threshold: false,
            dynamic_thresh_discard_percent: 2.0,
            velocity_threshold_ivt: 30.0,
            sigma_in_degs: 1.0,
            max_fixations_per_centroid: 1,
            output_fixation_maps: true,
            output_saliency_maps: true,
        }
    }
}

impl SaliencyConfig {
    pub fn from_json(json: &str) -> Result<Self, SaliencyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read, parse and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaliencyError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, SaliencyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SaliencyError> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(invalid("start must be a non-negative number of seconds"));
        }
        if !self.seconds_to_consider.is_finite() || self.seconds_to_consider < 0.0 {
            return Err(invalid("seconds_to_consider must be a non-negative number of seconds"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(invalid("confidence_threshold must be within [0, 1]"));
        }
        if !(0.0..100.0).contains(&self.dynamic_thresh_discard_percent) {
            return Err(invalid("dynamic_thresh_discard_percent must be within [0, 100)"));
        }
        if !(self.velocity_threshold_ivt >= 0.0) {
            return Err(invalid("velocity_threshold_ivt must be >= 0"));
        }
        if !(self.sigma_in_degs > 0.0 && self.sigma_in_degs.is_finite()) {
            return Err(invalid("sigma_in_degs must be > 0"));
        }
        if self.max_fixations_per_centroid < 1 {
            return Err(invalid("max_fixations_per_centroid must be >= 1"));
        }
        Ok(())
    }

    pub fn layout(&self) -> LogLayout {
        if self.gaze_logs {
            LogLayout::Gaze
        } else {
            LogLayout::Head
        }
    }

    pub fn threshold_policy(&self) -> ThresholdPolicy {
        if self.dynamic_velocity_threshold {
            ThresholdPolicy::Dynamic {
                discard_percent: self.dynamic_thresh_discard_percent,
            }
        } else {
            ThresholdPolicy::Static {
                threshold: self.velocity_threshold_ivt,
            }
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.seconds_to_consider)
    }
}

fn invalid(message: &str) -> SaliencyError {
    SaliencyError::InvalidConfig(message.to_string())
}
