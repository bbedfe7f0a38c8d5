//! Core types for the gaze-saliency pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: parsed log samples, per-log series with their angular velocities,
//! detected fixations and the analysis time window.

use serde::{Deserialize, Serialize};

/// Three-component vector (Euler angles in degrees, or a unit direction)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Rotation quaternion as logged (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quat {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Equirectangular texture coordinate, both components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Uv {
    pub u: f64,
    pub v: f64,
}

impl Uv {
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }
}

/// Log layout, selected once per run
///
/// Head-rotation logs carry a starting timestamp line, an initial rotation
/// line and a column header before the data. Gaze logs drop the initial
/// rotation line and append a confidence column to every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLayout {
    Head,
    Gaze,
}

impl LogLayout {
    /// Index of the first data line
    pub fn data_start_line(&self) -> usize {
        match self {
            LogLayout::Head => 3,
            LogLayout::Gaze => 2,
        }
    }

    pub fn has_confidence(&self) -> bool {
        matches!(self, LogLayout::Gaze)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLayout::Head => "head",
            LogLayout::Gaze => "gaze",
        }
    }

    /// Name of the per-layout output sub-directory
    pub fn output_dir_name(&self) -> &'static str {
        match self {
            LogLayout::Head => "headData",
            LogLayout::Gaze => "gazeData",
        }
    }

    /// Detect the layout from the `_head` / `_gaze` suffix written by the loggers
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.rsplit(['/', '\\']).next().unwrap_or(name);
        let stem = stem.split('.').next().unwrap_or(stem);
        if stem.ends_with("_head") {
            Some(LogLayout::Head)
        } else if stem.ends_with("_gaze") {
            Some(LogLayout::Gaze)
        } else {
            None
        }
    }
}

/// One logged orientation sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSample {
    /// Seconds since logging started
    pub timestamp: f64,
    /// Euler rotation (degrees)
    pub euler: Vec3,
    pub rotation: Quat,
    /// Head forward vector or gaze direction in world space
    pub direction: Vec3,
    pub uv: Uv,
    /// Eye tracker confidence in [0, 1] (gaze logs only)
    pub confidence: Option<f64>,
}

/// Values found in the header block of a log
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LogHeader {
    /// Video timestamp at which logging started
    pub starting_timestamp: Option<f64>,
    /// Head rotation when logging started (head logs only)
    pub initial_rotation: Option<Quat>,
}

/// Angular velocity between two adjacent samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularVelocity {
    /// Velocity in degrees per second
    Eligible(f64),
    /// Excluded from classification (low confidence or non-finite)
    Ineligible,
}

impl AngularVelocity {
    pub fn value(&self) -> Option<f64> {
        match self {
            AngularVelocity::Eligible(v) => Some(*v),
            AngularVelocity::Ineligible => None,
        }
    }

    /// True only for an eligible velocity not above `threshold`
    pub fn is_at_most(&self, threshold: f64) -> bool {
        matches!(self, AngularVelocity::Eligible(v) if *v <= threshold)
    }
}

/// Parsed log with its derived angular velocities
///
/// `velocities[i]` belongs to the sample pair `(i, i + 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogSeries {
    name: String,
    layout: LogLayout,
    header: LogHeader,
    samples: Vec<LogSample>,
    velocities: Vec<AngularVelocity>,
}

impl LogSeries {
    pub(crate) fn new(
        name: String,
        layout: LogLayout,
        header: LogHeader,
        samples: Vec<LogSample>,
        velocities: Vec<AngularVelocity>,
    ) -> Self {
        debug_assert_eq!(velocities.len(), samples.len().saturating_sub(1));
        Self {
            name,
            layout,
            header,
            samples,
            velocities,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> LogLayout {
        self.layout
    }

    pub fn header(&self) -> &LogHeader {
        &self.header
    }

    pub fn samples(&self) -> &[LogSample] {
        &self.samples
    }

    pub fn velocities(&self) -> &[AngularVelocity] {
        &self.velocities
    }

    /// First and last logged timestamps
    pub fn time_span(&self) -> Option<(f64, f64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

/// Analysis window `[start, start + seconds]` on the video timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub seconds: f64,
}

impl TimeWindow {
    pub fn new(start: f64, seconds: f64) -> Self {
        Self { start, seconds }
    }

    pub fn end(&self) -> f64 {
        self.start + self.seconds
    }

    /// Inclusive on both ends
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end()
    }
}

/// A detected fixation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    /// Mean UV of the contributing samples
    pub centroid: Uv,
    /// Timestamp of the first contributing sample
    pub start_time: f64,
    /// Seconds until the first sample after the run
    pub duration: f64,
    /// Position of the originating log in the run
    pub source_log_index: usize,
}

impl Fixation {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}
