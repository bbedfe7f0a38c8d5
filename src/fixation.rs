//! Velocity-threshold fixation identification (I-VT)
//!
//! A sample whose outgoing angular velocity does not exceed the threshold is
//! a fixation sample; consecutive fixation samples are merged into a single
//! [`Fixation`] located at their mean UV. The threshold is either a fixed
//! value or derived per log from its own velocity distribution.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{AngularVelocity, Fixation, LogSeries, TimeWindow, Uv};

/// Fraction of the retained maximum velocity used as dynamic threshold
const DYNAMIC_THRESHOLD_FACTOR: f64 = 0.2;

/// How the velocity threshold is chosen for each log
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum ThresholdPolicy {
    /// Fixed threshold in deg/s
    Static { threshold: f64 },
    /// Discard the fastest `discard_percent`% and take a fraction of the remaining maximum
    Dynamic { discard_percent: f64 },
}

impl ThresholdPolicy {
    /// Resolve the threshold for one log. `None` when no velocity is eligible
    /// under a dynamic policy.
    pub fn resolve(&self, velocities: &[AngularVelocity]) -> Option<f64> {
        match *self {
            ThresholdPolicy::Static { threshold } => Some(threshold),
            ThresholdPolicy::Dynamic { discard_percent } => {
                dynamic_threshold(velocities, discard_percent)
            }
        }
    }
}

/// Dynamic threshold: sort eligible velocities, keep the lowest
/// `100 - discard_percent`% by index and take a fifth of the largest kept value
pub fn dynamic_threshold(velocities: &[AngularVelocity], discard_percent: f64) -> Option<f64> {
    let mut finite: Vec<f64> = velocities.iter().filter_map(AngularVelocity::value).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);

    let kept = (finite.len() as f64 * (1.0 - discard_percent / 100.0)).round_ties_even();
    let kept = (kept.max(1.0) as usize).min(finite.len());

    Some(finite[kept - 1] * DYNAMIC_THRESHOLD_FACTOR)
}

/// I-VT classifier parameters for one run
#[derive(Debug, Clone, Copy)]
pub struct IvtClassifier {
    policy: ThresholdPolicy,
    max_fixations_per_centroid: usize,
    window: TimeWindow,
}

/// Fixations found in one log
#[derive(Debug, Clone, PartialEq)]
pub struct LogFixations {
    pub threshold: Option<f64>,
    pub fixations: Vec<Fixation>,
}

impl IvtClassifier {
    pub fn new(policy: ThresholdPolicy, max_fixations_per_centroid: usize, window: TimeWindow) -> Self {
        Self {
            policy,
            max_fixations_per_centroid,
            window,
        }
    }

    /// Classify one log.
    ///
    /// A fixation may only start on a sample inside the window; once started
    /// it keeps absorbing samples until one exceeds the threshold or the
    /// centroid cap is reached, even past the window end.
    pub fn classify(&self, series: &LogSeries, log_index: usize) -> LogFixations {
        let velocities = series.velocities();
        let samples = series.samples();
        let threshold = self.policy.resolve(velocities);

        let mut fixations = Vec::new();
        let Some(threshold) = threshold else {
            return LogFixations {
                threshold,
                fixations,
            };
        };

        let mut j = 0;
        while j < velocities.len() {
            if !self.window.contains(samples[j].timestamp) {
                j += 1;
                continue;
            }

            let mut sum_u = 0.0;
            let mut sum_v = 0.0;
            let mut start_time = f64::INFINITY;
            let mut duration = 0.0;
            let mut absorbed = 0usize;

            while j < velocities.len()
                && velocities[j].is_at_most(threshold)
                && absorbed <= self.max_fixations_per_centroid
            {
                sum_u += samples[j].uv.u;
                sum_v += samples[j].uv.v;
                start_time = start_time.min(samples[j].timestamp);
                duration = samples[j + 1].timestamp - start_time;
                absorbed += 1;
                j += 1;
            }

            if absorbed == 0 {
                // Sample j is a saccade (or ineligible); move past it
                j += 1;
                continue;
            }

            let n = absorbed as f64;
            fixations.push(Fixation {
                centroid: Uv::new(sum_u / n, sum_v / n),
                start_time,
                duration,
                source_log_index: log_index,
            });
        }

        LogFixations {
            threshold: Some(threshold),
            fixations,
        }
    }

    /// Classify every log and concatenate the results in log order
    pub fn classify_all(&self, series: &[LogSeries]) -> (Vec<Fixation>, Vec<Option<f64>>) {
        let mut all = Vec::new();
        let mut thresholds = Vec::with_capacity(series.len());

        for (idx, log) in series.iter().enumerate() {
            let result = self.classify(log, idx);
            match (result.threshold, self.policy) {
                (Some(threshold), ThresholdPolicy::Dynamic { .. }) => {
                    info!(log = %log.name(), threshold, "Dynamic velocity threshold");
                }
                (Some(_), ThresholdPolicy::Static { .. }) => {}
                (None, _) => warn!(log = %log.name(), "No eligible velocities in log"),
            }
            debug!(log = %log.name(), fixations = result.fixations.len(), "Classified log");

            thresholds.push(result.threshold);
            all.extend(result.fixations);
        }

        (all, thresholds)
    }
}
