//! Angular velocity computation
//!
//! Converts an orientation time series into one angular velocity per
//! adjacent sample pair. Euler X is treated as latitude and Euler Y as
//! longitude of a point on the viewing sphere; the angular distance between
//! two consecutive points is divided by the time between them.
//!
//! For gaze logs, a pair whose mean tracker confidence falls below the
//! configured threshold yields [`AngularVelocity::Ineligible`], as does any
//! pair logged with the same timestamp.

use crate::types::{AngularVelocity, LogLayout, LogSample};

/// Computes angular velocities (deg/s) for one log layout
#[derive(Debug, Clone, Copy)]
pub struct VelocityComputer {
    layout: LogLayout,
    confidence_threshold: f64,
}

impl VelocityComputer {
    pub fn new(layout: LogLayout, confidence_threshold: f64) -> Self {
        Self {
            layout,
            confidence_threshold,
        }
    }

    /// Returns `samples.len() - 1` velocities; index `i` covers `(i, i + 1)`
    pub fn compute(&self, samples: &[LogSample]) -> Vec<AngularVelocity> {
        samples
            .windows(2)
            .map(|pair| self.pair_velocity(&pair[0], &pair[1]))
            .collect()
    }

    fn pair_velocity(&self, a: &LogSample, b: &LogSample) -> AngularVelocity {
        if self.layout.has_confidence() {
            let mean_confidence =
                (a.confidence.unwrap_or(0.0) + b.confidence.unwrap_or(0.0)) / 2.0;
            if mean_confidence < self.confidence_threshold {
                return AngularVelocity::Ineligible;
            }
        }

        let dt = b.timestamp - a.timestamp;
        if dt <= 0.0 {
            return AngularVelocity::Ineligible;
        }

        let distance = orthodromic_distance(a.euler.x, b.euler.x, a.euler.y, b.euler.y);
        let velocity = distance.to_degrees() / dt;

        if velocity.is_finite() {
            AngularVelocity::Eligible(velocity)
        } else {
            AngularVelocity::Ineligible
        }
    }
}

/// Haversine-style angular distance between two orientations
///
/// Angles are fed to the trigonometric functions exactly as logged.
pub fn orthodromic_distance(lat_1: f64, lat_2: f64, long_1: f64, long_2: f64) -> f64 {
    let delta_long = long_2 - long_1;
    let delta_lat = lat_2 - lat_1;
    2.0 * ((delta_long / 2.0).sin().powi(2)
        + long_1.cos() * long_2.cos() * (delta_lat / 2.0).sin().powi(2))
    .asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Quat, Uv, Vec3};

    fn sample(t: f64, ex: f64, ey: f64, confidence: Option<f64>) -> LogSample {
        LogSample {
            timestamp: t,
            euler: Vec3::new(ex, ey, 0.0),
            rotation: Quat::identity(),
            direction: Vec3::new(0.0, 0.0, 1.0),
            uv: Uv::new(0.5, 0.5),
            confidence,
        }
    }

    #[test]
    fn test_identical_orientations_have_zero_velocity() {
        let samples = vec![
            sample(0.0, 10.0, 20.0, None),
            sample(0.1, 10.0, 20.0, None),
            sample(0.2, 10.0, 20.0, None),
        ];
        let velocities = VelocityComputer::new(LogLayout::Head, 0.0).compute(&samples);
        assert_eq!(velocities, vec![AngularVelocity::Eligible(0.0); 2]);
    }

    #[test]
    fn test_one_velocity_per_adjacent_pair() {
        let samples: Vec<LogSample> = (0..7)
            .map(|i| sample(i as f64 * 0.1, 0.0, i as f64 * 0.01, None))
            .collect();
        let velocities = VelocityComputer::new(LogLayout::Head, 0.0).compute(&samples);
        assert_eq!(velocities.len(), 6);

        // Index i is the pair (i, i + 1)
        let pair_2 = VelocityComputer::new(LogLayout::Head, 0.0).compute(&samples[2..4]);
        assert_eq!(velocities[2], pair_2[0]);

        assert!(VelocityComputer::new(LogLayout::Head, 0.0)
            .compute(&samples[..1])
            .is_empty());
    }

    #[test]
    fn test_velocity_matches_formula() {
        let a = sample(1.0, 0.02, 0.0, None);
        let b = sample(1.5, 0.06, 0.04, None);
        let velocities = VelocityComputer::new(LogLayout::Head, 0.0).compute(&[a, b]);

        let expected = orthodromic_distance(0.02, 0.06, 0.0, 0.04).to_degrees() / 0.5;
        match velocities[0] {
            AngularVelocity::Eligible(v) => assert!((v - expected).abs() < 1e-12),
            AngularVelocity::Ineligible => panic!("expected an eligible velocity"),
        }
        assert!(expected > 0.0);
    }

    #[test]
    fn test_low_confidence_pair_is_ineligible() {
        let samples = vec![
            sample(0.0, 1.0, 1.0, Some(0.9)),
            sample(0.1, 1.0, 1.0, Some(0.2)),
            sample(0.2, 1.0, 1.0, Some(0.9)),
            sample(0.3, 1.0, 1.0, Some(0.9)),
        ];
        let velocities = VelocityComputer::new(LogLayout::Gaze, 0.6).compute(&samples);

        // (0.9 + 0.2) / 2 = 0.55 < 0.6 for both pairs touching the second sample
        assert_eq!(velocities[0], AngularVelocity::Ineligible);
        assert_eq!(velocities[1], AngularVelocity::Ineligible);
        assert_eq!(velocities[2], AngularVelocity::Eligible(0.0));
    }

    #[test]
    fn test_confidence_ignored_for_head_logs() {
        let samples = vec![sample(0.0, 1.0, 1.0, Some(0.0)), sample(0.1, 1.0, 1.0, Some(0.0))];
        let velocities = VelocityComputer::new(LogLayout::Head, 0.6).compute(&samples);
        assert_eq!(velocities[0], AngularVelocity::Eligible(0.0));
    }

    #[test]
    fn test_repeated_timestamp_is_ineligible() {
        let samples = vec![
            sample(0.5, 1.0, 1.0, None),
            sample(0.5, 1.0, 2.0, None),
            sample(0.6, 1.0, 2.0, None),
        ];
        let velocities = VelocityComputer::new(LogLayout::Head, 0.0).compute(&samples);
        assert_eq!(velocities[0], AngularVelocity::Ineligible);
        assert_eq!(velocities[1], AngularVelocity::Eligible(0.0));

        // Identical orientations at the same instant are still not a fixation sample
        let still = vec![sample(0.5, 1.0, 1.0, None), sample(0.5, 1.0, 1.0, None)];
        let velocities = VelocityComputer::new(LogLayout::Head, 0.0).compute(&still);
        assert_eq!(velocities[0], AngularVelocity::Ineligible);
    }

    #[test]
    fn test_wrapped_angles_stay_finite() {
        // Angles around the 0/360 wrap are used as logged
        let samples = vec![sample(0.0, 359.0, 359.5, None), sample(0.1, 1.0, 0.5, None)];
        let velocities = VelocityComputer::new(LogLayout::Head, 0.0).compute(&samples);
        let v = velocities[0].value().expect("eligible velocity");
        assert!(v.is_finite());
        assert!(v >= 0.0);
    }
}
