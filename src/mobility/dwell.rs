//! Dwell time prediction.
//!
//! Projects the client's velocity onto the direction of the access point to
//! get a closing speed, then estimates how long the client stays in coverage
//! as `(radius - distance) / closing_speed`, perturbed by a bounded uniform
//! relative error.

use serde::{Deserialize, Serialize};

use crate::config::ImpairmentConfig;
use crate::random::RandomSource;
use crate::types::{AccessPoint, Vec2};

/// Floor of the prediction error multiplier.
pub const MIN_ERROR_FACTOR: f64 = 0.1;

/// Guards the direction vector at zero distance.
const DIRECTION_EPSILON: f64 = 1e-6;

/// One dwell time prediction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DwellPrediction {
    /// Velocity component toward the access point.
    pub closing_speed: f64,
    /// Prediction before the error perturbation.
    pub nominal: f64,
    /// Sampled relative error (0 when no prediction was made).
    pub relative_error: f64,
    /// Predicted remaining seconds in coverage.
    pub dwell_time: f64,
    /// Relative error magnitude exceeded the configured threshold.
    pub significant_error: bool,
}

impl DwellPrediction {
    fn none(closing_speed: f64) -> Self {
        Self {
            closing_speed,
            ..Self::default()
        }
    }
}

/// Predicts remaining time in an access point's coverage.
#[derive(Debug, Clone, Copy)]
pub struct DwellTimePredictor<'a> {
    config: &'a ImpairmentConfig,
}

impl<'a> DwellTimePredictor<'a> {
    pub fn new(config: &'a ImpairmentConfig) -> Self {
        Self { config }
    }

    /// Velocity component along the unit vector from `position` to `target`.
    /// Zero at zero distance.
    pub fn closing_speed(position: Vec2, velocity: Vec2, target: Vec2) -> f64 {
        let offset = target - position;
        let direction = offset * (1.0 / (offset.norm() + DIRECTION_EPSILON));
        velocity.dot(direction)
    }

    /// Predict the dwell time of a client in `access_point`'s coverage.
    ///
    /// Returns exactly 0 without drawing when the client is not approaching
    /// or is already outside coverage. Otherwise draws one uniform sample.
    pub fn predict<R: RandomSource + ?Sized>(
        &self,
        position: Vec2,
        velocity: Vec2,
        access_point: &AccessPoint,
        rng: &mut R,
    ) -> DwellPrediction {
        let closing_speed = Self::closing_speed(position, velocity, access_point.position());
        if closing_speed <= 0.0 {
            return DwellPrediction::none(closing_speed);
        }

        let distance = position.distance(access_point.position());
        let remaining = access_point.coverage_radius() - distance;
        if remaining <= 0.0 {
            return DwellPrediction::none(closing_speed);
        }

        let nominal = remaining / closing_speed;
        let bound = self.config.prediction_error_bound;
        let relative_error = rng.uniform(-bound, bound);
        let dwell_time = nominal * (1.0 + relative_error).max(MIN_ERROR_FACTOR);
        let significant_error = relative_error.abs() > self.config.significant_error_threshold;

        if significant_error {
            tracing::trace!(
                nominal,
                relative_error,
                access_point = %access_point.id(),
                "Significant dwell prediction error"
            );
        }

        DwellPrediction {
            closing_speed,
            nominal,
            relative_error,
            dwell_time,
            significant_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedSource, SeededSource};
    use crate::types::AccessPointId;

    fn ap_at(x: f64, y: f64) -> AccessPoint {
        AccessPoint::new(AccessPointId(0), Vec2::new(x, y), 10, 250.0).unwrap()
    }

    #[test]
    fn test_receding_client_has_zero_dwell() {
        let config = ImpairmentConfig::default();
        let predictor = DwellTimePredictor::new(&config);
        let mut rng = SeededSource::new(5);

        let p = predictor.predict(Vec2::new(100.0, 0.0), Vec2::new(10.0, 0.0), &ap_at(0.0, 0.0), &mut rng);
        assert_eq!(p.dwell_time, 0.0);
        assert!(p.closing_speed < 0.0);
    }

    #[test]
    fn test_stationary_client_has_zero_dwell() {
        let config = ImpairmentConfig::default();
        let predictor = DwellTimePredictor::new(&config);
        let mut rng = SeededSource::new(5);

        let p = predictor.predict(Vec2::new(100.0, 0.0), Vec2::ZERO, &ap_at(0.0, 0.0), &mut rng);
        assert_eq!(p.dwell_time, 0.0);
    }

    #[test]
    fn test_zero_distance_does_not_panic() {
        let config = ImpairmentConfig::default();
        let predictor = DwellTimePredictor::new(&config);
        let mut rng = SeededSource::new(5);

        let p = predictor.predict(Vec2::ZERO, Vec2::new(10.0, 5.0), &ap_at(0.0, 0.0), &mut rng);
        assert_eq!(p.closing_speed, 0.0);
        assert_eq!(p.dwell_time, 0.0);
    }

    #[test]
    fn test_approaching_client_nominal_prediction() {
        let config = ImpairmentConfig::default();
        let predictor = DwellTimePredictor::new(&config);
        // uniform 0.5 maps to zero relative error
        let mut stub = FixedSource::default();

        let p = predictor.predict(Vec2::new(150.0, 0.0), Vec2::new(-10.0, 0.0), &ap_at(0.0, 0.0), &mut stub);
        assert!((p.closing_speed - 10.0).abs() < 1e-6);
        assert!((p.nominal - 10.0).abs() < 1e-6);
        assert!((p.dwell_time - p.nominal).abs() < 1e-12);
        assert!(!p.significant_error);
    }

    #[test]
    fn test_prediction_error_is_bounded_and_flagged() {
        let config = ImpairmentConfig::default();
        let predictor = DwellTimePredictor::new(&config);
        // uniform 1.0 maps to the +bound edge
        let mut stub = FixedSource::new(0.0, 1.0);

        let p = predictor.predict(Vec2::new(150.0, 0.0), Vec2::new(-10.0, 0.0), &ap_at(0.0, 0.0), &mut stub);
        assert!((p.relative_error - 0.2).abs() < 1e-12);
        assert!((p.dwell_time - p.nominal * 1.2).abs() < 1e-9);
        assert!(p.significant_error);
    }

    #[test]
    fn test_outside_coverage_has_zero_dwell() {
        let config = ImpairmentConfig::default();
        let predictor = DwellTimePredictor::new(&config);
        let mut rng = SeededSource::new(5);

        let p = predictor.predict(Vec2::new(400.0, 0.0), Vec2::new(-10.0, 0.0), &ap_at(0.0, 0.0), &mut rng);
        assert_eq!(p.dwell_time, 0.0);
    }
}
