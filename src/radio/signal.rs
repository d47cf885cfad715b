//! Signal strength model.
//!
//! A linear falloff from [`MAX_SIGNAL`] at the access point to zero at the
//! coverage edge, followed by five multiplicative impairments applied in a
//! fixed order: interference, fading, shadowing, weather, channel quality.

use serde::{Deserialize, Serialize};

use crate::config::ImpairmentConfig;
use crate::random::RandomSource;
use crate::types::{AccessPoint, Vec2};

/// Signal strength at zero distance.
pub const MAX_SIGNAL: f64 = 100.0;

/// Floor of the fading multiplier; fading alone never erases the signal.
pub const MIN_FADING_FACTOR: f64 = 0.1;

/// Signal before impairments.
///
/// `MAX_SIGNAL * (1 - distance / radius)` inside coverage, exactly 0 at and
/// beyond the radius.
pub fn base_signal(distance: f64, radius: f64) -> f64 {
    if distance <= radius && radius > 0.0 {
        (MAX_SIGNAL * (1.0 - distance / radius)).max(0.0)
    } else {
        0.0
    }
}

/// Breakdown of one signal measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    /// Client to access point distance.
    pub distance: f64,
    /// Signal before impairments.
    pub base: f64,
    /// Interfering clients counted (after the cap).
    pub interferers: usize,
    pub interference_multiplier: f64,
    pub fading_multiplier: f64,
    pub shadowing_multiplier: f64,
    pub weather_multiplier: f64,
    pub channel_multiplier: f64,
    /// Final non-negative signal strength.
    pub signal: f64,
}

impl SignalReport {
    /// Whether the client is inside the coverage radius.
    pub fn in_coverage(&self) -> bool {
        self.base > 0.0
    }
}

/// Computes raw and impaired signal strength between a client and an
/// access point.
#[derive(Debug, Clone, Copy)]
pub struct SignalModel<'a> {
    config: &'a ImpairmentConfig,
}

impl<'a> SignalModel<'a> {
    pub fn new(config: &'a ImpairmentConfig) -> Self {
        Self { config }
    }

    /// Count clients within the interference radius of `access_point`,
    /// capped at the configured maximum.
    pub fn interfering_neighbors(&self, access_point: Vec2, others: &[Vec2]) -> usize {
        others
            .iter()
            .filter(|p| p.distance(access_point) <= self.config.interference_radius)
            .count()
            .min(self.config.max_interfering_neighbors)
    }

    /// Measure the signal from `access_point` at `client`.
    ///
    /// `others` are the positions of every other client. Draws one normal
    /// (fading) and one uniform (shadowing) sample, in that order, on every
    /// call regardless of coverage so the stream advances identically.
    pub fn measure<R: RandomSource + ?Sized>(
        &self,
        client: Vec2,
        access_point: &AccessPoint,
        others: &[Vec2],
        rng: &mut R,
    ) -> SignalReport {
        let distance = client.distance(access_point.position());
        let base = base_signal(distance, access_point.coverage_radius());

        let interferers = self.interfering_neighbors(access_point.position(), others);
        let interference_multiplier =
            (1.0 - interferers as f64 * self.config.interference_factor).max(0.0);

        let fading_multiplier =
            (1.0 + rng.normal(0.0, self.config.fading_std_dev)).max(MIN_FADING_FACTOR);
        let shadowing_multiplier = 1.0 - self.config.shadowing_magnitude * rng.unit_uniform();
        let weather_multiplier = 1.0 - self.config.weather_impact;
        let channel_multiplier = self.config.channel_quality;

        let signal = (base
            * interference_multiplier
            * fading_multiplier
            * shadowing_multiplier
            * weather_multiplier
            * channel_multiplier)
            .max(0.0);

        SignalReport {
            distance,
            base,
            interferers,
            interference_multiplier,
            fading_multiplier,
            shadowing_multiplier,
            weather_multiplier,
            channel_multiplier,
            signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{FixedSource, SeededSource};
    use crate::types::AccessPointId;

    fn ap_at_origin() -> AccessPoint {
        AccessPoint::new(AccessPointId(0), Vec2::ZERO, 10, 250.0).unwrap()
    }

    #[test]
    fn test_base_signal_endpoints() {
        assert_eq!(base_signal(0.0, 250.0), 100.0);
        assert_eq!(base_signal(125.0, 250.0), 50.0);
        assert_eq!(base_signal(250.0, 250.0), 0.0);
        assert_eq!(base_signal(250.1, 250.0), 0.0);
        assert_eq!(base_signal(1e9, 250.0), 0.0);
    }

    #[test]
    fn test_unimpaired_measurement_equals_base() {
        let config = ImpairmentConfig::unimpaired();
        let model = SignalModel::new(&config);
        let mut rng = SeededSource::new(3);

        let report = model.measure(Vec2::new(50.0, 0.0), &ap_at_origin(), &[], &mut rng);
        assert!((report.signal - 80.0).abs() < 1e-12);
        assert_eq!(report.interferers, 0);
    }

    #[test]
    fn test_interference_is_capped() {
        let config = ImpairmentConfig::default();
        let model = SignalModel::new(&config);

        let crowd: Vec<Vec2> = (0..10).map(|i| Vec2::new(f64::from(i), 0.0)).collect();
        assert_eq!(model.interfering_neighbors(Vec2::ZERO, &crowd), 3);

        let far = [Vec2::new(150.0, 0.0), Vec2::new(0.0, 101.0)];
        assert_eq!(model.interfering_neighbors(Vec2::ZERO, &far), 0);
    }

    #[test]
    fn test_impairments_apply_in_sequence() {
        let config = ImpairmentConfig {
            interference_factor: 0.15,
            fading_std_dev: 0.2,
            shadowing_magnitude: 0.2,
            weather_impact: 0.1,
            channel_quality: 0.8,
            ..ImpairmentConfig::default()
        };
        let model = SignalModel::new(&config);
        // normal draw 1.0 -> fading 1.2, uniform draw 0.5 -> shadowing 0.9
        let mut stub = FixedSource::new(1.0, 0.5);
        let others = [Vec2::new(10.0, 0.0)];

        let report = model.measure(Vec2::ZERO, &ap_at_origin(), &others, &mut stub);
        let expected = 100.0 * 0.85 * 1.2 * 0.9 * 0.9 * 0.8;
        assert!((report.signal - expected).abs() < 1e-9);
        assert!((report.fading_multiplier - 1.2).abs() < 1e-12);
        assert!((report.shadowing_multiplier - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_fading_floor() {
        let config = ImpairmentConfig {
            fading_std_dev: 1.0,
            ..ImpairmentConfig::unimpaired()
        };
        let model = SignalModel::new(&config);
        let mut stub = FixedSource::new(-5.0, 0.0);

        let report = model.measure(Vec2::ZERO, &ap_at_origin(), &[], &mut stub);
        assert_eq!(report.fading_multiplier, MIN_FADING_FACTOR);
        assert!((report.signal - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_signal_never_negative() {
        let config = ImpairmentConfig {
            interference_factor: 1.0,
            ..ImpairmentConfig::default()
        };
        let model = SignalModel::new(&config);
        let mut rng = SeededSource::new(11);
        let others = [Vec2::ZERO; 3];

        for _ in 0..200 {
            let report = model.measure(Vec2::new(10.0, 0.0), &ap_at_origin(), &others, &mut rng);
            assert!(report.signal >= 0.0);
        }
    }

    #[test]
    fn test_out_of_coverage_is_zero_regardless_of_impairments() {
        let config = ImpairmentConfig {
            fading_std_dev: 2.0,
            ..ImpairmentConfig::default()
        };
        let model = SignalModel::new(&config);
        let mut stub = FixedSource::new(3.0, 0.0);

        let report = model.measure(Vec2::new(250.0, 0.0), &ap_at_origin(), &[], &mut stub);
        assert_eq!(report.signal, 0.0);
        assert!(!report.in_coverage());
    }
}
