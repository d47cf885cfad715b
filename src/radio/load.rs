//! Access point load model.

use serde::{Deserialize, Serialize};

use crate::config::ImpairmentConfig;
use crate::types::AccessPoint;

/// Attractiveness of an access point given its load ratio.
///
/// `1 / (ratio + epsilon)`: finite at zero occupancy (≈ `1/epsilon`) and
/// strictly decreasing in the ratio.
pub fn load_factor(ratio: f64, epsilon: f64) -> f64 {
    1.0 / (ratio + epsilon)
}

/// Load figures for one access point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadAssessment {
    pub occupancy: u32,
    pub capacity: u32,
    /// Occupancy over capacity.
    pub ratio: f64,
    pub load_factor: f64,
    pub congestion_penalty: f64,
    pub overload_penalty: f64,
}

impl LoadAssessment {
    pub fn is_congested(&self) -> bool {
        self.congestion_penalty > 0.0
    }

    pub fn is_overloaded(&self) -> bool {
        self.overload_penalty > 0.0
    }
}

/// Computes load factor and the congestion/overload penalty regimes.
#[derive(Debug, Clone, Copy)]
pub struct LoadModel<'a> {
    config: &'a ImpairmentConfig,
}

impl<'a> LoadModel<'a> {
    pub fn new(config: &'a ImpairmentConfig) -> Self {
        Self { config }
    }

    /// Penalty for a load ratio strictly above the congestion threshold.
    pub fn congestion_penalty(&self, ratio: f64) -> f64 {
        if ratio > self.config.congestion_threshold {
            (ratio - self.config.congestion_threshold) * self.config.congestion_multiplier
        } else {
            0.0
        }
    }

    /// Penalty for an absolute occupancy strictly above the overload threshold.
    pub fn overload_penalty(&self, occupancy: u32) -> f64 {
        if occupancy > self.config.overload_threshold {
            f64::from(occupancy - self.config.overload_threshold) * self.config.overload_multiplier
        } else {
            0.0
        }
    }

    /// Assess an occupancy/capacity pair. Zero capacity counts as fully loaded.
    pub fn assess(&self, occupancy: u32, capacity: u32) -> LoadAssessment {
        let ratio = if capacity == 0 {
            1.0
        } else {
            f64::from(occupancy) / f64::from(capacity)
        };

        LoadAssessment {
            occupancy,
            capacity,
            ratio,
            load_factor: load_factor(ratio, self.config.load_epsilon),
            congestion_penalty: self.congestion_penalty(ratio),
            overload_penalty: self.overload_penalty(occupancy),
        }
    }

    /// Assess an access point at its current occupancy.
    pub fn assess_access_point(&self, access_point: &AccessPoint) -> LoadAssessment {
        self.assess(access_point.occupancy(), access_point.capacity())
    }
}
