//! Composite handover penalty.

use serde::{Deserialize, Serialize};

use crate::config::ImpairmentConfig;
use crate::radio::LoadAssessment;

/// Penalty per second of handover processing delay.
pub const PROCESSING_DELAY_PENALTY_PER_SECOND: f64 = 0.1;

/// Multiplier turning the failure rate into an expected-cost term.
pub const FAILURE_RISK_MULTIPLIER: f64 = 10.0;

/// Linearly decaying cooldown penalty.
///
/// `scale * (1 - elapsed / cooldown)` while `elapsed < cooldown`, exactly 0
/// from the boundary on and for clients that never handed over.
pub fn cooldown_penalty(elapsed: Option<f64>, cooldown: f64, scale: f64) -> f64 {
    match elapsed {
        Some(elapsed) if cooldown > 0.0 && elapsed < cooldown => {
            scale * (1.0 - elapsed.max(0.0) / cooldown)
        }
        _ => 0.0,
    }
}

/// State the penalty depends on for one (client, access point) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyInputs {
    /// The client holds a working connection it would give up.
    pub connected: bool,
    /// Load of the candidate access point.
    pub load: LoadAssessment,
    /// Seconds since the client's last handover, if any.
    pub elapsed_since_handover: Option<f64>,
}

/// Individual penalty terms; [`PenaltyBreakdown::total`] is their sum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    pub connection: f64,
    pub congestion: f64,
    pub overload: f64,
    pub processing_delay: f64,
    pub cooldown: f64,
    pub failure_risk: f64,
    pub channel_degradation: f64,
}

impl PenaltyBreakdown {
    pub fn total(&self) -> f64 {
        self.connection
            + self.congestion
            + self.overload
            + self.processing_delay
            + self.cooldown
            + self.failure_risk
            + self.channel_degradation
    }
}

/// Combines connection, load, delay, cooldown, risk and channel penalties.
#[derive(Debug, Clone, Copy)]
pub struct PenaltyAggregator<'a> {
    config: &'a ImpairmentConfig,
}

impl<'a> PenaltyAggregator<'a> {
    pub fn new(config: &'a ImpairmentConfig) -> Self {
        Self { config }
    }

    /// Fixed cost applied to every handover attempt.
    pub fn processing_delay_penalty(&self) -> f64 {
        self.config.processing_delay_seconds * PROCESSING_DELAY_PENALTY_PER_SECOND
    }

    /// A-priori expected cost of the stochastic failure check.
    pub fn failure_risk_penalty(&self) -> f64 {
        self.config.failure_rate * FAILURE_RISK_MULTIPLIER
    }

    /// Zero at perfect channel quality, proportional to the deficit below it.
    pub fn channel_degradation_penalty(&self) -> f64 {
        (1.0 - self.config.channel_quality).max(0.0) * self.config.channel_degradation_multiplier
    }

    pub fn cooldown_penalty(&self, elapsed: Option<f64>) -> f64 {
        cooldown_penalty(
            elapsed,
            self.config.cooldown_seconds,
            self.config.cooldown_penalty_scale,
        )
    }

    pub fn aggregate(&self, inputs: &PenaltyInputs) -> PenaltyBreakdown {
        PenaltyBreakdown {
            connection: if inputs.connected {
                self.config.connected_penalty
            } else {
                0.0
            },
            congestion: inputs.load.congestion_penalty,
            overload: inputs.load.overload_penalty,
            processing_delay: self.processing_delay_penalty(),
            cooldown: self.cooldown_penalty(inputs.elapsed_since_handover),
            failure_risk: self.failure_risk_penalty(),
            channel_degradation: self.channel_degradation_penalty(),
        }
    }
}
