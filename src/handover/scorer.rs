//! Weighted linear handover score.

use serde::{Deserialize, Serialize};

use crate::config::ScoringWeights;

/// Model outputs feeding one score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub signal: f64,
    pub load_factor: f64,
    pub dwell_time: f64,
    pub penalty: f64,
}

/// Weighted terms of a score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub signal_term: f64,
    pub load_term: f64,
    pub dwell_term: f64,
    /// Subtracted from the other terms.
    pub penalty_term: f64,
    pub score: f64,
}

/// `α1*signal + α2*load_factor + α3*dwell_time - α4*penalty`.
///
/// Pure: no state beyond the weights it was built with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandoverScorer {
    weights: ScoringWeights,
}

impl HandoverScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn breakdown(&self, inputs: &ScoreInputs) -> ScoreBreakdown {
        let signal_term = self.weights.signal * inputs.signal;
        let load_term = self.weights.load * inputs.load_factor;
        let dwell_term = self.weights.dwell * inputs.dwell_time;
        let penalty_term = self.weights.penalty * inputs.penalty;

        ScoreBreakdown {
            signal_term,
            load_term,
            dwell_term,
            penalty_term,
            score: signal_term + load_term + dwell_term - penalty_term,
        }
    }

    pub fn score(&self, inputs: &ScoreInputs) -> f64 {
        self.breakdown(inputs).score
    }
}

impl Default for HandoverScorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}
