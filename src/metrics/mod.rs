//! Episode statistics.
//!
//! Accumulates the per-step information returned by the stepper into the
//! figures used to compare handover policies:
//! - Total reward
//! - Handover attempts, successes, rejections and stochastic failures
//! - Mean connectivity ratio
//! - Significant dwell prediction errors

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handover::AttemptOutcome;
use crate::simulation::StepInfo;

/// Statistics of one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    /// Steps recorded.
    pub steps: u64,
    /// Sum of per-step rewards.
    pub total_reward: f64,
    /// Agent handover attempts (no-op steps excluded).
    pub attempts: u64,
    /// Attempts with a positive reward.
    pub successes: u64,
    /// Attempts rejected on score, capacity or re-attach grounds.
    pub rejected: u64,
    /// Attempts whose failure roll triggered.
    pub failures: u64,
    /// Sum over steps of connected clients / clients.
    pub connectivity_sum: f64,
    /// Dwell predictions whose error exceeded the significance threshold.
    pub significant_prediction_errors: u64,
    /// Non-agent clients attached by auto-connection, summed over steps.
    pub auto_connections: u64,
}

impl EpisodeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one step into the statistics.
    pub fn record_step(&mut self, reward: f64, info: &StepInfo) {
        self.steps += 1;
        self.total_reward += reward;

        if let Some(attempt) = &info.attempt {
            self.attempts += 1;
            if reward > 0.0 {
                self.successes += 1;
            }
            match attempt.outcome {
                AttemptOutcome::Rejected(_) => self.rejected += 1,
                AttemptOutcome::Failed => self.failures += 1,
                AttemptOutcome::Accepted { .. } => {}
            }
        }

        if info.total_clients > 0 {
            self.connectivity_sum += info.connected_clients as f64 / info.total_clients as f64;
        }
        self.significant_prediction_errors += info.significant_prediction_errors;
        self.auto_connections += info.auto_connections;
    }

    /// Successful attempts / attempts; 0 when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    /// Mean fraction of connected clients per step.
    pub fn connectivity_ratio(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.connectivity_sum / self.steps as f64
        }
    }

    /// Mean reward per step.
    pub fn mean_reward(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.total_reward / self.steps as f64
        }
    }

    /// One-line human-readable summary.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EpisodeMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps={} reward={:.2} handovers={}/{} ({:.1}% success) rejected={} failures={} connectivity={:.1}%",
            self.steps,
            self.total_reward,
            self.successes,
            self.attempts,
            self.success_rate() * 100.0,
            self.rejected,
            self.failures,
            self.connectivity_ratio() * 100.0,
        )
    }
}
