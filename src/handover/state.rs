//! Per-client connection state machine.
//!
//! ```text
//!                 accepted attempt
//!  Disconnected ───────────────────▶ ConnectedTo(X)
//!       ▲                             │        ▲
//!       │ per-step release            │        │ accepted attempt, X≠Y
//!       └─────────────────────────────┘        │
//!                                   ConnectedTo(Y)
//! ```
//!
//! An attempt is accepted when the score is positive, the target has spare
//! capacity and the independent failure roll does not trigger. Anything else
//! leaves client and occupancy state untouched.

use serde::{Deserialize, Serialize};

use crate::config::ImpairmentConfig;
use crate::error::{Error, Result};
use crate::random::RandomSource;
use crate::types::{AccessPoint, AccessPointId, Client, ClientId, ConnectionState};

/// Reward of an attempt rejected on score or capacity grounds.
pub const REJECTED_REWARD: f64 = -1.0;

/// Reward of an attempt whose failure roll triggered.
pub const FAILED_REWARD: f64 = -2.0;

/// Why an attempt was rejected before the failure roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Score was zero, negative or not a number.
    NonPositiveScore,
    /// Target access point is full.
    NoCapacity,
    /// Client is already attached to the target.
    AlreadyAttached,
}

/// Result of one handover attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// Transition committed; `from` is the state it replaced.
    Accepted { from: ConnectionState },
    Rejected(RejectReason),
    /// Passed score and capacity checks but the failure roll triggered.
    Failed,
}

/// Transient record of one attempt, produced and consumed within a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandoverAttempt {
    pub client: ClientId,
    pub target: AccessPointId,
    pub score: f64,
    /// Target had spare capacity when the attempt was evaluated.
    pub has_capacity: bool,
    /// Failure roll was drawn and triggered.
    pub failure_triggered: bool,
    pub outcome: AttemptOutcome,
}

impl HandoverAttempt {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Accepted { .. })
    }

    /// Score on acceptance, -1 on rejection, -2 on stochastic failure.
    pub fn reward(&self) -> f64 {
        match self.outcome {
            AttemptOutcome::Accepted { .. } => self.score,
            AttemptOutcome::Rejected(_) => REJECTED_REWARD,
            AttemptOutcome::Failed => FAILED_REWARD,
        }
    }
}

/// Attempt counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionStats {
    pub attempts: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub failures: u64,
}

/// Applies the documented transition rules to clients and access points.
#[derive(Debug, Clone)]
pub struct ConnectionStateMachine {
    failure_rate: f64,
    stats: TransitionStats,
}

impl ConnectionStateMachine {
    pub fn new(failure_rate: f64) -> Self {
        Self {
            failure_rate,
            stats: TransitionStats::default(),
        }
    }

    pub fn from_config(config: &ImpairmentConfig) -> Self {
        Self::new(config.failure_rate)
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    pub fn stats(&self) -> &TransitionStats {
        &self.stats
    }

    /// Number of attempts whose failure roll triggered.
    pub fn failures(&self) -> u64 {
        self.stats.failures
    }

    pub fn reset_stats(&mut self) {
        self.stats = TransitionStats::default();
    }

    /// Attempt to hand `client` over to `target`.
    ///
    /// Draws one uniform sample only when the score and capacity checks pass.
    /// Errors only for a target outside `access_points`.
    pub fn attempt<R: RandomSource + ?Sized>(
        &mut self,
        client: &mut Client,
        access_points: &mut [AccessPoint],
        target: AccessPointId,
        score: f64,
        now: f64,
        rng: &mut R,
    ) -> Result<HandoverAttempt> {
        let has_capacity = access_points
            .get(target.index())
            .ok_or(Error::UnknownAccessPoint(target))?
            .has_capacity();
        let from = client.connection();

        let mut attempt = HandoverAttempt {
            client: client.id(),
            target,
            score,
            has_capacity,
            failure_triggered: false,
            outcome: AttemptOutcome::Failed,
        };
        self.stats.attempts += 1;

        let rejection = if from == ConnectionState::ConnectedTo(target) {
            Some(RejectReason::AlreadyAttached)
        } else if score.is_nan() || score <= 0.0 {
            Some(RejectReason::NonPositiveScore)
        } else if !has_capacity {
            Some(RejectReason::NoCapacity)
        } else {
            None
        };

        if let Some(reason) = rejection {
            self.stats.rejected += 1;
            attempt.outcome = AttemptOutcome::Rejected(reason);
            tracing::debug!(
                client = %client.id(),
                access_point = %target,
                score,
                reason = ?reason,
                "Handover rejected"
            );
            return Ok(attempt);
        }

        if rng.chance(self.failure_rate) {
            self.stats.failures += 1;
            attempt.failure_triggered = true;
            attempt.outcome = AttemptOutcome::Failed;
            tracing::debug!(
                client = %client.id(),
                access_point = %target,
                score,
                "Handover failed"
            );
            return Ok(attempt);
        }

        if let ConnectionState::ConnectedTo(previous) = from {
            if let Some(ap) = access_points.get_mut(previous.index()) {
                ap.release();
            }
        }
        // Capacity was checked above and nothing admitted since.
        let admitted = access_points[target.index()].admit();
        debug_assert!(admitted);

        client.set_connection(ConnectionState::ConnectedTo(target));
        client.record_handover(now);
        self.stats.accepted += 1;
        attempt.outcome = AttemptOutcome::Accepted { from };

        tracing::debug!(
            client = %client.id(),
            from = %from,
            access_point = %target,
            score,
            "Handover accepted"
        );

        Ok(attempt)
    }

    /// Drop the client's connection, releasing its access point.
    ///
    /// Cooldown timestamps are kept. Returns the state that was released.
    pub fn release(&self, client: &mut Client, access_points: &mut [AccessPoint]) -> ConnectionState {
        let previous = client.connection();
        if let ConnectionState::ConnectedTo(id) = previous {
            if let Some(ap) = access_points.get_mut(id.index()) {
                ap.release();
            }
            client.set_connection(ConnectionState::Disconnected);
        }
        previous
    }
}

impl Default for ConnectionStateMachine {
    fn default() -> Self {
        Self::from_config(&ImpairmentConfig::default())
    }
}
