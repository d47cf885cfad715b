//! Handover decision pipeline.
//!
//! - Composite penalty aggregation
//! - Weighted linear scoring
//! - Connection state transitions with capacity checks and failure rolls

mod penalty;
mod scorer;
mod state;

pub use penalty::{
    cooldown_penalty, PenaltyAggregator, PenaltyBreakdown, PenaltyInputs,
    FAILURE_RISK_MULTIPLIER, PROCESSING_DELAY_PENALTY_PER_SECOND,
};
pub use scorer::{HandoverScorer, ScoreBreakdown, ScoreInputs};
pub use state::{
    AttemptOutcome, ConnectionStateMachine, HandoverAttempt, RejectReason, TransitionStats,
    FAILED_REWARD, REJECTED_REWARD,
};
