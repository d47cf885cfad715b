//! # RSU Handover
//!
//! Mobility-driven handover simulation between vehicles and roadside units.
//!
//! Every (client, access point) pair gets a desirability score combining
//! impaired signal strength, access point load, predicted dwell time and a
//! composite penalty. A per-client state machine applies handover attempts
//! with capacity checks, cooldowns and stochastic failures, and a stepper
//! drives the whole network one discrete step at a time for an external
//! decision-maker.
//!
//! ## Architecture
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │             External policy (observation → action)              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                       SimulationStepper                         │
//! │     movement → reset → agent action → auto-connect → observe    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                    ConnectionStateMachine                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                        HandoverScorer                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      PenaltyAggregator                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐    ┌─────────────┐    ┌────────────────────┐   │
//! │  │ SignalModel │    │  LoadModel  │    │ DwellTimePredictor │   │
//! │  └─────────────┘    └─────────────┘    └────────────────────┘   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                 RandomSource (seeded, injectable)               │
//! └─────────────────────────────────────────────────────────────────┘

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow stylistic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]      // Many functions can't be const due to trait bounds
#![allow(clippy::doc_markdown)]              // ASCII diagrams in docs
#![allow(clippy::unreadable_literal)]        // Numeric literals are clear
#![allow(clippy::cast_possible_truncation)]  // Index sampling from unit floats
#![allow(clippy::cast_sign_loss)]            // Sampled indices are non-negative
#![allow(clippy::cast_precision_loss)]       // Acceptable for stats
#![allow(clippy::suboptimal_flops)]          // Clarity over micro-optimization
#![allow(clippy::similar_names)]             // state/stats are intentionally named
#![allow(clippy::option_if_let_else)]        // More readable in context
#![allow(clippy::use_self)]                  // Explicit type names in matches
#![allow(clippy::redundant_pub_crate)]       // Explicit visibility
#![allow(clippy::too_many_lines)]            // Complete implementations
#![allow(clippy::float_cmp)]                 // Exact comparisons against configured constants
#![allow(clippy::match_same_arms)]           // Explicit arm per variant is clearer
#![allow(clippy::return_self_not_must_use)]  // Builder methods don't need must_use
#![allow(clippy::unnecessary_map_or)]        // map_or(true, ..) reads clearer than is_none_or

pub mod config;
pub mod error;
pub mod handover;
pub mod metrics;
pub mod mobility;
pub mod radio;
pub mod random;
pub mod simulation;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default coverage radius of an access point (distance units)
pub const DEFAULT_COVERAGE_RADIUS: f64 = 250.0;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, ImpairmentConfig, NetworkConfig, ScoringWeights};
    pub use crate::error::{Error, Result};
    pub use crate::handover::{
        AttemptOutcome, ConnectionStateMachine, HandoverAttempt, HandoverScorer,
        PenaltyAggregator, RejectReason,
    };
    pub use crate::metrics::EpisodeMetrics;
    pub use crate::mobility::DwellTimePredictor;
    pub use crate::radio::{LoadModel, SignalModel};
    pub use crate::random::{FixedSource, RandomSource, SeededSource};
    pub use crate::simulation::{
        GreedySignalPolicy, HandoverPolicy, NoHandoverPolicy, Observation, RandomPolicy,
        SimulationStepper, StepOutcome,
    };
    pub use crate::types::*;
}
