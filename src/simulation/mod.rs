//! Step-synchronous handover simulation.
//!
//! - [`SimulationStepper`]: owns client and access point state, runs steps
//! - [`ObservationLayout`]: the fixed observation vector contract
//! - Baseline [`HandoverPolicy`] implementations and their evaluation

mod observation;
mod policy;
mod stepper;

pub use observation::{
    ClientReading, Observation, ObservationLayout, ACCESS_POINT_FIELDS, CLIENT_FIELDS,
};
pub use policy::{
    compare_policies, evaluate_policy, run_episode, GreedySignalPolicy, HandoverPolicy,
    NoHandoverPolicy, PolicyContext, PolicyReport, RandomPolicy, DEFAULT_GREEDY_THRESHOLD,
};
pub use stepper::{PairEvaluation, SimulationStepper, StepInfo, StepOutcome};
