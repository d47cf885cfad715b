//! Radio and capacity models.
//!
//! Both models are read-only: they borrow the run's
//! [`ImpairmentConfig`](crate::config::ImpairmentConfig) and never mutate
//! client or access point state.

mod load;
mod signal;

pub use load::{load_factor, LoadAssessment, LoadModel};
pub use signal::{base_signal, SignalModel, SignalReport, MAX_SIGNAL, MIN_FADING_FACTOR};
