//! Mobility: movement, placement and dwell time prediction.

mod dwell;
mod movement;

pub use dwell::{DwellPrediction, DwellTimePredictor, MIN_ERROR_FACTOR};
pub use movement::{advance, grid_layout, spawn_clients};
