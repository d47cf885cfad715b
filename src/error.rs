//! Error types for the handover core.

use std::io;

use thiserror::Error;

use crate::types::{AccessPointId, ClientId};

/// Result type alias for handover operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type.
///
/// Only malformed configuration and malformed input reach this type.
/// Degraded radio conditions, full access points and rejected handovers
/// are ordinary numeric outcomes.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Input errors
    #[error("invalid action {action}: expected 0..{num_access_points} or the no-handover sentinel {num_access_points}")]
    InvalidAction {
        action: usize,
        num_access_points: usize,
    },

    #[error("client {0} not found")]
    UnknownClient(ClientId),

    #[error("access point {0} not found")]
    UnknownAccessPoint(AccessPointId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Lifecycle errors
    #[error("episode finished after {steps} steps; reset before stepping again")]
    EpisodeFinished { steps: u64 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Check if error was caused by configuration (file or values).
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidConfig(_))
    }

    /// Check if error was caused by a malformed per-call input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidAction { .. }
                | Error::UnknownClient(_)
                | Error::UnknownAccessPoint(_)
                | Error::InvalidInput(_)
        )
    }
}
