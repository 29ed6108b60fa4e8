//! Error types for the smdp crate

use thiserror::Error;

/// Main error type for the smdp crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("discount factor {value} is outside [0, 1]")]
    InvalidDiscountFactor { value: f64 },

    #[error("knownness threshold {value} must be at least 1")]
    InvalidKnownnessThreshold { value: u64 },

    #[error("reward bounds are inverted: rmin {rmin} exceeds rmax {rmax}")]
    InvalidRewardBounds { rmin: f64, rmax: f64 },

    #[error("horizon {horizon} must be a positive integer")]
    InvalidHorizon { horizon: usize },

    #[error("action duration {duration} must be a positive integer")]
    InvalidDuration { duration: u32 },

    #[error("timestep {timestep} is out of range (valid timesteps are integers in [0, {horizon}))")]
    TimestepOutOfRange { timestep: usize, horizon: usize },

    #[error("linear system could not be solved: {message}")]
    SingularSystem { message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write listener output: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
