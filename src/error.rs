//! Error types for the separation engines
//!
//! Input validation fails before any iteration starts; numerical issues
//! inside the loops are guarded with epsilon terms and only surface as
//! [`UnmixError::NonFinite`] when a guard was not enough. Hitting the
//! iteration cap is *not* an error, it is reported through
//! [`crate::ConvergenceStatus`].

use ndarray::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, UnmixError>;

/// An error when separating or factorizing a mixture
#[derive(Error, Debug)]
pub enum UnmixError {
    /// When the input contains no channels or no samples
    #[error("input must contain at least one channel with at least one sample")]
    NotEnoughSamples,
    /// When the channels of a mixture do not share a common length
    #[error("channel {index} has {got} samples but expected {expected}")]
    ChannelLengthMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
    /// When any of the hyperparameters are set the wrong value
    #[error("invalid value encountered: {0}")]
    InvalidValue(String),
    #[error("tolerance should be positive but is {0}")]
    InvalidTolerance(f32),
    /// When a matrix handed to NMF carries a negative entry
    #[error("negative entry {value} at ({row}, {col}), input must be non-negative")]
    NegativeEntry { row: usize, col: usize, value: f64 },
    /// When a vector vanishes during orthogonalization
    #[error("row {0} vanished during orthogonalization, matrix is rank deficient")]
    RankDeficient(usize),
    /// When NaN or infinity escaped the epsilon guards of an iteration
    #[error("non-finite values produced during {0}")]
    NonFinite(&'static str),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
}
