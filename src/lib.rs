//! # Blind source separation
//!
//! `unmix` separates multi-channel sample mixtures, as captured from a
//! multi-antenna receiver, into statistically distinct source signals. It is
//! meant as the numeric core of a forensic unmixing pipeline: the surrounding
//! application feeds it raw sample arrays and consumes structured numeric
//! output, while the engine itself performs no I/O and keeps no state between
//! calls.
//!
//! Two engines are provided:
//!
//! - [`fast_ica`]: deflationary fixed-point Independent Component Analysis
//!   with the logcosh contrast function. Input data is whitened (remove
//!   underlying correlation) before the iteration, see [`whiten`].
//! - [`nmf`]: Non-negative Matrix Factorization by multiplicative updates,
//!   operating on a single entrywise non-negative matrix.
//!
//! Both engines take their hyperparameters through a checked builder (see
//! [`ParamGuard`]) and report the outcome of the iteration as an explicit
//! [`ConvergenceStatus`] instead of a bare iteration count.

#[macro_use]
extern crate ndarray;

pub mod data;
pub mod error;
pub mod fast_ica;
pub mod linalg;
pub mod nmf;
mod param_guard;
pub mod whiten;

pub use data::{NonNegativeMatrix, SignalMixture};
pub use error::{Result, UnmixError};
pub use param_guard::ParamGuard;

use ndarray::ScalarOperand;
use num_traits::{FromPrimitive, NumCast};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumptions on floating
/// point numbers and implements them for 32bit and 64bit floating points.
pub trait Float:
    num_traits::Float
    + FromPrimitive
    + Sum
    + ScalarOperand
    + approx::AbsDiffEq
    + fmt::Display
    + fmt::Debug
    + Default
    + Send
    + Sync
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}
impl Float for f64 {}

/// Outcome of an iterative optimization run.
///
/// Reaching the iteration cap is reported distinctly from meeting the
/// tolerance; a capped run still carries a usable best-effort result.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConvergenceStatus {
    /// The tolerance was met after the given number of iterations.
    Converged { iterations: usize },
    /// The iteration cap was exhausted before the tolerance was met.
    MaxIterationsReached { iterations: usize },
}

impl ConvergenceStatus {
    /// Number of iterations actually run.
    pub fn iterations(&self) -> usize {
        match *self {
            ConvergenceStatus::Converged { iterations }
            | ConvergenceStatus::MaxIterationsReached { iterations } => iterations,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, ConvergenceStatus::Converged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<ConvergenceStatus>();
        has_autotraits::<UnmixError>();
    }

    #[test]
    fn status_reports_iterations() {
        let converged = ConvergenceStatus::Converged { iterations: 12 };
        let capped = ConvergenceStatus::MaxIterationsReached { iterations: 200 };

        assert!(converged.is_converged());
        assert_eq!(converged.iterations(), 12);
        assert!(!capped.is_converged());
        assert_eq!(capped.iterations(), 200);
    }
}
