use crate::error::UnmixError;
use crate::param_guard::ParamGuard;
use crate::Float;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Non-negative Matrix Factorization (NMF) by multiplicative updates
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NmfValidParams<F: Float> {
    ncomponents: usize,
    max_iter: usize,
    tol: F,
    random_state: Option<u64>,
}

impl<F: Float> NmfValidParams<F> {
    pub fn ncomponents(&self) -> usize {
        self.ncomponents
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn tol(&self) -> F {
        self.tol
    }

    pub fn random_state(&self) -> &Option<u64> {
        &self.random_state
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NmfParams<F: Float>(NmfValidParams<F>);

impl<F: Float> NmfParams<F> {
    /// Create new NMF parameters for the given factorization rank, with at
    /// most 200 iterations and a relative residual-improvement tolerance of
    /// `1e-4`.
    pub fn new(ncomponents: usize) -> Self {
        Self(NmfValidParams {
            ncomponents,
            max_iter: 200,
            tol: F::cast(1e-4),
            random_state: None,
        })
    }

    /// Set the iteration budget
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set the early-stopping tolerance on the relative improvement of the
    /// Frobenius reconstruction error
    pub fn tol(mut self, tol: F) -> Self {
        self.0.tol = tol;
        self
    }

    /// Set seed for the random number generator for reproducible results.
    pub fn random_state(mut self, random_state: u64) -> Self {
        self.0.random_state = Some(random_state);
        self
    }
}

impl<F: Float> ParamGuard for NmfParams<F> {
    type Checked = NmfValidParams<F>;
    type Error = UnmixError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.ncomponents == 0 {
            Err(UnmixError::InvalidValue(
                "ncomponents must be at least 1".to_string(),
            ))
        } else if self.0.max_iter == 0 {
            Err(UnmixError::InvalidValue(
                "max_iter must be at least 1".to_string(),
            ))
        } else if self.0.tol <= F::zero() {
            Err(UnmixError::InvalidTolerance(
                self.0.tol.to_f32().unwrap_or(0.0),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
