use crate::error::UnmixError;
use crate::param_guard::ParamGuard;
use crate::whiten::WhiteningMethod;
use crate::Float;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Deflationary Fast Independent Component Analysis (ICA)
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FastIcaValidParams<F: Float> {
    ncomponents: Option<usize>,
    whitening: WhiteningMethod,
    max_iter: usize,
    tol: F,
    random_state: Option<u64>,
}

impl<F: Float> FastIcaValidParams<F> {
    pub fn ncomponents(&self) -> &Option<usize> {
        &self.ncomponents
    }

    pub fn whitening(&self) -> WhiteningMethod {
        self.whitening
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
pub struct FastIcaParams<F: Float>(FastIcaValidParams<F>);

impl<F: Float> Default for FastIcaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> FastIcaParams<F> {
    /// Create new FastICA parameters with default values: every channel kept
    /// as a component, diagonal whitening, at most 200 iterations and a
    /// convergence tolerance of `1e-6`.
    pub fn new() -> Self {
        Self(FastIcaValidParams {
            ncomponents: None,
            whitening: WhiteningMethod::default(),
            max_iter: 200,
            tol: F::cast(1e-6),
            random_state: None,
        })
    }

    /// Set the number of components to extract, if not set one per channel is
    /// extracted
    pub fn ncomponents(mut self, ncomponents: usize) -> Self {
        self.0.ncomponents = Some(ncomponents);
        self
    }

    /// Set the whitening strategy applied before the fixed-point iteration
    pub fn whitening(mut self, whitening: WhiteningMethod) -> Self {
        self.0.whitening = whitening;
        self
    }

    /// Set the maximum number of outer iterations
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.0.max_iter = max_iter;
        self
    }

    /// Set tolerance on the weight update at each iteration
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

impl<F: Float> ParamGuard for FastIcaParams<F> {
    type Checked = FastIcaValidParams<F>;
    type Error = UnmixError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.tol <= F::zero() {
            Err(UnmixError::InvalidTolerance(
                self.0.tol.to_f32().unwrap_or(0.0),
            ))
        } else if self.0.max_iter == 0 {
            Err(UnmixError::InvalidValue(
                "max_iter must be at least 1".to_string(),
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
