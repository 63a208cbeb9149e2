//! Deflationary FastICA for separating multi-channel mixtures

use ndarray::{Array, Array1, Array2};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::data::SignalMixture;
use crate::error::{Result, UnmixError};
use crate::linalg::{orthonormalize_rows, pseudo_inverse};
use crate::param_guard::ParamGuard;
use crate::whiten::{whiten, WhiteningTransform};
use crate::{ConvergenceStatus, Float};

mod hyperparams;

pub use hyperparams::{FastIcaParams, FastIcaValidParams};

/// Guard added to vector norms before division, so a vanishing weight vector
/// cannot produce a division by zero.
const NORM_EPS: f64 = 1e-12;

/// Separated sources together with the matrices that produced them.
///
/// The unmixing matrix and the sources live in the whitened domain; the
/// stored [`WhiteningTransform`] maps raw channels into that domain.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct BssResult<F> {
    sources: Array2<F>,
    unmixing: Array2<F>,
    mixing: Array2<F>,
    whitening: WhiteningTransform<F>,
    status: ConvergenceStatus,
}

impl<F: Float> BssResult<F> {
    /// Separated sources, one row per component.
    pub fn sources(&self) -> &Array2<F> {
        &self.sources
    }

    /// The components × channels unmixing matrix; rows are unit-norm and
    /// mutually orthogonal by deflation.
    pub fn unmixing(&self) -> &Array2<F> {
        &self.unmixing
    }

    /// Best-effort inverse of the unmixing matrix: `mixing() · sources()`
    /// reconstructs the whitened mixture.
    pub fn mixing(&self) -> &Array2<F> {
        &self.mixing
    }

    /// The whitening transform applied before the iteration.
    pub fn whitening(&self) -> &WhiteningTransform<F> {
        &self.whitening
    }

    pub fn status(&self) -> ConvergenceStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.status.iterations()
    }
}

impl<F: Float> FastIcaParams<F> {
    /// Checks the hyperparameters, then runs the separation.
    pub fn separate(&self, mixture: &SignalMixture<F>) -> Result<BssResult<F>> {
        self.check_ref()?.separate(mixture)
    }
}

impl<F: Float> FastIcaValidParams<F> {
    /// Separates `mixture` into independent components with the deflationary
    /// fixed-point iteration and logcosh contrast function.
    ///
    /// # Errors
    ///
    /// Fails with [`UnmixError::InvalidValue`] before any iteration runs when
    /// more components are requested than channels are available, and with
    /// [`UnmixError::NonFinite`] when the iteration degenerates numerically.
    pub fn separate(&self, mixture: &SignalMixture<F>) -> Result<BssResult<F>> {
        let nchannels = mixture.nchannels();
        let nsamples = mixture.nsamples();

        // If the number of components is not set, we extract one per channel
        let ncomponents = self.ncomponents().unwrap_or(nchannels);
        if ncomponents == 0 || ncomponents > nchannels {
            return Err(UnmixError::InvalidValue(format!(
                "ncomponents must lie in 1..={}, got {}",
                nchannels, ncomponents
            )));
        }

        let (xw, whitening) = whiten(mixture, self.whitening())?;

        // We initialize the weight vectors from a uniform distribution and
        // orthonormalize them, so deflation starts from a valid basis
        let w_init: Array2<f64> = if let Some(seed) = self.random_state() {
            let mut rng = Xoshiro256Plus::seed_from_u64(*seed);
            Array::random_using((ncomponents, nchannels), Uniform::new(0., 1.), &mut rng)
        } else {
            Array::random((ncomponents, nchannels), Uniform::new(0., 1.))
        };
        let mut w = orthonormalize_rows(w_init.mapv(F::cast))?;

        let inv_nsamples = F::cast(nsamples).recip();
        let mut status = ConvergenceStatus::MaxIterationsReached {
            iterations: self.max_iter(),
        };

        for iteration in 0..self.max_iter() {
            let mut deltas: Array1<F> = Array1::zeros(ncomponents);

            for i in 0..ncomponents {
                let wold = w.row(i).to_owned();

                // logcosh contrast: g(y) = tanh(y), g'(y) = 1 - tanh²(y)
                let y = wold.dot(&xw);
                let gy = y.mapv(|v| v.tanh());
                let gprime_mean = gy
                    .mapv(|v| F::one() - v * v)
                    .mean()
                    .unwrap_or_else(F::zero);

                // w⁺ = E[X·g(y)] - E[g'(y)]·w
                let mut wnew = xw.dot(&gy);
                wnew.mapv_inplace(|v| v * inv_nsamples);
                wnew.scaled_add(-gprime_mean, &wold);
                normalize(&mut wnew);

                // deflate against the components already updated this sweep
                for k in 0..i {
                    let prev = w.row(k);
                    let proj = wnew.dot(&prev);
                    wnew.scaled_add(-proj, &prev);
                }
                normalize(&mut wnew);

                // sign-ambiguity-safe update distance
                deltas[i] = (wnew.dot(&wold).abs() - F::one()).abs();
                w.row_mut(i).assign(&wnew);
            }

            let lim = *deltas
                .max()
                .map_err(|_| UnmixError::NonFinite("the fixed-point update"))?;
            if lim < self.tol() {
                status = ConvergenceStatus::Converged {
                    iterations: iteration + 1,
                };
                break;
            }
        }

        let sources = w.dot(&xw);
        let mixing = pseudo_inverse(&w)?;

        if sources
            .iter()
            .chain(mixing.iter())
            .any(|v| !v.is_finite())
        {
            return Err(UnmixError::NonFinite("source recovery"));
        }

        Ok(BssResult {
            sources,
            unmixing: w,
            mixing,
            whitening,
            status,
        })
    }
}

// Unit-norm with an epsilon guard against vanishing vectors.
fn normalize<F: Float>(v: &mut Array1<F>) {
    let norm = v.iter().map(|&x| x * x).sum::<F>().sqrt();
    let guard = F::cast(NORM_EPS);
    v.mapv_inplace(|x| x / (norm + guard));
}
