//! Non-negative matrix factorization by Lee-Seung multiplicative updates

use ndarray::{Array, Array2};
use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::data::NonNegativeMatrix;
use crate::error::{Result, UnmixError};
use crate::linalg::frobenius_norm;
use crate::param_guard::ParamGuard;
use crate::{ConvergenceStatus, Float};

mod hyperparams;

pub use hyperparams::{NmfParams, NmfValidParams};

/// Additive guard keeping the update denominators away from zero.
const DENOM_EPS: f64 = 1e-10;

/// A basis/coefficient pair `V ≈ W · H`, both factors entrywise
/// non-negative.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct NmfFactorization<F> {
    basis: Array2<F>,
    coefficients: Array2<F>,
    status: ConvergenceStatus,
}

impl<F: Float> NmfFactorization<F> {
    /// The rows × components basis matrix W.
    pub fn basis(&self) -> &Array2<F> {
        &self.basis
    }

    /// The components × cols coefficient matrix H.
    pub fn coefficients(&self) -> &Array2<F> {
        &self.coefficients
    }

    pub fn status(&self) -> ConvergenceStatus {
        self.status
    }

    pub fn iterations(&self) -> usize {
        self.status.iterations()
    }

    /// The reconstruction `W · H`.
    pub fn reconstruction(&self) -> Array2<F> {
        self.basis.dot(&self.coefficients)
    }
}

impl<F: Float> NmfParams<F> {
    /// Checks the hyperparameters, then runs the factorization.
    pub fn factorize(&self, matrix: &NonNegativeMatrix<F>) -> Result<NmfFactorization<F>> {
        self.check_ref()?.factorize(matrix)
    }
}

impl<F: Float> NmfValidParams<F> {
    /// Factorizes `matrix` into non-negative factors W and H.
    ///
    /// Each iteration applies the multiplicative updates
    /// `H ← H ⊙ (WᵗV) / (WᵗWH + ε)` followed by
    /// `W ← W ⊙ (VHᵗ) / (WHHᵗ + ε)`; non-negativity of both factors is
    /// preserved by construction. The run stops early once the relative
    /// improvement of the Frobenius reconstruction error falls below the
    /// tolerance.
    ///
    /// # Errors
    ///
    /// Fails with [`UnmixError::InvalidValue`] when the rank exceeds the
    /// smaller matrix dimension, and with [`UnmixError::NonFinite`] when an
    /// update degenerates despite the epsilon guards.
    pub fn factorize(&self, matrix: &NonNegativeMatrix<F>) -> Result<NmfFactorization<F>> {
        let (nrows, ncols) = (matrix.nrows(), matrix.ncols());
        let ncomponents = self.ncomponents();

        if ncomponents > nrows.min(ncols) {
            return Err(UnmixError::InvalidValue(format!(
                "ncomponents cannot be greater than the min({}, {}), got {}",
                nrows, ncols, ncomponents
            )));
        }

        let v = matrix.matrix();

        let (w_init, h_init): (Array2<f64>, Array2<f64>) =
            if let Some(seed) = self.random_state() {
                let mut rng = Xoshiro256Plus::seed_from_u64(*seed);
                (
                    Array::random_using((nrows, ncomponents), Uniform::new(0., 1.), &mut rng),
                    Array::random_using((ncomponents, ncols), Uniform::new(0., 1.), &mut rng),
                )
            } else {
                (
                    Array::random((nrows, ncomponents), Uniform::new(0., 1.)),
                    Array::random((ncomponents, ncols), Uniform::new(0., 1.)),
                )
            };
        let mut w = w_init.mapv(F::cast);
        let mut h = h_init.mapv(F::cast);

        let eps = F::cast(DENOM_EPS);
        let mut residual = frobenius_norm(&(v - &w.dot(&h)));
        let mut status = ConvergenceStatus::MaxIterationsReached {
            iterations: self.max_iter(),
        };

        for iteration in 0..self.max_iter() {
            // Each factor is recomputed wholesale from complete matrices;
            // the alternating order carries the monotone descent of ‖V - WH‖.
            let numer = w.t().dot(v);
            let denom = w.t().dot(&w).dot(&h) + eps;
            h = &h * &(numer / denom);

            let numer = v.dot(&h.t());
            let denom = w.dot(&h).dot(&h.t()) + eps;
            w = &w * &(numer / denom);

            let next = frobenius_norm(&(v - &w.dot(&h)));
            if !next.is_finite() {
                return Err(UnmixError::NonFinite("the multiplicative update"));
            }

            let improvement = (residual - next).abs();
            residual = next;
            if improvement <= self.tol() * residual.max(F::one()) {
                status = ConvergenceStatus::Converged {
                    iterations: iteration + 1,
                };
                break;
            }
        }

        Ok(NmfFactorization {
            basis: w,
            coefficients: h,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::frobenius_norm;
    use ndarray::Array;
    use ndarray_rand::{rand::SeedableRng, rand_distr::Uniform, RandomExt};
    use num_traits::Float;
    use rand_xoshiro::Xoshiro256Plus;

    fn reconstruction_error(v: &Array2<f64>, factorization: &NmfFactorization<f64>) -> f64 {
        frobenius_norm(&(v - &factorization.reconstruction()))
    }

    #[test]
    fn rank_exceeding_dimensions_rejected() {
        let matrix = NonNegativeMatrix::new(Array2::<f64>::ones((4, 4))).unwrap();
        let result = NmfParams::new(5).factorize(&matrix);
        assert!(matches!(result, Err(UnmixError::InvalidValue(_))));
    }

    #[test]
    fn zero_rank_rejected() {
        let matrix = NonNegativeMatrix::new(Array2::<f64>::ones((4, 4))).unwrap();
        let result = NmfParams::new(0).factorize(&matrix);
        assert!(matches!(result, Err(UnmixError::InvalidValue(_))));
    }

    // All-ones 4x4 input, rank 2: the factors stay finite and non-negative
    // and the reconstruction error after 50 iterations is no worse than
    // after a single one.
    #[test]
    fn error_is_non_increasing_on_ones() {
        let v = Array2::<f64>::ones((4, 4));
        let matrix = NonNegativeMatrix::new(v.clone()).unwrap();

        let short = NmfParams::new(2)
            .max_iter(1)
            .tol(1e-12)
            .random_state(42)
            .factorize(&matrix)
            .unwrap();
        let long = NmfParams::new(2)
            .max_iter(50)
            .tol(1e-12)
            .random_state(42)
            .factorize(&matrix)
            .unwrap();

        for factorization in [&short, &long] {
            assert!(factorization
                .basis()
                .iter()
                .chain(factorization.coefficients().iter())
                .all(|x| x.is_finite() && *x >= 0.0));
        }

        assert!(reconstruction_error(&v, &long) <= reconstruction_error(&v, &short) + 1e-12);
    }

    #[test]
    fn factors_stay_non_negative_on_random_input() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let v = Array::random_using((6, 5), Uniform::new(0., 1.), &mut rng);
        let matrix = NonNegativeMatrix::new(v.clone()).unwrap();

        let factorization = NmfParams::new(3)
            .max_iter(100)
            .random_state(17)
            .factorize(&matrix)
            .unwrap();

        assert!(factorization
            .basis()
            .iter()
            .chain(factorization.coefficients().iter())
            .all(|x| x.is_finite() && *x >= 0.0));
        assert_eq!(factorization.basis().dim(), (6, 3));
        assert_eq!(factorization.coefficients().dim(), (3, 5));
    }

    #[test]
    fn identical_seeds_yield_identical_factors() {
        let mut rng = Xoshiro256Plus::seed_from_u64(11);
        let v = Array::random_using((5, 5), Uniform::new(0., 1.), &mut rng);
        let matrix = NonNegativeMatrix::new(v).unwrap();

        let params = NmfParams::new(2).random_state(23);
        let first = params.factorize(&matrix).unwrap();
        let second = params.factorize(&matrix).unwrap();

        assert_eq!(first.basis(), second.basis());
        assert_eq!(first.coefficients(), second.coefficients());
        assert_eq!(first.status(), second.status());
    }

    #[test]
    fn low_rank_input_converges() {
        // rank-2 product of non-negative factors
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        let a = Array::random_using((8, 2), Uniform::new(0., 1.), &mut rng);
        let b = Array::random_using((2, 7), Uniform::new(0., 1.), &mut rng);
        let v = a.dot(&b);
        let matrix = NonNegativeMatrix::new(v.clone()).unwrap();

        let factorization = NmfParams::new(2)
            .max_iter(500)
            .random_state(42)
            .factorize(&matrix)
            .unwrap();

        assert!(factorization.status().is_converged());

        let initial = NmfParams::new(2)
            .max_iter(1)
            .tol(1e-12)
            .random_state(42)
            .factorize(&matrix)
            .unwrap();
        assert!(reconstruction_error(&v, &factorization) <= reconstruction_error(&v, &initial));
    }
}
