//! Whitening stage
//!
//! Centers a multi-channel mixture and rescales it to unit variance before
//! separation. Two strategies are available behind [`WhiteningMethod`]: the
//! cheap per-channel diagonal transform and a full ZCA transform backed by an
//! eigendecomposition of the channel covariance.

use ndarray::{Array1, Array2, Axis};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::data::SignalMixture;
use crate::error::{Result, UnmixError};
use crate::linalg::eigh_jacobi;
use crate::Float;

/// Variance floor applied before taking reciprocal square roots, so
/// near-silent channels never divide by zero.
const VAR_EPS: f64 = 1e-12;

/// Decorrelation strategy used by [`whiten`].
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WhiteningMethod {
    /// Per-channel variance normalization only. Cheap, but residual
    /// cross-channel correlation survives the transform.
    Diagonal,
    /// Full covariance whitening `E · diag(1/√(λ+ε)) · Eᵗ`; the whitened
    /// channels are mutually decorrelated with unit variance.
    Zca,
}

impl Default for WhiteningMethod {
    fn default() -> Self {
        WhiteningMethod::Diagonal
    }
}

/// The affine transform derived from one mixture: per-channel means plus a
/// K×K decorrelation matrix.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct WhiteningTransform<F> {
    transform: Array2<F>,
    mean: Array1<F>,
}

impl<F: Float> WhiteningTransform<F> {
    pub fn transform(&self) -> &Array2<F> {
        &self.transform
    }

    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Applies centering followed by the decorrelation transform to a
    /// channels × samples matrix.
    pub fn apply(&self, records: &Array2<F>) -> Array2<F> {
        let centered = records - &self.mean.view().insert_axis(Axis(1));
        self.transform.dot(&centered)
    }
}

/// Whitens a mixture, returning the whitened channels × samples matrix along
/// with the transform that produced it.
pub fn whiten<F: Float>(
    mixture: &SignalMixture<F>,
    method: WhiteningMethod,
) -> Result<(Array2<F>, WhiteningTransform<F>)> {
    let records = mixture.records();
    let nchannels = mixture.nchannels();
    let inv_nsamples = F::cast(mixture.nsamples()).recip();
    let eps = F::cast(VAR_EPS);

    let mean = records
        .mean_axis(Axis(1))
        .ok_or(UnmixError::NotEnoughSamples)?;
    let centered = records - &mean.view().insert_axis(Axis(1));

    let transform = match method {
        WhiteningMethod::Diagonal => {
            let mut transform = Array2::zeros((nchannels, nchannels));
            for i in 0..nchannels {
                let row = centered.row(i);
                let var = row.dot(&row) * inv_nsamples;
                transform[(i, i)] = (var + eps).sqrt().recip();
            }
            transform
        }
        WhiteningMethod::Zca => {
            let cov = centered.dot(&centered.t()).mapv(|x| x * inv_nsamples);
            let (vals, vecs) = eigh_jacobi(&cov)?;

            let mut scaled = vecs.clone();
            for j in 0..nchannels {
                let inv_root = (vals[j].max(F::zero()) + eps).sqrt().recip();
                scaled.column_mut(j).mapv_inplace(|x| x * inv_root);
            }
            scaled.dot(&vecs.t())
        }
    };

    let whitened = transform.dot(&centered);
    Ok((whitened, WhiteningTransform { transform, mean }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array;
    use num_traits::Float;

    fn tones(nsamples: usize) -> SignalMixture<f64> {
        let t = Array::linspace(0., 1., nsamples);
        let ch1 = t.mapv(|x| 3.0 * (2.0 * std::f64::consts::PI * 5.0 * x).sin() + 1.5);
        let ch2 = t.mapv(|x| {
            0.2 * (2.0 * std::f64::consts::PI * 13.0 * x).sin()
                + 0.5 * (2.0 * std::f64::consts::PI * 5.0 * x).sin()
        });

        let records = concatenate![Axis(0), ch1.insert_axis(Axis(0)), ch2.insert_axis(Axis(0))];
        SignalMixture::from_records(records).unwrap()
    }

    #[test]
    fn diagonal_normalizes_each_channel() {
        let mixture = tones(2000);
        let (whitened, transform) = whiten(&mixture, WhiteningMethod::Diagonal).unwrap();

        let n = mixture.nsamples() as f64;
        for i in 0..2 {
            let row = whitened.row(i);
            assert_abs_diff_eq!(row.sum() / n, 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(row.dot(&row) / n, 1.0, epsilon = 1e-6);
        }

        // the transform reproduces the whitened output
        assert_abs_diff_eq!(
            transform.apply(mixture.records()),
            whitened,
            epsilon = 1e-12
        );
    }

    #[test]
    fn zca_decorrelates_channels() {
        let mixture = tones(2000);
        let (whitened, _) = whiten(&mixture, WhiteningMethod::Zca).unwrap();

        let n = mixture.nsamples() as f64;
        let cov = whitened.dot(&whitened.t()).mapv(|x| x / n);
        assert_abs_diff_eq!(cov, Array2::eye(2), epsilon = 1e-4);
    }

    #[test]
    fn near_silent_channel_stays_finite() {
        let records = array![[1.0, 1.0, 1.0, 1.0], [0.0, 1.0, 0.0, 1.0]];
        let mixture = SignalMixture::from_records(records).unwrap();

        for method in [WhiteningMethod::Diagonal, WhiteningMethod::Zca] {
            let (whitened, _) = whiten(&mixture, method).unwrap();
            assert!(whitened.iter().all(|x| x.is_finite()));
        }
    }
}
