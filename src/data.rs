//! Validated input containers
//!
//! Construction is the single validation point: once a [`SignalMixture`] or a
//! [`NonNegativeMatrix`] exists, the engines can rely on its invariants and
//! skip per-iteration checks.

use ndarray::{Array2, ArrayView1};
use num_traits::NumCast;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{Result, UnmixError};
use crate::Float;

/// A multi-channel capture: one row per channel, one column per sample.
///
/// Invariant: at least one channel, and all channels share the same length.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct SignalMixture<F> {
    records: Array2<F>,
}

impl<F: Float> SignalMixture<F> {
    /// Builds a mixture from per-channel sample buffers.
    ///
    /// # Errors
    ///
    /// Fails with [`UnmixError::ChannelLengthMismatch`] when the buffers are
    /// ragged, and with [`UnmixError::NotEnoughSamples`] when no channel or no
    /// sample is supplied.
    pub fn from_channels(channels: &[Vec<F>]) -> Result<Self> {
        if channels.is_empty() {
            return Err(UnmixError::NotEnoughSamples);
        }
        let nsamples = channels[0].len();
        if nsamples == 0 {
            return Err(UnmixError::NotEnoughSamples);
        }
        for (index, channel) in channels.iter().enumerate() {
            if channel.len() != nsamples {
                return Err(UnmixError::ChannelLengthMismatch {
                    index,
                    expected: nsamples,
                    got: channel.len(),
                });
            }
        }

        let mut records = Array2::zeros((channels.len(), nsamples));
        for (mut row, channel) in records.outer_iter_mut().zip(channels.iter()) {
            row.assign(&ArrayView1::from(channel.as_slice()));
        }

        Ok(SignalMixture { records })
    }

    /// Wraps an already rectangular channels × samples matrix.
    pub fn from_records(records: Array2<F>) -> Result<Self> {
        if records.nrows() == 0 || records.ncols() == 0 {
            return Err(UnmixError::NotEnoughSamples);
        }
        Ok(SignalMixture { records })
    }

    pub fn nchannels(&self) -> usize {
        self.records.nrows()
    }

    pub fn nsamples(&self) -> usize {
        self.records.ncols()
    }

    pub fn records(&self) -> &Array2<F> {
        &self.records
    }
}

/// A rows × cols matrix with every entry finite and non-negative, the
/// precondition of the multiplicative-update NMF.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct NonNegativeMatrix<F> {
    matrix: Array2<F>,
}

impl<F: Float> NonNegativeMatrix<F> {
    /// Validates and wraps a dense matrix.
    ///
    /// # Errors
    ///
    /// Fails with [`UnmixError::NegativeEntry`] on the first entry below zero
    /// and with [`UnmixError::NonFinite`] on NaN or infinite entries.
    pub fn new(matrix: Array2<F>) -> Result<Self> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            return Err(UnmixError::NotEnoughSamples);
        }
        for ((row, col), &value) in matrix.indexed_iter() {
            if !value.is_finite() {
                return Err(UnmixError::NonFinite("input validation"));
            }
            if value < F::zero() {
                return Err(UnmixError::NegativeEntry {
                    row,
                    col,
                    value: <f64 as NumCast>::from(value).unwrap_or(f64::NAN),
                });
            }
        }
        Ok(NonNegativeMatrix { matrix })
    }

    /// Builds the matrix from a flat row-major buffer plus its dimensions.
    pub fn from_flat(nrows: usize, ncols: usize, buffer: Vec<F>) -> Result<Self> {
        let matrix = Array2::from_shape_vec((nrows, ncols), buffer)?;
        Self::new(matrix)
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn matrix(&self) -> &Array2<F> {
        &self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixture_rejects_ragged_channels() {
        let channels = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]];
        let err = SignalMixture::from_channels(&channels).unwrap_err();
        assert!(matches!(
            err,
            UnmixError::ChannelLengthMismatch {
                index: 1,
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn mixture_rejects_empty_input() {
        let empty: Vec<Vec<f64>> = Vec::new();
        assert!(matches!(
            SignalMixture::from_channels(&empty),
            Err(UnmixError::NotEnoughSamples)
        ));
        assert!(matches!(
            SignalMixture::from_channels(&[Vec::<f64>::new()]),
            Err(UnmixError::NotEnoughSamples)
        ));
    }

    #[test]
    fn mixture_keeps_channel_order() {
        let channels = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let mixture = SignalMixture::from_channels(&channels).unwrap();

        assert_eq!(mixture.nchannels(), 2);
        assert_eq!(mixture.nsamples(), 2);
        assert_eq!(mixture.records(), &array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn nonnegative_rejects_negative_entry() {
        let matrix = array![[1.0, 2.0], [3.0, -4.0]];
        let err = NonNegativeMatrix::new(matrix).unwrap_err();
        assert!(matches!(
            err,
            UnmixError::NegativeEntry { row: 1, col: 1, .. }
        ));
    }

    #[test]
    fn nonnegative_rejects_nan() {
        let matrix = array![[1.0, f64::NAN]];
        assert!(matches!(
            NonNegativeMatrix::new(matrix),
            Err(UnmixError::NonFinite(_))
        ));
    }

    #[test]
    fn nonnegative_from_flat_checks_shape() {
        assert!(matches!(
            NonNegativeMatrix::from_flat(2, 3, vec![1.0; 5]),
            Err(UnmixError::NdShape(_))
        ));

        let matrix = NonNegativeMatrix::from_flat(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(matrix.matrix(), &array![[1.0, 2.0], [3.0, 4.0]]);
    }
}
