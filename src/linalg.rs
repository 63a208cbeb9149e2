//! Dense matrix helpers backing the whitening and separation stages
//!
//! Everything here is pure Rust on top of `ndarray`; the decompositions are
//! Jacobi-rotation based, which is accurate and entirely adequate for the
//! small channel counts the engines operate on.

use ndarray::{Array1, Array2};

use crate::error::{Result, UnmixError};
use crate::Float;

/// Number of full Jacobi sweeps before giving up on further refinement.
const MAX_SWEEPS: usize = 50;

/// Orthonormalizes the rows of `m` in place with modified Gram-Schmidt.
///
/// Requires `rows <= cols`, otherwise the rows cannot form an orthonormal
/// set.
///
/// # Errors
///
/// Fails with [`UnmixError::RankDeficient`] when a row vanishes after the
/// projections onto earlier rows are removed.
pub fn orthonormalize_rows<F: Float>(mut m: Array2<F>) -> Result<Array2<F>> {
    let (rows, cols) = m.dim();
    if rows > cols {
        return Err(UnmixError::InvalidValue(format!(
            "cannot orthonormalize {} rows of dimension {}",
            rows, cols
        )));
    }

    for i in 0..rows {
        let mut row = m.row(i).to_owned();
        for k in 0..i {
            let prev = m.row(k);
            let proj = row.dot(&prev);
            row.scaled_add(-proj, &prev);
        }
        let norm = row.iter().map(|&x| x * x).sum::<F>().sqrt();
        if norm < F::cast(1e-10) {
            return Err(UnmixError::RankDeficient(i));
        }
        row.mapv_inplace(|x| x / norm);
        m.row_mut(i).assign(&row);
    }

    Ok(m)
}

/// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations.
///
/// Returns the eigenvalues and a matrix whose columns are the matching
/// eigenvectors, so that `a ≈ vecs · diag(vals) · vecsᵗ`. Only the symmetric
/// part of the input is meaningful; no symmetry check is performed.
pub fn eigh_jacobi<F: Float>(a: &Array2<F>) -> Result<(Array1<F>, Array2<F>)> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(UnmixError::InvalidValue(format!(
            "eigendecomposition requires a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }

    let mut a = a.to_owned();
    let mut v: Array2<F> = Array2::eye(n);

    for _ in 0..MAX_SWEEPS {
        let mut off = F::zero();
        for p in 0..n {
            for q in (p + 1)..n {
                off = off + a[(p, q)] * a[(p, q)];
            }
        }
        if off.sqrt() < F::cast(1e-12) {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[(p, q)];
                if apq.abs() < F::cast(1e-30) {
                    continue;
                }

                let theta = (a[(q, q)] - a[(p, p)]) / (F::cast(2.) * apq);
                let sign = if theta >= F::zero() { F::one() } else { -F::one() };
                let t = sign / (theta.abs() + (F::one() + theta * theta).sqrt());
                let c = (F::one() + t * t).sqrt().recip();
                let s = c * t;

                for i in 0..n {
                    let aip = a[(i, p)];
                    let aiq = a[(i, q)];
                    a[(i, p)] = c * aip - s * aiq;
                    a[(i, q)] = s * aip + c * aiq;
                }
                for j in 0..n {
                    let apj = a[(p, j)];
                    let aqj = a[(q, j)];
                    a[(p, j)] = c * apj - s * aqj;
                    a[(q, j)] = s * apj + c * aqj;
                }
                for i in 0..n {
                    let vip = v[(i, p)];
                    let viq = v[(i, q)];
                    v[(i, p)] = c * vip - s * viq;
                    v[(i, q)] = s * vip + c * viq;
                }
            }
        }
    }

    Ok((a.diag().to_owned(), v))
}

/// Thin singular value decomposition by one-sided Jacobi orthogonalization.
///
/// For an m×n input with m ≥ n returns `(u, sigma, v)` with
/// `a ≈ u · diag(sigma) · vᵗ`, where `u` is m×n with orthonormal columns
/// (zero columns for vanishing singular values) and `v` is n×n orthogonal.
fn svd_one_sided<F: Float>(a: &Array2<F>) -> (Array2<F>, Array1<F>, Array2<F>) {
    let (m, n) = a.dim();
    debug_assert!(m >= n);

    let mut u = a.to_owned();
    let mut v: Array2<F> = Array2::eye(n);

    for _ in 0..MAX_SWEEPS {
        let mut rotated = false;

        for p in 0..n {
            for q in (p + 1)..n {
                let mut alpha = F::zero();
                let mut beta = F::zero();
                let mut gamma = F::zero();
                for i in 0..m {
                    alpha = alpha + u[(i, p)] * u[(i, p)];
                    beta = beta + u[(i, q)] * u[(i, q)];
                    gamma = gamma + u[(i, p)] * u[(i, q)];
                }
                if gamma.abs() <= F::cast(1e-14) * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (F::cast(2.) * gamma);
                let sign = if zeta >= F::zero() { F::one() } else { -F::one() };
                let t = sign / (zeta.abs() + (F::one() + zeta * zeta).sqrt());
                let c = (F::one() + t * t).sqrt().recip();
                let s = c * t;

                for i in 0..m {
                    let uip = u[(i, p)];
                    let uiq = u[(i, q)];
                    u[(i, p)] = c * uip - s * uiq;
                    u[(i, q)] = s * uip + c * uiq;
                }
                for i in 0..n {
                    let vip = v[(i, p)];
                    let viq = v[(i, q)];
                    v[(i, p)] = c * vip - s * viq;
                    v[(i, q)] = s * vip + c * viq;
                }
            }
        }

        if !rotated {
            break;
        }
    }

    let mut sigma: Array1<F> = Array1::zeros(n);
    for j in 0..n {
        let norm = u.column(j).iter().map(|&x| x * x).sum::<F>().sqrt();
        sigma[j] = norm;
        if norm > F::zero() {
            u.column_mut(j).mapv_inplace(|x| x / norm);
        }
    }

    (u, sigma, v)
}

/// Moore-Penrose pseudo-inverse via the one-sided Jacobi SVD.
///
/// Singular values below `max_sigma · ε · max(m, n)` are treated as zero, so
/// rank-deficient inputs yield the minimum-norm inverse instead of blowing
/// up. For a matrix with exactly orthonormal rows the result coincides with
/// the transpose.
pub fn pseudo_inverse<F: Float>(a: &Array2<F>) -> Result<Array2<F>> {
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(UnmixError::NotEnoughSamples);
    }
    if m < n {
        let pinv_t = pseudo_inverse(&a.t().to_owned())?;
        return Ok(pinv_t.t().to_owned());
    }

    let (u, sigma, v) = svd_one_sided(a);

    let max_sigma = sigma.iter().cloned().fold(F::zero(), F::max);
    if max_sigma == F::zero() {
        return Ok(Array2::zeros((n, m)));
    }
    let cutoff = max_sigma * F::epsilon() * F::cast(m.max(n));

    // pinv = V · Σ⁺ · Uᵗ, with Σ⁺ folded into the columns of V
    let mut scaled = v;
    for j in 0..n {
        let inv = if sigma[j] > cutoff {
            sigma[j].recip()
        } else {
            F::zero()
        };
        scaled.column_mut(j).mapv_inplace(|x| x * inv);
    }

    Ok(scaled.dot(&u.t()))
}

/// Frobenius norm, the root of the summed squared entries.
pub fn frobenius_norm<F: Float>(m: &Array2<F>) -> F {
    m.iter().map(|&x| x * x).sum::<F>().sqrt()
}
