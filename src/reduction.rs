//! # Principal component projection of the normalised audio features
//!
//! ## Baseline Choice
//!
//! Songs are embedded with a plain, exact **PCA** fitted once over the whole corpus.
//! The feature space is tiny (six min-max scaled audio features), so the covariance
//! matrix is 6×6 and can be diagonalised directly; no randomised or incremental
//! approximation is needed. Fitting over all rows in a single pass gives the same
//! components an incremental fit over mini-batches converges to.
//!
//! ## Algorithm
//!
//! 1. Column means \( \mu \) of the N×F normalised matrix \( X \).
//! 2. Covariance \( C = \frac{1}{N-1} (X-\mu)^\top (X-\mu) \), F×F, symmetric.
//! 3. Cyclic Jacobi rotations until the off-diagonal mass vanishes; the diagonal
//!    holds the eigenvalues, the accumulated rotations the eigenvectors.
//! 4. Components sorted by eigenvalue (descending, ties by original axis order).
//! 5. Sign fix: the entry with the largest magnitude in each component is made
//!    positive, so repeated fits over the same rows give identical embeddings.
//!
//! Embedding of a row \( x \): \( e_k = (x - \mu) \cdot v_k \) for the first `r` components.
//!
//! ## Failure modes
//!
//! - `r == 0` or `r > F` → `ReductionError::InvalidComponents`
//! - `N < r` → `ReductionError::InsufficientRows`
//! - any `NaN`/`inf` in \( X \) → `ReductionError::NonFinite` (malformed rows surface here)
//! - Jacobi not converged within `MAX_SWEEPS` → `ReductionError::NoConvergence`

use log::{debug, info, trace};
use rayon::prelude::*;
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

use crate::error::ReductionError;

/// Number of embedding dimensions used by default.
pub const DEFAULT_COMPONENTS: usize = 5;

/// Upper bound on full Jacobi sweeps; a 6×6 matrix converges in well under ten.
const MAX_SWEEPS: usize = 64;

/// Fitted linear projection onto the leading principal axes.
#[derive(Clone, Debug, PartialEq)]
pub struct PcaProjection {
    pub(crate) original_dim: usize,
    pub(crate) reduced_dim: usize,
    pub(crate) mean: Vec<f64>,
    /// `reduced_dim` rows of length `original_dim`, unit norm, mutually orthogonal.
    pub(crate) components: Vec<Vec<f64>>,
    pub(crate) explained_variance: Vec<f64>,
    pub(crate) total_variance: f64,
}

impl PcaProjection {
    /// Fits the projection on an N×F matrix.
    pub fn fit(data: &DenseMatrix<f64>, n_components: usize) -> Result<Self, ReductionError> {
        let (n_rows, n_features) = data.shape();
        info!(
            "Fitting PCA: {} rows x {} features -> {} components",
            n_rows, n_features, n_components
        );

        if n_components == 0 || n_components > n_features {
            return Err(ReductionError::InvalidComponents {
                requested: n_components,
                n_features,
            });
        }
        if n_rows < n_components {
            return Err(ReductionError::InsufficientRows {
                n_rows,
                required: n_components,
            });
        }
        for i in 0..n_rows {
            for j in 0..n_features {
                if !data.get((i, j)).is_finite() {
                    return Err(ReductionError::NonFinite { row: i, feature: j });
                }
            }
        }

        let mean: Vec<f64> = (0..n_features)
            .map(|j| (0..n_rows).map(|i| *data.get((i, j))).sum::<f64>() / n_rows as f64)
            .collect();
        trace!("Column means: {:?}", mean);

        let cov = covariance(data, &mean);
        let (eigenvalues, eigenvectors) = jacobi_eigen(cov)?;

        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            eigenvalues[b]
                .partial_cmp(&eigenvalues[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let components: Vec<Vec<f64>> = order
            .iter()
            .take(n_components)
            .map(|&k| {
                let mut v: Vec<f64> = (0..n_features).map(|f| eigenvectors[f][k]).collect();
                flip_sign(&mut v);
                v
            })
            .collect();

        // negative round-off on a rank-deficient covariance is clamped to zero
        let explained_variance: Vec<f64> = order
            .iter()
            .take(n_components)
            .map(|&k| eigenvalues[k].max(0.0))
            .collect();
        let total_variance: f64 = eigenvalues.iter().map(|v| v.max(0.0)).sum();

        let projection = Self {
            original_dim: n_features,
            reduced_dim: n_components,
            mean,
            components,
            explained_variance,
            total_variance,
        };
        info!(
            "PCA fitted, explained variance ratio {:?}",
            projection.explained_variance_ratio()
        );
        Ok(projection)
    }

    #[inline]
    pub fn original_dim(&self) -> usize {
        self.original_dim
    }

    #[inline]
    pub fn reduced_dim(&self) -> usize {
        self.reduced_dim
    }

    #[inline]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    #[inline]
    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }

    /// Variance captured by each kept component.
    #[inline]
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// Share of the total variance captured by each kept component.
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        if self.total_variance > 0.0 {
            self.explained_variance
                .iter()
                .map(|v| v / self.total_variance)
                .collect()
        } else {
            vec![0.0; self.reduced_dim]
        }
    }

    /// Projects one normalised row onto the kept components.
    ///
    /// # Panics
    ///
    /// Panics if `row.len() != original_dim`.
    pub fn project(&self, row: &[f64]) -> Vec<f64> {
        assert_eq!(row.len(), self.original_dim, "Dimension mismatch");
        self.components
            .iter()
            .map(|component| {
                row.iter()
                    .zip(self.mean.iter())
                    .zip(component.iter())
                    .map(|((x, m), v)| (x - m) * v)
                    .sum()
            })
            .collect()
    }
}

/// Projects every row of `data`, preserving row order.
pub fn project_matrix(data: &DenseMatrix<f64>, projection: &PcaProjection) -> DenseMatrix<f64> {
    let (n_rows, _n_cols) = data.shape();
    let target_dim = projection.reduced_dim;
    debug!("Projecting {} rows onto {} components", n_rows, target_dim);

    let projected_rows: Vec<Vec<f64>> = (0..n_rows)
        .into_par_iter()
        .map(|i| {
            let row: Vec<f64> = data.get_row(i).iterator(0).copied().collect();
            projection.project(&row)
        })
        .collect();

    let mut flat = Vec::with_capacity(n_rows * target_dim);
    for row in projected_rows {
        flat.extend(row);
    }

    DenseMatrix::from_iterator(flat.into_iter(), n_rows, target_dim, 0)
}

/// Sample covariance (N-1 denominator, N when only one row).
fn covariance(data: &DenseMatrix<f64>, mean: &[f64]) -> Vec<Vec<f64>> {
    let (n_rows, n_features) = data.shape();
    let denom = if n_rows > 1 { (n_rows - 1) as f64 } else { 1.0 };

    let mut cov = vec![vec![0.0; n_features]; n_features];
    for i in 0..n_rows {
        let centred: Vec<f64> = (0..n_features)
            .map(|j| *data.get((i, j)) - mean[j])
            .collect();
        for a in 0..n_features {
            for b in a..n_features {
                cov[a][b] += centred[a] * centred[b];
            }
        }
    }
    for a in 0..n_features {
        for b in a..n_features {
            cov[a][b] /= denom;
            cov[b][a] = cov[a][b];
        }
    }
    cov
}

/// Cyclic Jacobi eigen decomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose column `k` is the eigenvector of
/// eigenvalue `k`.
pub(crate) fn jacobi_eigen(
    mut a: Vec<Vec<f64>>,
) -> Result<(Vec<f64>, Vec<Vec<f64>>), ReductionError> {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum();
    let threshold = (scale * 1e-24).max(f64::MIN_POSITIVE);

    for sweep in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum();
        trace!("Jacobi sweep {}: off-diagonal mass {:e}", sweep, off);
        if off <= threshold {
            debug!("Jacobi converged after {} sweeps", sweep);
            let eigenvalues = (0..n).map(|i| a[i][i]).collect();
            return Ok((eigenvalues, v));
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q] == 0.0 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = if theta == 0.0 {
                    1.0
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (akp, akq) = (row[p], row[q]);
                    row[p] = c * akp - s * akq;
                    row[q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    Err(ReductionError::NoConvergence(MAX_SWEEPS))
}

/// Makes the largest-magnitude entry positive (first one wins on ties).
fn flip_sign(v: &mut [f64]) {
    let mut pivot = 0usize;
    for (i, x) in v.iter().enumerate() {
        if x.abs() > v[pivot].abs() {
            pivot = i;
        }
    }
    if v[pivot] < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
}
