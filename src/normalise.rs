//! Column-wise min-max rescaling of the audio features into [0, 1].
//!
//! The scaler is fitted once on the whole corpus; the observed minimum and maximum of
//! each column are frozen inside `MinMaxScaler` and reused by `transform`.
//!
//! Pinned edge cases:
//! - constant column (`max == min`): every value of that column maps to `0.0`;
//! - `NaN` cells are skipped when computing min/max and stay `NaN` after scaling.

use log::{debug, info, warn};
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

/// Frozen per-column ranges of a fitted min-max scaler.
#[derive(Clone, Debug, PartialEq)]
pub struct MinMaxScaler {
    pub(crate) mins: Vec<f64>,
    pub(crate) maxs: Vec<f64>,
}

impl MinMaxScaler {
    /// Fits column minima and maxima on an N×F matrix.
    pub fn fit(data: &DenseMatrix<f64>) -> Self {
        let (n_rows, n_cols) = data.shape();
        info!("Fitting min-max scaler on {} rows x {} features", n_rows, n_cols);

        let mut mins = vec![f64::NAN; n_cols];
        let mut maxs = vec![f64::NAN; n_cols];
        for j in 0..n_cols {
            let (lo, hi) = (0..n_rows)
                .map(|i| *data.get((i, j)))
                .filter(|v| !v.is_nan())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if lo <= hi {
                mins[j] = lo;
                maxs[j] = hi;
            }
            if lo == hi {
                warn!("Feature column {} is constant ({}); it will scale to 0", j, lo);
            }
            debug!("Feature column {}: min={} max={}", j, mins[j], maxs[j]);
        }

        Self { mins, maxs }
    }

    /// Number of features the scaler was fitted on.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.mins.len()
    }

    #[inline]
    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    #[inline]
    pub fn maxs(&self) -> &[f64] {
        &self.maxs
    }

    /// Rescales a single value of column `j`.
    #[inline]
    pub fn scale_value(&self, j: usize, value: f64) -> f64 {
        let range = self.maxs[j] - self.mins[j];
        if value.is_nan() {
            value
        } else if range == 0.0 {
            0.0
        } else {
            (value - self.mins[j]) / range
        }
    }

    /// Rescales one row of raw features.
    ///
    /// # Panics
    ///
    /// Panics if `row.len()` differs from the fitted feature count.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        assert_eq!(row.len(), self.n_features(), "Dimension mismatch");
        row.iter()
            .enumerate()
            .map(|(j, &v)| self.scale_value(j, v))
            .collect()
    }

    /// Rescales a whole N×F matrix into a new row-major matrix.
    pub fn transform(&self, data: &DenseMatrix<f64>) -> DenseMatrix<f64> {
        let (n_rows, n_cols) = data.shape();
        assert_eq!(n_cols, self.n_features(), "Dimension mismatch");

        let flat: Vec<f64> = (0..n_rows)
            .flat_map(|i| (0..n_cols).map(move |j| self.scale_value(j, *data.get((i, j)))))
            .collect();
        DenseMatrix::from_iterator(flat.into_iter(), n_rows, n_cols, 0)
    }

    /// Fits on `data` and returns both the scaler and the rescaled matrix.
    pub fn fit_transform(data: &DenseMatrix<f64>) -> (Self, DenseMatrix<f64>) {
        let scaler = Self::fit(data);
        let scaled = scaler.transform(data);
        (scaler, scaled)
    }
}
