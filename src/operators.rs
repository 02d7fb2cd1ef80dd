//! Vector primitives and the candidate scoring used at query time.
//!
//! - `cosine_similarity(a, b) = a·b / (‖a‖‖b‖)`, with the convention `0.0` when
//!   either vector has zero magnitude
//! - `score_candidates`: query embedding against a subset of the embedding table,
//!   returned in candidate order

use log::trace;
use rayon::prelude::*;
use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

/// Computes the Euclidean norm (L2) without allocating.
#[inline]
pub fn norm(a: &[f64]) -> f64 {
    a.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

/// Dot product.
///
/// # Panics
///
/// Panics if the lengths differ.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "Dimension mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity in [-1, 1]; `0.0` if either vector is all zeros.
///
/// # Panics
///
/// Panics if the lengths differ.
#[inline]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let denom = norm(a) * norm(b);
    if denom > 0.0 {
        (dot(a, b) / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Scores every candidate row of `embeddings` against `query`.
///
/// Output pairs are `(row index, similarity)` in the same order as `candidates`.
///
/// # Panics
///
/// Panics if a candidate index is out of bounds or the query length differs from
/// the embedding width.
pub fn score_candidates(
    query: &[f64],
    embeddings: &DenseMatrix<f64>,
    candidates: &[usize],
) -> Vec<(usize, f64)> {
    trace!("Scoring {} candidates", candidates.len());
    candidates
        .par_iter()
        .map(|&i| {
            let row: Vec<f64> = embeddings.get_row(i).iterator(0).copied().collect();
            (i, cosine_similarity(query, &row))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm() {
        assert!((norm(&[3.0, 4.0]) - 5.0).abs() < 1e-12);
        assert_eq!(norm(&[]), 0.0);
    }

    #[test]
    fn test_cosine_identical_and_opposite() {
        let a = [0.2, -0.5, 1.0];
        let b = [-0.2, 0.5, -1.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch")]
    fn test_dot_mismatch_panics() {
        dot(&[1.0], &[1.0, 2.0]);
    }

    #[test]
    fn test_score_candidates_keeps_candidate_order() {
        let flat = vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0, -1.0, 0.0];
        let emb = DenseMatrix::from_iterator(flat.into_iter(), 4, 2, 0);
        let scores = score_candidates(&[1.0, 0.0], &emb, &[3, 1, 2]);

        let idx: Vec<usize> = scores.iter().map(|s| s.0).collect();
        assert_eq!(idx, vec![3, 1, 2]);
        assert!((scores[0].1 + 1.0).abs() < 1e-12);
        assert!(scores[1].1.abs() < 1e-12);
        assert!((scores[2].1 - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }
}
