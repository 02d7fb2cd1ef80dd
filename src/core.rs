//! SongSpace: the fitted, immutable recommendation model.
//!
//! A `SongSpace` owns everything a query needs:
//!
//! - the loaded `SongDataset` (row order = load order),
//! - the `MinMaxScaler` frozen at build time,
//! - the `PcaProjection` fitted once over the whole corpus,
//! - the embedding table, an N×r row-major `DenseMatrix<f64>` where row `i` is the
//!   embedding of dataset row `i`.
//!
//! Nothing is mutated after construction; every accessor takes `&self`, so a single
//! `SongSpace` can serve any number of concurrent read-only queries. Reloading a
//! corpus means building a new `SongSpace` (see `shared::SharedSongSpace`).
//!
//! # Examples
//!
//! ```
//! use songspace::builder::SongSpaceBuilder;
//! use songspace::dataset::{SongDataset, SongRecord};
//!
//! let song = |name: &str, x: f64| SongRecord {
//!     name: name.to_string(),
//!     artists: vec!["Someone".to_string()],
//!     artists_raw: "['Someone']".to_string(),
//!     year: Some(2000),
//!     danceability: x,
//!     energy: 1.0 - x,
//!     valence: x * x,
//!     tempo: 100.0 + x * 40.0,
//!     acousticness: (x * 3.0).sin().abs(),
//!     instrumentalness: (x * 5.0).cos().abs(),
//! };
//! let ds = SongDataset::from_records(
//!     (0..8).map(|i| song(&format!("s{}", i), i as f64 / 8.0)).collect(),
//! );
//! let space = SongSpaceBuilder::new().build(ds).unwrap();
//! assert_eq!(space.embedding(0).len(), 5);
//! ```

use std::path::Path;

use smartcore::linalg::basic::{
    arrays::{Array, Array2},
    matrix::DenseMatrix,
};

use crate::builder::SongSpaceBuilder;
use crate::dataset::{SongDataset, SongRecord};
use crate::error::BuildError;
use crate::normalise::MinMaxScaler;
use crate::reduction::PcaProjection;

/// Fitted model: corpus, frozen scaler, frozen projection and the embedding table.
#[derive(Clone, Debug)]
pub struct SongSpace {
    pub(crate) dataset: SongDataset,
    pub(crate) scaler: MinMaxScaler,
    pub(crate) projection: PcaProjection,
    pub(crate) embeddings: DenseMatrix<f64>,
}

impl SongSpace {
    /// Assembles a model from already-fitted parts.
    ///
    /// # Panics
    ///
    /// Panics if the embedding table is not aligned with the dataset.
    pub(crate) fn new(
        dataset: SongDataset,
        scaler: MinMaxScaler,
        projection: PcaProjection,
        embeddings: DenseMatrix<f64>,
    ) -> Self {
        assert_eq!(
            embeddings.shape(),
            (dataset.len(), projection.reduced_dim()),
            "embedding table must have one row per song"
        );
        Self {
            dataset,
            scaler,
            projection,
            embeddings,
        }
    }

    /// Loads a CSV corpus and fits the model with default settings.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        SongSpaceBuilder::new().build_from_path(path)
    }

    /// Number of songs in the corpus.
    #[inline]
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    #[inline]
    pub fn dataset(&self) -> &SongDataset {
        &self.dataset
    }

    #[inline]
    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    #[inline]
    pub fn projection(&self) -> &PcaProjection {
        &self.projection
    }

    /// The whole N×r embedding table.
    #[inline]
    pub fn embeddings(&self) -> &DenseMatrix<f64> {
        &self.embeddings
    }

    /// Embedding dimensionality.
    #[inline]
    pub fn dim(&self) -> usize {
        self.projection.reduced_dim()
    }

    /// Record at row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[inline]
    pub fn song(&self, i: usize) -> &SongRecord {
        self.dataset.get(i)
    }

    /// Owned copy of the embedding of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[inline]
    pub fn embedding(&self, i: usize) -> Vec<f64> {
        assert!(i < self.len(), "Song index out of bounds");
        self.embeddings.get_row(i).iterator(0).copied().collect()
    }

    /// Case-insensitive exact name lookup; first occurrence in load order.
    #[inline]
    pub fn resolve(&self, song_name: &str) -> Option<usize> {
        self.dataset.find_by_name(song_name)
    }

    /// Similarity between two songs of the corpus.
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        crate::operators::cosine_similarity(&self.embedding(a), &self.embedding(b))
    }
}
