//! Error taxonomy for loading, fitting and querying a `SongSpace`.
//!
//! Load-time and fit-time errors abort the build: no partial corpus is ever served.
//! Query-time errors are returned per call and never touch the shared model.
//!
//! An empty candidate set after filtering is not an error: see
//! [`Recommendation::NoSimilarSongs`](crate::recommend::Recommendation).

use thiserror::Error;

/// The dataset source could not be turned into a table of songs.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("cannot read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid value {value:?} in column `{column}`")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
}

/// The linear reduction could not be fitted on the normalised corpus.
#[derive(Debug, Error, PartialEq)]
pub enum ReductionError {
    #[error("cannot extract {requested} components from {n_features} features")]
    InvalidComponents {
        requested: usize,
        n_features: usize,
    },

    #[error("need at least {required} rows to fit {required} components, got {n_rows}")]
    InsufficientRows { n_rows: usize, required: usize },

    #[error("non-finite value at row {row}, feature {feature}")]
    NonFinite { row: usize, feature: usize },

    #[error("eigen decomposition did not converge after {0} sweeps")]
    NoConvergence(usize),
}

/// Startup failure: either the corpus could not be loaded or the model could not be fitted.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Load(#[from] DataLoadError),

    #[error(transparent)]
    Reduction(#[from] ReductionError),

    #[error("dataset contains no songs")]
    EmptyCorpus,
}

/// Per-query failure. Recoverable: the caller reports it and keeps serving.
#[derive(Debug, Error, PartialEq)]
pub enum RecommendError {
    #[error("song '{0}' is not in the dataset")]
    NotFound(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
