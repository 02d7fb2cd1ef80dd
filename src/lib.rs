//! # songspace
//!
//! Content-based song recommendations over a tabular audio-feature corpus.
//!
//! The corpus is loaded once ([`dataset`]), six audio features are min-max scaled
//! ([`normalise`]), a 5-component PCA is fitted over all songs ([`reduction`]) and the
//! resulting embedding table is frozen inside a [`core::SongSpace`]. Queries
//! ([`recommend`]) filter the corpus with bounds derived from the queried song's own
//! year, energy and valence, then rank by cosine similarity ([`operators`]).
//!
//! ```no_run
//! use songspace::core::SongSpace;
//! use songspace::recommend::QueryParams;
//!
//! let space = SongSpace::from_path("data.csv").unwrap();
//! let recs = space.recommend("Clair de Lune", &QueryParams::default()).unwrap();
//! for song in recs.songs() {
//!     println!("{} ({}) {:.3}", song.name, song.year, song.similarity);
//! }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod dataset;
pub mod error;
pub mod normalise;
pub mod operators;
pub mod recommend;
pub mod reduction;
pub mod shared;

#[cfg(test)]
mod tests;

pub use builder::SongSpaceBuilder;
pub use error::{BuildError, DataLoadError, RecommendError, ReductionError};
pub use recommend::{QueryParams, Recommendation, RecommendedSong};
