//! Song-relative dynamic filtering and ranking.
//!
//! A query names a song; the bounds used to pick candidates are derived from that
//! song's own attributes rather than fixed thresholds:
//!
//! - year window: `|year - base.year| <= year_tolerance`
//! - energy: `[base.energy - dynamic_range, base.energy + dynamic_range]` (inclusive)
//! - valence: `[base.valence - dynamic_range, base.valence + dynamic_range]` (inclusive)
//!
//! Ranges are not clamped to [0, 1]. A song without a year never passes the year
//! window; when the queried song itself has no year nothing passes and the outcome is
//! `Recommendation::NoSimilarSongs`. Candidates passing all three are scored by
//! cosine similarity of their embeddings against the base song, then:
//!
//! 1. stable sort by similarity, descending (ties keep load order),
//! 2. the base row itself is dropped,
//! 3. the list is cut to `top_n`,
//! 4. repeats of an earlier `(name, artists)` pair are dropped.
//!
//! De-duplication happens after the cut and is not backfilled, so fewer than
//! `top_n` songs can come back even when more candidates exist.

use std::cmp::Ordering;
use std::collections::HashSet;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::SongSpace;
use crate::dataset::SongRecord;
use crate::error::RecommendError;
use crate::operators::score_candidates;

/// Per-query knobs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Maximum number of songs returned.
    pub top_n: usize,
    /// Allowed distance in years from the base song.
    pub year_tolerance: u32,
    /// Half-width of the energy and valence windows.
    pub dynamic_range: f64,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            top_n: 10,
            year_tolerance: 2,
            dynamic_range: 0.1,
        }
    }
}

impl QueryParams {
    pub fn new(top_n: usize, year_tolerance: u32, dynamic_range: f64) -> Self {
        Self {
            top_n,
            year_tolerance,
            dynamic_range,
        }
    }

    fn validate(&self) -> Result<(), RecommendError> {
        if !self.dynamic_range.is_finite() || self.dynamic_range < 0.0 {
            return Err(RecommendError::InvalidQuery(format!(
                "dynamic_range must be a finite value >= 0, got {}",
                self.dynamic_range
            )));
        }
        Ok(())
    }
}

/// Bounds derived from the base song for a single request.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryContext {
    /// Row of the resolved base song.
    pub index: usize,
    pub year: Option<i32>,
    pub energy: f64,
    pub valence: f64,
    pub year_tolerance: u32,
    pub energy_range: (f64, f64),
    pub valence_range: (f64, f64),
}

impl QueryContext {
    fn new(index: usize, base: &SongRecord, params: &QueryParams) -> Self {
        let r = params.dynamic_range;
        Self {
            index,
            year: base.year,
            energy: base.energy,
            valence: base.valence,
            year_tolerance: params.year_tolerance,
            energy_range: (base.energy - r, base.energy + r),
            valence_range: (base.valence - r, base.valence + r),
        }
    }

    /// True if `song` passes the year, energy and valence bounds.
    #[inline]
    pub fn admits(&self, song: &SongRecord) -> bool {
        let year_ok = match (song.year, self.year) {
            (Some(year), Some(base)) => {
                (i64::from(year) - i64::from(base)).abs() <= i64::from(self.year_tolerance)
            }
            _ => false,
        };
        year_ok
            && within(song.energy, self.energy_range)
            && within(song.valence, self.valence_range)
    }
}

#[inline]
fn within(value: f64, (lo, hi): (f64, f64)) -> bool {
    lo <= value && value <= hi
}

/// One recommended song.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendedSong {
    /// Dataset row.
    pub index: usize,
    pub name: String,
    pub artists: Vec<String>,
    pub year: i32,
    pub energy: f64,
    pub valence: f64,
    /// Cosine similarity to the base song used for ranking.
    pub similarity: f64,
}

impl RecommendedSong {
    /// `None` for a song without a year, which cannot have passed the filters.
    fn from_record(index: usize, song: &SongRecord, similarity: f64) -> Option<Self> {
        Some(Self {
            index,
            name: song.name.clone(),
            artists: song.artists.clone(),
            year: song.year?,
            energy: song.energy,
            valence: song.valence,
            similarity,
        })
    }
}

/// Outcome of a resolved query.
#[derive(Clone, Debug, PartialEq)]
pub enum Recommendation {
    /// Ranked songs; may be empty (e.g. `top_n == 0` or only the base song matched).
    Songs(Vec<RecommendedSong>),
    /// No row passed the dynamic filters.
    NoSimilarSongs,
}

impl Recommendation {
    /// The ranked songs, empty for `NoSimilarSongs`.
    pub fn songs(&self) -> &[RecommendedSong] {
        match self {
            Self::Songs(songs) => songs,
            Self::NoSimilarSongs => &[],
        }
    }

    pub fn into_songs(self) -> Vec<RecommendedSong> {
        match self {
            Self::Songs(songs) => songs,
            Self::NoSimilarSongs => Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.songs().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.songs().is_empty()
    }
}

impl SongSpace {
    /// Resolves `song_name` and derives the filter bounds for `params`.
    pub fn query_context(
        &self,
        song_name: &str,
        params: &QueryParams,
    ) -> Result<QueryContext, RecommendError> {
        params.validate()?;
        let index = self
            .resolve(song_name)
            .ok_or_else(|| RecommendError::NotFound(song_name.to_string()))?;
        let ctx = QueryContext::new(index, self.song(index), params);
        debug!(
            "Query '{}' -> row {}: year {:?}±{}, energy {:?}, valence {:?}",
            song_name, index, ctx.year, ctx.year_tolerance, ctx.energy_range, ctx.valence_range
        );
        Ok(ctx)
    }

    /// Rows passing the dynamic filters, in load order. Includes the base row.
    pub fn candidates(&self, ctx: &QueryContext) -> Vec<usize> {
        self.dataset
            .iter()
            .enumerate()
            .filter(|(_, song)| ctx.admits(song))
            .map(|(i, _)| i)
            .collect()
    }

    /// Recommends up to `params.top_n` songs similar to `song_name`.
    ///
    /// Returns `RecommendError::NotFound` when no song has that name (case-insensitive),
    /// and `Recommendation::NoSimilarSongs` when nothing passes the filters.
    pub fn recommend(
        &self,
        song_name: &str,
        params: &QueryParams,
    ) -> Result<Recommendation, RecommendError> {
        let ctx = self.query_context(song_name, params)?;

        let candidates = self.candidates(&ctx);
        debug!("{} candidates passed the dynamic filters", candidates.len());
        if candidates.is_empty() {
            info!("No similar songs for '{}' with the current filters", song_name);
            return Ok(Recommendation::NoSimilarSongs);
        }

        let query = self.embedding(ctx.index);
        let mut scored = score_candidates(&query, &self.embeddings, &candidates);
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let ranked: Vec<(usize, f64)> = scored
            .into_iter()
            .filter(|&(i, _)| i != ctx.index)
            .take(params.top_n)
            .collect();

        let mut seen: HashSet<(&str, &str)> = HashSet::with_capacity(ranked.len());
        let songs: Vec<RecommendedSong> = ranked
            .into_iter()
            .filter(|&(i, _)| seen.insert(self.song(i).identity()))
            .filter_map(|(i, sim)| RecommendedSong::from_record(i, self.song(i), sim))
            .collect();

        info!("Recommending {} songs for '{}'", songs.len(), song_name);
        Ok(Recommendation::Songs(songs))
    }
}
