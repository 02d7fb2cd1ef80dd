//! Song dataset ingestion.
//!
//! Reads a CSV table of songs into memory with stable row indices (row `i` is the
//! `i`-th data record of the file). The header row locates the required columns:
//!
//! `name, artists, year, danceability, energy, valence, tempo, acousticness, instrumentalness`
//!
//! Any other column is accepted and ignored. No validation beyond parsing is
//! performed: duplicated songs are kept, an empty feature cell is loaded as `NaN`
//! and an empty year as `None`, both left for the downstream stages to deal with.
//!
//! # Examples
//!
//! ```
//! use songspace::dataset::SongDataset;
//!
//! let csv = "name,artists,year,danceability,energy,valence,tempo,acousticness,instrumentalness\n\
//!            Clair de Lune,['Claude Debussy'],1905,0.2,0.1,0.3,70.0,0.99,0.9\n";
//! let ds = SongDataset::from_reader(csv.as_bytes()).unwrap();
//! assert_eq!(ds.len(), 1);
//! assert_eq!(ds.get(0).artists, vec!["Claude Debussy".to_string()]);
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info, trace, warn};
use serde::Serialize;
use smartcore::linalg::basic::{arrays::Array2, matrix::DenseMatrix};

use crate::error::DataLoadError;

/// Audio features fed to the normaliser, in matrix column order.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "danceability",
    "energy",
    "valence",
    "tempo",
    "acousticness",
    "instrumentalness",
];

/// Number of audio features per song.
pub const N_FEATURES: usize = FEATURE_COLUMNS.len();

/// One row of the dataset. Immutable once loaded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SongRecord {
    pub name: String,
    pub artists: Vec<String>,
    /// The artists cell exactly as it appeared in the source.
    #[serde(skip)]
    pub artists_raw: String,
    /// `None` when the cell was empty; such a song never passes a year window.
    pub year: Option<i32>,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl SongRecord {
    /// Audio features in `FEATURE_COLUMNS` order.
    #[inline]
    pub fn features(&self) -> [f64; N_FEATURES] {
        [
            self.danceability,
            self.energy,
            self.valence,
            self.tempo,
            self.acousticness,
            self.instrumentalness,
        ]
    }

    /// Identity used for de-duplicating recommendations: the name and the artists
    /// cell text, so `['A']` and `["A"]` count as different songs.
    #[inline]
    pub fn identity(&self) -> (&str, &str) {
        (self.name.as_str(), self.artists_raw.as_str())
    }
}

/// Column positions of the required fields inside a CSV record.
struct ColumnIndex {
    name: usize,
    artists: usize,
    year: usize,
    features: [usize; N_FEATURES],
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DataLoadError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or(DataLoadError::MissingColumn(column))
        };

        let mut features = [0usize; N_FEATURES];
        for (slot, column) in features.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = find(column)?;
        }

        Ok(Self {
            name: find("name")?,
            artists: find("artists")?,
            year: find("year")?,
            features,
        })
    }
}

/// In-memory song table with a case-insensitive name index.
#[derive(Clone, Debug, Default)]
pub struct SongDataset {
    records: Vec<SongRecord>,
    // lowercased name -> first row carrying it
    name_index: HashMap<String, usize>,
}

impl SongDataset {
    /// Builds a dataset from already-parsed records, keeping their order.
    pub fn from_records(records: Vec<SongRecord>) -> Self {
        let mut name_index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            name_index.entry(record.name.to_lowercase()).or_insert(i);
        }
        debug!(
            "Indexed {} songs under {} distinct names",
            records.len(),
            name_index.len()
        );
        Self {
            records,
            name_index,
        }
    }

    /// Loads a CSV file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DataLoadError> {
        let path = path.as_ref();
        info!("Loading song dataset from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Loads CSV data from any reader. The first record must be the header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns = ColumnIndex::from_headers(rdr.headers()?)?;

        let mut records = Vec::new();
        let mut missing_cells = 0usize;
        let mut missing_years = 0usize;
        for (row, result) in rdr.records().enumerate() {
            let raw = result?;
            let cell = |i: usize| raw.get(i).unwrap_or("");

            let mut features = [0.0f64; N_FEATURES];
            for (k, (&col, column)) in columns.features.iter().zip(FEATURE_COLUMNS).enumerate() {
                features[k] = match parse_feature(cell(col), row, column)? {
                    Some(v) => v,
                    None => {
                        missing_cells += 1;
                        f64::NAN
                    }
                };
            }

            let year = parse_year(cell(columns.year), row)?;
            if year.is_none() {
                missing_years += 1;
            }

            let artists_raw = cell(columns.artists);
            let record = SongRecord {
                name: cell(columns.name).to_string(),
                artists: parse_artists(artists_raw),
                artists_raw: artists_raw.to_string(),
                year,
                danceability: features[0],
                energy: features[1],
                valence: features[2],
                tempo: features[3],
                acousticness: features[4],
                instrumentalness: features[5],
            };
            trace!("Row {}: {:?}", row, record);
            records.push(record);
        }

        if missing_cells > 0 {
            warn!(
                "{} empty feature cells loaded as NaN; they are not repaired",
                missing_cells
            );
        }
        if missing_years > 0 {
            warn!("{} songs have no year and will never be recommended", missing_years);
        }
        info!("Loaded {} songs", records.len());

        Ok(Self::from_records(records))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the record at row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    #[inline]
    pub fn get(&self, i: usize) -> &SongRecord {
        &self.records[i]
    }

    #[inline]
    pub fn records(&self) -> &[SongRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SongRecord> {
        self.records.iter()
    }

    /// Case-insensitive exact lookup. Returns the first row in load order.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.name_index.get(&name.to_lowercase()).copied()
    }

    /// Row-major N×6 matrix of the raw audio features.
    ///
    /// # Panics
    ///
    /// Panics if the dataset is empty.
    pub fn feature_matrix(&self) -> DenseMatrix<f64> {
        assert!(!self.is_empty(), "cannot build a feature matrix from no songs");
        let flat = self.records.iter().flat_map(|r| r.features());
        DenseMatrix::from_iterator(flat, self.len(), N_FEATURES, 0)
    }
}

impl<'a> IntoIterator for &'a SongDataset {
    type Item = &'a SongRecord;
    type IntoIter = std::slice::Iter<'a, SongRecord>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Parses a feature cell. Empty cells yield `None`.
fn parse_feature(cell: &str, row: usize, column: &'static str) -> Result<Option<f64>, DataLoadError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| DataLoadError::InvalidValue {
            row,
            column,
            value: cell.to_string(),
        })
}

/// Parses the year; integral floats such as `1999.0` are accepted.
/// Empty and `NaN` cells yield `None`.
fn parse_year(cell: &str, row: usize) -> Result<Option<i32>, DataLoadError> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(year) = trimmed.parse::<i32>() {
        return Ok(Some(year));
    }
    match trimmed.parse::<f64>() {
        Ok(y) if y.is_nan() => Ok(None),
        Ok(y) if y.is_finite() && y.fract() == 0.0 && y.abs() <= i32::MAX as f64 => {
            Ok(Some(y as i32))
        }
        _ => Err(DataLoadError::InvalidValue {
            row,
            column: "year",
            value: cell.to_string(),
        }),
    }
}

/// Parses an artists cell.
///
/// The usual encoding is a list literal, e.g. `['Sergei Rachmaninoff', "Guns N' Roses"]`.
/// Anything that is not bracketed is taken as a single artist name.
pub fn parse_artists(cell: &str) -> Vec<String> {
    let trimmed = cell.trim();
    let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    else {
        return if trimmed.is_empty() {
            vec![]
        } else {
            vec![trimmed.to_string()]
        };
    };

    let mut artists = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in inner.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    current.push(c);
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                ',' => flush_artist(&mut artists, &mut current),
                _ => current.push(c),
            },
        }
    }
    flush_artist(&mut artists, &mut current);
    artists
}

fn flush_artist(artists: &mut Vec<String>, current: &mut String) {
    let name = current.trim();
    if !name.is_empty() {
        artists.push(name.to_string());
    }
    current.clear();
}
