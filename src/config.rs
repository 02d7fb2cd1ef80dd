use std::path::PathBuf;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::recommend::QueryParams;
use crate::reduction::DEFAULT_COMPONENTS;

/// Configuration of the interactive recommender, loaded from environment variables.
///
/// All settings use the `SONGSPACE_` prefix and `__` for nesting, e.g.
/// `SONGSPACE_DATASET=data.csv`, `SONGSPACE_QUERY__TOP_N=21`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// CSV file with the song corpus
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,

    /// Embedding dimensionality
    #[serde(default = "default_components")]
    pub components: usize,

    /// Filters applied to every console query
    #[serde(default)]
    pub query: QueryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            components: default_components(),
            query: QueryConfig::default(),
        }
    }
}

fn default_dataset() -> PathBuf {
    PathBuf::from("data.csv")
}

fn default_components() -> usize {
    DEFAULT_COMPONENTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_year_tolerance")]
    pub year_tolerance: u32,

    #[serde(default = "default_dynamic_range")]
    pub dynamic_range: f64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            year_tolerance: default_year_tolerance(),
            dynamic_range: default_dynamic_range(),
        }
    }
}

fn default_top_n() -> usize {
    21
}

fn default_year_tolerance() -> u32 {
    2
}

fn default_dynamic_range() -> f64 {
    0.1
}

impl QueryConfig {
    pub fn params(&self) -> QueryParams {
        QueryParams::new(self.top_n, self.year_tolerance, self.dynamic_range)
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SONGSPACE_DATASET` -> dataset
    /// - `SONGSPACE_COMPONENTS` -> components
    /// - `SONGSPACE_QUERY__TOP_N` -> query.top_n
    /// - `SONGSPACE_QUERY__YEAR_TOLERANCE` -> query.year_tolerance
    /// - `SONGSPACE_QUERY__DYNAMIC_RANGE` -> query.dynamic_range
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("SONGSPACE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
