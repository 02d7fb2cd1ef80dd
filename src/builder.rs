use std::path::Path;

use log::{debug, info};

use crate::core::SongSpace;
use crate::dataset::SongDataset;
use crate::error::BuildError;
use crate::normalise::MinMaxScaler;
use crate::reduction::{project_matrix, PcaProjection, DEFAULT_COMPONENTS};

/// Configures and runs the one-shot fit pipeline:
/// raw features -> min-max scaling -> PCA fit -> embedding table.
#[derive(Clone, Debug)]
pub struct SongSpaceBuilder {
    n_components: usize,
}

impl Default for SongSpaceBuilder {
    fn default() -> Self {
        debug!("Creating SongSpaceBuilder with default parameters");
        Self {
            n_components: DEFAULT_COMPONENTS,
        }
    }
}

impl SongSpaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of PCA components kept in the embeddings (default 5).
    pub fn with_components(mut self, n_components: usize) -> Self {
        info!("Setting embedding components: {}", n_components);
        self.n_components = n_components;
        self
    }

    /// Loads the CSV at `path`, then builds.
    pub fn build_from_path<P: AsRef<Path>>(self, path: P) -> Result<SongSpace, BuildError> {
        let dataset = SongDataset::from_path(path)?;
        self.build(dataset)
    }

    /// Fits the scaler and projection once over `dataset` and embeds every song.
    ///
    /// Any failure aborts the build; nothing partially fitted is returned.
    pub fn build(self, dataset: SongDataset) -> Result<SongSpace, BuildError> {
        if dataset.is_empty() {
            return Err(BuildError::EmptyCorpus);
        }
        info!(
            "Building SongSpace from {} songs with {} components",
            dataset.len(),
            self.n_components
        );

        let raw = dataset.feature_matrix();
        let (scaler, normalised) = MinMaxScaler::fit_transform(&raw);
        debug!("Features normalised");

        let projection = PcaProjection::fit(&normalised, self.n_components)?;
        let embeddings = project_matrix(&normalised, &projection);
        debug!("Embedding table computed");

        let space = SongSpace::new(dataset, scaler, projection, embeddings);
        info!("SongSpace ready: {} songs x {} dims", space.len(), space.dim());
        Ok(space)
    }
}
