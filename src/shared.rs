//! Read-write-locked handle for serving a `SongSpace` from several threads.
//!
//! Queries take the read lock just long enough to clone the inner `Arc`, then run
//! lock-free on that snapshot. A reload fits the new model outside the lock and only
//! takes the write lock to swap it in, so a failed reload leaves the current model
//! serving and readers never observe a half-built corpus.

use std::path::Path;
use std::sync::{Arc, RwLock};

use log::{info, warn};

use crate::builder::SongSpaceBuilder;
use crate::core::SongSpace;
use crate::error::{BuildError, RecommendError};
use crate::recommend::{QueryParams, Recommendation};

#[derive(Clone, Debug)]
pub struct SharedSongSpace {
    inner: Arc<RwLock<Arc<SongSpace>>>,
}

impl SharedSongSpace {
    pub fn new(space: SongSpace) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(space))),
        }
    }

    /// The model currently served.
    pub fn snapshot(&self) -> Arc<SongSpace> {
        // the guarded value is an immutable Arc, a poisoned lock still holds a valid model
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn recommend(
        &self,
        song_name: &str,
        params: &QueryParams,
    ) -> Result<Recommendation, RecommendError> {
        self.snapshot().recommend(song_name, params)
    }

    /// Swaps in an already-built model.
    pub fn replace(&self, space: SongSpace) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(space);
        info!("SongSpace replaced: now serving {} songs", guard.len());
    }

    /// Rebuilds from a CSV file and swaps it in on success.
    pub fn reload_from_path<P: AsRef<Path>>(
        &self,
        builder: SongSpaceBuilder,
        path: P,
    ) -> Result<(), BuildError> {
        match builder.build_from_path(path) {
            Ok(space) => {
                self.replace(space);
                Ok(())
            }
            Err(e) => {
                warn!("Reload failed, keeping the current corpus: {}", e);
                Err(e)
            }
        }
    }
}
