use crate::error;
use crate::executor::TaskExecutor;
use crate::source::SourceBandReader;
use crate::storage::TileStore;
use crate::Result;
use geocube_catalogue::store::{Catalogue, Clock, SystemClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation, checked between tiles. None of the engine's
/// operations are cancellation-safe mid-write.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(error::Error::Cancelled);
        }
        Ok(())
    }
}

/// Everything the engine needs to run, passed explicitly: the catalogue, the
/// tile backend, the source reader seam, the executor and the clock. There is
/// no module-scope state.
#[derive(Clone)]
pub struct CoreContext {
    catalogue: Arc<dyn Catalogue>,
    tile_store: Arc<dyn TileStore>,
    source_reader: Arc<dyn SourceBandReader>,
    executor: Arc<dyn TaskExecutor>,
    clock: Arc<dyn Clock>,
}

impl CoreContext {
    pub fn new(
        catalogue: Arc<dyn Catalogue>,
        tile_store: Arc<dyn TileStore>,
        source_reader: Arc<dyn SourceBandReader>,
        executor: Arc<dyn TaskExecutor>,
    ) -> Self {
        Self {
            catalogue,
            tile_store,
            source_reader,
            executor,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalogue(&self) -> &Arc<dyn Catalogue> {
        &self.catalogue
    }

    pub fn tile_store(&self) -> &Arc<dyn TileStore> {
        &self.tile_store
    }

    pub fn source_reader(&self) -> &Arc<dyn SourceBandReader> {
        &self.source_reader
    }

    pub fn executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.executor
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

/// Per-query state: chunking hint, deadline and the cancellation flag the
/// lazy array checks between tile reads
#[derive(Clone, Debug)]
pub struct QueryContext {
    pub chunk_byte_size: usize,
    pub cancellation: CancellationFlag,
    /// Deadline for materialisation; expiry surfaces as a retryable timeout
    pub timeout: Option<std::time::Duration>,
}

impl Default for QueryContext {
    fn default() -> Self {
        Self {
            chunk_byte_size: 1024 * 1024,
            cancellation: CancellationFlag::new(),
            timeout: None,
        }
    }
}
