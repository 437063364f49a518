//! LRU cache of cell renderers
//!
//! Maps a cell id to a shared future of its [`ImmutableCellRenderer`]. The
//! first query for a cell starts the background load; later queries attach
//! to the same future. When the cache is full, the least recently queried
//! cell is evicted. A load that is still running when evicted finishes on
//! the runtime and is then dropped.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::runtime::Runtime;

use super::loader::{LoadSettings, load_cell};
use crate::cell::is_editor_only;
use crate::cell_renderer::ImmutableCellRenderer;
use crate::config::PlacementsConfig;
use crate::core::error::Error;
use crate::core::types::{CellId, Result};
use crate::scaffold::disk_io::cell_path;
use crate::scene::ModelScene;

/// Outcome of a cell load. Errors are shared between every waiter.
pub type CellLoadResult = std::result::Result<Arc<ImmutableCellRenderer>, Arc<Error>>;

/// Cloneable handle on a cell load
pub type CellFuture = Shared<BoxFuture<'static, CellLoadResult>>;

/// LRU cache of cell renderers
///
/// Owns the background runtime that cell loads run on. Access is from a
/// single thread; the load tasks only ever write into their own futures.
pub struct PlacementsCache {
    /// Map of cell ids to their (possibly pending) renderers
    entries: HashMap<CellId, CellFuture>,
    /// Access order: oldest first, newest last
    access_order: Vec<CellId>,
    /// Maximum number of cells to keep
    capacity: usize,
    config: PlacementsConfig,
    scene: Arc<dyn ModelScene>,
    runtime: Runtime,
}

impl PlacementsCache {
    pub fn new(config: PlacementsConfig, scene: Arc<dyn ModelScene>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads.max(1))
            .thread_name("placements-loader")
            .enable_all()
            .build()
            .map_err(|e| Error::Runtime(format!("failed to create loader runtime: {e}")))?;
        let capacity = config.cache_capacity.max(1);
        Ok(Self {
            entries: HashMap::with_capacity(capacity),
            access_order: Vec::with_capacity(capacity),
            capacity,
            config,
            scene,
            runtime,
        })
    }

    pub fn config(&self) -> &PlacementsConfig {
        &self.config
    }

    pub fn scene(&self) -> &Arc<dyn ModelScene> {
        &self.scene
    }

    /// Future resolving to the cell's renderer, starting the load if needed
    pub fn get_cell_renderer_future(&mut self, key: CellId, filename: &str) -> CellFuture {
        if let Some(future) = self.entries.get(&key).cloned() {
            self.update_access_order(key);
            return future;
        }

        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let future = self.begin_load(filename);
        self.entries.insert(key, future.clone());
        self.access_order.push(key);
        future
    }

    /// The cell's renderer if it has finished loading. None while pending
    /// or after a failed load; never blocks.
    pub fn try_get_cell_renderer(&mut self, key: CellId, filename: &str) -> Option<Arc<ImmutableCellRenderer>> {
        match self.get_cell_renderer_future(key, filename).now_or_never() {
            Some(Ok(cell)) => Some(cell),
            Some(Err(_)) | None => None,
        }
    }

    /// Block until the cell is loaded. Tooling paths only.
    pub fn stall_for_cell(&mut self, key: CellId, filename: &str) -> Result<Arc<ImmutableCellRenderer>> {
        let future = self.get_cell_renderer_future(key, filename);
        self.stall(future)?.map_err(|e| Error::CellLoad {
            cell: filename.to_string(),
            reason: e.to_string(),
        })
    }

    /// Run a future to completion on the loader runtime, giving up after
    /// the configured stall timeout.
    pub fn stall<F: Future>(&self, future: F) -> Result<F::Output> {
        let timeout = self.config.stall_timeout();
        self.runtime
            .block_on(async { tokio::time::timeout(timeout, future).await })
            .map_err(|_| Error::Timeout(timeout))
    }

    /// Spawn a background task on the loader runtime
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    fn begin_load(&self, filename: &str) -> CellFuture {
        if is_editor_only(filename) {
            let error = Arc::new(Error::CellLoad {
                cell: filename.to_string(),
                reason: "editor-only cell has no placements file".to_string(),
            });
            return futures::future::ready::<CellLoadResult>(Err(error)).boxed().shared();
        }

        let path = cell_path(&self.config.data_root, filename);
        let settings = LoadSettings {
            leaf_threshold: self.config.quad_tree_leaf_threshold,
            poll_interval: self.config.poll_interval(),
        };
        let handle = self.runtime.spawn(load_cell(path, self.scene.clone(), settings));
        let filename = filename.to_string();
        async move {
            match handle.await {
                Ok(Ok(cell)) => Ok(cell),
                Ok(Err(e)) => {
                    log::warn!("Failed to load placements cell {filename}: {e}");
                    Err(Arc::new(e))
                }
                Err(e) => Err(Arc::new(Error::Runtime(format!("cell load task for {filename} failed: {e}")))),
            }
        }
        .boxed()
        .shared()
    }

    /// Drop a cell so the next query reloads it
    pub fn invalidate(&mut self, key: CellId) -> bool {
        self.remove_from_access_order(key);
        self.entries.remove(&key).is_some()
    }

    /// Check if the cache holds an entry (pending, loaded or failed) for a cell
    pub fn contains(&self, key: CellId) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Evict the least recently queried cell
    fn evict_oldest(&mut self) -> Option<CellId> {
        let key = self.access_order.first().copied()?;
        self.invalidate(key);
        log::debug!("Evicted placements cell 0x{key:016x}");
        Some(key)
    }

    /// Update access order by moving a key to the end (most recent)
    fn update_access_order(&mut self, key: CellId) {
        self.remove_from_access_order(key);
        self.access_order.push(key);
    }

    fn remove_from_access_order(&mut self, key: CellId) {
        if let Some(pos) = self.access_order.iter().position(|&k| k == key) {
            self.access_order.remove(pos);
        }
    }
}
