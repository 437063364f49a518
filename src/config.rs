//! Placements system configuration and the world cell registry file

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;

/// Runtime settings for the placements system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementsConfig {
    /// Directory that cell placements filenames are resolved against
    pub data_root: PathBuf,
    /// Maximum number of cells kept in the LRU cache
    pub cache_capacity: usize,
    /// Largest number of objects in a quad tree leaf
    pub quad_tree_leaf_threshold: usize,
    /// Radius added to cell bounds for intersection queries, since edits can
    /// move objects outside the bounds a cell was registered with
    pub assumed_max_object_radius: f32,
    /// Sleep between readiness polls of pending assets
    pub poll_interval_ms: u64,
    /// Longest time tooling calls block waiting for a cell or asset
    pub stall_timeout_ms: u64,
    /// Background runtime worker threads
    pub worker_threads: usize,
}

impl Default for PlacementsConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("."),
            cache_capacity: 128,
            quad_tree_leaf_threshold: 12,
            assumed_max_object_radius: 100.0,
            poll_interval_ms: 2,
            stall_timeout_ms: 5000,
            worker_threads: 2,
        }
    }
}

impl PlacementsConfig {
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self { data_root: data_root.into(), ..Default::default() }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}

/// One cell entry of the world registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldCellConfig {
    /// Placements filename, relative to the data root
    pub native_file: String,
    /// World-space translation of the cell
    pub offset: [f32; 3],
    /// Capture rectangle and bounds min corner, relative to the world offset
    pub mins: [f32; 3],
    /// Capture rectangle and bounds max corner, relative to the world offset
    pub maxs: [f32; 3],
}

/// World registry of placement cells, loaded once at world initialisation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPlacementsConfig {
    pub cells: Vec<WorldCellConfig>,
}

impl WorldPlacementsConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from file (sync)
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save to file (sync)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
