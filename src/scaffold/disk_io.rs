//! Placements chunk file I/O

use std::path::{Path, PathBuf};

use super::PlacementsScaffold;
use crate::core::error::Error;
use crate::core::types::Result;

/// Resolve a cell's placements filename against the data root
pub fn cell_path(data_root: &Path, filename: &str) -> PathBuf {
    data_root.join(filename)
}

/// Read and parse a chunk. Errors carry the file name.
pub async fn load_scaffold(path: &Path) -> Result<PlacementsScaffold> {
    let data = tokio::fs::read(path).await.map_err(|e| Error::CellLoad {
        cell: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let scaffold = PlacementsScaffold::from_bytes(&data)?;
    scaffold.log_details(&path.display().to_string());
    Ok(scaffold)
}

/// Write a chunk, creating parent directories as needed
pub async fn save_scaffold(path: &Path, scaffold: &PlacementsScaffold) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, scaffold.serialize()).await?;
    log::info!("Wrote {} placements to {}", scaffold.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_path() {
        let path = cell_path(Path::new("/data/world"), "cells/c0_0.plcs");
        assert_eq!(path, PathBuf::from("/data/world/cells/c0_0.plcs"));
    }

    #[tokio::test]
    async fn test_save_and_load_scaffold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cell.plcs");
        let mut scaffold = PlacementsScaffold::new();
        scaffold.add_string("models/tree.mdl");
        save_scaffold(&path, &scaffold).await.unwrap();
        let loaded = load_scaffold(&path).await.unwrap();
        assert_eq!(loaded, scaffold);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_scaffold(&dir.path().join("missing.plcs")).await;
        assert!(matches!(result, Err(Error::CellLoad { .. })));
    }
}
