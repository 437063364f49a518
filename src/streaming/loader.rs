//! Background construction of cell renderers

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::poll::poll_until;
use crate::cell_renderer::{CellRenderer, ImmutableCellRenderer};
use crate::core::types::Result;
use crate::scaffold::disk_io::load_scaffold;
use crate::scene::{AssetState, ModelScene};

/// Settings the loader task needs, copied out of the cache config
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoadSettings {
    pub leaf_threshold: usize,
    pub poll_interval: Duration,
}

/// Load one cell: read and parse its scaffold, build the quad tree and
/// renderers, then wait until the scene has finished preparing every
/// renderer. Renderers that end up invalid are logged and left in place.
pub(crate) async fn load_cell(
    path: PathBuf,
    scene: Arc<dyn ModelScene>,
    settings: LoadSettings,
) -> Result<Arc<ImmutableCellRenderer>> {
    let scaffold = load_scaffold(&path).await?;

    let cell = ImmutableCellRenderer::new(scaffold, scene.as_ref(), settings.leaf_threshold);
    poll_until(
        || cell.renderers().iter().all(|r| !scene.renderer_state(r.renderer).is_pending()),
        settings.poll_interval,
    )
    .await;

    for r in cell.renderers() {
        if let AssetState::Invalid(reason) = scene.renderer_state(r.renderer) {
            log::warn!(
                "Invalid renderer for {} / {} in {}: {reason}",
                r.model_name,
                r.material_name,
                path.display()
            );
        }
    }
    log::debug!("Loaded placements cell {}", path.display());
    Ok(Arc::new(cell))
}
