//! Batching visible instances into a drawables packet

use super::{AssetState, CommandListId, DrawablesPacket, ModelScene, RendererId};
use crate::core::types::Affine3A;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildMetrics {
    pub instances_prepared: u64,
    pub unique_models_prepared: u64,
}

/// Submits one instanced call per renderer run and tracks the latest
/// completion command list among the renderers it used.
pub struct DrawablesBuilder<'a> {
    scene: &'a dyn ModelScene,
    packet: &'a mut dyn DrawablesPacket,
    completion_cmd_list: CommandListId,
    metrics: BuildMetrics,
}

impl<'a> DrawablesBuilder<'a> {
    pub fn new(scene: &'a dyn ModelScene, packet: &'a mut dyn DrawablesPacket) -> Self {
        Self { scene, packet, completion_cmd_list: 0, metrics: BuildMetrics::default() }
    }

    /// Whether `renderer` can be drawn this frame
    pub fn is_ready(&self, renderer: RendererId) -> bool {
        matches!(self.scene.renderer_state(renderer), AssetState::Ready(_))
    }

    /// Submit instances. Renderers that are not ready are skipped; returns
    /// whether anything was submitted.
    pub fn add_instances(&mut self, renderer: RendererId, local_to_world: &[Affine3A], view_masks: Option<&[u32]>) -> bool {
        if local_to_world.is_empty() {
            return false;
        }
        let AssetState::Ready(cmd_list) = self.scene.renderer_state(renderer) else {
            return false;
        };
        self.packet.push_instances(renderer, local_to_world, view_masks);
        self.completion_cmd_list = self.completion_cmd_list.max(cmd_list);
        self.metrics.instances_prepared += local_to_world.len() as u64;
        self.metrics.unique_models_prepared += 1;
        true
    }

    pub fn completion_cmd_list(&self) -> CommandListId {
        self.completion_cmd_list
    }

    pub fn metrics(&self) -> BuildMetrics {
        self.metrics
    }
}
