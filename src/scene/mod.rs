//! Interfaces to the model/renderer scene that owns GPU-side resources
//!
//! The placements system never owns models or renderers. It asks the scene
//! to create them by name and refers to them through the returned ids.

pub mod drawables;
#[cfg(test)]
pub(crate) mod mock;

use crate::core::types::Affine3A;
use crate::math::Aabb;

pub use drawables::{BuildMetrics, DrawablesBuilder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(pub u64);

/// Identifies a GPU command list; resources are valid once it completes
pub type CommandListId = u64;

/// Readiness of an asynchronously prepared asset
#[derive(Clone, Debug, PartialEq)]
pub enum AssetState<T> {
    Pending,
    Ready(T),
    Invalid(String),
}

impl<T> AssetState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, AssetState::Pending)
    }

    pub fn ready(self) -> Option<T> {
        match self {
            AssetState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelInfo {
    /// Bounding box in model local space
    pub bounding_box: Aabb,
}

/// Model and renderer factory.
///
/// `create_model` and `create_renderer` must return the same id when asked
/// for the same name (and material) again.
pub trait ModelScene: Send + Sync {
    fn create_model(&self, model: &str) -> ModelId;
    fn create_renderer(&self, model: ModelId, material: &str) -> RendererId;
    fn model_info(&self, model: ModelId) -> AssetState<ModelInfo>;
    /// Ready with the command list that must complete before drawing
    fn renderer_state(&self, renderer: RendererId) -> AssetState<CommandListId>;
}

/// Sink for instanced draw calls
pub trait DrawablesPacket {
    /// One instanced draw of `renderer`. `view_masks`, when present, has one
    /// bitmask of visible views per instance.
    fn push_instances(&mut self, renderer: RendererId, local_to_world: &[Affine3A], view_masks: Option<&[u32]>);
}

/// A packet that records every call, useful for tools and tests
#[derive(Clone, Debug, Default)]
pub struct RecordedDrawables {
    pub draws: Vec<RecordedDraw>,
}

#[derive(Clone, Debug)]
pub struct RecordedDraw {
    pub renderer: RendererId,
    pub local_to_world: Vec<Affine3A>,
    pub view_masks: Option<Vec<u32>>,
}

impl RecordedDrawables {
    pub fn instance_count(&self) -> usize {
        self.draws.iter().map(|d| d.local_to_world.len()).sum()
    }
}

impl DrawablesPacket for RecordedDrawables {
    fn push_instances(&mut self, renderer: RendererId, local_to_world: &[Affine3A], view_masks: Option<&[u32]>) {
        self.draws.push(RecordedDraw {
            renderer,
            local_to_world: local_to_world.to_vec(),
            view_masks: view_masks.map(<[u32]>::to_vec),
        });
    }
}
