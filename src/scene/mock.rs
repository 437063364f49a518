//! In-memory scene for tests

use std::collections::HashMap;
use std::sync::Mutex;

use super::{AssetState, CommandListId, ModelId, ModelInfo, ModelScene, RendererId};
use crate::core::types::Vec3;
use crate::math::Aabb;

#[derive(Default)]
struct Inner {
    models: Vec<String>,
    renderers: Vec<(String, String)>,
    model_states: HashMap<String, AssetState<ModelInfo>>,
    renderer_states: HashMap<(String, String), AssetState<CommandListId>>,
}

/// Models default to ready with a unit box around the origin; renderers
/// default to ready on command list 1.
#[derive(Default)]
pub(crate) struct MockScene {
    inner: Mutex<Inner>,
}

impl MockScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_bounding_box() -> Aabb {
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    pub fn set_model_bounding_box(&self, model: &str, bounding_box: Aabb) {
        self.set_model_state(model, AssetState::Ready(ModelInfo { bounding_box }));
    }

    pub fn set_model_state(&self, model: &str, state: AssetState<ModelInfo>) {
        self.inner.lock().unwrap().model_states.insert(model.to_string(), state);
    }

    pub fn set_renderer_state(&self, model: &str, material: &str, state: AssetState<CommandListId>) {
        self.inner
            .lock()
            .unwrap()
            .renderer_states
            .insert((model.to_string(), material.to_string()), state);
    }

    pub fn renderer_count(&self) -> usize {
        self.inner.lock().unwrap().renderers.len()
    }
}

impl ModelScene for MockScene {
    fn create_model(&self, model: &str) -> ModelId {
        let mut inner = self.inner.lock().unwrap();
        let index = match inner.models.iter().position(|m| m == model) {
            Some(index) => index,
            None => {
                inner.models.push(model.to_string());
                inner.models.len() - 1
            }
        };
        ModelId(index as u64)
    }

    fn create_renderer(&self, model: ModelId, material: &str) -> RendererId {
        let mut inner = self.inner.lock().unwrap();
        let key = (inner.models[model.0 as usize].clone(), material.to_string());
        let index = match inner.renderers.iter().position(|r| *r == key) {
            Some(index) => index,
            None => {
                inner.renderers.push(key);
                inner.renderers.len() - 1
            }
        };
        RendererId(index as u64)
    }

    fn model_info(&self, model: ModelId) -> AssetState<ModelInfo> {
        let inner = self.inner.lock().unwrap();
        let name = &inner.models[model.0 as usize];
        inner
            .model_states
            .get(name)
            .cloned()
            .unwrap_or(AssetState::Ready(ModelInfo { bounding_box: Self::default_bounding_box() }))
    }

    fn renderer_state(&self, renderer: RendererId) -> AssetState<CommandListId> {
        let inner = self.inner.lock().unwrap();
        let key = &inner.renderers[renderer.0 as usize];
        inner.renderer_states.get(key).cloned().unwrap_or(AssetState::Ready(1))
    }
}
