/// Slotmap-backed owner of primitives, usable as a `RenderableSource`

use slotmap::{new_key_type, SlotMap};
use super::{Primitive, Renderable, RenderableSource};

new_key_type! {
    /// Non-owning reference to a primitive held by the spatial index
    pub struct PrimitiveKey;
}

#[derive(Default)]
pub struct PrimitiveStore {
    primitives: SlotMap<PrimitiveKey, Primitive>,
}

impl PrimitiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, mut primitive: Primitive) -> PrimitiveKey {
        primitive.update_world_aabb();
        self.primitives.insert(primitive)
    }

    pub fn remove(&mut self, key: PrimitiveKey) -> Option<Primitive> {
        self.primitives.remove(key)
    }

    pub fn get(&self, key: PrimitiveKey) -> Option<&Primitive> {
        self.primitives.get(key)
    }

    pub fn get_mut(&mut self, key: PrimitiveKey) -> Option<&mut Primitive> {
        self.primitives.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PrimitiveKey, &Primitive)> {
        self.primitives.iter()
    }
}

impl RenderableSource for PrimitiveStore {
    fn renderable_keys(&self) -> Vec<PrimitiveKey> {
        self.primitives.keys().collect()
    }

    fn renderable(&self, key: PrimitiveKey) -> Option<&dyn Renderable> {
        self.primitives.get(key).map(|p| p as &dyn Renderable)
    }

    fn refresh_world_bounds(&mut self, key: PrimitiveKey) {
        if let Some(primitive) = self.primitives.get_mut(key) {
            primitive.update_world_aabb();
        }
    }
}

#[cfg(test)]
#[path = "primitive_store_tests.rs"]
mod tests;
