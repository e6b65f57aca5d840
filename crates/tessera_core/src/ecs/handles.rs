//! # Handle and Model Stores
//!
//! The two per-entity columns that are not bit-packed fields: the opaque
//! external handle (a sprite, a sound voice, ...) and the model tag.

use super::entity::{Entity, Model};

/// Per-entity optional external handle.
///
/// This is the only place the table keeps a host resource. Clearing a slot
/// drops the handle it held.
pub struct HandleArray<H> {
    slots: Box<[Option<H>]>,
}

impl<H> HandleArray<H> {
    /// Creates an empty store for `entities` entities.
    #[must_use]
    pub fn new(entities: usize) -> Self {
        Self {
            slots: (0..entities).map(|_| None).collect(),
        }
    }

    /// Stores a handle, dropping any previous one.
    #[inline]
    pub fn set(&mut self, entity: Entity, handle: H) {
        self.slots[entity.index()] = Some(handle);
    }

    /// Borrows the handle of an entity.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&H> {
        self.slots[entity.index()].as_ref()
    }

    /// Mutably borrows the handle of an entity.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut H> {
        self.slots[entity.index()].as_mut()
    }

    /// Checks if the entity holds a handle.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.slots[entity.index()].is_some()
    }

    /// Removes and returns the handle of an entity.
    #[inline]
    pub fn take(&mut self, entity: Entity) -> Option<H> {
        self.slots[entity.index()].take()
    }

    /// Drops the handle of an entity, if any.
    #[inline]
    pub fn clear(&mut self, entity: Entity) {
        self.slots[entity.index()] = None;
    }
}

/// Per-entity model tag; [`Model::NONE`] marks free rows.
pub struct ModelArray {
    models: Box<[Model]>,
}

impl ModelArray {
    /// Creates a store with every row set to [`Model::NONE`].
    #[must_use]
    pub fn new(entities: usize) -> Self {
        Self {
            models: vec![Model::NONE; entities].into_boxed_slice(),
        }
    }

    /// Records the model of a freshly created entity.
    #[inline]
    pub fn add(&mut self, entity: Entity, model: Model) {
        self.models[entity.index()] = model;
    }

    /// Returns the model of an entity.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Model {
        self.models[entity.index()]
    }

    /// Resets a row to the sentinel.
    #[inline]
    pub fn clear(&mut self, entity: Entity) {
        self.models[entity.index()] = Model::NONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_handle_lifecycle() {
        let mut handles = HandleArray::new(4);
        let e = Entity::new(2);
        assert!(!handles.has(e));

        handles.set(e, String::from("sprite"));
        assert_eq!(handles.get(e).map(String::as_str), Some("sprite"));

        if let Some(h) = handles.get_mut(e) {
            h.push_str("-1");
        }
        assert_eq!(handles.take(e).as_deref(), Some("sprite-1"));
        assert!(!handles.has(e));
    }

    #[test]
    fn test_clear_drops_handle() {
        let shared = Rc::new(());
        let mut handles = HandleArray::new(2);
        handles.set(Entity::new(0), Rc::clone(&shared));
        assert_eq!(Rc::strong_count(&shared), 2);
        handles.clear(Entity::new(0));
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn test_models() {
        let mut models = ModelArray::new(3);
        assert!(models.get(Entity::new(1)).is_none());
        models.add(Entity::new(1), Model::new(4));
        assert_eq!(models.get(Entity::new(1)), Model::new(4));
        models.clear(Entity::new(1));
        assert_eq!(models.get(Entity::new(1)), Model::NONE);
    }
}
