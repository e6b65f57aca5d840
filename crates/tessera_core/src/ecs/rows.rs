//! # Row Storage
//!
//! Every per-entity column of a table: identity, model tag, the four field
//! stores and the handle store. This is what processors receive; the
//! subscription machinery lives one level up, in the table.
//!
//! ## Structural changes from processors
//!
//! `create` only marks the new entity as pending, and `destroy_later` only
//! marks it as doomed. The table subscribes pending entities and reclaims
//! doomed ones at its next settle point, after the running processor
//! returns. A scan in progress therefore never sees its set change.

use tracing::{trace, warn};

use super::entity::{Entity, Model};
use super::field::{BoolField, FixedField, IntField, PackedField, SlotKey};
use super::handles::{HandleArray, ModelArray};
use super::identity::IdentityRegistry;
use super::processor::Requirement;
use super::storage::{BoolArray, FixedArray, IntArray, PackedArray};
use crate::error::{TableError, TableResult};
use crate::fixed::Fixed;
use crate::layout::{Layout, LayoutCheck};
use crate::memory::EntityMask;

/// Per-entity columns of a table with layout `L`.
pub struct Rows<L: Layout> {
    identity: IdentityRegistry,
    models: ModelArray,
    fixed: FixedArray,
    ints: IntArray,
    bools: BoolArray,
    packed: PackedArray,
    handles: HandleArray<L::Handle>,
    /// Bit per model that has had at least one entity (schema frozen).
    populated: u32,
    /// Created but not yet subscribed.
    pending: EntityMask,
    /// Marked for destruction at the next settle point.
    doomed: EntityMask,
}

impl<L: Layout> Rows<L> {
    /// Pre-allocates every column.
    #[must_use]
    pub fn new() -> Self {
        let () = LayoutCheck::<L>::VALID;
        Self {
            identity: IdentityRegistry::new(L::ENTITIES),
            models: ModelArray::new(L::ENTITIES),
            fixed: FixedArray::new(L::ENTITIES, L::MODELS, L::FIXED_FIELDS),
            ints: IntArray::new(L::ENTITIES, L::MODELS, L::INT_FIELDS),
            bools: BoolArray::new(L::ENTITIES, L::MODELS),
            packed: PackedArray::new(L::ENTITIES, L::MODELS),
            handles: HandleArray::new(L::ENTITIES),
            populated: 0,
            pending: EntityMask::new(L::ENTITIES),
            doomed: EntityMask::new(L::ENTITIES),
        }
    }

    // =========================================================================
    // Schema declaration (setup only)
    // =========================================================================

    fn assert_unpopulated(&self, model: Model) {
        assert!(
            model.index() < L::MODELS,
            "model {model} exceeds the {} declared models",
            L::MODELS
        );
        assert!(
            self.populated & (1 << model.index()) == 0,
            "model {model} already has entities; its schema is frozen"
        );
    }

    /// Declares a fixed-point field for a model.
    ///
    /// # Panics
    ///
    /// Panics if the model is out of range, already has entities, or the
    /// slot is beyond the layout.
    pub fn declare_fixed(&mut self, model: Model, field: FixedField) {
        self.assert_unpopulated(model);
        self.fixed.declare(model, field);
    }

    /// Declares an integer field for a model.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Rows::declare_fixed`].
    pub fn declare_int(&mut self, model: Model, field: IntField) {
        self.assert_unpopulated(model);
        self.ints.declare(model, field);
    }

    /// Declares a boolean field for a model.
    ///
    /// # Panics
    ///
    /// Panics if the model is out of range or already has entities.
    pub fn declare_bool(&mut self, model: Model, field: BoolField) {
        self.assert_unpopulated(model);
        self.bools.declare(model, field);
    }

    /// Declares a packed field for a model.
    ///
    /// # Panics
    ///
    /// Panics if the model is out of range or already has entities.
    pub fn declare_packed(&mut self, model: Model, field: PackedField) {
        self.assert_unpopulated(model);
        self.packed.declare(model, field);
    }

    /// The fixed-point store.
    #[inline]
    #[must_use]
    pub fn fixed_store(&self) -> &FixedArray {
        &self.fixed
    }

    /// The integer store.
    #[inline]
    #[must_use]
    pub fn int_store(&self) -> &IntArray {
        &self.ints
    }

    /// The boolean store.
    #[inline]
    #[must_use]
    pub fn bool_store(&self) -> &BoolArray {
        &self.bools
    }

    /// The packed store.
    #[inline]
    #[must_use]
    pub fn packed_store(&self) -> &PackedArray {
        &self.packed
    }

    /// Checks the entity's model against a requirement.
    ///
    /// Dead entities satisfy nothing.
    #[must_use]
    pub fn satisfies(&self, entity: Entity, requirement: &Requirement) -> bool {
        if !self.contains(entity) {
            return false;
        }
        if requirement.is_empty() {
            return true;
        }
        let model = self.models.get(entity);
        if requirement.model.is_some_and(|m| m != model) {
            return false;
        }
        self.fixed.matching(model, requirement.fixed)
            && self.ints.matching(model, requirement.ints)
            && self.bools.matching(model, requirement.bools)
            && self.packed.matching(model, requirement.packed)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Maximum number of entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        L::ENTITIES
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.identity.size()
    }

    /// Checks if every entity id is taken.
    #[inline]
    #[must_use]
    pub fn full(&self) -> bool {
        self.identity.full()
    }

    /// One past the largest live id.
    #[inline]
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.identity.high_water_mark()
    }

    /// Checks if an entity is live.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.identity.contains(entity)
    }

    /// Iterates over live entities, ascending.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.identity.iter()
    }

    /// Returns the model of an entity ([`Model::NONE`] for free rows).
    #[inline]
    #[must_use]
    pub fn model(&self, entity: Entity) -> Model {
        self.models.get(entity)
    }

    /// Allocates an entity of `model`. Its fields start at zero.
    ///
    /// The entity joins subscription sets at the table's next settle point.
    ///
    /// # Errors
    ///
    /// - [`TableError::CapacityExceeded`] if the table is full
    /// - [`TableError::InvariantViolation`] if the model is out of range
    pub fn create(&mut self, model: Model) -> TableResult<Entity> {
        if model.index() >= L::MODELS {
            return Err(TableError::InvariantViolation(
                "model beyond the layout's model count",
            ));
        }
        let entity = self.identity.create().map_err(|e| {
            warn!("Entity creation rejected: {}", e);
            e
        })?;
        self.models.add(entity, model);
        self.populated |= 1 << model.index();
        self.pending.insert(entity);
        trace!("Created entity {} (model {})", entity, model);
        Ok(entity)
    }

    /// Marks an entity for destruction at the next settle point.
    ///
    /// Returns `false` if the entity is not live.
    pub fn destroy_later(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.doomed.insert(entity);
        true
    }

    /// Checks if an entity is marked for destruction.
    #[inline]
    #[must_use]
    pub fn is_doomed(&self, entity: Entity) -> bool {
        self.contains(entity) && self.doomed.contains(entity)
    }

    /// Checks if an entity was created but not yet subscribed.
    #[inline]
    pub(crate) fn is_pending(&self, entity: Entity) -> bool {
        self.pending.contains(entity)
    }

    pub(crate) fn pop_pending(&mut self) -> Option<Entity> {
        self.pending.pop_first()
    }

    pub(crate) fn pop_doomed(&mut self) -> Option<Entity> {
        self.doomed.pop_first()
    }

    /// Clears every column of a live entity and recycles its id.
    ///
    /// Subscriptions must already be dropped.
    pub(crate) fn release(&mut self, entity: Entity) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.pending.remove(entity);
        self.doomed.remove(entity);
        self.clear_columns(entity);
        self.identity.destroy(entity);
        trace!("Destroyed entity {}", entity);
        true
    }

    /// Clears every column of every live entity and restores the id order.
    pub(crate) fn release_all(&mut self) {
        let high_water = self.identity.high_water_mark();
        for index in 0..high_water {
            let entity = Entity::new(index as u32);
            if self.contains(entity) {
                self.clear_columns(entity);
            }
        }
        self.identity.clear();
        self.pending.clear();
        self.doomed.clear();
    }

    fn clear_columns(&mut self, entity: Entity) {
        self.models.clear(entity);
        self.fixed.clear(entity);
        self.ints.clear(entity);
        self.bools.clear(entity);
        self.packed.clear(entity);
        self.handles.clear(entity);
    }

    // =========================================================================
    // Field access
    // =========================================================================

    /// Reads a fixed-point field.
    #[inline]
    #[must_use]
    pub fn fixed(&self, entity: Entity, field: FixedField) -> Fixed {
        debug_assert!(
            self.fixed.has(self.model(entity), field),
            "model {} does not declare fixed field {}",
            self.model(entity),
            field.slot()
        );
        self.fixed.get(entity, field)
    }

    /// Writes a fixed-point field.
    #[inline]
    pub fn set_fixed(&mut self, entity: Entity, field: FixedField, value: Fixed) {
        debug_assert!(
            self.fixed.has(self.model(entity), field),
            "model {} does not declare fixed field {}",
            self.model(entity),
            field.slot()
        );
        self.fixed.set(entity, field, value);
    }

    /// Reads an integer field.
    #[inline]
    #[must_use]
    pub fn int(&self, entity: Entity, field: IntField) -> i32 {
        debug_assert!(
            self.ints.has(self.model(entity), field),
            "model {} does not declare int field {}",
            self.model(entity),
            field.slot()
        );
        self.ints.get(entity, field)
    }

    /// Writes an integer field.
    #[inline]
    pub fn set_int(&mut self, entity: Entity, field: IntField, value: i32) {
        debug_assert!(
            self.ints.has(self.model(entity), field),
            "model {} does not declare int field {}",
            self.model(entity),
            field.slot()
        );
        self.ints.set(entity, field, value);
    }

    /// Reads a boolean field.
    #[inline]
    #[must_use]
    pub fn flag(&self, entity: Entity, field: BoolField) -> bool {
        debug_assert!(
            self.bools.has(self.model(entity), field),
            "model {} does not declare bool field {}",
            self.model(entity),
            field.slot()
        );
        self.bools.get(entity, field)
    }

    /// Writes a boolean field.
    #[inline]
    pub fn set_flag(&mut self, entity: Entity, field: BoolField, value: bool) {
        debug_assert!(
            self.bools.has(self.model(entity), field),
            "model {} does not declare bool field {}",
            self.model(entity),
            field.slot()
        );
        self.bools.set(entity, field, value);
    }

    /// Reads a packed field.
    #[inline]
    #[must_use]
    pub fn packed(&self, entity: Entity, field: PackedField) -> u32 {
        debug_assert!(
            self.packed.has(self.model(entity), field),
            "model {} does not declare packed field at bit {}",
            self.model(entity),
            field.offset()
        );
        self.packed.get(entity, field)
    }

    /// Writes a packed field. `value` must fit in the field's width.
    #[inline]
    pub fn set_packed(&mut self, entity: Entity, field: PackedField, value: u32) {
        debug_assert!(
            self.packed.has(self.model(entity), field),
            "model {} does not declare packed field at bit {}",
            self.model(entity),
            field.offset()
        );
        self.packed.set(entity, field, value);
    }

    /// Borrows the external handle of an entity.
    #[inline]
    #[must_use]
    pub fn handle(&self, entity: Entity) -> Option<&L::Handle> {
        self.handles.get(entity)
    }

    /// Mutably borrows the external handle of an entity.
    #[inline]
    pub fn handle_mut(&mut self, entity: Entity) -> Option<&mut L::Handle> {
        self.handles.get_mut(entity)
    }

    /// Attaches an external handle, dropping any previous one.
    #[inline]
    pub fn set_handle(&mut self, entity: Entity, handle: L::Handle) {
        debug_assert!(self.contains(entity), "entity {entity} is not live");
        self.handles.set(entity, handle);
    }

    /// Checks if the entity holds an external handle.
    #[inline]
    #[must_use]
    pub fn has_handle(&self, entity: Entity) -> bool {
        self.handles.has(entity)
    }

    /// Detaches and returns the external handle of an entity.
    #[inline]
    pub fn take_handle(&mut self, entity: Entity) -> Option<L::Handle> {
        self.handles.take(entity)
    }
}

impl<L: Layout> Default for Rows<L> {
    fn default() -> Self {
        Self::new()
    }
}
