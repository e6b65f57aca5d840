//! # Field Storage
//!
//! Pre-allocated, dense field storage with zero runtime allocations.
//!
//! Four categories:
//! - [`FieldArray`]: one value per (entity, slot), row-major. Used for
//!   fixed-point ([`FixedArray`]) and integer ([`IntArray`]) fields.
//! - [`BoolArray`]: one word per entity, one bit per field.
//! - [`PackedArray`]: one word per entity, `width` bits per field at a
//!   declared offset.
//!
//! Every store carries its own [`Schema`] so it can answer "does model M
//! declare this field" without touching the other stores.

use std::marker::PhantomData;

use super::entity::{Entity, Model};
use super::field::{BoolField, FixedField, IntField, PackedField, Scalar, SlotKey, MAX_SLOTS};
use super::schema::Schema;
use crate::fixed::Fixed;

/// Dense store of fixed-point fields.
pub type FixedArray = FieldArray<Fixed, FixedField>;

/// Dense store of integer fields.
pub type IntArray = FieldArray<i32, IntField>;

/// Row-major storage for one dense field category.
///
/// `index = entity * slots + slot`; every access goes through one asserted
/// index function, never raw pointer math.
///
/// # Type Parameters
///
/// * `T` - The stored value type
/// * `K` - The key type addressing it
pub struct FieldArray<T: Scalar, K: SlotKey> {
    /// The dense array of values.
    data: Box<[T]>,
    /// Slots per entity row.
    slots: usize,
    /// Capacity (max entities).
    entities: usize,
    /// Which models declare which slots.
    schema: Schema,
    _key: PhantomData<K>,
}

impl<T: Scalar, K: SlotKey> FieldArray<T, K> {
    /// Creates storage for `entities` rows of `slots` values each.
    ///
    /// All slots start at the type's zero value.
    ///
    /// # Panics
    ///
    /// Panics if `slots` exceeds 32.
    #[must_use]
    pub fn new(entities: usize, models: usize, slots: usize) -> Self {
        assert!(slots <= MAX_SLOTS, "at most {MAX_SLOTS} slots per category");
        Self {
            data: vec![T::zeroed(); entities * slots].into_boxed_slice(),
            slots,
            entities,
            schema: Schema::new(models),
            _key: PhantomData,
        }
    }

    /// Returns the number of slots per entity.
    #[inline]
    #[must_use]
    pub const fn slots(&self) -> usize {
        self.slots
    }

    #[inline]
    fn index(&self, entity: Entity, slot: usize) -> usize {
        assert!(
            entity.index() < self.entities,
            "entity {entity} out of range (capacity {})",
            self.entities
        );
        assert!(
            slot < self.slots,
            "field slot {slot} beyond the {} declared slots",
            self.slots
        );
        entity.index() * self.slots + slot
    }

    /// Declares that `model` owns `field`.
    ///
    /// # Panics
    ///
    /// Panics if the slot is beyond this store's slot count or the model is
    /// out of range.
    pub fn declare(&mut self, model: Model, field: K) {
        assert!(
            field.slot() < self.slots,
            "field slot {} beyond the {} declared slots",
            field.slot(),
            self.slots
        );
        self.schema.declare(model, field.mask());
    }

    /// Checks if `model` declares `field`.
    #[inline]
    #[must_use]
    pub fn has(&self, model: Model, field: K) -> bool {
        self.schema.matching(model, field.mask())
    }

    /// Checks if `model` declares every field in `mask`.
    #[inline]
    #[must_use]
    pub fn matching(&self, model: Model, mask: u32) -> bool {
        self.schema.matching(model, mask)
    }

    /// Reads a field.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity, field: K) -> T {
        self.data[self.index(entity, field.slot())]
    }

    /// Writes a field.
    ///
    /// This is a **zero-allocation** operation - it overwrites the
    /// pre-allocated slot.
    #[inline]
    pub fn set(&mut self, entity: Entity, field: K, value: T) {
        let index = self.index(entity, field.slot());
        self.data[index] = value;
    }

    /// Zeroes an entity's whole row.
    #[inline]
    pub fn clear(&mut self, entity: Entity) {
        if self.slots == 0 {
            return;
        }
        let start = self.index(entity, 0);
        for value in &mut self.data[start..start + self.slots] {
            *value = T::zeroed();
        }
    }

    /// Returns an entity's row as a slice.
    #[inline]
    #[must_use]
    pub fn row(&self, entity: Entity) -> &[T] {
        if self.slots == 0 {
            return &[];
        }
        let start = self.index(entity, 0);
        &self.data[start..start + self.slots]
    }
}

/// Boolean fields: one 32-bit word per entity.
pub struct BoolArray {
    words: Box<[u32]>,
    schema: Schema,
}

impl BoolArray {
    /// Creates storage for `entities` entities.
    #[must_use]
    pub fn new(entities: usize, models: usize) -> Self {
        Self {
            words: vec![0u32; entities].into_boxed_slice(),
            schema: Schema::new(models),
        }
    }

    /// Declares that `model` owns `field`.
    pub fn declare(&mut self, model: Model, field: BoolField) {
        self.schema.declare(model, field.mask());
    }

    /// Checks if `model` declares `field`.
    #[inline]
    #[must_use]
    pub fn has(&self, model: Model, field: BoolField) -> bool {
        self.schema.matching(model, field.mask())
    }

    /// Checks if `model` declares every field in `mask`.
    #[inline]
    #[must_use]
    pub fn matching(&self, model: Model, mask: u32) -> bool {
        self.schema.matching(model, mask)
    }

    /// Reads a field.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity, field: BoolField) -> bool {
        self.words[entity.index()] & field.mask() != 0
    }

    /// Writes a field.
    #[inline]
    pub fn set(&mut self, entity: Entity, field: BoolField, value: bool) {
        let word = &mut self.words[entity.index()];
        if value {
            *word |= field.mask();
        } else {
            *word &= !field.mask();
        }
    }

    /// Resets every boolean of an entity to `false`.
    #[inline]
    pub fn clear(&mut self, entity: Entity) {
        self.words[entity.index()] = 0;
    }
}

/// Packed multi-bit fields: one 32-bit word per entity.
pub struct PackedArray {
    words: Box<[u32]>,
    schema: Schema,
}

impl PackedArray {
    /// Creates storage for `entities` entities.
    #[must_use]
    pub fn new(entities: usize, models: usize) -> Self {
        Self {
            words: vec![0u32; entities].into_boxed_slice(),
            schema: Schema::new(models),
        }
    }

    /// Declares that `model` owns the bit range of `field`.
    pub fn declare(&mut self, model: Model, field: PackedField) {
        self.schema.declare(model, field.mask());
    }

    /// Checks if `model` declares every bit of `field`.
    #[inline]
    #[must_use]
    pub fn has(&self, model: Model, field: PackedField) -> bool {
        self.schema.matching(model, field.mask())
    }

    /// Checks if `model` declares every bit in `mask`.
    #[inline]
    #[must_use]
    pub fn matching(&self, model: Model, mask: u32) -> bool {
        self.schema.matching(model, mask)
    }

    /// Reads a field.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity, field: PackedField) -> u32 {
        (self.words[entity.index()] >> field.offset()) & field.value_mask()
    }

    /// Writes a field, leaving every other bit of the word unchanged.
    ///
    /// `value` must fit in `field.width()` bits. This is only checked in
    /// debug builds; in release the excess bits corrupt the neighbours.
    #[inline]
    pub fn set(&mut self, entity: Entity, field: PackedField, value: u32) {
        debug_assert!(
            value <= field.max_value(),
            "value {value} does not fit in {} bits",
            field.width()
        );
        let word = &mut self.words[entity.index()];
        *word = (*word & !field.mask()) | (value << field.offset());
    }

    /// Returns the raw packed word of an entity.
    #[inline]
    #[must_use]
    pub fn word(&self, entity: Entity) -> u32 {
        self.words[entity.index()]
    }

    /// Zeroes every packed field of an entity.
    #[inline]
    pub fn clear(&mut self, entity: Entity) {
        self.words[entity.index()] = 0;
    }
}
