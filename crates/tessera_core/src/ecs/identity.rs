//! # Identity Registry
//!
//! Tracks which entity ids are live and recycles freed ids.
//!
//! Freed ids are handed out again most-recently-freed-first (a stack)
//! before any never-issued id is used, so the live ids stay packed towards
//! the front of the table and scans stay short.

use super::entity::Entity;
use crate::error::{TableError, TableResult};
use crate::memory::EntityMask;

/// Presence mask plus free-id stack.
pub struct IdentityRegistry {
    /// Presence bit per entity.
    live: EntityMask,
    /// Free list of recycled ids (pre-reserved to capacity).
    free: Vec<Entity>,
    /// Next id that has never been issued.
    fresh: usize,
    /// Number of currently live entities.
    size: usize,
    /// One past the largest live id.
    high_water: usize,
    /// Maximum capacity.
    capacity: usize,
}

impl IdentityRegistry {
    /// Creates a registry for ids in `[0, capacity)`.
    ///
    /// # Panics
    ///
    /// Panics if capacity is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        Self {
            live: EntityMask::new(capacity),
            free: Vec::with_capacity(capacity),
            fresh: 0,
            size: 0,
            high_water: 0,
            capacity,
        }
    }

    /// Returns the maximum number of entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently live entities.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Checks if every id is taken.
    #[inline]
    #[must_use]
    pub const fn full(&self) -> bool {
        self.size == self.capacity
    }

    /// One past the largest live id; `0` when the table is empty.
    #[inline]
    #[must_use]
    pub const fn high_water_mark(&self) -> usize {
        self.high_water
    }

    /// Allocates an id.
    ///
    /// # Errors
    ///
    /// [`TableError::CapacityExceeded`] if every id is live.
    pub fn create(&mut self) -> TableResult<Entity> {
        if self.full() {
            return Err(TableError::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let entity = match self.free.pop() {
            Some(recycled) => recycled,
            None => {
                let issued = Entity::new(self.fresh as u32);
                self.fresh += 1;
                issued
            }
        };

        self.live.insert(entity);
        self.size += 1;
        self.high_water = self.high_water.max(entity.index() + 1);
        Ok(entity)
    }

    /// Frees an id. Returns `false` if it was not live.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.live.remove(entity) {
            return false;
        }
        self.size -= 1;
        self.free.push(entity);

        if entity.index() + 1 == self.high_water {
            while self.high_water > 0
                && !self.live.contains(Entity::new((self.high_water - 1) as u32))
            {
                self.high_water -= 1;
            }
        }
        true
    }

    /// Checks if an id is live. Ids beyond capacity are never live.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        entity.index() < self.capacity && self.live.contains(entity)
    }

    /// Iterates over live ids, ascending.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.live.iter()
    }

    /// Frees every id and restores the initial issue order.
    pub fn clear(&mut self) {
        self.live.clear();
        self.free.clear();
        self.fresh = 0;
        self.size = 0;
        self.high_water = 0;
    }
}
