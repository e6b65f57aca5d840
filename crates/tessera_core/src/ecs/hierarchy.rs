//! # Parent Hierarchy
//!
//! Resolves parent chains stored in a packed field. An entity whose model
//! declares the parent field has a parent; the chain ends at the first
//! ancestor whose model does not declare it.
//!
//! Every walk is bounded by `max_depth` links, so a cycle or a corrupted
//! link ends in an error instead of an endless loop.

use super::entity::Entity;
use super::field::{FixedField, PackedField};
use super::rows::Rows;
use crate::config::TableConfig;
use crate::error::{TableError, TableResult};
use crate::fixed::Fixed;
use crate::layout::Layout;

/// A parent link field plus its depth bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    parent: PackedField,
    max_depth: usize,
}

impl Hierarchy {
    /// Creates a resolver following `parent` for at most `max_depth` links.
    ///
    /// # Panics
    ///
    /// Panics if `max_depth` is zero.
    #[must_use]
    pub const fn new(parent: PackedField, max_depth: usize) -> Self {
        assert!(max_depth > 0, "hierarchy depth bound must be at least 1");
        Self { parent, max_depth }
    }

    /// Creates a resolver with the configured depth bound.
    #[must_use]
    pub fn from_config(parent: PackedField, config: &TableConfig) -> Self {
        Self::new(parent, config.max_hierarchy_depth.max(1))
    }

    /// The parent link field.
    #[inline]
    #[must_use]
    pub const fn parent_field(&self) -> PackedField {
        self.parent
    }

    /// The depth bound.
    #[inline]
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The direct parent of an entity, if its model has a parent link.
    #[must_use]
    pub fn parent<L: Layout>(&self, rows: &Rows<L>, entity: Entity) -> Option<u32> {
        if rows.packed_store().has(rows.model(entity), self.parent) {
            Some(rows.packed_store().get(entity, self.parent))
        } else {
            None
        }
    }

    /// Walks the parent chain of `entity`, nearest first.
    #[must_use]
    pub fn ancestors<'r, L: Layout>(&self, rows: &'r Rows<L>, entity: Entity) -> Ancestors<'r, L> {
        Ancestors {
            rows,
            hierarchy: *self,
            current: entity,
            next: self.parent(rows, entity),
            links: 0,
        }
    }

    /// Number of ancestors of `entity`.
    ///
    /// # Errors
    ///
    /// [`TableError::HierarchyTooDeep`] or [`TableError::DanglingParent`].
    pub fn depth<L: Layout>(&self, rows: &Rows<L>, entity: Entity) -> TableResult<usize> {
        let mut depth = 0;
        for ancestor in self.ancestors(rows, entity) {
            ancestor?;
            depth += 1;
        }
        Ok(depth)
    }

    /// Sums fixed-point fields over the entity and all its ancestors.
    ///
    /// With position fields stored relative to the parent this yields the
    /// absolute position.
    ///
    /// # Errors
    ///
    /// [`TableError::HierarchyTooDeep`] or [`TableError::DanglingParent`].
    pub fn accumulate<L: Layout, const K: usize>(
        &self,
        rows: &Rows<L>,
        entity: Entity,
        fields: [FixedField; K],
    ) -> TableResult<[Fixed; K]> {
        let store = rows.fixed_store();
        let mut sums = fields.map(|field| store.get(entity, field));
        for ancestor in self.ancestors(rows, entity) {
            let ancestor = ancestor?;
            for (sum, field) in sums.iter_mut().zip(fields) {
                *sum += store.get(ancestor, field);
            }
        }
        Ok(sums)
    }
}

/// Iterator over a parent chain. Yields at most `max_depth` ancestors, then
/// an error if the chain goes on.
pub struct Ancestors<'r, L: Layout> {
    rows: &'r Rows<L>,
    hierarchy: Hierarchy,
    current: Entity,
    next: Option<u32>,
    links: usize,
}

impl<L: Layout> Iterator for Ancestors<'_, L> {
    type Item = TableResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.next.take()?;

        if self.links == self.hierarchy.max_depth {
            return Some(Err(TableError::HierarchyTooDeep {
                entity: self.current,
                max_depth: self.hierarchy.max_depth,
            }));
        }

        let in_range = (raw as usize) < self.rows.capacity();
        let parent = if in_range { Entity::new(raw) } else { Entity::NULL };
        if !in_range || !self.rows.contains(parent) {
            return Some(Err(TableError::DanglingParent {
                entity: self.current,
                parent,
            }));
        }

        self.links += 1;
        self.current = parent;
        self.next = self.hierarchy.parent(self.rows, parent);
        Some(Ok(parent))
    }
}
