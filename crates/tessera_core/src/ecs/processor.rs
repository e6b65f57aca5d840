//! # Processor Protocol
//!
//! Four kinds of per-tick work, expressed as capability traits:
//!
//! | Trait               | Runs                                     | Subscribes |
//! |---------------------|------------------------------------------|------------|
//! | [`TableProcessor`]  | once per tick                            | no         |
//! | [`EntityProcessor`] | once per tick per subscribed entity      | yes        |
//! | [`CachedQuery`]     | on `query`, filtered subscribed set      | yes        |
//! | [`CachedApply`]     | on `apply`, until the first `true`       | yes        |
//!
//! The table keeps one registration list per kind and dispatches by list,
//! so no processor is ever downcast.
//!
//! Processors receive the row storage ([`Rows`]), never the table itself.
//! Structural changes made from inside a processor (`create`,
//! `destroy_later`) are settled by the table once the processor returns.

use super::entity::{Entity, Model, Tag};
use super::field::{BoolField, FixedField, IntField, PackedField, SlotKey};
use super::rows::Rows;
use super::table::TableContext;
use crate::layout::Layout;

/// The fields (and optionally the model) an entity must have to be
/// subscribed.
///
/// Built in `const` context next to the processor:
///
/// ```rust,ignore
/// const MOVING: Requirement = Requirement::new().fixed(X).fixed(Y).fixed(SPEED);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Requirement {
    /// Required fixed-point slots.
    pub fixed: u32,
    /// Required integer slots.
    pub ints: u32,
    /// Required boolean bits.
    pub bools: u32,
    /// Required packed bits.
    pub packed: u32,
    /// Required model, if any.
    pub model: Option<Model>,
}

impl Requirement {
    /// Matches every live entity.
    pub const ANY: Self = Self::new();

    /// Creates an empty requirement.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fixed: 0,
            ints: 0,
            bools: 0,
            packed: 0,
            model: None,
        }
    }

    /// Also requires a fixed-point field.
    #[must_use]
    pub const fn fixed(mut self, field: FixedField) -> Self {
        self.fixed |= 1 << field.slot_index();
        self
    }

    /// Also requires an integer field.
    #[must_use]
    pub const fn int(mut self, field: IntField) -> Self {
        self.ints |= 1 << field.slot_index();
        self
    }

    /// Also requires a boolean field.
    #[must_use]
    pub const fn boolean(mut self, field: BoolField) -> Self {
        self.bools |= 1 << field.slot_index();
        self
    }

    /// Also requires every bit of a packed field.
    #[must_use]
    pub const fn packed(mut self, field: PackedField) -> Self {
        self.packed |= field.mask();
        self
    }

    /// Restricts to one model.
    #[must_use]
    pub const fn model(mut self, model: Model) -> Self {
        self.model = Some(model);
        self
    }

    /// Checks if no field or model is required.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fixed == 0
            && self.ints == 0
            && self.bools == 0
            && self.packed == 0
            && self.model.is_none()
    }
}

/// Common part of every processor.
pub trait Processor<L: Layout> {
    /// Unique tag within the table.
    fn tag(&self) -> Tag;

    /// One-time setup, called by the table's `init`.
    fn init(&mut self, _rows: &mut Rows<L>) {}
}

/// A processor that keeps a subscription set.
pub trait Subscriber<L: Layout>: Processor<L> {
    /// Declared requirement. Defaults to every live entity.
    fn requirement(&self) -> Requirement {
        Requirement::ANY
    }

    /// Decides whether `entity` belongs to the subscription set.
    ///
    /// Evaluated on create and on explicit re-subscription only. Override
    /// to select on field values rather than on the model's schema.
    fn select(&self, rows: &Rows<L>, entity: Entity) -> bool {
        rows.satisfies(entity, &self.requirement())
    }
}

/// Runs once per tick for every subscribed entity, ascending.
pub trait EntityProcessor<L: Layout>: Subscriber<L> {
    /// Processes one entity.
    fn update(&mut self, rows: &mut Rows<L>, entity: Entity);
}

/// Runs once per tick.
pub trait TableProcessor<L: Layout>: Processor<L> {
    /// Processes the whole table.
    ///
    /// The context may create, spawn and destroy entities, run queries and
    /// applies, and toggle other processors.
    fn update(&mut self, table: &mut TableContext<'_, L>);
}

/// Read-only search over a subscription set.
pub trait CachedQuery<L: Layout>: Subscriber<L> {
    /// Per-call filter, evaluated over subscribed entities only.
    fn filter(&self, _rows: &Rows<L>, _entity: Entity) -> bool {
        true
    }
}

/// Conditional mutation over a subscription set with early exit.
pub trait CachedApply<L: Layout>: Subscriber<L> {
    /// Handles one entity. Returning `true` stops the scan.
    fn apply(&mut self, rows: &mut Rows<L>, entity: Entity) -> bool;
}
