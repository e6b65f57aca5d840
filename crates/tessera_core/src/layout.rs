//! # Table Layout
//!
//! Compile-time capacities of an entity table. A host describes its table
//! once with a zero-sized type:
//!
//! ```rust,ignore
//! struct Squares;
//!
//! impl Layout for Squares {
//!     const ENTITIES: usize = 64;
//!     const MODELS: usize = 4;
//!     const FIXED_FIELDS: usize = 6;
//!     const INT_FIELDS: usize = 2;
//!     type Handle = Sprite;
//! }
//! ```
//!
//! Every bound is checked when the table type is instantiated, so an
//! out-of-range layout is a build failure rather than a runtime surprise.
//! Boolean and packed fields always use one 32-bit word per entity.

/// Largest entity capacity. Ids must fit in an 8-bit packed field.
pub const MAX_ENTITIES: usize = 256;

/// Largest number of models (one bit per model in a processor's model mask).
pub const MAX_MODELS: usize = 32;

/// Largest number of fixed-point fields per entity.
pub const MAX_FIXED_FIELDS: usize = 32;

/// Largest number of integer fields per entity.
pub const MAX_INT_FIELDS: usize = 32;

/// Boolean fields per entity (one word).
pub const BOOL_FIELDS: usize = 32;

/// Packed bits per entity (one word).
pub const PACKED_BITS: usize = 32;

/// Capacities of one entity table.
pub trait Layout: 'static {
    /// Maximum number of live entities.
    const ENTITIES: usize;
    /// Number of models.
    const MODELS: usize;
    /// Fixed-point slots per entity.
    const FIXED_FIELDS: usize;
    /// Integer slots per entity.
    const INT_FIELDS: usize;
    /// Opaque per-entity handle type. Use `()` when the host keeps none.
    type Handle: 'static;
}

/// Holder of the layout assertions; evaluated once per instantiated layout.
pub(crate) struct LayoutCheck<L: Layout>(std::marker::PhantomData<L>);

impl<L: Layout> LayoutCheck<L> {
    pub(crate) const VALID: () = {
        assert!(L::ENTITIES > 0, "a table needs at least one entity");
        assert!(L::ENTITIES <= MAX_ENTITIES, "at most 256 entities per table");
        assert!(L::MODELS > 0, "a table needs at least one model");
        assert!(L::MODELS <= MAX_MODELS, "at most 32 models per table");
        assert!(
            L::FIXED_FIELDS <= MAX_FIXED_FIELDS,
            "at most 32 fixed-point fields per entity"
        );
        assert!(
            L::INT_FIELDS <= MAX_INT_FIELDS,
            "at most 32 integer fields per entity"
        );
    };
}
