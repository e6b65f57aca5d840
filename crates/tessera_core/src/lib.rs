//! # TESSERA Core
//!
//! Fixed-capacity entity table for memory-constrained real-time loops:
//! - Kilobytes of state, no heap growth after setup
//! - Bit-packed field storage, declared per model
//! - Subscription caches instead of per-tick table scans
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in the tick** - All storage is pre-allocated
//! 2. **Capacities are compile-time** - A [`Layout`] is checked at build time
//! 3. **Single-threaded** - Processors get the rows, never the table
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::{EntityTable, Layout, Model, FixedField};
//!
//! let mut table = EntityTable::<Squares>::new();
//! table.declare_fixed(SQUARE, X);
//! table.add_entity_processor(Movement)?;
//! table.init();
//! loop {
//!     table.update();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod fixed;
pub mod layout;
pub mod memory;

pub use config::{DestroyMode, TableConfig};
pub use ecs::{
    BoolField, CachedApply, CachedQuery, Entity, EntityProcessor, EntityTable, FixedField,
    Hierarchy, IntField, Model, PackedField, Processor, QueryResults, Requirement, Rows,
    Subscriber, TableContext, TableProcessor, Tag,
};
pub use error::{ProcessorKind, TableError, TableResult};
pub use fixed::Fixed;
pub use layout::Layout;
pub use memory::EntityMask;
