//! # Entity Table
//!
//! A fixed-capacity entity/field table for real-time loops.
//!
//! ## Design Philosophy
//!
//! - All storage is pre-allocated when the table is created
//! - Entities are plain row ids, recycled most-recently-freed first
//! - Fields are bit-packed per model schema, in four categories
//! - Processors see only entities whose model matches their requirement,
//!   through subscription sets maintained on create and destroy

mod entity;
mod field;
mod handles;
mod hierarchy;
mod identity;
mod processor;
mod query;
mod rows;
mod schema;
mod storage;
mod subscription;
mod table;

pub use entity::{Entity, Model, Tag};
pub use field::{BoolField, FixedField, IntField, PackedField, Scalar, SlotKey, MAX_SLOTS};
pub use handles::{HandleArray, ModelArray};
pub use hierarchy::{Ancestors, Hierarchy};
pub use identity::IdentityRegistry;
pub use processor::{
    CachedApply, CachedQuery, EntityProcessor, Processor, Requirement, Subscriber,
    TableProcessor,
};
pub use query::QueryResults;
pub use rows::Rows;
pub use schema::Schema;
pub use storage::{BoolArray, FieldArray, FixedArray, IntArray, PackedArray};
pub use table::{EntityTable, TableContext};
