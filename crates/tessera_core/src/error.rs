//! # Table Error Types
//!
//! Every failure the entity table can report. All of them are programmer
//! errors (a static configuration mistake), except [`TableError::CapacityExceeded`]
//! on `create`, which callers guard with `full()`.

use std::fmt;

use thiserror::Error;

use crate::ecs::{Entity, Tag};

/// The registration list a tag was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessorKind {
    /// Any of the four lists (tags are unique table-wide).
    Any,
    /// Runs once per subscribed entity every tick.
    Entity,
    /// Runs once per tick, unconditionally.
    Table,
    /// Subscription-backed read-only search.
    Query,
    /// Subscription-backed conditional mutation with early exit.
    Apply,
}

impl fmt::Display for ProcessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "processor",
            Self::Entity => "entity processor",
            Self::Table => "table processor",
            Self::Query => "cached query",
            Self::Apply => "cached apply",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the entity table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Every entity id is taken.
    #[error("table full: all {capacity} entity ids are allocated")]
    CapacityExceeded {
        /// Maximum number of entities of the table.
        capacity: usize,
    },

    /// A query matched more entities than the caller allowed for.
    #[error("query overflow: more than {limit} entities matched")]
    QueryOverflow {
        /// The caller-declared maximum result count.
        limit: usize,
    },

    /// No processor of that kind was registered under the tag.
    #[error("unknown {kind} tag {tag}")]
    UnknownTag {
        /// Which list was searched.
        kind: ProcessorKind,
        /// The tag that was requested.
        tag: Tag,
    },

    /// A processor of the same kind already uses the tag.
    #[error("duplicate {kind} tag {tag}")]
    DuplicateTag {
        /// Which list the tag collides in.
        kind: ProcessorKind,
        /// The colliding tag.
        tag: Tag,
    },

    /// A structural invariant of the table was broken by the caller.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    /// A parent chain is longer than the configured bound (or cyclic).
    #[error("hierarchy of entity {entity} exceeds {max_depth} levels")]
    HierarchyTooDeep {
        /// The entity whose chain was being resolved.
        entity: Entity,
        /// The configured bound.
        max_depth: usize,
    },

    /// A parent link points at an entity that is not live.
    #[error("entity {entity} has dead parent {parent}")]
    DanglingParent {
        /// The entity holding the link.
        entity: Entity,
        /// The dead parent id.
        parent: Entity,
    },

    /// The runtime configuration could not be parsed or is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;
