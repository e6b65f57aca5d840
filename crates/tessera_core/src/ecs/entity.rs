//! # Entity, Model and Tag Identifiers
//!
//! Entities are plain row indices. They carry no data and no generation:
//! liveness is tracked by the identity registry, and freed ids are reused.

use std::fmt;

/// Identifier of one row of the entity table.
///
/// Valid ids lie in `[0, Layout::ENTITIES)`. Ids fit in 16 bits so they can
/// be stored inside packed fields (a parent link, a target) by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u16);

impl Entity {
    /// Null/invalid entity, used to fill unused result slots.
    pub const NULL: Self = Self(u16::MAX);

    /// Creates an entity id from a row index.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in 16 bits.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        assert!(index < u16::MAX as u32, "entity index out of range");
        Self(index as u16)
    }

    /// Returns the row index of this entity.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the id as stored in a packed field.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0 as u32
    }

    /// Checks if this entity id is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u16::MAX
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A declared entity shape.
///
/// Every live entity has exactly one model; the model decides which fields
/// the entity may read and write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Model(u8);

impl Model {
    /// Sentinel stored in rows that hold no entity.
    pub const NONE: Self = Self(u8::MAX);

    /// Creates a model tag.
    #[inline]
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the model index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this is the "no model" sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u8::MAX
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Unique tag of a processor, query or apply within its registration list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tag(u16);

impl Tag {
    /// Creates a tag.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw tag value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
