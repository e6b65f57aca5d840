//! # Query Results
//!
//! Fixed-capacity, stack-allocated result of a query. The caller picks the
//! bound `N`; matching more than `N` entities is an error, not a silent
//! truncation.

use std::ops::Deref;

use super::entity::Entity;
use crate::error::{TableError, TableResult};

/// Up to `N` entity ids, in ascending order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryResults<const N: usize> {
    ids: [Entity; N],
    len: usize,
}

impl<const N: usize> QueryResults<N> {
    /// Creates an empty result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ids: [Entity::NULL; N],
            len: 0,
        }
    }

    /// Appends an id.
    ///
    /// # Errors
    ///
    /// [`TableError::QueryOverflow`] if `N` ids are already stored.
    pub fn push(&mut self, entity: Entity) -> TableResult<()> {
        if self.len == N {
            return Err(TableError::QueryOverflow { limit: N });
        }
        self.ids[self.len] = entity;
        self.len += 1;
        Ok(())
    }

    /// Number of matches.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if nothing matched.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The matches as a slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.ids[..self.len]
    }
}

impl<const N: usize> Default for QueryResults<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for QueryResults<N> {
    type Target = [Entity];

    fn deref(&self) -> &[Entity] {
        self.as_slice()
    }
}

impl<const N: usize> IntoIterator for QueryResults<N> {
    type Item = Entity;
    type IntoIter = std::iter::Take<std::array::IntoIter<Entity, N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter().take(self.len)
    }
}

impl<'a, const N: usize> IntoIterator for &'a QueryResults<N> {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full() {
        let mut results = QueryResults::<2>::new();
        assert!(results.is_empty());
        results.push(Entity::new(1)).unwrap();
        results.push(Entity::new(5)).unwrap();
        assert_eq!(
            results.push(Entity::new(6)),
            Err(TableError::QueryOverflow { limit: 2 })
        );
        assert_eq!(results.as_slice(), &[Entity::new(1), Entity::new(5)]);
    }

    #[test]
    fn test_iteration_stops_at_len() {
        let mut results = QueryResults::<8>::new();
        results.push(Entity::new(3)).unwrap();
        let ids: Vec<Entity> = results.into_iter().collect();
        assert_eq!(ids, vec![Entity::new(3)]);
        assert_eq!((&results).into_iter().count(), 1);
    }
}
