//! # Entity Bitset
//!
//! One bit per entity, 32 entities per word. Used for the identity
//! registry's presence mask, for every subscription cache and for the
//! pending/doomed sets of the deferred paths.
//!
//! ## Performance
//!
//! - Insert / remove / contains: O(1)
//! - Clear: O(n/32) where n = capacity
//! - Iterate: O(words + members), ascending entity order

use crate::ecs::Entity;

/// Bits per storage word.
const WORD_BITS: usize = 32;

/// Fixed-capacity set of entity ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityMask {
    /// 1 = member, 0 = absent.
    words: Box<[u32]>,
    /// Capacity in entities.
    capacity: usize,
}

impl EntityMask {
    /// Creates an empty mask able to hold ids in `[0, capacity)`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let word_count = (capacity + WORD_BITS - 1) / WORD_BITS;
        Self {
            words: vec![0u32; word_count].into_boxed_slice(),
            capacity,
        }
    }

    /// Returns the capacity in entities.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn locate(&self, entity: Entity) -> (usize, u32) {
        let index = entity.index();
        assert!(
            index < self.capacity,
            "entity {entity} out of range (capacity {})",
            self.capacity
        );
        (index / WORD_BITS, 1 << (index % WORD_BITS))
    }

    /// Adds an entity. Returns `true` if it was absent.
    #[inline]
    pub fn insert(&mut self, entity: Entity) -> bool {
        let (word, bit) = self.locate(entity);
        let was_absent = self.words[word] & bit == 0;
        self.words[word] |= bit;
        was_absent
    }

    /// Removes an entity. Returns `true` if it was present.
    #[inline]
    pub fn remove(&mut self, entity: Entity) -> bool {
        let (word, bit) = self.locate(entity);
        let was_present = self.words[word] & bit != 0;
        self.words[word] &= !bit;
        was_present
    }

    /// Checks membership.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        let (word, bit) = self.locate(entity);
        self.words[word] & bit != 0
    }

    /// Removes every entity.
    pub fn clear(&mut self) {
        for word in self.words.iter_mut() {
            *word = 0;
        }
    }

    /// Checks if no entity is a member.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Counts the members.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns the lowest member.
    #[must_use]
    pub fn first(&self) -> Option<Entity> {
        self.iter().next()
    }

    /// Removes and returns the lowest member.
    pub fn pop_first(&mut self) -> Option<Entity> {
        let entity = self.first()?;
        self.remove(entity);
        Some(entity)
    }

    /// Iterates over members in ascending order.
    ///
    /// Uses `trailing_zeros` to skip empty regions.
    pub fn iter(&self) -> MaskIter<'_> {
        MaskIter {
            words: &self.words,
            word_idx: 0,
            current_word: self.words.first().copied().unwrap_or(0),
        }
    }
}

/// Iterator over the members of an [`EntityMask`], ascending.
pub struct MaskIter<'a> {
    words: &'a [u32],
    word_idx: usize,
    current_word: u32,
}

impl Iterator for MaskIter<'_> {
    type Item = Entity;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let bit = self.current_word.trailing_zeros() as usize;
                // Clear lowest set bit
                self.current_word &= self.current_word - 1;
                return Some(Entity::new((self.word_idx * WORD_BITS + bit) as u32));
            }
            self.word_idx += 1;
            self.current_word = *self.words.get(self.word_idx)?;
        }
    }
}

impl<'a> IntoIterator for &'a EntityMask {
    type Item = Entity;
    type IntoIter = MaskIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
