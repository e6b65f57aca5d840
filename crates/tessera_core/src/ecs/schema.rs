//! # Schema Registry
//!
//! One bitmask word per model for a single field-store category. A set bit
//! means "this model declares that field (or that packed bit)".
//!
//! Both "does model M own field F" and "does model M satisfy a processor's
//! requirement" reduce to the same test: `(bits & mask) == mask`.

use super::entity::Model;

/// Per-model declaration masks of one store category.
#[derive(Clone, Debug)]
pub struct Schema {
    words: Box<[u32]>,
}

impl Schema {
    /// Creates an empty schema for `models` models.
    #[must_use]
    pub fn new(models: usize) -> Self {
        Self {
            words: vec![0u32; models].into_boxed_slice(),
        }
    }

    /// Number of models this schema covers.
    #[inline]
    #[must_use]
    pub fn models(&self) -> usize {
        self.words.len()
    }

    /// ORs `bits` into the model's word.
    ///
    /// # Panics
    ///
    /// Panics if the model is out of range.
    pub fn declare(&mut self, model: Model, bits: u32) {
        assert!(
            model.index() < self.words.len(),
            "model {model} exceeds the {} declared models",
            self.words.len()
        );
        self.words[model.index()] |= bits;
    }

    /// Declared bits of a model; zero for the "no model" sentinel.
    #[inline]
    #[must_use]
    pub fn bits(&self, model: Model) -> u32 {
        self.words.get(model.index()).copied().unwrap_or(0)
    }

    /// Checks that the model declares every bit of `mask`.
    #[inline]
    #[must_use]
    pub fn matching(&self, model: Model, mask: u32) -> bool {
        self.bits(model) & mask == mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching() {
        let mut schema = Schema::new(4);
        schema.declare(Model::new(1), 0b0101);

        assert!(schema.matching(Model::new(1), 0b0001));
        assert!(schema.matching(Model::new(1), 0b0101));
        assert!(!schema.matching(Model::new(1), 0b0111));
        assert!(!schema.matching(Model::new(0), 0b0001));
        // Empty requirement is always satisfied
        assert!(schema.matching(Model::new(0), 0));
    }

    #[test]
    fn test_declarations_accumulate() {
        let mut schema = Schema::new(2);
        schema.declare(Model::new(0), 0b01);
        schema.declare(Model::new(0), 0b10);
        assert_eq!(schema.bits(Model::new(0)), 0b11);
        assert_eq!(schema.bits(Model::NONE), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds the 2 declared models")]
    fn test_model_out_of_range() {
        let mut schema = Schema::new(2);
        schema.declare(Model::new(2), 1);
    }
}
