//! # Field Keys
//!
//! Typed addresses into the four field stores. Hosts define them as
//! constants next to their models:
//!
//! ```rust,ignore
//! const X: FixedField = FixedField::new(0);
//! const ANGLE: IntField = IntField::new(0);
//! const VISIBLE: BoolField = BoolField::new(0);
//! const ANIM_TIMER: PackedField = PackedField::new(6, 4);
//! ```
//!
//! A key of one category can never address another category's store, and
//! out-of-range keys are rejected when the constant is evaluated.

use bytemuck::{Pod, Zeroable};

use crate::fixed::Fixed;
use crate::layout::{BOOL_FIELDS, MAX_FIXED_FIELDS, MAX_INT_FIELDS, PACKED_BITS};

/// Largest slot index any category supports (one bit per slot in a `u32`).
pub const MAX_SLOTS: usize = 32;

/// Value types the dense field stores can hold.
///
/// Values must be plain data so a row can be cleared to zero.
pub trait Scalar: Copy + Pod + Zeroable + Default + PartialEq + std::fmt::Debug + 'static {}

impl Scalar for i32 {}
impl Scalar for Fixed {}

/// A key into a dense (one value per slot) field store.
pub trait SlotKey: Copy {
    /// Slot index within an entity's row.
    fn slot(self) -> usize;

    /// Schema bit of this slot.
    #[inline]
    fn mask(self) -> u32 {
        1 << self.slot()
    }
}

macro_rules! slot_key {
    ($(#[$meta:meta])* $name:ident, $limit:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(u8);

        impl $name {
            /// Creates the key for a slot.
            ///
            /// # Panics
            ///
            /// Panics (at compile time in a `const`) if `slot` is past the
            /// category's slot count.
            #[must_use]
            pub const fn new(slot: u8) -> Self {
                assert!((slot as usize) < $limit, "field slot out of range");
                Self(slot)
            }

            /// Slot index, usable in `const` context.
            #[inline]
            #[must_use]
            pub const fn slot_index(self) -> u32 {
                self.0 as u32
            }
        }

        impl SlotKey for $name {
            #[inline]
            fn slot(self) -> usize {
                self.0 as usize
            }
        }
    };
}

slot_key!(
    /// Key of a fixed-point field.
    FixedField,
    MAX_FIXED_FIELDS
);

slot_key!(
    /// Key of an integer field.
    IntField,
    MAX_INT_FIELDS
);

slot_key!(
    /// Key of a boolean field (one bit of the entity's boolean word).
    BoolField,
    BOOL_FIELDS
);

/// Key of a packed multi-bit field: `width` bits at `offset` in the
/// entity's packed word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedField {
    offset: u8,
    width: u8,
}

impl PackedField {
    /// Creates the key.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or the bit range leaves the 32-bit word.
    #[must_use]
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width > 0, "packed field must be at least one bit wide");
        assert!(
            offset as usize + width as usize <= PACKED_BITS,
            "packed field exceeds 32 bits"
        );
        Self { offset, width }
    }

    /// Bit offset within the word.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u32 {
        self.offset as u32
    }

    /// Width in bits.
    #[inline]
    #[must_use]
    pub const fn width(self) -> u32 {
        self.width as u32
    }

    /// Mask of the value before shifting (`2^width - 1`).
    #[inline]
    #[must_use]
    pub const fn value_mask(self) -> u32 {
        u32::MAX >> (32 - self.width as u32)
    }

    /// Mask of the bits this field occupies in the word.
    #[inline]
    #[must_use]
    pub const fn mask(self) -> u32 {
        self.value_mask() << self.offset
    }

    /// Largest storable value.
    #[inline]
    #[must_use]
    pub const fn max_value(self) -> u32 {
        self.value_mask()
    }
}
