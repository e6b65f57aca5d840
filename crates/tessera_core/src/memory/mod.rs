//! # Memory Management
//!
//! Pre-allocated bit-level containers for zero-allocation ticks.
//!
//! ## Design Philosophy
//!
//! All memory is allocated once, when the table is built. During a tick:
//! - No heap allocations
//! - No reallocation
//! - Predictable, flat latency

mod bitset;

pub use bitset::{EntityMask, MaskIter};
