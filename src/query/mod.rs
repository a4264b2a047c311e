// src/query/mod.rs
// =============================================================================
// This module decides WHAT to search for.
//
// Submodules:
// - enumerator: the fixed, ordered space of top-level terms (aa..zz) and
//   where to pick it up again after an interruption
// - refiner: turns a saturated query into more specific child queries
//
// Nothing in here talks to the network or the disk. Both pieces are pure,
// which keeps the search space easy to test.
// =============================================================================

mod enumerator;
mod refiner;

pub use enumerator::QueryEnumerator;
pub use refiner::{PendingQuery, SaturationRefiner};
