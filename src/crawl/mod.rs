// src/crawl/mod.rs
// =============================================================================
// This module runs the crawl.
//
// - driver: one query end to end, plus the work-stack that refines
//   saturated queries
// - session: the whole run over all top-level terms, with checkpointing
//
// Rust concepts:
// - #[cfg(test)] modules: the scripted fakes only exist in test builds
// =============================================================================

mod driver;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use session::{CrawlSession, RunSummary};
