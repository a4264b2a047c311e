// src/store/mod.rs
// =============================================================================
// Everything a run keeps on disk.
//
// Submodules:
// - atomic: write-to-temp-then-rename, so a crash never leaves half a file
// - checkpoint: the last top-level term that fully finished
// - seen: the persisted set of fingerprints (plus rebuilding it from results)
// - sink: the append-only CSV of harvested entries
//
// All three targets are per run mode (see config::StatePaths).
// =============================================================================

mod atomic;
mod checkpoint;
mod seen;
mod sink;

pub use checkpoint::CheckpointManager;
pub use seen::{FingerprintStore, SeenSet};
pub use sink::ResultSink;
