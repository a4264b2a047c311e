// src/store/checkpoint.rs
// =============================================================================
// The checkpoint: one line of text naming the last top-level term whose
// whole refinement tree finished.
//
// - present  => resume at (the bucket of) this term
// - absent   => start from the beginning
//
// It is committed only between top-level terms and cleared only when the
// whole enumeration is done.
// =============================================================================

use super::atomic::write_atomic;
use crate::error::StoreError;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct CheckpointManager {
    path: PathBuf,
}

impl CheckpointManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Reads the checkpoint. A missing or blank file is None.
    pub fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let term = contents.trim();
                Ok((!term.is_empty()).then(|| term.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    /// Atomically records `query` as the last completed top-level term.
    pub fn commit(&self, query: &str) -> Result<(), StoreError> {
        write_atomic(&self.path, query.as_bytes())?;
        tracing::debug!(query, path = %self.path.display(), "checkpoint committed");
        Ok(())
    }

    /// Removes the checkpoint. Clearing twice is fine.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }
}
