// src/store/seen.rs
// =============================================================================
// The seen-set: every fingerprint ever written to the result sink.
//
// Loaded once when a run starts, grown while crawling, and written out in
// full after every query (not after every record). Writing the whole set is
// O(everything seen so far), which is fine at directory scale and means there
// is no separate per-record journal to keep consistent.
//
// Rebuild:
// If the seen-set file is lost or suspect, the result sink has everything we
// need. Each stored row goes through the same Record::fingerprint() as live
// crawling (trim, blank => ""), so the rebuilt set equals the original.
// =============================================================================

use super::atomic::write_atomic;
use super::sink::ResultSink;
use crate::error::StoreError;
use crate::record::Fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const SEEN_SET_VERSION: u32 = 1;

// In-memory identity set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    fingerprints: HashSet<Fingerprint>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.fingerprints.contains(fingerprint)
    }

    /// Adds a fingerprint. Returns false if it was already there.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        self.fingerprints.insert(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl FromIterator<Fingerprint> for SeenSet {
    fn from_iter<I: IntoIterator<Item = Fingerprint>>(iter: I) -> Self {
        Self {
            fingerprints: iter.into_iter().collect(),
        }
    }
}

// On-disk layout of the seen-set file
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSeenSet {
    version: u32,
    fingerprints: Vec<Fingerprint>,
}

// Loads and saves the seen-set for one run mode
#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Reads the persisted set, or an empty one if there is none yet.
    pub fn load(&self) -> Result<SeenSet, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SeenSet::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let persisted: PersistedSeenSet =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
                path: self.path.clone(),
                source,
            })?;

        if persisted.version != SEEN_SET_VERSION {
            tracing::warn!(
                version = persisted.version,
                expected = SEEN_SET_VERSION,
                "seen-set file has an unexpected version, loading anyway"
            );
        }

        Ok(persisted.fingerprints.into_iter().collect())
    }

    /// Writes the whole set, atomically. Output is sorted so the same set
    /// always produces the same file.
    pub fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        let mut fingerprints: Vec<Fingerprint> = seen.fingerprints.iter().cloned().collect();
        fingerprints.sort();

        let persisted = PersistedSeenSet {
            version: SEEN_SET_VERSION,
            fingerprints,
        };
        let raw = serde_json::to_vec(&persisted).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(&self.path, &raw)
    }

    /// Recomputes the seen-set from the result sink and persists it.
    ///
    /// Touches nothing if the sink cannot be read. Running it twice gives the
    /// same file.
    pub fn rebuild_from(&self, sink: &ResultSink) -> Result<SeenSet, StoreError> {
        let entries = sink.read_all()?;
        let rows = entries.len();

        let seen: SeenSet = entries
            .iter()
            .map(|entry| entry.record.fingerprint())
            .collect();

        tracing::info!(
            rows,
            unique = seen.len(),
            sink = %sink.path().display(),
            "rebuilt seen-set from results"
        );

        self.persist(&seen)?;
        Ok(seen)
    }
}
