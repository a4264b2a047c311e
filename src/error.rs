// src/error.rs
// =============================================================================
// Error types for the harvester.
//
// Only one error is allowed to stop a whole run: the directory backend could
// not be brought up at all (FetchError::Init), or the state files can no
// longer be written. Everything else is logged and the crawl moves on:
// - a missing page or control is a timeout and simply ends pagination
// - an entry that changed while we read it is retried once, then skipped
// - an entry with an unexpected shape is skipped
//
// Rust concepts:
// - thiserror: derives std::error::Error and Display from attributes
// - #[from]: lets `?` convert a lower-level error automatically
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

// Errors from the page fetcher (the directory backend)
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend could not be initialised after all retries. Fatal.
    #[error("backend unavailable after {attempts} attempt(s): {reason}")]
    Init { attempts: u32, reason: String },

    /// The search view could not be loaded for one query.
    #[error("failed to load {url}: {reason}")]
    Load { url: String, reason: String },

    /// An element did not show up within the bounded wait.
    #[error("timed out waiting for {0}")]
    Timeout(String),
}

// Errors from turning one entry block into a record
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The block changed while it was being read. Worth one retry.
    #[error("entry changed while reading: {0}")]
    Transient(String),

    /// The block does not look like a directory entry.
    #[error("unexpected entry structure: {0}")]
    Malformed(String),
}

// Errors from the on-disk state (checkpoint, seen-set, result sink)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seen-set encoding error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("result file error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("result file not found at {0}")]
    SinkMissing(PathBuf),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

// Errors that abort a crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
