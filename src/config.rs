// src/config.rs
// =============================================================================
// Run configuration.
//
// A run is either Forward (aa, ab, ... zz) or Reversed (zz, zy, ... aa).
// The mode picks the enumeration direction AND the files the run owns, so a
// forward run and a reversed run can share a state directory without ever
// touching each other's checkpoint, seen-set or results.
//
// Rust concepts:
// - Default trait: one place for every tunable's default value
// - PathBuf: owned filesystem paths
// =============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.utdallas.edu/directory/";
pub const DEFAULT_SEARCH_PARAM: &str = "dirSearch";

// Enumeration direction, also used to pick the per-mode state files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Forward,
    Reversed,
}

impl RunMode {
    pub fn from_reversed_flag(reversed: bool) -> Self {
        if reversed {
            RunMode::Reversed
        } else {
            RunMode::Forward
        }
    }

    fn file_suffix(self) -> &'static str {
        match self {
            RunMode::Forward => "",
            RunMode::Reversed => "_reversed",
        }
    }
}

// The three persisted targets a run reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub results: PathBuf,
    pub checkpoint: PathBuf,
    pub seen: PathBuf,
}

impl StatePaths {
    pub fn for_mode(state_dir: &Path, mode: RunMode) -> Self {
        let suffix = mode.file_suffix();
        Self {
            results: state_dir.join(format!("directory_results{suffix}.csv")),
            checkpoint: state_dir.join(format!("last_prefix{suffix}.txt")),
            seen: state_dir.join(format!("seen_people{suffix}.json")),
        }
    }
}

// Everything that shapes a crawl run
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub mode: RunMode,
    pub state_dir: PathBuf,
    /// Directory search page.
    pub base_url: String,
    /// Query-string parameter the search form submits.
    pub search_param: String,
    /// Length of the generated top-level terms.
    pub term_length: usize,
    /// Highest page index the service ever shows.
    pub max_pages: usize,
    /// Raw entry count at which a query is considered saturated.
    pub saturation_cap: usize,
    /// How many refinement levels below a top-level term we go.
    pub max_refine_depth: usize,
    /// Bounded wait for any single request / element.
    pub wait_timeout: Duration,
    /// Pause between queries so we do not hammer the service.
    pub request_delay: Duration,
    /// Pause before retrying an entry that changed mid-read.
    pub retry_delay: Duration,
    /// Attempts to bring the backend up before giving up.
    pub init_attempts: u32,
    pub init_retry_delay: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Forward,
            state_dir: PathBuf::from("."),
            base_url: DEFAULT_BASE_URL.to_string(),
            search_param: DEFAULT_SEARCH_PARAM.to_string(),
            term_length: 2,
            max_pages: 10,
            saturation_cap: 100,
            max_refine_depth: 6,
            wait_timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(500),
            retry_delay: Duration::from_millis(100),
            init_attempts: 3,
            init_retry_delay: Duration::from_secs(2),
        }
    }
}

impl CrawlConfig {
    pub fn paths(&self) -> StatePaths {
        StatePaths::for_mode(&self.state_dir, self.mode)
    }
}
