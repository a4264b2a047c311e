// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl:   walk the whole directory (or resume an interrupted walk)
// - rebuild: recreate the seen-set from the results CSV
//
// Both take --reversed, which switches to the reversed run's own files.
// =============================================================================

use crate::config::{CrawlConfig, RunMode, DEFAULT_BASE_URL};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// 26^4 = 456,976 top-level terms is already a multi-day crawl.
const MAX_TERM_LENGTH: u64 = 4;

#[derive(Parser, Debug)]
#[command(
    name = "directory-harvester",
    version,
    about = "Harvest every record from a directory lookup service",
    long_about = "directory-harvester searches a directory service with every two-letter term, \
                  refines searches that hit the result cap, and appends each new person to a CSV. \
                  It can be stopped at any time and picks up where it left off."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the directory, resuming from the last checkpoint if there is one
    ///
    /// Example: directory-harvester crawl --state-dir ./state
    Crawl {
        /// Walk the terms from zz down to aa, using the reversed state files
        #[arg(long)]
        reversed: bool,

        /// Directory holding the results CSV, checkpoint and seen-set
        #[arg(long, default_value = ".")]
        state_dir: PathBuf,

        /// Directory search page
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Length of the generated top-level terms (1 to 4)
        #[arg(
            long,
            default_value_t = 2,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_TERM_LENGTH)
        )]
        term_length: usize,

        /// How many levels a saturated search may be refined
        #[arg(long, default_value_t = 6)]
        max_depth: usize,

        /// Bounded wait for each request, in seconds
        #[arg(long, default_value_t = 10)]
        page_timeout_secs: u64,

        /// Pause between searches, in milliseconds
        #[arg(long, default_value_t = 500)]
        request_delay_ms: u64,

        /// Print the run summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the seen-set from the results CSV
    ///
    /// Use this when the seen-set file is lost or looks corrupt. Safe to run
    /// at any time.
    Rebuild {
        /// Rebuild the reversed run's seen-set
        #[arg(long)]
        reversed: bool,

        /// Directory holding the results CSV and seen-set
        #[arg(long, default_value = ".")]
        state_dir: PathBuf,
    },
}

/// Settings for a crawl from its command-line arguments.
#[allow(clippy::too_many_arguments)]
pub fn crawl_config(
    reversed: bool,
    state_dir: PathBuf,
    base_url: String,
    term_length: usize,
    max_depth: usize,
    page_timeout_secs: u64,
    request_delay_ms: u64,
) -> CrawlConfig {
    CrawlConfig {
        mode: RunMode::from_reversed_flag(reversed),
        state_dir,
        base_url,
        term_length,
        max_refine_depth: max_depth,
        wait_timeout: Duration::from_secs(page_timeout_secs),
        request_delay: Duration::from_millis(request_delay_ms),
        ..CrawlConfig::default()
    }
}
