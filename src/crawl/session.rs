// src/crawl/session.rs
// =============================================================================
// A crawl session: one run over the whole top-level term space.
//
// The session owns everything a run touches (the driver, the seen-set, the
// sink, the checkpoint) instead of keeping it in globals, so two sessions
// never share state by accident and tests can build as many as they like.
//
// Crash consistency:
// The checkpoint moves only after a top-level term AND its refinement tree
// are done. Dying halfway through "sm" means "sm" starts over on the next
// run; the seen-set makes that replay harmless.
// =============================================================================

use super::driver::{CrawlDriver, CrawlState};
use crate::config::{CrawlConfig, RunMode};
use crate::directory::{PageFetcher, RecordExtractor};
use crate::error::{CrawlError, StoreError};
use crate::query::QueryEnumerator;
use crate::store::{CheckpointManager, FingerprintStore, ResultSink};
use serde::Serialize;

// What a finished run reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub resumed_from: Option<String>,
    pub top_level_terms: usize,
    pub queries: usize,
    pub raw_entries: usize,
    pub unique_entries: usize,
    pub depth_limited: usize,
    pub seen_total: usize,
}

pub struct CrawlSession<F, E> {
    mode: RunMode,
    enumerator: QueryEnumerator,
    driver: CrawlDriver<F, E>,
    checkpoint: CheckpointManager,
    state: CrawlState,
    total_unique: usize,
}

impl<F: PageFetcher, E: RecordExtractor> CrawlSession<F, E> {
    /// Sets up a run: loads the seen-set for this run mode.
    pub fn new(config: &CrawlConfig, fetcher: F, extractor: E) -> Result<Self, StoreError> {
        let paths = config.paths();

        let fingerprints = FingerprintStore::new(&paths.seen);
        let seen = fingerprints.load()?;
        if !seen.is_empty() {
            tracing::info!(count = seen.len(), "loaded previously seen entries");
        }

        Ok(Self {
            mode: config.mode,
            enumerator: QueryEnumerator::new(config.term_length, config.mode),
            driver: CrawlDriver::new(fetcher, extractor, config),
            checkpoint: CheckpointManager::new(&paths.checkpoint),
            state: CrawlState {
                seen,
                fingerprints,
                sink: ResultSink::new(&paths.results),
            },
            total_unique: 0,
        })
    }

    #[cfg(test)]
    pub fn driver(&self) -> &CrawlDriver<F, E> {
        &self.driver
    }

    #[cfg(test)]
    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs every remaining top-level term, committing the checkpoint after
    /// each one and clearing it at the end.
    pub async fn run(&mut self) -> Result<RunSummary, CrawlError> {
        let resumed_from = self.checkpoint.load()?;
        if let Some(last) = &resumed_from {
            tracing::info!(last_prefix = %last, "resuming from last prefix");
        }

        let terms = self.enumerator.remaining(resumed_from.as_deref());
        let mut summary = RunSummary {
            mode: format!("{:?}", self.mode).to_lowercase(),
            resumed_from,
            ..RunSummary::default()
        };

        for term in &terms {
            tracing::info!(prefix = %term, "starting search for prefix");

            let tree = self.driver.run_tree(term, &mut self.state).await?;
            self.total_unique += tree.unique;

            summary.top_level_terms += 1;
            summary.queries += tree.queries;
            summary.raw_entries += tree.raw;
            summary.unique_entries += tree.unique;
            summary.depth_limited += tree.depth_limited;

            self.checkpoint.commit(term)?;
            tracing::info!(
                prefix = %term,
                saved = tree.unique,
                total_unique = self.total_unique,
                "🌟 completed search for prefix"
            );
        }

        self.checkpoint.clear()?;
        summary.seen_total = self.state.seen.len();
        tracing::info!(total_unique = self.total_unique, "scraping completed");

        Ok(summary)
    }
}
