// src/crawl/driver.rs
// =============================================================================
// The crawl driver: runs one search and everything it has to refine.
//
// One query:
// 1. Open the search view (failure => log, count nothing, move on)
// 2. Submit the term, click "show all" if there is one
// 3. Walk pages 1..=max_pages until a page is missing
// 4. Extract every entry block (one retry for a transient read, else skip)
// 5. Dedup by fingerprint against the seen-set; new entries get the query
//    term stamped on them
// 6. Persist the whole seen-set, then append the new rows to the sink
// 7. If the raw entry count hit the cap, the query is saturated
//
// A saturated query is refined with an explicit work-stack instead of
// recursion. Children are pushed in reverse so they pop in order, which
// gives the same depth-first order as calling ourselves recursively:
//   jo, joa, joaa, ..., joaz, joa a, ..., job, ...
//
// Rust concepts:
// - Generics over the collaborator traits, so tests plug in fakes
// - Vec as a stack: push / pop from the end
// =============================================================================

use crate::config::CrawlConfig;
use crate::directory::{EntryBlock, PageFetcher, RecordExtractor};
use crate::error::{CrawlError, ExtractError, FetchError};
use crate::query::{PendingQuery, SaturationRefiner};
use crate::record::{Entry, Field, Record};
use crate::store::{FingerprintStore, ResultSink, SeenSet};
use std::time::Duration;

// The per-run state every query reads and writes
#[derive(Debug)]
pub struct CrawlState {
    pub seen: SeenSet,
    pub fingerprints: FingerprintStore,
    pub sink: ResultSink,
}

// What a single query produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub query: String,
    /// Entries observed, duplicates and unreadable ones included.
    pub raw: usize,
    /// Entries that were new and went to the sink.
    pub unique: usize,
    pub saturated: bool,
}

impl QueryOutcome {
    fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            raw: 0,
            unique: 0,
            saturated: false,
        }
    }
}

// Totals for a top-level term and its whole refinement tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeOutcome {
    pub queries: usize,
    pub raw: usize,
    pub unique: usize,
    /// Saturated queries the depth guard refused to refine.
    pub depth_limited: usize,
}

impl TreeOutcome {
    fn add(&mut self, outcome: &QueryOutcome) {
        self.queries += 1;
        self.raw += outcome.raw;
        self.unique += outcome.unique;
    }
}

pub struct CrawlDriver<F, E> {
    fetcher: F,
    extractor: E,
    refiner: SaturationRefiner,
    max_pages: usize,
    retry_delay: Duration,
    request_delay: Duration,
}

impl<F: PageFetcher, E: RecordExtractor> CrawlDriver<F, E> {
    pub fn new(fetcher: F, extractor: E, config: &CrawlConfig) -> Self {
        Self {
            fetcher,
            extractor,
            refiner: SaturationRefiner::new(config.saturation_cap, config.max_refine_depth),
            max_pages: config.max_pages,
            retry_delay: config.retry_delay,
            request_delay: config.request_delay,
        }
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    #[cfg(test)]
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Runs `term` and every child query its saturation leads to.
    ///
    /// Only a backend failure or a persistence failure comes back as Err.
    pub async fn run_tree(
        &mut self,
        term: &str,
        state: &mut CrawlState,
    ) -> Result<TreeOutcome, CrawlError> {
        let mut tree = TreeOutcome::default();
        let mut stack = vec![PendingQuery::top_level(term)];

        while let Some(pending) = stack.pop() {
            let outcome = self.process(&pending.term, state).await?;
            tree.add(&outcome);

            if outcome.saturated {
                match self.refiner.expand(&pending) {
                    Some(children) => {
                        tracing::info!(
                            query = %outcome.query,
                            children = children.len(),
                            depth = pending.depth + 1,
                            "⚠️ reached maximum entries, adding deeper search terms"
                        );
                        stack.extend(children.into_iter().rev());
                    }
                    None => {
                        tree.depth_limited += 1;
                        tracing::warn!(
                            query = %pending.term,
                            depth = pending.depth,
                            "query still saturated at the depth limit, results may be incomplete"
                        );
                    }
                }
            }

            if !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        Ok(tree)
    }

    /// Runs a single query: fetch, extract, dedup, persist.
    pub async fn process(
        &mut self,
        query: &str,
        state: &mut CrawlState,
    ) -> Result<QueryOutcome, CrawlError> {
        tracing::info!(query, "🔍 searching");

        if let Err(e) = self.fetcher.open().await {
            return skip_query(query, "load search page", e);
        }
        if let Err(e) = self.fetcher.submit_query(query).await {
            return skip_query(query, "submit search", e);
        }

        match self.fetcher.expand_all().await {
            Ok(true) => tracing::debug!(query, "showing all results"),
            Ok(false) | Err(FetchError::Timeout(_)) => {}
            Err(e @ FetchError::Init { .. }) => return Err(e.into()),
            Err(e) => tracing::warn!(query, error = %e, "could not expand results"),
        }

        let mut raw = 0;
        let mut batch = Vec::new();

        for index in 1..=self.max_pages {
            let page = match self.fetcher.page(index).await {
                Ok(Some(page)) => page,
                Ok(None) | Err(FetchError::Timeout(_)) => break,
                Err(e @ FetchError::Init { .. }) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(query, page = index, error = %e, "could not read page");
                    break;
                }
            };
            tracing::debug!(query, page = page.index, entries = page.entries.len(), "📄 processing page");

            for block in &page.entries {
                raw += 1;
                let Some(record) = self.extract_with_retry(query, block).await else {
                    continue;
                };

                let fingerprint = record.fingerprint();
                if state.seen.contains(&fingerprint) {
                    tracing::debug!(query, name = record.get(Field::Name), "duplicate entry, skipping");
                    continue;
                }

                state.seen.insert(fingerprint);
                batch.push(Entry::new(record, query));
            }
        }

        // Seen-set first: a crash between the two writes can drop rows but
        // never duplicate them
        state.fingerprints.persist(&state.seen)?;
        let unique = state.sink.append(&batch)?;

        let saturated = self.refiner.is_saturated(raw);
        tracing::info!(query, raw, saved = unique, saturated, "✅ query finished");

        Ok(QueryOutcome {
            query: query.to_string(),
            raw,
            unique,
            saturated,
        })
    }

    async fn extract_with_retry(&self, query: &str, block: &EntryBlock) -> Option<Record> {
        let first = match self.extractor.extract(block) {
            Ok(record) => return Some(record),
            Err(ExtractError::Transient(reason)) => reason,
            Err(e @ ExtractError::Malformed(_)) => {
                tracing::warn!(query, error = %e, "skipping entry");
                return None;
            }
        };

        tracing::debug!(query, reason = %first, "entry changed while reading, retrying");
        if !self.retry_delay.is_zero() {
            tokio::time::sleep(self.retry_delay).await;
        }

        match self.extractor.extract(block) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(query, error = %e, "skipping entry after retry");
                None
            }
        }
    }
}

// A query the backend could not serve: fatal only if the backend is gone
fn skip_query(query: &str, step: &str, error: FetchError) -> Result<QueryOutcome, CrawlError> {
    if let FetchError::Init { .. } = error {
        return Err(error.into());
    }
    tracing::warn!(query, step, error = %error, "skipping query");
    Ok(QueryOutcome::empty(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunMode;
    use crate::crawl::testing::{people, person, test_config, ScriptedExtractor, ScriptedFetcher};
    use tempfile::TempDir;

    fn state_in(dir: &TempDir) -> CrawlState {
        let paths = test_config(dir.path(), RunMode::Forward).paths();
        CrawlState {
            seen: SeenSet::new(),
            fingerprints: FingerprintStore::new(paths.seen),
            sink: ResultSink::new(paths.results),
        }
    }

    fn driver(dir: &TempDir, fetcher: ScriptedFetcher) -> CrawlDriver<ScriptedFetcher, ScriptedExtractor> {
        CrawlDriver::new(fetcher, ScriptedExtractor::new(), &test_config(dir.path(), RunMode::Forward))
    }

    #[tokio::test]
    async fn test_new_entries_are_saved_and_seen() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new().with_results(
            "aa",
            vec![EntryBlock::new("Aaron A"), EntryBlock::new("Aaron B"), EntryBlock::new("Aaliyah C")],
        );
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("aa", &mut state).await.unwrap();
        assert_eq!((outcome.raw, outcome.unique), (3, 3));
        assert!(!outcome.saturated);

        let rows = state.sink.read_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.query_term == "aa"));
        assert_eq!(state.seen.len(), 3);
        assert_eq!(state.fingerprints.load().unwrap(), state.seen);

        // Same results again: nothing new
        let again = driver.process("aa", &mut state).await.unwrap();
        assert_eq!((again.raw, again.unique), (3, 0));
        assert_eq!(state.sink.read_all().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicates_within_one_query() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new().with_pages(
            "bo",
            vec![
                vec![EntryBlock::new("Bo Diddley"), EntryBlock::new("Bo Jackson")],
                vec![EntryBlock::new("Bo Diddley")],
            ],
        );
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("bo", &mut state).await.unwrap();
        assert_eq!((outcome.raw, outcome.unique), (3, 2));
    }

    #[tokio::test]
    async fn test_pagination_stops_at_first_missing_page() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new().with_results("ca", people("Ca", 25));
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("ca", &mut state).await.unwrap();
        assert_eq!(outcome.raw, 25);
        assert_eq!(outcome.unique, 25);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        // Eleven pages offered, only ten are ever read
        let pages = (0..11).map(|p| people(&format!("Da{p}"), 5)).collect();
        let fetcher = ScriptedFetcher::new().with_pages("da", pages);
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("da", &mut state).await.unwrap();
        assert_eq!(outcome.raw, 50);
    }

    #[tokio::test]
    async fn test_saturation_threshold() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_results("ed", people("Ed", 100))
            .with_results("ef", people("Ef", 99));
        let mut driver = driver(&dir, fetcher);

        assert!(driver.process("ed", &mut state).await.unwrap().saturated);
        assert!(!driver.process("ef", &mut state).await.unwrap().saturated);
    }

    #[tokio::test]
    async fn test_saturated_two_letter_query_refines_with_letters_only() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_results("jo", people("Jo", 100))
            .with_results("joh", people("Joh", 4));
        let mut driver = driver(&dir, fetcher);

        let tree = driver.run_tree("jo", &mut state).await.unwrap();

        let submitted = driver.fetcher().submitted();
        assert_eq!(submitted.len(), 27);
        assert_eq!(submitted[0], "jo");
        assert_eq!(submitted[1], "joa");
        assert_eq!(submitted[26], "joz");
        assert!(submitted.iter().all(|q| !q.contains(' ')));
        assert_eq!(tree.queries, 27);
        assert_eq!(tree.unique, 104);
    }

    #[tokio::test]
    async fn test_saturated_three_letter_query_adds_space_variants() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new().with_results("smi", people("Smi", 100));
        let mut driver = driver(&dir, fetcher);

        driver.run_tree("smi", &mut state).await.unwrap();

        let submitted = driver.fetcher().submitted();
        assert_eq!(submitted.len(), 1 + 52);
        assert_eq!(submitted[1], "smia");
        assert_eq!(submitted[26], "smiz");
        assert_eq!(submitted[27], "smi a");
        assert_eq!(submitted[52], "smi z");
    }

    #[tokio::test]
    async fn test_refinement_is_depth_first() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_results("jo", people("Jo", 100))
            .with_results("joa", people("Joa", 100));
        let mut driver = driver(&dir, fetcher);

        driver.run_tree("jo", &mut state).await.unwrap();

        let submitted = driver.fetcher().submitted();
        assert_eq!(&submitted[..3], ["jo", "joa", "joaa"]);
        assert_eq!(submitted[27], "joaz");
        assert_eq!(submitted[28], "joa a");
        assert_eq!(submitted[53], "joa z");
        assert_eq!(submitted[54], "job");
        assert_eq!(submitted.len(), 1 + 26 + 52);
    }

    #[tokio::test]
    async fn test_children_share_the_seen_set() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let everyone = people("Jo", 100);
        // "joa" returns some of the same people as "jo"
        let fetcher = ScriptedFetcher::new()
            .with_results("jo", everyone.clone())
            .with_results("joa", everyone[..5].to_vec());
        let mut driver = driver(&dir, fetcher);

        let tree = driver.run_tree("jo", &mut state).await.unwrap();
        assert_eq!(tree.raw, 105);
        assert_eq!(tree.unique, 100);
        assert_eq!(state.sink.read_all().unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_depth_guard_stops_refinement() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let config = CrawlConfig {
            max_refine_depth: 1,
            ..test_config(dir.path(), RunMode::Forward)
        };
        let fetcher = ScriptedFetcher::new()
            .with_results("jo", people("Jo", 100))
            .with_results("joa", people("Joa", 100));
        let mut driver = CrawlDriver::new(fetcher, ScriptedExtractor::new(), &config);

        let tree = driver.run_tree("jo", &mut state).await.unwrap();
        assert_eq!(tree.queries, 27);
        assert_eq!(tree.depth_limited, 1);
    }

    #[tokio::test]
    async fn test_transient_read_is_retried_once() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new().with_results(
            "fl",
            vec![EntryBlock::new("flaky:Flo"), EntryBlock::new("broken:Flynn"), EntryBlock::new("Flora")],
        );
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("fl", &mut state).await.unwrap();
        assert_eq!(outcome.raw, 3);
        assert_eq!(outcome.unique, 2);
        assert_eq!(driver.extractor().reads_of("flaky:Flo"), 2);
        assert_eq!(driver.extractor().reads_of("broken:Flynn"), 2);
        assert!(state.seen.contains(&person("Flo").fingerprint()));
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_results("ga", vec![EntryBlock::new("junk"), EntryBlock::new("Gary")]);
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("ga", &mut state).await.unwrap();
        assert_eq!((outcome.raw, outcome.unique), (2, 1));
        assert_eq!(driver.extractor().reads_of("junk"), 1);
        let rows = state.sink.read_all().unwrap();
        assert_eq!(rows[0].record.get(Field::Name), "Gary");
    }

    #[tokio::test]
    async fn test_load_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let mut driver = driver(&dir, ScriptedFetcher::new().unreachable());

        let outcome = driver.process("ha", &mut state).await.unwrap();
        assert_eq!(outcome, QueryOutcome::empty("ha"));
    }

    #[tokio::test]
    async fn test_search_failure_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_results("ha", people("Ha", 3))
            .failing_search_for("ha");
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("ha", &mut state).await.unwrap();
        assert_eq!((outcome.raw, outcome.unique), (0, 0));
    }

    #[tokio::test]
    async fn test_backend_loss_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let mut driver = driver(&dir, ScriptedFetcher::new().fatal_on("ia"));

        let result = driver.process("ia", &mut state).await;
        assert!(matches!(result, Err(CrawlError::Fetch(FetchError::Init { .. }))));
    }

    #[tokio::test]
    async fn test_show_all_is_optional() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let fetcher = ScriptedFetcher::new()
            .with_results("ja", people("Ja", 2))
            .offering_show_all();
        let mut driver = driver(&dir, fetcher);

        let outcome = driver.process("ja", &mut state).await.unwrap();
        assert_eq!(outcome.unique, 2);
        assert_eq!(driver.fetcher().expanded(), 1);
    }
}
