// src/crawl/testing.rs
// =============================================================================
// In-memory stand-ins for the directory, used by the crawl tests.
//
// ScriptedFetcher serves fixed pages per query and records what was asked.
// ScriptedExtractor reads an entry block's "html" as a tiny script:
//   "Ada"          -> Record { Name: Ada, Email: ada@utdallas.edu }
//   "flaky:Ada"    -> transient error on the first read, Ada after that
//   "broken:Ada"   -> transient error every time
//   "junk"         -> malformed entry
// =============================================================================

use crate::config::{CrawlConfig, RunMode};
use crate::directory::{EntryBlock, PageFetcher, RecordExtractor, ResultPage};
use crate::error::{ExtractError, FetchError};
use crate::record::{Field, Record};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// A config with no sleeps, rooted in `state_dir`.
pub fn test_config(state_dir: &Path, mode: RunMode) -> CrawlConfig {
    CrawlConfig {
        mode,
        state_dir: state_dir.to_path_buf(),
        request_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        init_retry_delay: Duration::ZERO,
        ..CrawlConfig::default()
    }
}

/// `count` distinct people whose names start with `prefix`.
pub fn people(prefix: &str, count: usize) -> Vec<EntryBlock> {
    (0..count)
        .map(|i| EntryBlock::new(format!("{prefix} person {i}")))
        .collect()
}

/// The record ScriptedExtractor produces for `name`.
pub fn person(name: &str) -> Record {
    Record::new()
        .with(Field::Name, name)
        .with(Field::Email, &format!("{}@utdallas.edu", name.to_lowercase().replace(' ', ".")))
}

#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    results: HashMap<String, Vec<Vec<EntryBlock>>>,
    fail_search: HashSet<String>,
    fail_open: bool,
    fatal_on: HashSet<String>,
    with_show_all: bool,
    current: Option<String>,
    submitted: Vec<String>,
    expanded: usize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `entries` for `query`, split into pages of ten.
    pub fn with_results(mut self, query: &str, entries: Vec<EntryBlock>) -> Self {
        let pages = entries.chunks(10).map(<[EntryBlock]>::to_vec).collect();
        self.results.insert(query.to_string(), pages);
        self
    }

    /// Serve exactly these pages for `query`.
    pub fn with_pages(mut self, query: &str, pages: Vec<Vec<EntryBlock>>) -> Self {
        self.results.insert(query.to_string(), pages);
        self
    }

    /// Submitting `query` fails with a load error.
    pub fn failing_search_for(mut self, query: &str) -> Self {
        self.fail_search.insert(query.to_string());
        self
    }

    /// The search view never loads.
    pub fn unreachable(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Submitting `query` reports the backend as gone.
    pub fn fatal_on(mut self, query: &str) -> Self {
        self.fatal_on.insert(query.to_string());
        self
    }

    pub fn offering_show_all(mut self) -> Self {
        self.with_show_all = true;
        self
    }

    pub fn submitted(&self) -> &[String] {
        &self.submitted
    }

    pub fn expanded(&self) -> usize {
        self.expanded
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn open(&mut self) -> Result<(), FetchError> {
        self.current = None;
        if self.fail_open {
            return Err(FetchError::Load {
                url: "scripted://directory".to_string(),
                reason: "page load timed out".to_string(),
            });
        }
        Ok(())
    }

    async fn submit_query(&mut self, query: &str) -> Result<(), FetchError> {
        self.submitted.push(query.to_string());
        if self.fatal_on.contains(query) {
            return Err(FetchError::Init {
                attempts: 3,
                reason: "browser went away".to_string(),
            });
        }
        if self.fail_search.contains(query) {
            return Err(FetchError::Load {
                url: format!("scripted://{query}"),
                reason: "connection reset".to_string(),
            });
        }
        self.current = Some(query.to_string());
        Ok(())
    }

    async fn expand_all(&mut self) -> Result<bool, FetchError> {
        if self.with_show_all {
            self.expanded += 1;
            Ok(true)
        } else {
            Err(FetchError::Timeout("a.allrecs".to_string()))
        }
    }

    async fn page(&mut self, index: usize) -> Result<Option<ResultPage>, FetchError> {
        let page = self
            .current
            .as_ref()
            .and_then(|query| self.results.get(query))
            .and_then(|pages| pages.get(index.checked_sub(1)?))
            .map(|entries| ResultPage {
                index,
                entries: entries.clone(),
            });
        Ok(page)
    }
}

#[derive(Debug, Default)]
pub struct ScriptedExtractor {
    reads: RefCell<HashMap<String, usize>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a block was read (retries included).
    pub fn reads_of(&self, html: &str) -> usize {
        self.reads.borrow().get(html).copied().unwrap_or(0)
    }
}

impl RecordExtractor for ScriptedExtractor {
    fn extract(&self, block: &EntryBlock) -> Result<Record, ExtractError> {
        let reads = {
            let mut all = self.reads.borrow_mut();
            let count = all.entry(block.html.clone()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(name) = block.html.strip_prefix("flaky:") {
            return if reads == 1 {
                Err(ExtractError::Transient("stale element".to_string()))
            } else {
                Ok(person(name))
            };
        }
        if block.html.starts_with("broken:") {
            return Err(ExtractError::Transient("stale element".to_string()));
        }
        if block.html == "junk" {
            return Err(ExtractError::Malformed("no name heading".to_string()));
        }

        Ok(person(&block.html))
    }
}
