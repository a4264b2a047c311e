// src/directory/mod.rs
// =============================================================================
// This module talks to the directory service.
//
// Submodules:
// - fetcher: the PageFetcher contract (open, search, show all, get page N)
//   and an HTTP implementation built on reqwest
// - extractor: the RecordExtractor contract (entry block -> Record) and an
//   HTML implementation built on scraper
//
// The crawl engine only ever sees the two traits. Markup details (CSS
// classes, label text) stay in here.
// =============================================================================

mod extractor;
mod fetcher;

pub use extractor::{HtmlRecordExtractor, RecordExtractor};
pub use fetcher::{EntryBlock, HttpPageFetcher, PageFetcher, ResultPage};
