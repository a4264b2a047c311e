// src/directory/fetcher.rs
// =============================================================================
// Fetching directory result pages.
//
// How a search looks to us:
// 1. Load the search view
// 2. Submit the term as the `dirSearch` value
// 3. If the results offer an "All" link (a.allrecs), follow it so every
//    result page is in one document
// 4. Result page N is the element with id "pageN". The service never says
//    how many pages there are; the first N that is missing ends the list
// 5. Inside a page, each entry is the element wrapping a ".fullname.mt-3"
//    heading
//
// Every request has a bounded wait (the client timeout). A timeout on an
// optional step is reported as FetchError::Timeout and the caller treats
// it as "not there".
//
// Rust concepts:
// - async-trait: async methods in a trait we can mock in tests
// - Keeping scraper::Html (not Send) out of async state by parsing in
//   plain functions that return owned data
// =============================================================================

use crate::config::CrawlConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

// The raw markup of one entry container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryBlock {
    pub html: String,
}

impl EntryBlock {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

// One result page: its index and its entry blocks in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    pub index: usize,
    pub entries: Vec<EntryBlock>,
}

/// Browser-like access to the directory search.
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigate to the search view.
    async fn open(&mut self) -> Result<(), FetchError>;

    /// Put `query` into the search control and submit it.
    async fn submit_query(&mut self, query: &str) -> Result<(), FetchError>;

    /// Activate the "show all results" control. Ok(false) when the current
    /// results do not offer one.
    async fn expand_all(&mut self) -> Result<bool, FetchError>;

    /// The container for page `index` (starting at 1), or None if it did not
    /// show up within the bounded wait.
    async fn page(&mut self, index: usize) -> Result<Option<ResultPage>, FetchError>;
}

// PageFetcher over plain HTTP
pub struct HttpPageFetcher {
    client: Client,
    base_url: Url,
    search_param: String,
    // The document currently "on screen" and where it came from
    current: Option<(Url, String)>,
}

impl HttpPageFetcher {
    /// Builds the HTTP client and checks that the service answers.
    ///
    /// Retries up to `config.init_attempts` times. Failing here is the one
    /// error that stops a whole run.
    pub async fn connect(config: &CrawlConfig) -> Result<Self, FetchError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| FetchError::Init {
            attempts: 0,
            reason: format!("invalid base URL '{}': {}", config.base_url, e),
        })?;

        let attempts = config.init_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match Self::try_connect(config, &base_url).await {
                Ok(client) => {
                    tracing::info!(url = %base_url, attempt, "directory backend ready");
                    return Ok(Self {
                        client,
                        base_url,
                        search_param: config.search_param.clone(),
                        current: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(attempt, attempts, error = %e, "backend initialisation failed");
                    last_error = e;
                    if attempt < attempts {
                        tokio::time::sleep(config.init_retry_delay).await;
                    }
                }
            }
        }

        Err(FetchError::Init {
            attempts,
            reason: last_error,
        })
    }

    async fn try_connect(config: &CrawlConfig, base_url: &Url) -> Result<Client, String> {
        let client = Client::builder()
            .timeout(config.wait_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| e.to_string())?;

        let response = client
            .get(base_url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        Ok(client)
    }

    // Fetches a page and makes it the current document
    async fn load(&mut self, url: Url) -> Result<(), FetchError> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Load {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Load {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let html = response.text().await.map_err(|e| FetchError::Load {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        self.current = Some((url, html));
        Ok(())
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair(&self.search_param, query);
        url
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn open(&mut self) -> Result<(), FetchError> {
        self.current = None;
        self.load(self.base_url.clone()).await
    }

    async fn submit_query(&mut self, query: &str) -> Result<(), FetchError> {
        let url = self.search_url(query);
        self.load(url).await
    }

    async fn expand_all(&mut self) -> Result<bool, FetchError> {
        let target = match &self.current {
            Some((url, html)) => find_show_all_link(html, url),
            None => None,
        };

        match target {
            Some(url) => {
                self.load(url).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn page(&mut self, index: usize) -> Result<Option<ResultPage>, FetchError> {
        Ok(self
            .current
            .as_ref()
            .and_then(|(_, html)| extract_page(html, index)))
    }
}

// Finds the "All" results link and resolves it against the page URL
fn find_show_all_link(html: &str, page_url: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a.allrecs").ok()?;

    let href = document
        .select(&selector)
        .find_map(|link| link.value().attr("href"))?;

    // "#" or "javascript:" links only toggle visibility; everything is
    // already in the document we have
    if href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    page_url.join(href).ok()
}

// Pulls page `index` and its entry blocks out of a results document
fn extract_page(html: &str, index: usize) -> Option<ResultPage> {
    let document = Html::parse_document(html);
    let page_selector = Selector::parse(&format!("#page{index}")).ok()?;
    let heading_selector = Selector::parse(".fullname.mt-3").ok()?;

    let page = document.select(&page_selector).next()?;

    // The entry is whatever directly wraps the name heading. Two headings
    // in one wrapper still make one entry.
    let mut wrappers: Vec<ElementRef> = Vec::new();
    for heading in page.select(&heading_selector) {
        let Some(wrapper) = heading.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if !wrappers.contains(&wrapper) {
            wrappers.push(wrapper);
        }
    }

    Some(ResultPage {
        index,
        entries: wrappers
            .into_iter()
            .map(|wrapper| EntryBlock::new(wrapper.html()))
            .collect(),
    })
}
