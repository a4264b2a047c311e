// src/directory/extractor.rs
// =============================================================================
// Turns one entry block into a Record.
//
// An entry looks like this:
//
//   <div>
//     <h2 class="fullname mt-3">Ada Lovelace</h2>
//     <h3>Professor</h3>                        (optional title)
//     <div class="output row">
//       <p><b>Email:</b> ada@utdallas.edu</p>
//       <p><b>Department:</b> Mathematics</p>
//       ...
//     </div>
//   </div>
//
// Fields are matched by label text against the fixed field list. A label we
// do not know is dropped; a field whose label is absent stays "".
//
// Rust concepts:
// - Traits: the crawl engine depends on RecordExtractor, not on HTML
// - Iterator::collect::<String>() to join an element's text nodes
// =============================================================================

use super::fetcher::EntryBlock;
use crate::error::ExtractError;
use crate::record::{Field, Record};
use scraper::{ElementRef, Html, Selector};

/// Maps an entry block to its field values.
pub trait RecordExtractor {
    fn extract(&self, block: &EntryBlock) -> Result<Record, ExtractError>;
}

// RecordExtractor for the directory's HTML markup
#[derive(Debug, Clone, Default)]
pub struct HtmlRecordExtractor;

impl HtmlRecordExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Malformed(format!("bad selector {css}: {e:?}")))
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl RecordExtractor for HtmlRecordExtractor {
    fn extract(&self, block: &EntryBlock) -> Result<Record, ExtractError> {
        let fragment = Html::parse_fragment(&block.html);
        let mut record = Record::new();

        let name = fragment
            .select(&selector(".fullname.mt-3")?)
            .next()
            .map(element_text)
            .ok_or_else(|| ExtractError::Malformed("no name heading".to_string()))?;
        if name.is_empty() {
            // The heading exists but has not been filled in yet
            return Err(ExtractError::Transient("name not rendered yet".to_string()));
        }
        record.set(Field::Name, &name);

        // Most people have no title
        if let Some(title) = fragment.select(&selector("h3")?).next() {
            record.set(Field::Title, &element_text(title));
        }

        let row_selector = selector("div.output.row")?;
        let label_selector = selector("b")?;
        for row in fragment.select(&row_selector) {
            for label_element in row.select(&label_selector) {
                let label = element_text(label_element);
                let label = label.trim_end_matches(':').trim_end();
                let Some(field) = Field::from_label(label) else {
                    continue;
                };

                // The value is whatever follows the label in its parent
                let line = label_element
                    .parent()
                    .and_then(ElementRef::wrap)
                    .map(element_text)
                    .unwrap_or_default();
                let value = line
                    .strip_prefix(label)
                    .map(|rest| rest.trim_matches(|c: char| c == ':' || c.is_whitespace()))
                    .unwrap_or("");

                record.set(field, value);
            }
        }

        Ok(record)
    }
}
