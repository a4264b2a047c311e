// src/store/sink.rs
// =============================================================================
// The result sink: an append-only CSV of every new entry.
//
// Column order is fixed (the ten fields, then Query-Term). The header goes
// in exactly once, when the file is empty or does not exist yet; after that
// every batch is only appended. Each batch is flushed and fsynced before we
// return, so rows that made it into the sink survive a crash.
//
// A crash in the middle of a write can still leave a partial last row with
// no newline. Before appending, that fragment is cut off so the next row
// starts on a line of its own. The person it belonged to is already in the
// seen-set; `rebuild` followed by a re-crawl brings them back.
//
// Reading back (for rebuilding the seen-set) is lenient: columns are found by
// header name, a missing column or a short row reads as "".
// =============================================================================

use crate::error::StoreError;
use crate::record::{header_row, Entry, Field, Record, QUERY_TERM_COLUMN};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Older result files called the provenance column "Prefix".
const LEGACY_QUERY_TERM_COLUMN: &str = "Prefix";

#[derive(Debug, Clone)]
pub struct ResultSink {
    path: PathBuf,
}

impl ResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn needs_header(&self) -> bool {
        fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true)
    }

    /// Truncates the file back to its last complete line, if the last write
    /// was torn. Returns the number of bytes removed.
    fn drop_torn_tail(&self) -> Result<u64, StoreError> {
        let mut file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };
        let io_err = |e| StoreError::io(&self.path, e);

        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            return Ok(0);
        }

        let mut last = [0u8; 1];
        file.seek(SeekFrom::Start(len - 1)).map_err(io_err)?;
        file.read_exact(&mut last).map_err(io_err)?;
        if last[0] == b'\n' {
            return Ok(0);
        }

        let mut contents = Vec::new();
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        file.read_to_end(&mut contents).map_err(io_err)?;
        let keep = contents
            .iter()
            .rposition(|&byte| byte == b'\n')
            .map_or(0, |pos| pos + 1);

        tracing::warn!(
            path = %self.path.display(),
            fragment = %String::from_utf8_lossy(&contents[keep..]),
            "dropping incomplete last row from results file"
        );

        file.set_len(keep as u64).map_err(io_err)?;
        file.sync_data().map_err(io_err)?;
        Ok(len - keep as u64)
    }

    fn csv_error(&self, source: csv::Error) -> StoreError {
        StoreError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    /// Appends a batch of entries, writing the header first if the file is
    /// new. Returns the number of rows written.
    pub fn append(&self, entries: &[Entry]) -> Result<usize, StoreError> {
        self.drop_torn_tail()?;
        let write_header = self.needs_header();
        if entries.is_empty() && !write_header {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::io(&self.path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer
                .write_record(header_row())
                .map_err(|e| self.csv_error(e))?;
        }
        for entry in entries {
            writer
                .write_record(entry.to_row())
                .map_err(|e| self.csv_error(e))?;
        }

        writer
            .flush()
            .map_err(|e| StoreError::io(&self.path, e))?;
        writer
            .get_ref()
            .sync_data()
            .map_err(|e| StoreError::io(&self.path, e))?;

        Ok(entries.len())
    }

    /// Reads every stored row back as an Entry.
    pub fn read_all(&self) -> Result<Vec<Entry>, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::SinkMissing(self.path.clone()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        let headers = reader.headers().map_err(|e| self.csv_error(e))?.clone();

        // Column index for every field we know about, by header name
        let field_columns: Vec<(Field, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, name)| Field::from_label(name).map(|field| (field, idx)))
            .collect();
        let query_column = headers.iter().position(|name| {
            let name = name.trim();
            name == QUERY_TERM_COLUMN || name == LEGACY_QUERY_TERM_COLUMN
        });

        let mut entries = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| self.csv_error(e))?;

            let mut record = Record::new();
            for &(field, idx) in &field_columns {
                record.set(field, row.get(idx).unwrap_or(""));
            }
            let query_term = query_column
                .and_then(|idx| row.get(idx))
                .unwrap_or("")
                .trim();

            entries.push(Entry::new(record, query_term));
        }

        Ok(entries)
    }
}
