// src/record.rs
// =============================================================================
// The data model for harvested directory records.
//
// - Field:       one of the ten fixed columns a directory record can carry
// - Record:      the field values extracted from one entry block
// - Entry:       a Record stamped with the query term that produced it
// - Fingerprint: the identity of a Record (every field, trimmed, no query term)
//
// Two Entries with the same Fingerprint are the same person no matter which
// query found them. This is what lets dedup work across queries AND runs.
//
// Rust concepts:
// - Fixed-size arrays indexed by an enum: no HashMap needed for ten columns
// - Derive macros for Hash/Eq/Ord so Fingerprints go straight into sets
// =============================================================================

use serde::{Deserialize, Serialize};

/// Number of identity fields on a record (everything except the query term).
pub const FIELD_COUNT: usize = 10;

/// Header of the provenance column, always the last column in the sink.
pub const QUERY_TERM_COLUMN: &str = "Query-Term";

// The fixed, ordered set of fields every directory record has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    Name,
    Email,
    Title,
    Year,
    Department,
    Major,
    School,
    Location,
    Phone,
    Mailstop,
}

impl Field {
    /// Every field in column order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Name,
        Field::Email,
        Field::Title,
        Field::Year,
        Field::Department,
        Field::Major,
        Field::School,
        Field::Location,
        Field::Phone,
        Field::Mailstop,
    ];

    /// Column header / label text for this field.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Email => "Email",
            Field::Title => "Title",
            Field::Year => "Year",
            Field::Department => "Department",
            Field::Major => "Major",
            Field::School => "School",
            Field::Location => "Location",
            Field::Phone => "Phone",
            Field::Mailstop => "Mailstop",
        }
    }

    /// Matches a label as it appears on the page.
    ///
    /// A trailing colon ("Email:") is accepted. Anything that is not one of
    /// the expected labels returns None and gets dropped by the caller.
    pub fn from_label(label: &str) -> Option<Field> {
        let label = label.trim().trim_end_matches(':').trim_end();
        Field::ALL.into_iter().find(|field| field.label() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

// The field values of one directory record
//
// Every field is always present; a field the page did not show is "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    values: [String; FIELD_COUNT],
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    /// Stores a trimmed value for the field.
    pub fn set(&mut self, field: Field, value: &str) {
        self.values[field.index()] = value.trim().to_string();
    }

    /// Builder-style setter for fixtures.
    #[cfg(test)]
    pub fn with(mut self, field: Field, value: &str) -> Self {
        self.set(field, value);
        self
    }

    /// Computes the identity of this record.
    ///
    /// Values are trimmed again here so a Record built without `set` (or a
    /// row read back from the sink) neutralizes the same way.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(
            Field::ALL
                .into_iter()
                .map(|field| (field, self.get(field).trim().to_string()))
                .collect(),
        )
    }
}

// A Record plus the query term that discovered it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub record: Record,
    pub query_term: String,
}

impl Entry {
    pub fn new(record: Record, query_term: &str) -> Self {
        Self {
            record,
            query_term: query_term.to_string(),
        }
    }

    /// The row as written to the sink: fields in column order, query term last.
    pub fn to_row(&self) -> Vec<&str> {
        Field::ALL
            .into_iter()
            .map(|field| self.record.get(field))
            .chain(std::iter::once(self.query_term.as_str()))
            .collect()
    }
}

/// The sink's header row.
pub fn header_row() -> Vec<&'static str> {
    Field::ALL
        .into_iter()
        .map(Field::label)
        .chain(std::iter::once(QUERY_TERM_COLUMN))
        .collect()
}

// The identity of a record: ordered (field, trimmed value) pairs
//
// Serialized as a list of [field, value] pairs so the persisted seen-set is
// readable and independent of in-memory layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(Vec<(Field, String)>);
