//! Corpus data model.
//!
//! A `Document` is one ingested paper record. The corpus is append-only and
//! deduplicated by title; all mutation goes through the store's insert path.

pub mod sqlite;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use sqlite::SqliteCorpusStore;
pub use store::CorpusStore;

/// Where a document was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Arxiv,
    Pubmed,
    OtherFeed,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Arxiv => "arxiv",
            Origin::Pubmed => "pubmed",
            Origin::OtherFeed => "other_feed",
        }
    }

    pub fn parse(raw: &str) -> Origin {
        match raw {
            "arxiv" => Origin::Arxiv,
            "pubmed" => Origin::Pubmed,
            _ => Origin::OtherFeed,
        }
    }
}

/// A validated candidate produced by the fetcher, not yet persisted.
///
/// The ingestion timestamp is assigned by the store at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub abstract_text: String,
    pub source_url: String,
    pub origin: Origin,
}

/// One persisted corpus entry. Never mutated or deleted after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub abstract_text: String,
    pub source_url: String,
    pub origin: Origin,
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    /// The text the indexer sees: title and abstract concatenated.
    pub fn indexed_text(&self) -> String {
        format!("{} {}", self.title, self.abstract_text)
    }
}

/// Outcome of a dedup insert. A duplicate title is a no-op, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}
