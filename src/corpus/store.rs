//! CorpusStore trait — abstract interface for corpus persistence backends.
//!
//! The primary implementation is `SqliteCorpusStore` in the `sqlite` module.

use async_trait::async_trait;

use super::{Candidate, Document, InsertOutcome};
use crate::core::errors::ApiError;

/// Abstract trait for the persistent, deduplicated corpus.
///
/// Implementations must keep the title-uniqueness invariant under concurrent
/// inserts: check-and-insert is observed as a single logical unit.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Insert a candidate, stamping its ingestion time. Idempotent on title.
    async fn insert(&self, candidate: Candidate) -> Result<InsertOutcome, ApiError>;

    /// Insert a batch of candidates; returns how many were newly added.
    async fn insert_batch(&self, candidates: Vec<Candidate>) -> Result<usize, ApiError>;

    /// Point-in-time copy of the whole corpus in ingestion order.
    async fn snapshot(&self) -> Result<Vec<Document>, ApiError>;

    /// The `n` most-recently-ingested documents, newest first.
    async fn recent(&self, n: usize) -> Result<Vec<Document>, ApiError>;

    /// Total number of documents in the corpus.
    async fn count(&self) -> Result<usize, ApiError>;
}
