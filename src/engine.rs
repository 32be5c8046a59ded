//! Engine facade: the two caller-facing operations.
//!
//! `ingest()` pulls candidates from the configured sources, funnels them
//! through the dedup insert, and rebuilds the index. `ask()` answers a
//! question against the current index snapshot. Ingestion and querying may
//! run concurrently: a rebuild swaps in a fresh immutable index while
//! in-flight queries keep the snapshot they already hold.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::context::ContextAssembler;
use crate::core::config::EngineConfig;
use crate::core::errors::ApiError;
use crate::corpus::{CorpusStore, Document};
use crate::fetch::Fetcher;
use crate::index::{Indexer, VectorIndex};
use crate::llm::GenerationProvider;
use crate::retrieve::Retriever;
use crate::synthesis::{AnswerResult, Orchestrator};

/// Result of one ingestion pass.
#[derive(Debug, Clone, Copy)]
pub struct IngestReport {
    /// Candidates fetched across all sources that responded.
    pub fetched: usize,
    /// Documents newly added to the corpus (duplicates excluded).
    pub added: usize,
}

pub struct Engine {
    store: Arc<dyn CorpusStore>,
    fetcher: Fetcher,
    indexer: Indexer,
    orchestrator: Orchestrator,
    index: RwLock<Arc<VectorIndex>>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        store: Arc<dyn CorpusStore>,
        provider: Arc<dyn GenerationProvider>,
        config: EngineConfig,
    ) -> Result<Self, ApiError> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        let indexer = Indexer::new(config.index.clone());
        let orchestrator = Orchestrator::new(
            Retriever::new(config.retrieval.clone()),
            ContextAssembler::new(config.context.clone()),
            provider,
            config.generation.clone(),
        );

        Ok(Self {
            store,
            fetcher,
            indexer,
            orchestrator,
            index: RwLock::new(Arc::new(VectorIndex::empty())),
            config,
        })
    }

    /// Run an ingestion pass over the configured standing sources.
    pub async fn ingest(&self) -> Result<IngestReport, ApiError> {
        let candidates = self.fetcher.fetch_all(&self.config.sources).await;
        self.ingest_candidates(candidates).await
    }

    /// Run a bounded topical ingestion pass for an ad-hoc topic.
    pub async fn ingest_topic(&self, topic: &str) -> Result<IngestReport, ApiError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ApiError::BadRequest("topic must not be empty".to_string()));
        }

        let candidates = self
            .fetcher
            .fetch_for_topic(topic, &self.config.sources)
            .await;
        self.ingest_candidates(candidates).await
    }

    async fn ingest_candidates(
        &self,
        candidates: Vec<crate::corpus::Candidate>,
    ) -> Result<IngestReport, ApiError> {
        let fetched = candidates.len();
        let added = self.store.insert_batch(candidates).await?;

        if added > 0 {
            self.reindex().await?;
        }

        tracing::info!("Ingestion pass: {} fetched, {} added", fetched, added);
        Ok(IngestReport { fetched, added })
    }

    /// Answer a question against the current index.
    pub async fn ask(&self, question: &str) -> Result<AnswerResult, ApiError> {
        if self.config.fetch.fetch_on_ask {
            if let Err(err) = self.ingest_topic(question).await {
                // A failed topical fetch degrades to answering from the
                // existing corpus; it never fails the question itself.
                tracing::warn!("ask-time ingest failed: {}", err);
            }
        }

        let index = self.current_index().await?;
        self.orchestrator.answer(question, &index).await
    }

    /// Rebuild the index from a fresh corpus snapshot and swap it in.
    /// Returns the number of indexed documents.
    pub async fn reindex(&self) -> Result<usize, ApiError> {
        let snapshot = self.store.snapshot().await?;
        let count = snapshot.len();
        let rebuilt = Arc::new(self.indexer.build(snapshot));

        *self.index.write().await = rebuilt;
        tracing::debug!("Index rebuilt over {} documents", count);
        Ok(count)
    }

    pub async fn corpus_count(&self) -> Result<usize, ApiError> {
        self.store.count().await
    }

    /// The `n` most-recently-ingested documents, newest first.
    pub async fn recent_documents(&self, n: usize) -> Result<Vec<Document>, ApiError> {
        self.store.recent(n).await
    }

    /// Current index snapshot, lazily building the first one when the
    /// corpus already has documents (e.g. after a restart).
    async fn current_index(&self) -> Result<Arc<VectorIndex>, ApiError> {
        let current = self.index.read().await.clone();
        if !current.is_empty() {
            return Ok(current);
        }

        if self.store.count().await? > 0 {
            self.reindex().await?;
            return Ok(self.index.read().await.clone());
        }

        Ok(current)
    }
}
