//! Ranking the corpus against a question.
//!
//! The retriever projects the query into the current index's space, scores
//! every document by cosine similarity, and makes the accept/refuse call:
//! if even the best match is below the confidence floor (or the index is the
//! empty sentinel), the outcome is an explicit insufficient-evidence result,
//! distinct from an empty ranking.

use crate::core::config::RetrievalConfig;
use crate::corpus::Document;
use crate::index::{cosine_similarity, VectorIndex};

/// A ranked (document, score) pair.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub document: Document,
    pub score: f32,
}

/// Why retrieval could not produce usable evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsufficientReason {
    /// The index was built from an empty corpus (or never built).
    EmptyCorpus,
    /// The corpus has documents, but none cleared the confidence floor.
    BelowThreshold,
}

/// Outcome of ranking a query against an index.
#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// Evidence sorted best-first; never empty.
    Ranked(Vec<Evidence>),
    Insufficient(InsufficientReason),
}

pub struct Retriever {
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Rank the index's documents against `query_text`.
    ///
    /// Ordering is fully deterministic: descending score, ties broken by
    /// more recent ingestion, then title.
    pub fn rank(&self, query_text: &str, index: &VectorIndex) -> RetrievalOutcome {
        if index.is_empty() {
            return RetrievalOutcome::Insufficient(InsufficientReason::EmptyCorpus);
        }

        let query = index.embed_query(query_text);

        let mut evidence: Vec<Evidence> = index
            .documents()
            .iter()
            .enumerate()
            .map(|(idx, document)| {
                let score = index
                    .doc_vector(idx)
                    .map(|v| cosine_similarity(&query, v))
                    .unwrap_or(0.0);
                Evidence {
                    document: document.clone(),
                    score,
                }
            })
            .collect();

        evidence.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.document.ingested_at.cmp(&a.document.ingested_at))
                .then_with(|| a.document.title.cmp(&b.document.title))
        });

        let best = evidence.first().map(|e| e.score).unwrap_or(0.0);
        if best < self.config.min_confidence {
            return RetrievalOutcome::Insufficient(InsufficientReason::BelowThreshold);
        }

        RetrievalOutcome::Ranked(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::core::config::IndexConfig;
    use crate::corpus::Origin;
    use crate::index::Indexer;

    fn make_doc(title: &str, abstract_text: &str, age_hours: i64) -> Document {
        Document {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            source_url: format!("https://example.org/{}", title.replace(' ', "-")),
            origin: Origin::Arxiv,
            ingested_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    fn build_index(docs: Vec<Document>) -> VectorIndex {
        Indexer::new(IndexConfig::default()).build(docs)
    }

    fn retriever(min_confidence: f32) -> Retriever {
        Retriever::new(RetrievalConfig {
            min_confidence,
            top_k: 5,
        })
    }

    #[test]
    fn empty_index_is_insufficient_with_empty_corpus_reason() {
        let outcome = retriever(0.25).rank("anything", &VectorIndex::empty());
        assert!(matches!(
            outcome,
            RetrievalOutcome::Insufficient(InsufficientReason::EmptyCorpus)
        ));
    }

    #[test]
    fn irrelevant_corpus_is_insufficient_below_threshold() {
        let index = build_index(vec![
            make_doc("Pasta Recipes", "cooking pasta tomato sauce basil", 1),
            make_doc("Jazz History", "saxophone improvisation bebop origins", 2),
        ]);

        let outcome = retriever(0.25).rank("does exercise reduce heart disease risk", &index);
        assert!(matches!(
            outcome,
            RetrievalOutcome::Insufficient(InsufficientReason::BelowThreshold)
        ));
    }

    #[test]
    fn adding_a_relevant_document_flips_the_outcome() {
        let query = "does exercise reduce heart disease risk";

        let mut docs = vec![make_doc("Pasta Recipes", "cooking pasta tomato sauce", 1)];
        let outcome = retriever(0.25).rank(query, &build_index(docs.clone()));
        assert!(matches!(outcome, RetrievalOutcome::Insufficient(_)));

        docs.push(make_doc(
            "Exercise and Cardiovascular Risk",
            "regular exercise reduces heart disease risk in adults",
            1,
        ));
        let outcome = retriever(0.25).rank(query, &build_index(docs));

        match outcome {
            RetrievalOutcome::Ranked(evidence) => {
                assert_eq!(evidence[0].document.title, "Exercise and Cardiovascular Risk");
                assert!(evidence[0].score >= 0.25);
            }
            other => panic!("expected ranked evidence, got {other:?}"),
        }
    }

    #[test]
    fn ranking_is_deterministic_across_calls() {
        let index = build_index(vec![
            make_doc("Sleep and Memory", "sleep consolidates memory overnight", 3),
            make_doc("Sleep Deprivation", "sleep loss impairs memory and attention", 2),
            make_doc("Diet Study", "fiber intake and gut health", 1),
        ]);
        let retriever = retriever(0.0);

        let order = |outcome: RetrievalOutcome| -> Vec<String> {
            match outcome {
                RetrievalOutcome::Ranked(e) => {
                    e.into_iter().map(|e| e.document.title).collect()
                }
                other => panic!("expected ranked evidence, got {other:?}"),
            }
        };

        let first = order(retriever.rank("sleep memory", &index));
        let second = order(retriever.rank("sleep memory", &index));
        assert_eq!(first, second);
    }

    #[test]
    fn score_ties_break_by_recency() {
        // Two documents with identical text score identically; the newer
        // one must rank first.
        let older = make_doc("Older Study", "identical abstract text", 10);
        let newer = make_doc("Newer Study", "identical abstract text", 1);
        let index = build_index(vec![older, newer]);

        match retriever(0.0).rank("identical abstract text", &index) {
            RetrievalOutcome::Ranked(evidence) => {
                assert_eq!(evidence[0].document.title, "Newer Study");
                assert_eq!(evidence[1].document.title, "Older Study");
            }
            other => panic!("expected ranked evidence, got {other:?}"),
        }
    }
}
