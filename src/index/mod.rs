//! Lexical vector index over the corpus.
//!
//! Builds a TF-IDF weighting from a corpus snapshot: a bounded vocabulary
//! (lowest-weight terms dropped first), per-document unit-normalized sparse
//! vectors, and the transform needed to project queries into the same space.
//! The index is immutable once built; a rebuild produces a new instance.

use std::collections::{HashMap, HashSet};

use crate::core::config::IndexConfig;
use crate::corpus::Document;

/// Sparse vector: `(dimension, weight)` pairs sorted by dimension.
pub type SparseVector = Vec<(usize, f32)>;

/// A derived, disposable artifact built from a corpus snapshot.
///
/// An empty corpus yields the designated empty sentinel (`is_empty()`),
/// which retrieval treats as "no evidence available".
pub struct VectorIndex {
    vocab: HashMap<String, usize>,
    idf: Vec<f32>,
    doc_vectors: Vec<SparseVector>,
    documents: Vec<Document>,
}

impl VectorIndex {
    pub fn empty() -> Self {
        Self {
            vocab: HashMap::new(),
            idf: Vec::new(),
            doc_vectors: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn doc_vector(&self, idx: usize) -> Option<&SparseVector> {
        self.doc_vectors.get(idx)
    }

    /// Project a query into this index's space. Terms unseen at build time
    /// contribute zero weight; no rebuild is ever triggered here.
    pub fn embed_query(&self, query: &str) -> SparseVector {
        let tokens = tokenize(query);
        if tokens.is_empty() || self.vocab.is_empty() {
            return Vec::new();
        }

        let mut tf: HashMap<usize, f32> = HashMap::new();
        for token in &tokens {
            if let Some(&dim) = self.vocab.get(token) {
                *tf.entry(dim).or_default() += 1.0;
            }
        }

        let total = tokens.len() as f32;
        let mut vector: SparseVector = tf
            .into_iter()
            .map(|(dim, count)| (dim, (count / total) * self.idf[dim]))
            .collect();
        vector.sort_unstable_by_key(|&(dim, _)| dim);

        normalize(&mut vector);
        vector
    }
}

/// Builds `VectorIndex` instances from corpus snapshots.
///
/// Deterministic for a given snapshot and configuration; holds no
/// ingestion-triggering logic — rebuild cadence is the caller's call.
pub struct Indexer {
    config: IndexConfig,
}

impl Indexer {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, documents: Vec<Document>) -> VectorIndex {
        if documents.is_empty() {
            return VectorIndex::empty();
        }

        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|d| tokenize(&d.indexed_text()))
            .collect();

        // Document frequency per term.
        let mut df: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&String> = tokens.iter().collect();
            for term in unique {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
        }

        // Collection-wide term frequency, used to rank terms for the cap.
        let mut total_tf: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            for token in tokens {
                *total_tf.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len() as f32;
        let term_idf = |term: &str| -> f32 {
            let doc_freq = df.get(term).copied().unwrap_or(1) as f32;
            (n_docs / doc_freq).ln() + 1.0
        };

        // Rank terms by collection weight, drop the lowest-weight tail.
        // Ties break lexicographically so the build is deterministic.
        let mut ranked: Vec<(String, f32)> = total_tf
            .iter()
            .map(|(term, &count)| (term.clone(), count as f32 * term_idf(term)))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(self.config.vocab_cap);

        let mut vocab: HashMap<String, usize> = HashMap::with_capacity(ranked.len());
        let mut idf: Vec<f32> = Vec::with_capacity(ranked.len());
        for (dim, (term, _)) in ranked.into_iter().enumerate() {
            idf.push(term_idf(&term));
            vocab.insert(term, dim);
        }

        let doc_vectors: Vec<SparseVector> = tokenized
            .iter()
            .map(|tokens| {
                let mut tf: HashMap<usize, f32> = HashMap::new();
                for token in tokens {
                    if let Some(&dim) = vocab.get(token) {
                        *tf.entry(dim).or_default() += 1.0;
                    }
                }

                let total = tokens.len().max(1) as f32;
                let mut vector: SparseVector = tf
                    .into_iter()
                    .map(|(dim, count)| (dim, (count / total) * idf[dim]))
                    .collect();
                vector.sort_unstable_by_key(|&(dim, _)| dim);

                normalize(&mut vector);
                vector
            })
            .collect();

        VectorIndex {
            vocab,
            idf,
            doc_vectors,
            documents,
        }
    }
}

/// Cosine similarity of two unit-normalized sparse vectors via merge-join.
/// Weights are non-negative, so the result lands in [0, 1].
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f32 {
    let mut dot = 0.0f32;
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    dot.clamp(0.0, 1.0)
}

fn normalize(vector: &mut SparseVector) {
    let norm: f32 = vector.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for (_, w) in vector.iter_mut() {
            *w /= norm;
        }
    }
}

/// Lowercase alphanumeric tokens, short tokens and stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() > 2 && !is_stop_word(w))
        .collect()
}

fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "the" | "and" | "for" | "are" | "but" | "not" | "you" | "all" | "can" | "had" | "her"
            | "was" | "one" | "our" | "out" | "has" | "have" | "been" | "from" | "this" | "that"
            | "with" | "they" | "will" | "each" | "which" | "their" | "said" | "what" | "its"
            | "into" | "more" | "other" | "does" | "did" | "when" | "where" | "how" | "why"
            | "who" | "than" | "then" | "these" | "those" | "there" | "here" | "also" | "such"
            | "may" | "might" | "could" | "would" | "should" | "between" | "among" | "about"
    )
}
