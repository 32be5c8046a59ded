//! Fetching candidate documents from external research sources.
//!
//! Each configured source is fetched independently; a network failure or a
//! malformed payload skips that source and never aborts the rest of the
//! batch. The fetcher only produces validated candidates — persisting them
//! (and deduplicating) is the corpus store's job.

pub mod arxiv;
pub mod pubmed;

use crate::core::config::{FetchConfig, SourceConfig, SourceKind};
use crate::core::errors::ApiError;
use crate::corpus::{Candidate, Origin};

pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every configured source, skipping the ones that fail.
    pub async fn fetch_all(&self, sources: &[SourceConfig]) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for source in sources {
            match self.fetch_source(source).await {
                Ok(batch) => {
                    tracing::info!(
                        "Fetched {} candidates from {:?} for '{}'",
                        batch.len(),
                        source.kind,
                        source.topic
                    );
                    candidates.extend(batch);
                }
                Err(err) => {
                    tracing::warn!("Skipping source {:?}: {}", source.kind, err);
                }
            }
        }

        candidates
    }

    /// Fetch the configured sources for an ad-hoc topic instead of their
    /// standing ones. Used by the ask-time topical ingest path.
    pub async fn fetch_for_topic(
        &self,
        topic: &str,
        sources: &[SourceConfig],
    ) -> Vec<Candidate> {
        let retargeted: Vec<SourceConfig> = sources
            .iter()
            .map(|s| SourceConfig {
                kind: s.kind,
                topic: topic.to_string(),
                max_results: s.max_results,
            })
            .collect();

        self.fetch_all(&retargeted).await
    }

    pub async fn fetch_source(&self, source: &SourceConfig) -> Result<Vec<Candidate>, ApiError> {
        match source.kind {
            SourceKind::ArxivFeed => {
                arxiv::fetch(&self.client, &source.topic, source.max_results).await
            }
            SourceKind::PubmedSearch => {
                pubmed::fetch(
                    &self.client,
                    &source.topic,
                    source.max_results,
                    self.config.detail_char_cap,
                )
                .await
            }
        }
    }
}

/// Collapse runs of whitespace; feed titles often carry embedded newlines.
pub(crate) fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build a candidate from raw entry fields, rejecting entries that cannot
/// supply a usable title and link.
pub(crate) fn candidate_from_fields(
    title: &str,
    summary: &str,
    link: &str,
    origin: Origin,
) -> Result<Candidate, ApiError> {
    let title = normalize_text(title);
    let abstract_text = normalize_text(summary);
    let source_url = link.trim().to_string();

    if title.is_empty() || source_url.is_empty() {
        return Err(ApiError::MalformedEntry(format!(
            "entry from {} missing title or link",
            origin.as_str()
        )));
    }

    Ok(Candidate {
        title,
        abstract_text,
        source_url,
        origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_in_titles() {
        let candidate = candidate_from_fields(
            "  Exercise and\n  Cardiovascular Risk ",
            "A  study\nof outcomes.",
            " https://example.org/paper ",
            Origin::Arxiv,
        )
        .unwrap();

        assert_eq!(candidate.title, "Exercise and Cardiovascular Risk");
        assert_eq!(candidate.abstract_text, "A study of outcomes.");
        assert_eq!(candidate.source_url, "https://example.org/paper");
    }

    #[test]
    fn rejects_entry_without_title() {
        let err = candidate_from_fields("  ", "text", "https://example.org", Origin::Pubmed)
            .unwrap_err();
        assert!(matches!(err, ApiError::MalformedEntry(_)));
    }

    #[test]
    fn rejects_entry_without_link() {
        let err = candidate_from_fields("Title", "text", "", Origin::Arxiv).unwrap_err();
        assert!(matches!(err, ApiError::MalformedEntry(_)));
    }

    #[test]
    fn empty_abstract_is_still_a_valid_entry() {
        let candidate =
            candidate_from_fields("Title", "", "https://example.org", Origin::Pubmed).unwrap();
        assert!(candidate.abstract_text.is_empty());
    }
}
